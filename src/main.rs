#![deny(missing_docs)]
#![deny(warnings)]

//! Interactive terminal front end for the salescope prediction client.

use std::io::{self, Write};

use salescope::client::PredictionClient;
use salescope::config::{self, Settings};
use salescope::fields::ValueKind;
use salescope::logging;
use salescope::schema::ModelKind;
use salescope::session::Session;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    if let Err(err) = logging::init() {
        eprintln!("Logging disabled: {err}");
    }

    let settings = config::load_or_default().unwrap_or_else(|err| {
        tracing::warn!("Settings unavailable, using defaults: {err}");
        Settings::default()
    });
    let base = std::env::args()
        .nth(1)
        .or_else(|| std::env::var("SALESCOPE_BASE_URL").ok())
        .or_else(|| settings.base_url.clone())
        .unwrap_or_default();
    let client = PredictionClient::new(&base)?;
    println!("salescope: prediction client for {}", client.base_url());

    let mut session = Session::new(client);
    match session.refresh_catalog() {
        Ok(()) => print_models(&session),
        Err(err) => {
            println!("{err}");
            println!("Type 'refresh' to retry once the service is reachable.");
        }
    }

    run(&mut session);
    Ok(())
}

fn run(session: &mut Session) {
    println!("Type 'help' for commands.");
    let stdin = io::stdin();
    loop {
        print!("> ");
        let _ = io::stdout().flush();
        let mut line = String::new();
        match stdin.read_line(&mut line) {
            Ok(0) => return,
            Ok(_) => {}
            Err(err) => {
                eprintln!("Input error: {err}");
                return;
            }
        }
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        let (command, rest) = match line.split_once(char::is_whitespace) {
            Some((command, rest)) => (command, rest.trim()),
            None => (line, ""),
        };
        match command {
            "help" => print_help(),
            "models" => print_models(session),
            "use" => select_model(session, rest),
            "show" => show_form(session),
            "set" => set_field(session, rest),
            "clear" => report(session.clear_form().map(|_| "Form cleared.".to_string())),
            "presets" => print_presets(session),
            "preset" => apply_preset(session, rest),
            "predict" => predict(session, rest),
            "batch" => batch(session, rest),
            "health" => health(session),
            "refresh" => refresh(session),
            "base" => change_base(session, rest),
            "quit" | "exit" => return,
            _ => println!("Unknown command '{command}'. Type 'help' for commands."),
        }
    }
}

fn print_help() {
    println!(
        "\
Commands:
  models               List models the service declares
  use <tag>            Select a model (logreg, dtree, svm, kmeans, linreg)
  show                 Show the current form
  set <field> <value>  Edit one field
  clear                Clear every field
  presets              List presets for the selected model
  preset <number>      Fill the form from a preset
  predict [json]       Submit the form, optionally merging a raw JSON override
  batch <json>         Submit a JSON array of feature objects
  health               Check service health
  refresh              Re-fetch the model catalog
  base <url>           Switch to another service origin and remember it
  quit                 Leave"
    );
}

fn report<E: std::fmt::Display>(result: Result<String, E>) {
    match result {
        Ok(message) => println!("{message}"),
        Err(err) => println!("{err}"),
    }
}

fn print_models(session: &Session) {
    let models = session.available_models();
    if models.is_empty() {
        println!("No models available; the catalog has not been fetched yet.");
        return;
    }
    for kind in models {
        let marker = if session.selected() == Some(kind) {
            "*"
        } else {
            " "
        };
        println!("{marker} {:<8} {}", kind.tag(), kind.display_name());
    }
}

fn select_model(session: &mut Session, tag: &str) {
    let Some(kind) = ModelKind::from_tag(tag) else {
        let tags: Vec<&str> = ModelKind::ALL.iter().map(|kind| kind.tag()).collect();
        println!("Unknown model '{tag}'. Expected one of: {}", tags.join(", "));
        return;
    };
    report(
        session
            .select_model(kind)
            .map(|_| format!("Using {} ({})", kind.display_name(), kind.tag())),
    );
}

fn show_form(session: &Session) {
    let Some(form) = session.form() else {
        println!("No model selected.");
        return;
    };
    println!("Model: {}", form.kind().display_name());
    if let Some(notes) = session
        .catalog()
        .entry(form.kind())
        .and_then(|entry| entry.notes.as_deref())
    {
        println!("Notes: {notes}");
    }
    for field in form.fields() {
        let value = form.value_of(&field.name);
        let shown = if value.is_empty() { "(unset)" } else { value };
        println!("  {:<14} {:<40} {shown}", field.name, describe(field.kind));
    }
}

fn describe(kind: ValueKind) -> String {
    match kind {
        ValueKind::Numeric => "number".to_string(),
        ValueKind::Categorical(values) => format!("one of {}", values.join("|")),
        ValueKind::FreeText => "text".to_string(),
    }
}

fn set_field(session: &mut Session, rest: &str) {
    if rest.is_empty() {
        println!("Usage: set <field> <value>");
        return;
    }
    let (name, value) = match rest.split_once(char::is_whitespace) {
        Some((name, value)) => (name, value.trim()),
        None => (rest, ""),
    };
    let shown = if value.is_empty() { "(unset)" } else { value };
    report(
        session
            .set_field(name, value)
            .map(|_| format!("{name} = {shown}")),
    );
}

fn print_presets(session: &Session) {
    let presets = session.presets();
    if presets.is_empty() {
        println!("No presets for the current selection.");
        return;
    }
    for (index, preset) in presets.iter().enumerate() {
        println!("{}. {}", index + 1, preset.name);
    }
}

fn apply_preset(session: &mut Session, rest: &str) {
    let Ok(number) = rest.parse::<usize>() else {
        println!("Usage: preset <number>");
        return;
    };
    if number == 0 {
        println!("Preset numbers start at 1.");
        return;
    }
    report(session.apply_preset(number - 1).map(|name| {
        format!("Loaded preset '{name}'. You can edit any field before predicting.")
    }));
}

fn predict(session: &Session, rest: &str) {
    let override_json = if rest.is_empty() { None } else { Some(rest) };
    let outcome = match session.build_payload(override_json) {
        Ok(outcome) => outcome,
        Err(err) => {
            println!("{err}");
            return;
        }
    };
    if !outcome.ignored.is_empty() {
        println!("Ignored unknown field(s): {}", outcome.ignored.join(", "));
    }
    match session.predict(&outcome.payload) {
        Ok(result) => {
            println!("{}", result.pretty());
            println!("{}", session.present(&result));
        }
        Err(err) => println!("{err}"),
    }
}

fn batch(session: &Session, rest: &str) {
    if rest.is_empty() {
        println!("Usage: batch <json array of feature objects>");
        return;
    }
    let outcome = match session.build_batch(rest) {
        Ok(outcome) => outcome,
        Err(err) => {
            println!("{err}");
            return;
        }
    };
    if !outcome.ignored.is_empty() {
        println!("Ignored unknown field(s): {}", outcome.ignored.join(", "));
    }
    match session.predict_batch(&outcome.payload) {
        Ok(results) => {
            for (index, result) in results.iter().enumerate() {
                println!("{}. {}", index + 1, session.present(result));
            }
        }
        Err(err) => println!("{err}"),
    }
}

fn health(session: &Session) {
    match session.health() {
        Ok(status) => println!("Health: {}", status.status),
        Err(err) => println!("Health check failed: {err}"),
    }
}

fn refresh(session: &mut Session) {
    match session.refresh_catalog() {
        Ok(()) => {
            println!("Catalog refreshed.");
            print_models(session);
        }
        Err(err) => println!("{err}"),
    }
}

fn change_base(session: &mut Session, rest: &str) {
    if rest.is_empty() {
        println!("Usage: base <url>");
        return;
    }
    let client = match PredictionClient::new(rest) {
        Ok(client) => client,
        Err(err) => {
            println!("{err}");
            return;
        }
    };
    let settings = Settings {
        base_url: Some(client.base_url().to_string()),
    };
    if let Err(err) = config::save(&settings) {
        tracing::warn!("Could not persist settings: {err}");
    }
    println!("Now talking to {}", client.base_url());
    *session = Session::new(client);
    refresh(session);
}
