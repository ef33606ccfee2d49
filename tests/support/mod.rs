//! Local fixture server for integration tests.

use std::io::{Read, Write};
use std::net::TcpListener;
use std::thread;

/// Serve each prepared response once, in order, then stop accepting.
///
/// Returns the base URL to point a client at. Bodies are wrapped in a
/// `200 OK` JSON response; use [`serve_raw`] for anything else.
pub fn serve_json(bodies: Vec<String>) -> String {
    let responses = bodies
        .into_iter()
        .map(|body| {
            format!(
                "HTTP/1.1 200 OK\r\nContent-Type: application/json\r\nConnection: close\r\nContent-Length: {}\r\n\r\n{}",
                body.len(),
                body
            )
        })
        .collect();
    serve_raw(responses)
}

/// Serve each raw HTTP response once, in order, then stop accepting.
pub fn serve_raw(responses: Vec<String>) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    thread::spawn(move || {
        for response in responses {
            let Ok((mut stream, _)) = listener.accept() else {
                return;
            };
            let mut buf = [0u8; 8192];
            let _ = stream.read(&mut buf);
            let _ = stream.write_all(response.as_bytes());
        }
    });
    format!("http://{addr}")
}
