//! End-to-end client flows against a local fixture server.

mod support;

use salescope::client::PredictionClient;
use salescope::payload::PayloadError;
use salescope::present::{ChurnVerdict, Summary};
use salescope::schema::ModelKind;
use salescope::session::{Session, SessionError};
use support::{serve_json, serve_raw};

const NUMERIC_AND_CATEGORICAL: [&str; 11] = [
    "price",
    "quantity",
    "total_value",
    "age",
    "tenure_months",
    "gender",
    "region",
    "segment",
    "product_name",
    "category",
    "sentiment",
];

fn full_catalog() -> String {
    serde_json::json!({
        "models": {
            "logreg_churn": {
                "model_type": "logreg",
                "required_fields": NUMERIC_AND_CATEGORICAL,
                "notes": "Pipeline with impute + scale/one-hot + LogisticRegression.",
                "example_payload": {
                    "model_type": "logreg",
                    "features": {
                        "price": 45000, "quantity": 2, "total_value": 90000,
                        "age": 50, "tenure_months": 44,
                        "gender": "Female", "region": "West", "segment": "Corporate",
                        "product_name": "Projector", "category": "Electronics",
                        "sentiment": "Positive"
                    }
                }
            },
            "decision_tree_churn": {
                "model_type": "dtree",
                "required_fields": NUMERIC_AND_CATEGORICAL,
                "example_payload": {
                    "model_type": "dtree",
                    "features": {
                        "price": 12000, "quantity": 2, "total_value": 24000,
                        "age": 40, "tenure_months": 37,
                        "gender": "Female", "region": "West", "segment": "Small Business",
                        "product_name": "Desk", "category": "Furniture",
                        "sentiment": "Negative"
                    }
                }
            },
            "svm_churn": {
                "model_type": "svm",
                "required_fields": NUMERIC_AND_CATEGORICAL,
                "example_payload": {
                    "model_type": "svm",
                    "features": {
                        "price": 45000, "quantity": 4, "total_value": 180000,
                        "age": 33, "tenure_months": 25,
                        "gender": "Male", "region": "South", "segment": "Corporate",
                        "product_name": "Projector", "category": "Electronics",
                        "sentiment": "Neutral"
                    }
                }
            },
            "kmeans_clusters": {
                "model_type": "kmeans",
                "required_numeric_fields": [
                    "price", "quantity", "total_value", "age", "tenure_months"
                ],
                "example_payload_dict": {
                    "model_type": "kmeans",
                    "features": {
                        "price": 12000, "quantity": 2, "total_value": 24000,
                        "age": 40, "tenure_months": 37
                    }
                },
                "cluster_labels": {"1": "Loyal Mid"}
            },
            "linreg_sales": {
                "model_type": "linreg",
                "required_fields": [
                    "price", "quantity", "age", "tenure_months",
                    "gender", "region", "segment", "product_name", "category", "sentiment"
                ],
                "example_payload": {
                    "model_type": "linreg",
                    "features": {
                        "price": 45000, "quantity": 2, "age": 50, "tenure_months": 44,
                        "gender": "Female", "region": "West", "segment": "Corporate",
                        "product_name": "Projector", "category": "Electronics",
                        "sentiment": "Positive"
                    }
                }
            }
        }
    })
    .to_string()
}

fn connect(bodies: Vec<String>) -> Session {
    let url = serve_json(bodies);
    let client = PredictionClient::new(&url).unwrap();
    Session::connect(client).unwrap()
}

#[test]
fn catalog_drives_the_model_menu() {
    let session = connect(vec![full_catalog()]);
    assert_eq!(
        session.available_models(),
        vec![
            ModelKind::Logreg,
            ModelKind::Dtree,
            ModelKind::Svm,
            ModelKind::Kmeans,
            ModelKind::Linreg
        ]
    );
    assert_eq!(session.selected(), Some(ModelKind::Logreg));
    assert_eq!(session.presets().len(), 2);
}

#[test]
fn preset_prediction_uses_catalog_cluster_labels() {
    let predict_response = serde_json::json!({
        "model_type": "kmeans",
        "order": ["price", "quantity", "total_value", "age", "tenure_months"],
        "features": [12000, 2, 24000, 40, 37],
        "prediction_cluster": 1
    })
    .to_string();
    let mut session = connect(vec![full_catalog(), predict_response]);

    session.select_model(ModelKind::Kmeans).unwrap();
    let name = session.apply_preset(0).unwrap();
    assert_eq!(name, "Mid Spender");

    let outcome = session.build_payload(None).unwrap();
    assert!(outcome.ignored.is_empty());
    assert_eq!(outcome.payload.model_type, "kmeans");
    assert_eq!(
        outcome.payload.features.get("price"),
        Some(&serde_json::json!(12000))
    );

    let result = session.predict(&outcome.payload).unwrap();
    assert_eq!(
        session.present(&result),
        Summary::Cluster {
            id: 1,
            label: "Loyal Mid".to_string()
        }
    );
}

#[test]
fn churn_prediction_presents_a_clamped_probability() {
    let predict_response = serde_json::json!({
        "model_type": "logreg",
        "prediction": 1,
        "probability_of_churn": 0.83
    })
    .to_string();
    let mut session = connect(vec![full_catalog(), predict_response]);

    session.apply_preset(0).unwrap();
    let outcome = session.build_payload(None).unwrap();
    let result = session.predict(&outcome.payload).unwrap();
    assert_eq!(
        session.present(&result),
        Summary::Churn {
            verdict: ChurnVerdict::Churn,
            probability: Some(0.83)
        }
    );
}

#[test]
fn validation_blocks_submission_before_the_network() {
    // Only the catalog response is served; a predict would hang up.
    let session = connect(vec![full_catalog()]);
    let err = session.build_payload(None).unwrap_err();
    let SessionError::Payload(PayloadError::MissingFields { missing }) = err else {
        panic!("expected MissingFields, got {err}");
    };
    assert_eq!(
        missing,
        ["price", "quantity", "total_value", "age", "tenure_months"]
    );
}

#[test]
fn merged_override_reports_ignored_fields_and_submits() {
    let predict_response = serde_json::json!({
        "model_type": "svm",
        "prediction": 0
    })
    .to_string();
    let mut session = connect(vec![full_catalog(), predict_response]);

    session.select_model(ModelKind::Svm).unwrap();
    session.apply_preset(0).unwrap();
    let outcome = session
        .build_payload(Some(r#"{"age": 60, "churn": 1, "favorite_color": "blue"}"#))
        .unwrap();
    assert_eq!(outcome.ignored, ["favorite_color"]);
    assert!(!outcome.payload.features.contains_key("churn"));
    assert_eq!(
        outcome.payload.features.get("age"),
        Some(&serde_json::json!(60))
    );

    let result = session.predict(&outcome.payload).unwrap();
    assert_eq!(
        session.present(&result),
        Summary::Churn {
            verdict: ChurnVerdict::Stay,
            probability: None
        }
    );
}

#[test]
fn batch_flow_presents_each_row() {
    let batch_response = serde_json::json!({
        "model_type": "linreg",
        "results": [
            {"input": {}, "predicted_sales_value": 90000.0},
            {"input": {}, "predicted_sales_value": 1234.9}
        ]
    })
    .to_string();
    let mut session = connect(vec![full_catalog(), batch_response]);

    session.select_model(ModelKind::Linreg).unwrap();
    let rows = serde_json::json!([
        {"price": 45000, "quantity": 2, "age": 50, "tenure_months": 44},
        {"price": 12000, "quantity": 1, "age": 26, "tenure_months": 6}
    ])
    .to_string();
    let outcome = session.build_batch(&rows).unwrap();
    let results = session.predict_batch(&outcome.payload).unwrap();
    assert_eq!(results.len(), 2);

    let summaries: Vec<Summary> = results
        .iter()
        .map(|result| session.present(result))
        .collect();
    assert_eq!(
        summaries[1],
        Summary::Sales {
            value: 1234.9,
            formatted: "$1,235".to_string()
        }
    );
}

#[test]
fn schema_failure_leaves_an_empty_but_usable_session() {
    let url = serve_raw(vec![
        "HTTP/1.1 500 Internal Server Error\r\nConnection: close\r\nContent-Length: 0\r\n\r\n"
            .to_string(),
    ]);
    let client = PredictionClient::new(&url).unwrap();
    let mut session = Session::new(client);

    assert!(session.refresh_catalog().is_err());
    assert!(session.available_models().is_empty());
    assert!(matches!(
        session.build_payload(None),
        Err(SessionError::NoSelection)
    ));
}

#[test]
fn health_round_trip() {
    let url = serve_json(vec![r#"{"status": "ok"}"#.to_string()]);
    let client = PredictionClient::new(&url).unwrap();
    let session = Session::new(client);
    assert_eq!(session.health().unwrap().status, "ok");
}
