mod helpers;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use tower::ServiceExt;

use medwise::api;
use medwise::server::build_state;

async fn call(app: &axum::Router, req: Request<Body>) -> (StatusCode, serde_json::Value) {
    let response = app.clone().oneshot(req).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), 1024 * 1024)
        .await
        .unwrap();
    (status, serde_json::from_slice(&bytes).unwrap_or_default())
}

fn predict(symptoms: &str) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/predict")
        .header("content-type", "application/x-www-form-urlencoded")
        .body(Body::from(format!("symptoms={symptoms}")))
        .unwrap()
}

#[tokio::test]
async fn server_state_from_fixture_files() {
    let (config, _tmp) = helpers::fixture_config();
    let state = tokio::task::spawn_blocking(move || build_state(&config))
        .await
        .unwrap()
        .unwrap();
    // No sentence encoder in the fixture directory.
    assert!(!state.search.is_ready());
    assert!(state.sms.is_none());

    let app = api::router(state);

    let (status, health) = call(&app, Request::get("/health").body(Body::empty()).unwrap()).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(health["model"], "ready");
    assert_eq!(health["vocabulary_size"], 4);
    assert_eq!(health["diseases"], 3);
    assert_eq!(health["medicine_search"], "unavailable");

    let (status, json) = call(&app, predict("itching%2C+skin+rash")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["disease"], "Fungal infection");
    assert_eq!(json["advisory"]["medications"][1], "Fluconazole");
    assert_eq!(json["advisory"]["precautions"].as_array().unwrap().len(), 4);

    let (status, json) = call(&app, predict("shivering")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["status"], "unknown_disease");
    assert_eq!(json["headline"], "Unknown Disease");

    let (status, _) = call(
        &app,
        Request::get("/medicines/search?q=paracetamol")
            .body(Body::empty())
            .unwrap(),
    )
    .await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
}
