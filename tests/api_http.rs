// tests/api_http.rs
//
// HTTP-level tests for the Router without opening sockets.
// We exercise the router directly via tower::ServiceExt::oneshot.

use axum::{
    body::{self, Body},
    http::{Request, StatusCode},
    Router,
};
use serde_json::{json, Value as Json};
use tower::ServiceExt as _; // for `oneshot`

use realm_classifier::app_with;
use realm_classifier::config::AppConfig;

const BODY_LIMIT: usize = 1024 * 1024;

fn test_router(debug_routes: bool) -> Router {
    let cfg = AppConfig {
        debug_routes,
        ..AppConfig::default()
    };
    app_with(&cfg).expect("router builds from embedded data")
}

async fn get(app: Router, uri: &str) -> (StatusCode, Vec<u8>) {
    let req = Request::builder()
        .method("GET")
        .uri(uri)
        .body(Body::empty())
        .unwrap();
    let resp = app.oneshot(req).await.unwrap();
    let status = resp.status();
    let bytes = body::to_bytes(resp.into_body(), BODY_LIMIT).await.unwrap();
    (status, bytes.to_vec())
}

async fn post_json(app: Router, uri: &str, payload: Json) -> (StatusCode, Json) {
    let req = Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(payload.to_string()))
        .unwrap();
    let resp = app.oneshot(req).await.unwrap();
    let status = resp.status();
    let bytes = body::to_bytes(resp.into_body(), BODY_LIMIT).await.unwrap();
    (status, serde_json::from_slice(&bytes).unwrap_or(Json::Null))
}

#[tokio::test]
async fn health_returns_ok() {
    let (status, body) = get(test_router(false), "/health").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(String::from_utf8(body).unwrap(), "ok");
}

#[tokio::test]
async fn realms_are_listed_in_registry_order() {
    let (status, body) = get(test_router(false), "/realms").await;
    assert_eq!(status, StatusCode::OK);
    let v: Json = serde_json::from_slice(&body).unwrap();
    let ids: Vec<&str> = v
        .as_array()
        .unwrap()
        .iter()
        .map(|r| r["id"].as_str().unwrap())
        .collect();
    assert_eq!(
        ids,
        ["abyss", "cavern", "dross", "ember", "glare", "languish", "mist", "oasis", "trace", "zenith"]
    );
}

#[tokio::test]
async fn questions_are_served() {
    let (status, body) = get(test_router(false), "/questions").await;
    assert_eq!(status, StatusCode::OK);
    let v: Json = serde_json::from_slice(&body).unwrap();
    let qs = v["questions"].as_array().unwrap();
    assert_eq!(qs.len(), 30);
    assert_eq!(qs[0]["id"], "q1");
}

#[tokio::test]
async fn classify_returns_full_result() {
    let payload = json!([
        {"question_id": "q1", "value": "q1a", "weights": {"trace": 10, "oasis": 5, "mist": 3}},
        {"question_id": "q2", "value": "q2b", "weights": {"trace": 8, "oasis": 4}}
    ]);
    let (status, v) = post_json(test_router(false), "/classify", payload).await;
    assert_eq!(status, StatusCode::OK, "{v}");
    assert_eq!(v["primary_realm"], "trace");
    assert_eq!(v["primary_score"], 60);
    assert_eq!(v["secondary_realm"], "oasis");
    assert_eq!(v["secondary_score"], 30);
    assert_eq!(v["tertiary_realm"], "mist");
    assert_eq!(v["tertiary_score"], 10);
    assert_eq!(v["confidence"], "moderate");
    assert_eq!(v["trio"]["key"], "mist-oasis-trace");
    assert_eq!(v["trio"]["title"], "The Wondering Heart");
    assert_eq!(v["full_scores"].as_object().unwrap().len(), 10);
    assert!(v["timestamp"].is_string());
}

#[tokio::test]
async fn classify_rejects_negative_and_unknown_weights() {
    let negative = json!([{"question_id": "q1", "value": "q1a", "weights": {"ember": -2}}]);
    let (status, v) = post_json(test_router(false), "/classify", negative).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(v["error"].is_string());

    let unknown = json!([{"question_id": "q1", "value": "q1a", "weights": {"sunshine": 2}}]);
    let (status, v) = post_json(test_router(false), "/classify", unknown).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(v["error"].as_str().unwrap().contains("sunshine"));
}

#[tokio::test]
async fn classify_rejects_totals_that_overflow() {
    let payload = json!([
        {"question_id": "q1", "value": "q1a", "weights": {"trace": 4000000000u64}},
        {"question_id": "q2", "value": "q2a", "weights": {"trace": 4000000000u64}},
        {"question_id": "q3", "value": "q3a", "weights": {"oasis": 4200000000u64}}
    ]);
    let (status, v) = post_json(test_router(false), "/classify", payload).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    let msg = v["error"].as_str().unwrap();
    assert!(msg.contains("trace") && msg.contains("overflows"), "{msg}");
}

#[tokio::test]
async fn submit_resolves_selections() {
    let payload = json!([
        {"question_id": "q1", "value": "q1d"},
        {"question_id": "q15", "value": 10}
    ]);
    let (status, v) = post_json(test_router(false), "/quiz/submit", payload).await;
    assert_eq!(status, StatusCode::OK, "{v}");
    assert_eq!(v["primary_realm"], "oasis");
    assert_eq!(v["primary_score"], 83);
    assert_eq!(v["secondary_realm"], "zenith");
}

#[tokio::test]
async fn submit_errors_map_to_status_codes() {
    let unknown_q = json!([{"question_id": "q99", "value": "x"}]);
    let (status, v) = post_json(test_router(false), "/quiz/submit", unknown_q).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert!(v["error"].as_str().unwrap().contains("q99"));

    let out_of_range = json!([{"question_id": "q13", "value": 150}]);
    let (status, _) = post_json(test_router(false), "/quiz/submit", out_of_range).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn trio_lookup_is_order_independent() {
    let (status, body) = get(test_router(false), "/trio/trace/Oasis/mist").await;
    assert_eq!(status, StatusCode::OK);
    let v: Json = serde_json::from_slice(&body).unwrap();
    assert_eq!(v["key"], "mist-oasis-trace");
    assert_eq!(v["fallback"], false);

    let (status, _) = get(test_router(false), "/trio/mist/mist/oasis").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    let (status, _) = get(test_router(false), "/trio/mist/oasis/sunshine").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn debug_routes_are_gated() {
    let (status, _) = get(test_router(false), "/debug/balance").await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let app = test_router(true);
    let (status, body) = get(app.clone(), "/debug/balance").await;
    assert_eq!(status, StatusCode::OK);
    let v: Json = serde_json::from_slice(&body).unwrap();
    assert_eq!(v["total_questions"], 30);
    assert_eq!(v["all_combinations_reachable"], true);

    let (status, body) = get(app.clone(), "/debug/coverage").await;
    assert_eq!(status, StatusCode::OK);
    let v: Json = serde_json::from_slice(&body).unwrap();
    assert_eq!(v["present"], 120);
}

#[tokio::test]
async fn recent_history_tracks_classifications() {
    let app = test_router(true);
    for option in ["q1a", "q1d"] {
        let (status, _) = post_json(
            app.clone(),
            "/quiz/submit",
            json!([{"question_id": "q1", "value": option}]),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
    }

    let (status, body) = get(app.clone(), "/debug/recent?n=5").await;
    assert_eq!(status, StatusCode::OK);
    let rows: Json = serde_json::from_slice(&body).unwrap();
    let rows = rows.as_array().unwrap();
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0]["primary"], "trace");
    assert_eq!(rows[1]["primary"], "oasis");

    let (_, body) = get(app, "/debug/recent?n=1").await;
    let rows: Json = serde_json::from_slice(&body).unwrap();
    assert_eq!(rows.as_array().unwrap().len(), 1);
}
