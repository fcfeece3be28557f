use std::{sync::Arc, time::Duration};

use axum::{
    Router,
    body::Body,
    http::{Method, Request, StatusCode},
};
use http_body_util::BodyExt;
use serde_json::{Value, json};
use tower::ServiceExt;
use word_mafia_back::{
    config::AppConfig,
    dao::game_store::memory::MemoryGameStore,
    routes::{self, SESSION_TOKEN_HEADER},
    state::AppState,
};

async fn app() -> Router {
    let state = AppState::with_store(AppConfig::default(), Arc::new(MemoryGameStore::new())).await;
    routes::router(state)
}

async fn send(
    app: &Router,
    method: Method,
    uri: &str,
    token: Option<&str>,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let mut request = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        request = request.header(SESSION_TOKEN_HEADER, token);
    }
    let request = match body {
        Some(body) => request
            .header("content-type", "application/json")
            .body(Body::from(body.to_string())),
        None => request.body(Body::empty()),
    }
    .unwrap();

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, value)
}

async fn create(app: &Router, player_count: u8) -> (String, String) {
    let (status, body) = send(
        app,
        Method::POST,
        "/games",
        None,
        Some(json!({"host_name": "Host", "player_count": player_count, "mafia_count": 1})),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    (
        body["game"]["code"].as_str().unwrap().to_owned(),
        body["session_token"].as_str().unwrap().to_owned(),
    )
}

async fn join(app: &Router, code: &str, name: &str) -> (StatusCode, Value) {
    send(
        app,
        Method::POST,
        &format!("/games/{code}/players"),
        None,
        Some(json!({"player_name": name})),
    )
    .await
}

#[tokio::test]
async fn healthcheck_reports_ok_with_store() {
    let app = app().await;
    let (status, body) = send(&app, Method::GET, "/healthcheck", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
}

#[tokio::test]
async fn plays_a_full_round_over_http() {
    let app = app().await;
    let (code, host_token) = create(&app, 3).await;

    let (status, bob) = join(&app, &code, "Bob").await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(bob["player"]["id"], 2);
    let (status, _) = join(&app, &code, "Cleo").await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, started) = send(&app, Method::POST, &format!("/games/{code}/start"), None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(started["status"], "playing");
    assert_eq!(started["phase"], "discussion");

    let (status, view) = send(
        &app,
        Method::GET,
        &format!("/games/{code}/view"),
        Some(&host_token),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(view["is_host"], true);
    assert!(view["word"].is_string());

    let (status, voting) = send(&app, Method::POST, &format!("/games/{code}/voting"), None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(voting["phase"], "voting");

    for (voter, target) in [(1, 3), (2, 3), (3, 1)] {
        let (status, _) = send(
            &app,
            Method::POST,
            &format!("/games/{code}/votes"),
            None,
            Some(json!({"voter_id": voter, "target_id": target})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
    }

    let (status, results) = send(&app, Method::GET, &format!("/games/{code}/results"), None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(results["voting_complete"], true);
    assert_eq!(results["votes_cast"], 3);
    assert_eq!(results["most_voted"][0]["id"], 3);
    assert!(results.get("mafia").is_none());

    let (status, revealed) = send(&app, Method::POST, &format!("/games/{code}/reveal"), None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(revealed["phase"], "revealed");

    let (status, lobby) = send(&app, Method::POST, &format!("/games/{code}/reset"), None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(lobby["phase"], "lobby");
    assert_eq!(lobby["players"].as_array().unwrap().len(), 3);
}

#[tokio::test]
async fn errors_carry_a_stable_kind() {
    let app = app().await;
    let (code, _) = create(&app, 3).await;

    let (status, body) = join(&app, &code, " Host ").await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["kind"], "name_taken");

    join(&app, &code, "Bob").await;
    join(&app, &code, "Cleo").await;
    let (status, body) = join(&app, &code, "Dan").await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["kind"], "full");

    let (status, body) = send(&app, Method::GET, "/games/ZZZZZZ", None, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["kind"], "not_found");

    let (status, body) = send(&app, Method::GET, "/games/nope", None, None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["kind"], "invalid_input");

    let (status, body) = send(&app, Method::GET, &format!("/games/{code}/view"), None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["kind"], "not_in_game");
}

#[tokio::test]
async fn rejects_invalid_settings() {
    let app = app().await;
    let (status, body) = send(
        &app,
        Method::POST,
        "/games",
        None,
        Some(json!({"host_name": "Host", "player_count": 4, "mafia_count": 3})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["kind"], "invalid_input");
}

#[tokio::test]
async fn session_can_be_read_and_cleared() {
    let app = app().await;
    let (code, token) = create(&app, 4).await;

    let (status, session) = send(&app, Method::GET, "/session", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(session["game_code"], code.as_str());
    assert_eq!(session["player_id"], 1);

    let (status, _) = send(&app, Method::DELETE, "/session", Some(&token), None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, body) = send(&app, Method::GET, "/session", Some(&token), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["kind"], "not_in_game");
}

#[tokio::test]
async fn event_stream_starts_with_current_snapshot() {
    let app = app().await;
    let (code, _) = create(&app, 4).await;

    let request = Request::builder()
        .uri(format!("/games/{code}/events"))
        .body(Body::empty())
        .unwrap();
    let response = app.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers()["content-type"].to_str().unwrap(),
        "text/event-stream"
    );

    let mut body = response.into_body();
    let frame = tokio::time::timeout(Duration::from_secs(2), body.frame())
        .await
        .unwrap()
        .unwrap()
        .unwrap();
    let data = frame.into_data().unwrap();
    let text = std::str::from_utf8(&data).unwrap();
    assert!(text.contains("event: game.updated"));
    assert!(text.contains(&format!(r#""code":"{code}""#)));
}

#[tokio::test]
async fn event_stream_of_unknown_game_is_not_found() {
    let app = app().await;
    let (status, body) = send(&app, Method::GET, "/games/ZZZZZZ/events", None, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["kind"], "not_found");
}
