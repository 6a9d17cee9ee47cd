use std::sync::Arc;

use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use serde_json::json;
use tower::ServiceExt;
use uuid::Uuid;

use super::common::*;
use crate::waitlist::{InsertOutcome, DUPLICATE_EMAIL_MESSAGE};

fn form_request(body: String) -> Request<Body> {
    Request::post("/waitlist")
        .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
        .body(Body::from(body))
        .expect("request builds")
}

#[tokio::test]
async fn landing_page_does_not_open_a_session() {
    let (router, registry) = router_with(Arc::new(ScriptedGateway::always(InsertOutcome::Success)));

    let response = router
        .oneshot(Request::get("/").body(Body::empty()).expect("request builds"))
        .await
        .expect("route executes");

    assert_eq!(response.status(), StatusCode::OK);
    let html = read_body(response).await;
    assert!(html.contains("<h1>Utforsk</h1>"));
    assert!(html.contains("Meld deg på venteliste"));
    assert!(!html.contains("name=\"session_id\""));
    assert!(registry.is_empty());
}

#[tokio::test]
async fn form_post_with_blank_or_malformed_session_opens_a_new_one() {
    let gateway = Arc::new(ScriptedGateway::always(InsertOutcome::Success));
    let (router, registry) = router_with(gateway.clone());

    for body in ["session_id=&email=a%40b.com", "session_id=nope&email=c%40d.com"] {
        let response = router
            .clone()
            .oneshot(form_request(body.to_string()))
            .await
            .expect("route executes");

        assert_eq!(response.status(), StatusCode::OK);
        assert!(read_body(response).await.contains("Takk for påmeldingen!"));
    }

    assert_eq!(registry.len(), 2);
    assert_eq!(gateway.emails(), vec!["a@b.com".to_string(), "c@d.com".to_string()]);
}

#[tokio::test]
async fn form_post_renders_thank_you_on_success() {
    let gateway = Arc::new(ScriptedGateway::always(InsertOutcome::Success));
    let (router, registry) = router_with(gateway.clone());
    let (session_id, controller) = registry.create();

    let response = router
        .oneshot(form_request(format!(
            "session_id={session_id}&email=a%40b.com"
        )))
        .await
        .expect("route executes");

    assert_eq!(response.status(), StatusCode::OK);
    let html = read_body(response).await;
    assert!(html.contains("Takk for påmeldingen!"));
    assert!(controller.is_completed());
    assert_eq!(gateway.emails(), vec!["a@b.com".to_string()]);
}

#[tokio::test]
async fn form_post_renders_duplicate_error() {
    let (router, registry) =
        router_with(Arc::new(ScriptedGateway::always(InsertOutcome::DuplicateConflict)));
    let (session_id, _) = registry.create();

    let response = router
        .oneshot(form_request(format!(
            "session_id={session_id}&email=dup%40b.com"
        )))
        .await
        .expect("route executes");

    let html = read_body(response).await;
    assert!(html.contains(DUPLICATE_EMAIL_MESSAGE));
    assert!(html.contains("value=\"dup@b.com\""));
}

#[tokio::test]
async fn form_post_with_invalid_email_skips_the_gateway() {
    let gateway = Arc::new(ScriptedGateway::always(InsertOutcome::Success));
    let (router, _) = router_with(gateway.clone());

    let response = router
        .oneshot(form_request("email=not-an-email".to_string()))
        .await
        .expect("route executes");

    assert_eq!(response.status(), StatusCode::OK);
    let html = read_body(response).await;
    assert!(html.contains("value=\"not-an-email\""));
    assert!(!html.contains("waitlist-error"));
    assert_eq!(gateway.calls(), 0);
}

#[tokio::test]
async fn json_session_flow_reaches_completion() {
    let gateway = Arc::new(ScriptedGateway::always(InsertOutcome::Success));
    let (router, _) = router_with(gateway.clone());

    let created = router
        .clone()
        .oneshot(json_request("POST", "/api/v1/waitlist/sessions", None))
        .await
        .expect("route executes");
    assert_eq!(created.status(), StatusCode::CREATED);
    let created = read_json_body(created).await;
    let session_id = created["session_id"].as_str().expect("session id").to_string();
    assert_eq!(created["state"]["phase"]["phase"], "idle");

    let changed = router
        .clone()
        .oneshot(json_request(
            "PUT",
            &format!("/api/v1/waitlist/sessions/{session_id}/email"),
            Some(json!({ "email": "a@b.com" })),
        ))
        .await
        .expect("route executes");
    assert_eq!(changed.status(), StatusCode::OK);
    assert_eq!(read_json_body(changed).await["state"]["candidate_email"], "a@b.com");

    let submitted = router
        .clone()
        .oneshot(json_request(
            "POST",
            &format!("/api/v1/waitlist/sessions/{session_id}/submit"),
            None,
        ))
        .await
        .expect("route executes");
    assert_eq!(submitted.status(), StatusCode::CREATED);
    let submitted = read_json_body(submitted).await;
    assert_eq!(submitted["result"]["outcome"], "succeeded");
    assert_eq!(submitted["state"]["is_completed"], true);
    assert_eq!(submitted["state"]["candidate_email"], "");

    let again = router
        .oneshot(json_request(
            "POST",
            &format!("/api/v1/waitlist/sessions/{session_id}/submit"),
            None,
        ))
        .await
        .expect("route executes");
    assert_eq!(again.status(), StatusCode::BAD_REQUEST);
    assert_eq!(gateway.calls(), 1);
}

#[tokio::test]
async fn json_submit_reports_failures_and_clears_errors() {
    let (router, registry) = router_with(Arc::new(ScriptedGateway::always(
        InsertOutcome::OtherFailure(String::new()),
    )));
    let (session_id, controller) = registry.create();
    controller.on_candidate_change("a@b.com");

    let submitted = router
        .clone()
        .oneshot(json_request(
            "POST",
            &format!("/api/v1/waitlist/sessions/{session_id}/submit"),
            None,
        ))
        .await
        .expect("route executes");
    assert_eq!(submitted.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let body = read_json_body(submitted).await;
    assert_eq!(body["result"]["outcome"], "failed");
    assert_eq!(body["result"]["kind"], "backend");
    assert_eq!(body["state"]["last_error"], "En feil oppstod. Prøv igjen senere.");

    let cleared = router
        .oneshot(json_request(
            "DELETE",
            &format!("/api/v1/waitlist/sessions/{session_id}/error"),
            None,
        ))
        .await
        .expect("route executes");
    assert_eq!(cleared.status(), StatusCode::OK);
    let body = read_json_body(cleared).await;
    assert!(body["state"]["last_error"].is_null());
    assert_eq!(body["state"]["phase"]["phase"], "idle");
}

#[tokio::test]
async fn unknown_sessions_are_not_found() {
    let (router, _) = router_with(Arc::new(ScriptedGateway::always(InsertOutcome::Success)));

    let response = router
        .oneshot(json_request(
            "GET",
            &format!("/api/v1/waitlist/sessions/{}", Uuid::new_v4()),
            None,
        ))
        .await
        .expect("route executes");

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_eq!(read_json_body(response).await["error"], "session not found");
}
