use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{Html, IntoResponse, Response},
    routing::{delete, get, post, put},
    Form, Json, Router,
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use uuid::Uuid;

use super::controller::{SkipReason, SubmissionResult, SubmissionSnapshot};
use super::page::{render_landing_page, FORM_ACTION};
use super::session::SessionRegistry;

/// Landing page plus the JSON session API, sharing one registry.
pub fn waitlist_router(sessions: Arc<SessionRegistry>) -> Router {
    Router::new()
        .route("/", get(landing_page_handler))
        .route(FORM_ACTION, post(form_submit_handler))
        .route("/api/v1/waitlist/sessions", post(create_session_handler))
        .route(
            "/api/v1/waitlist/sessions/:session_id",
            get(session_state_handler),
        )
        .route(
            "/api/v1/waitlist/sessions/:session_id/email",
            put(candidate_change_handler),
        )
        .route(
            "/api/v1/waitlist/sessions/:session_id/submit",
            post(submit_handler),
        )
        .route(
            "/api/v1/waitlist/sessions/:session_id/error",
            delete(clear_error_handler),
        )
        .with_state(sessions)
}

/// Fields posted by the server-rendered form.
#[derive(Debug, Deserialize)]
pub(crate) struct WaitlistForm {
    #[serde(default)]
    pub(crate) session_id: Option<String>,
    #[serde(default)]
    pub(crate) email: String,
}

#[derive(Debug, Deserialize)]
pub(crate) struct CandidateChange {
    pub(crate) email: String,
}

#[derive(Debug, Serialize)]
pub(crate) struct SessionView {
    pub(crate) session_id: Uuid,
    pub(crate) state: SubmissionSnapshot,
}

#[derive(Debug, Serialize)]
pub(crate) struct SubmitView {
    pub(crate) session_id: Uuid,
    pub(crate) result: SubmissionResult,
    pub(crate) state: SubmissionSnapshot,
}

/// Renders the idle page. No session is opened until the form is posted.
pub(crate) async fn landing_page_handler() -> Html<String> {
    Html(render_landing_page(None, &SubmissionSnapshot::default()))
}

pub(crate) async fn form_submit_handler(
    State(sessions): State<Arc<SessionRegistry>>,
    Form(form): Form<WaitlistForm>,
) -> Html<String> {
    let session_id = form
        .session_id
        .as_deref()
        .map(str::trim)
        .filter(|raw| !raw.is_empty())
        .and_then(|raw| Uuid::parse_str(raw).ok());
    let (session_id, controller) = sessions.resume_or_create(session_id);

    controller.on_candidate_change(form.email);
    controller.submit_current().await;

    Html(render_landing_page(Some(session_id), &controller.snapshot()))
}

pub(crate) async fn create_session_handler(
    State(sessions): State<Arc<SessionRegistry>>,
) -> Response {
    let (session_id, controller) = sessions.create();
    let view = SessionView {
        session_id,
        state: controller.snapshot(),
    };
    (StatusCode::CREATED, Json(view)).into_response()
}

pub(crate) async fn session_state_handler(
    State(sessions): State<Arc<SessionRegistry>>,
    Path(session_id): Path<Uuid>,
) -> Response {
    match sessions.get(&session_id) {
        Some(controller) => {
            let view = SessionView {
                session_id,
                state: controller.snapshot(),
            };
            (StatusCode::OK, Json(view)).into_response()
        }
        None => session_not_found(session_id),
    }
}

pub(crate) async fn candidate_change_handler(
    State(sessions): State<Arc<SessionRegistry>>,
    Path(session_id): Path<Uuid>,
    Json(change): Json<CandidateChange>,
) -> Response {
    let Some(controller) = sessions.get(&session_id) else {
        return session_not_found(session_id);
    };

    controller.on_candidate_change(change.email);
    let view = SessionView {
        session_id,
        state: controller.snapshot(),
    };
    (StatusCode::OK, Json(view)).into_response()
}

pub(crate) async fn submit_handler(
    State(sessions): State<Arc<SessionRegistry>>,
    Path(session_id): Path<Uuid>,
) -> Response {
    let Some(controller) = sessions.get(&session_id) else {
        return session_not_found(session_id);
    };

    let result = controller.submit_current().await;
    let status = match &result {
        SubmissionResult::Succeeded => StatusCode::CREATED,
        SubmissionResult::Failed { .. } => StatusCode::UNPROCESSABLE_ENTITY,
        SubmissionResult::Skipped {
            reason: SkipReason::InvalidEmail,
        } => StatusCode::BAD_REQUEST,
        SubmissionResult::Skipped { .. } => StatusCode::CONFLICT,
    };

    let view = SubmitView {
        session_id,
        result,
        state: controller.snapshot(),
    };
    (status, Json(view)).into_response()
}

pub(crate) async fn clear_error_handler(
    State(sessions): State<Arc<SessionRegistry>>,
    Path(session_id): Path<Uuid>,
) -> Response {
    let Some(controller) = sessions.get(&session_id) else {
        return session_not_found(session_id);
    };

    controller.clear_error();
    let view = SessionView {
        session_id,
        state: controller.snapshot(),
    };
    (StatusCode::OK, Json(view)).into_response()
}

fn session_not_found(session_id: Uuid) -> Response {
    let payload = json!({
        "error": "session not found",
        "session_id": session_id,
    });
    (StatusCode::NOT_FOUND, Json(payload)).into_response()
}
