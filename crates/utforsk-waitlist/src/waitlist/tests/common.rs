use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use axum::body::Body;
use axum::response::Response;
use serde_json::Value;
use tokio::sync::Notify;

use crate::waitlist::gateway::{GatewayKind, InsertOutcome, WaitlistGateway};
use crate::waitlist::{waitlist_router, SessionRegistry, WaitlistController};

/// Replays queued outcomes, repeating the last one once the queue runs dry.
#[derive(Debug)]
pub(super) struct ScriptedGateway {
    outcomes: Mutex<VecDeque<InsertOutcome>>,
    last: Mutex<InsertOutcome>,
    emails: Mutex<Vec<String>>,
    calls: AtomicUsize,
}

impl ScriptedGateway {
    pub(super) fn new(outcomes: impl IntoIterator<Item = InsertOutcome>) -> Self {
        Self {
            outcomes: Mutex::new(outcomes.into_iter().collect()),
            last: Mutex::new(InsertOutcome::Success),
            emails: Mutex::new(Vec::new()),
            calls: AtomicUsize::new(0),
        }
    }

    pub(super) fn always(outcome: InsertOutcome) -> Self {
        Self::new([outcome])
    }

    pub(super) fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub(super) fn emails(&self) -> Vec<String> {
        self.emails.lock().expect("emails mutex").clone()
    }
}

#[async_trait]
impl WaitlistGateway for ScriptedGateway {
    async fn insert(&self, email: &str) -> InsertOutcome {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.emails.lock().expect("emails mutex").push(email.to_string());

        let mut last = self.last.lock().expect("last mutex");
        if let Some(next) = self.outcomes.lock().expect("outcomes mutex").pop_front() {
            *last = next;
        }
        last.clone()
    }

    fn kind(&self) -> GatewayKind {
        GatewayKind::Simulated
    }
}

/// Parks every insert until the test releases it.
#[derive(Debug)]
pub(super) struct GatedGateway {
    outcome: InsertOutcome,
    entered: Notify,
    release: Notify,
    calls: AtomicUsize,
}

impl GatedGateway {
    pub(super) fn new(outcome: InsertOutcome) -> Self {
        Self {
            outcome,
            entered: Notify::new(),
            release: Notify::new(),
            calls: AtomicUsize::new(0),
        }
    }

    pub(super) async fn wait_until_entered(&self) {
        tokio::time::timeout(Duration::from_secs(5), self.entered.notified())
            .await
            .expect("gateway was called");
    }

    pub(super) fn release(&self) {
        self.release.notify_one();
    }

    pub(super) fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl WaitlistGateway for GatedGateway {
    async fn insert(&self, _email: &str) -> InsertOutcome {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.entered.notify_one();
        self.release.notified().await;
        self.outcome.clone()
    }

    fn kind(&self) -> GatewayKind {
        GatewayKind::Remote
    }
}

pub(super) fn controller_with(gateway: Arc<dyn WaitlistGateway>) -> Arc<WaitlistController> {
    Arc::new(WaitlistController::new(gateway))
}

/// Waits for a detached insert to hand its outcome back to the controller.
pub(super) async fn wait_until_settled(controller: &WaitlistController) {
    tokio::time::timeout(Duration::from_secs(5), async {
        while controller.is_submitting() {
            tokio::task::yield_now().await;
        }
    })
    .await
    .expect("insert settled");
}

pub(super) fn registry_with(gateway: Arc<dyn WaitlistGateway>) -> Arc<SessionRegistry> {
    Arc::new(SessionRegistry::new(gateway, Duration::from_secs(3600)))
}

pub(super) fn router_with(
    gateway: Arc<dyn WaitlistGateway>,
) -> (axum::Router, Arc<SessionRegistry>) {
    let registry = registry_with(gateway);
    (waitlist_router(registry.clone()), registry)
}

pub(super) async fn read_body(response: Response) -> String {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("body readable");
    String::from_utf8(bytes.to_vec()).expect("utf-8 body")
}

pub(super) async fn read_json_body(response: Response) -> Value {
    let body = read_body(response).await;
    serde_json::from_str(&body).expect("json body")
}

pub(super) fn json_request(
    method: &str,
    uri: &str,
    payload: Option<Value>,
) -> axum::http::Request<Body> {
    let builder = axum::http::Request::builder().method(method).uri(uri);
    match payload {
        Some(payload) => builder
            .header(axum::http::header::CONTENT_TYPE, "application/json")
            .body(Body::from(payload.to_string()))
            .expect("request builds"),
        None => builder.body(Body::empty()).expect("request builds"),
    }
}
