//! Sign-up rules and the shape of the hosted `waitlist` table.
//!
//! The backend owns [`WaitlistEntry`] rows and enforces uniqueness on
//! `email`. This service only writes [`NewWaitlistEntry`] payloads and never
//! reads rows back; [`WaitlistEntry`] and [`WaitlistStatus`] describe the
//! table for callers that query it directly.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Shown when the address is already on the list.
pub const DUPLICATE_EMAIL_MESSAGE: &str =
    "Denne e-postadressen er allerede registrert på ventelisten.";

/// Shown when the backend fails without telling us why.
pub const GENERIC_FAILURE_MESSAGE: &str = "En feil oppstod. Prøv igjen senere.";

/// Minimal client-side check: non-empty and containing `@`.
pub fn is_submittable(candidate: &str) -> bool {
    !candidate.is_empty() && candidate.contains('@')
}

/// Row shape of the hosted `waitlist` table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WaitlistEntry {
    pub id: Uuid,
    pub email: String,
    pub created_at: DateTime<Utc>,
    pub status: WaitlistStatus,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WaitlistStatus {
    Pending,
    Invited,
    #[serde(other)]
    Unknown,
}

/// Insert payload; `id`, `created_at`, and `status` use column defaults.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NewWaitlistEntry<'a> {
    pub email: &'a str,
}
