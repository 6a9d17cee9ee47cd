//! Waitlist sign-up: the per-session submission controller, the gateways it
//! writes through, and the HTTP surface that renders it.

pub mod controller;
pub mod domain;
pub mod gateway;
pub mod page;
pub mod router;
pub mod session;
pub mod supabase;

#[cfg(test)]
mod tests;

pub use controller::{
    FailureKind, SkipReason, SubmissionPhase, SubmissionResult, SubmissionSnapshot,
    WaitlistController,
};
pub use domain::{
    is_submittable, NewWaitlistEntry, WaitlistEntry, WaitlistStatus, DUPLICATE_EMAIL_MESSAGE,
    GENERIC_FAILURE_MESSAGE,
};
pub use gateway::{
    gateway_from_config, GatewayKind, InsertOutcome, SimulatedGateway, WaitlistGateway,
};
pub use router::waitlist_router;
pub use session::SessionRegistry;
pub use supabase::{GatewayError, SupabaseGateway, UNIQUE_VIOLATION_CODE};
