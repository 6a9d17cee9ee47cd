//! Waitlist sign-up flow behind the Utforsk landing page.
//!
//! The [`waitlist`] module holds the submission controller and the backend
//! gateways it talks to; [`config`], [`telemetry`], and [`error`] carry the
//! service plumbing shared with the HTTP binary.

pub mod config;
pub mod error;
pub mod telemetry;
pub mod waitlist;
