//! `buildgate-gateway` — HTTP front door for the delayed-trigger scheduler.
//!
//! Validates schedule requests and status queries, then delegates to the
//! state machine in `buildgate-scheduler`. Nothing from the asynchronous
//! execution path is surfaced here; failures are observable only through
//! the status endpoint.

pub mod app;
pub mod auth;
pub mod http;
