//! `buildgate-scheduler` — single-slot delayed-trigger state machine.
//!
//! # Overview
//!
//! Each scheduler identity owns at most one pending execution, persisted as
//! a [`types::SchedulingRecord`] in SQLite. A schedule request arms the slot
//! for `now + delay`; repeated requests coalesce into the latest one. The
//! [`engine::SchedulerEngine`] polls the store every second and fires any
//! schedule whose due time has arrived, then applies the outcome:
//!
//! | outcome | effect |
//! |---------|--------|
//! | success | slot cleared, failure streak reset |
//! | failure | streak +1, re-armed at 60 s / 120 s / 300 s backoff |
//! | no target configured | recorded as a failure, not re-armed |
//!
//! After the third consecutive failure retries continue at the 300 s cadence
//! until a success or a superseding request — there is no hard retry cap.

pub mod db;
pub mod engine;
pub mod error;
pub mod machine;
pub mod store;
pub mod trigger;
pub mod types;

pub use engine::SchedulerEngine;
pub use error::{Result, SchedulerError};
pub use store::ScheduleStore;
pub use trigger::{HttpTrigger, TriggerClient, TriggerError};
pub use types::{Outcome, QueueAck, SchedulingRecord, StatusReport};
