//! Retry orchestration
//!
//! The single entry point for sending a request: gate pre-check, request
//! counting, send, fixed-schedule retries and post-send quota bookkeeping.
//!
//! # Backoff
//!
//! Retries wait on a fixed, non-jittered schedule (4s, 8s, 16s by default).
//! Waits are task-local sleeps; they hold no lock and never stall other
//! requests sharing the connection pool.

mod orchestrator;
mod schedule;

pub use orchestrator::Orchestrator;
pub use schedule::BackoffSchedule;

#[cfg(test)]
mod tests;
