//! Seat lifecycle engine facade: the two concurrency paths (§4.4, §4.5),
//! their shared worker bookkeeping (§5), and the reclaimer (§4.7).
//!
//! [`ImmediateEngine`] (C5) is the v1 lock-based path; [`queued`] and
//! [`WorkerRegistry`] (C6) are the v2 queue-based path; [`reclaimer`] (C8)
//! is the background hold-expiry sweep shared by both.

pub mod immediate;
pub mod queued;
pub mod reclaimer;
pub mod worker_registry;

pub use immediate::ImmediateEngine;
pub use worker_registry::WorkerRegistry;
