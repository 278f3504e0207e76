//! meshcalc-orchestrator — the periodic demo driver.
//!
//! Two independently-ticking loops run against whatever workers are
//! currently registered: one issues scalar arithmetic calls, the other
//! exercises matrix multiplication in three flavours (constant valid,
//! constant invalid, random valid). Every round follows the same policy:
//! attempt, log, continue — a failed round never aborts the next one.

pub mod scheduler;

pub use scheduler::Scheduler;
