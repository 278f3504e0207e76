//! meshcalc-services — worker-side command handlers.
//!
//! Workers expose their commands through a [`HandlerRegistry`]; the
//! handlers here are pure functions of their request, so invocations are
//! independent and free of concurrency hazards.
//!
//! Command surface:
//!
//! - `calculate-sum(a, b)` / `calculate-subtract(a, b)` →
//!   `[impl_tag, result]`
//! - `linalg-matmul(shapeA, bytesA, shapeB, bytesB)` →
//!   `[shape, bytes]` or a structured shape-mismatch error
//!
//! The first response frame carries an implementation tag, diagnostic
//! only, so the orchestrator log shows which implementation answered.
//!
//! [`HandlerRegistry`]: meshcalc_rpc::HandlerRegistry

pub mod calc;
pub mod linalg;

pub use calc::calc_registry;
pub use linalg::{linalg_registry, matmul, LinalgError};
