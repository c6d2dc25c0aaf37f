//! Shared DTOs (schemas-as-code) for the linepatch workspace.
//!
//! # Design constraints
//! - Batch documents and task schemas are authored by other tools; parse them tolerantly
//!   through [`wire`] and hand the rest of the workspace fully validated values.
//! - Results and events are serialized for external consumers.
//! - Prefer adding optional fields over changing semantics.

pub mod batch;
pub mod event;
pub mod ops;
pub mod result;
pub mod task_schema;
pub mod wire;

/// Schema identifiers.
pub mod schema {
    pub const LINEPATCH_BATCH_V1: &str = "linepatch.batch.v1";
    pub const LINEPATCH_RESULT_V1: &str = "linepatch.result.v1";
}
