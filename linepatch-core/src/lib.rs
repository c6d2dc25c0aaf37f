//! Embeddable core library for linepatch.
//!
//! Applies line-addressed patch batches to a project tree and reports the outcome,
//! without any CLI concerns.
//!
//! # Port traits
//!
//! All side effects are abstracted behind port traits in [`ports`]:
//! - [`SchemaProvider`](ports::SchemaProvider): load the optional task allow-list
//! - [`EventSink`](ports::EventSink): deliver lifecycle events
//! - [`TypeChecker`](ports::TypeChecker): check a modified file
//! - [`WritePort`](ports::WritePort): write files
//! - [`Reporter`](ports::Reporter): observe progress
//!
//! The [`adapters`] module provides filesystem, webhook, command and tracing implementations.
//!
//! # Entry point
//!
//! [`Orchestrator`](pipeline::Orchestrator): `validate` a batch, or `apply_batch` it.

pub mod adapters;
pub mod error;
pub mod notifier;
pub mod pipeline;
pub mod ports;
pub mod process;
pub mod schema;
pub mod settings;

pub use error::{PatchError, ValidationError, Violation};
pub use pipeline::Orchestrator;
