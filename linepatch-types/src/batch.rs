use crate::ops::PatchOperation;
use serde::{Deserialize, Serialize};

pub const DEFAULT_REQUESTER: &str = "agent";

/// An ordered batch of patch operations.
///
/// Order is significant: later operations observe the effects of earlier ones,
/// including edits to the same file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PatchBatch {
    /// Caller-supplied order id. The orchestrator generates one when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub order_id: Option<String>,
    pub requester: String,
    #[serde(default)]
    pub reason: String,
    #[serde(default)]
    pub branch: String,
    #[serde(default)]
    pub patches: Vec<PatchOperation>,
}

impl PatchBatch {
    pub fn new(patches: Vec<PatchOperation>) -> Self {
        Self {
            order_id: None,
            requester: DEFAULT_REQUESTER.to_string(),
            reason: String::new(),
            branch: String::new(),
            patches,
        }
    }

    pub fn with_order_id(mut self, order_id: impl Into<String>) -> Self {
        self.order_id = Some(order_id.into());
        self
    }

    pub fn len(&self) -> usize {
        self.patches.len()
    }

    pub fn is_empty(&self) -> bool {
        self.patches.is_empty()
    }
}
