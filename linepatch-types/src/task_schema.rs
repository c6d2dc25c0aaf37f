//! Per-task allow-lists (`.mission_control/tasks.json`).

use serde::{Deserialize, Deserializer, Serialize};

pub const DEFAULT_TASK_SCHEMA_PATH: &str = ".mission_control/tasks.json";

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskSchema {
    #[serde(default)]
    pub tasks: Vec<TaskDef>,
}

impl TaskSchema {
    /// Find a task by id. Ids compare by their string form, so `1` and `"1"` are the same task.
    pub fn task(&self, id: &str) -> Option<&TaskDef> {
        self.tasks.iter().find(|t| t.id == id)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskDef {
    #[serde(deserialize_with = "string_or_number")]
    pub id: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,

    /// Allowed target files. Empty means unrestricted.
    #[serde(default)]
    pub files: Vec<String>,

    /// Allowed op spellings (`replace-block`, ...). Empty means unrestricted.
    ///
    /// Kept as strings: schemas are authored elsewhere and may name ops this tool does not know.
    #[serde(default)]
    pub allowed_operations: Vec<String>,
}

/// Task ids are written by hand in JSON, as strings or numbers.
#[derive(Deserialize)]
#[serde(untagged)]
enum LooseId {
    Str(String),
    Int(i64),
    Float(f64),
}

impl From<LooseId> for String {
    fn from(id: LooseId) -> Self {
        match id {
            LooseId::Str(s) => s,
            LooseId::Int(n) => n.to_string(),
            LooseId::Float(n) => n.to_string(),
        }
    }
}

fn string_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    LooseId::deserialize(deserializer).map(String::from)
}

pub(crate) fn opt_string_or_number<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<LooseId>::deserialize(deserializer)?.map(String::from))
}
