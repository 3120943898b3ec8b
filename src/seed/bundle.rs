//! The bundled sample dataset.

use serde::{Deserialize, Serialize};
use serde_json::Value;

const KITCHENSINK: &str = include_str!("../../resources/kitchensink.json");
const SUB_FLOW_1: &str = include_str!("../../resources/sub_flow_1.json");

/// Number of generated `task_<n>` definitions.
pub const SAMPLE_TASK_COUNT: usize = 40;

/// Task definition as accepted by the metadata API.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskDef {
    pub name: String,
    pub description: String,
    pub retry_count: u32,
    pub timeout_seconds: u64,
}

impl TaskDef {
    pub fn new(name: &str, retry_count: u32, timeout_seconds: u64) -> Self {
        Self {
            name: name.to_string(),
            description: name.to_string(),
            retry_count,
            timeout_seconds,
        }
    }
}

/// Task definitions plus the workflow definitions that use them.
#[derive(Debug, Clone)]
pub struct SampleBundle {
    pub task_defs: Vec<TaskDef>,
    /// Posted as-is, one request each.
    pub workflows: Vec<Value>,
}

impl SampleBundle {
    /// `task_0..task_39`, `search_elasticsearch`, `kitchensink` and `sub_flow_1`.
    pub fn kitchensink() -> Result<Self, serde_json::Error> {
        let mut task_defs: Vec<TaskDef> = (0..SAMPLE_TASK_COUNT)
            .map(|i| TaskDef::new(&format!("task_{}", i), 1, 0))
            .collect();
        task_defs.push(TaskDef::new("search_elasticsearch", 1, 0));

        Ok(Self {
            task_defs,
            workflows: vec![serde_json::from_str(KITCHENSINK)?, serde_json::from_str(SUB_FLOW_1)?],
        })
    }
}
