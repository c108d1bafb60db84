//! 日程工具：schedule_day

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;

use crate::store::PlannerStore;
use crate::tools::Tool;

const DEFAULT_AVAILABLE_HOURS: u32 = 8;

/// 为未完成任务编排一天的整点时段
pub struct ScheduleDayTool {
    store: Arc<PlannerStore>,
}

impl ScheduleDayTool {
    pub fn new(store: Arc<PlannerStore>) -> Self {
        Self { store }
    }
}

#[async_trait]
impl Tool for ScheduleDayTool {
    fn name(&self) -> &str {
        "schedule_day"
    }

    fn description(&self) -> &str {
        "Build a simple hourly schedule for the next available_hours (default 8)."
    }

    fn parameters_schema(&self) -> Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "available_hours": { "type": "integer", "minimum": 1 }
            },
            "required": []
        })
    }

    async fn execute(&self, args: Value) -> Result<String, String> {
        let available_hours = args
            .get("available_hours")
            .and_then(|v| v.as_u64())
            .map(|v| v as u32)
            .unwrap_or(DEFAULT_AVAILABLE_HOURS);

        match self.store.schedule_day(available_hours) {
            Ok(slots) if slots.is_empty() => Ok("Nothing to schedule — no open tasks.".to_string()),
            Ok(slots) => {
                let lines: Vec<String> = slots
                    .iter()
                    .map(|s| format!("{}: {}", s.window, s.title))
                    .collect();
                Ok(format!("Today's schedule:\n{}", lines.join("\n")))
            }
            Err(e) => Ok(format!("⚠️ Error building schedule: {e}")),
        }
    }
}
