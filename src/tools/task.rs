//! 任务类工具：create_task / complete_task / list_tasks

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;

use crate::store::{PlannerStore, StoreError};
use crate::tools::Tool;

fn arg_str<'a>(args: &'a Value, key: &str) -> Option<&'a str> {
    args.get(key).and_then(|v| v.as_str())
}

/// 新建任务，可选挂接到计划 / 里程碑
pub struct CreateTaskTool {
    store: Arc<PlannerStore>,
}

impl CreateTaskTool {
    pub fn new(store: Arc<PlannerStore>) -> Self {
        Self { store }
    }
}

#[async_trait]
impl Tool for CreateTaskTool {
    fn name(&self) -> &str {
        "create_task"
    }

    fn description(&self) -> &str {
        "Create a task, optionally linked to a plan and/or milestone."
    }

    fn parameters_schema(&self) -> Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "title": { "type": "string" },
                "priority": { "type": "string", "enum": ["high", "medium", "low"] },
                "deadline": { "type": "string" },
                "estimated_time": { "type": "integer", "description": "estimated hours" },
                "plan_id": { "type": "string" },
                "milestone_id": { "type": "string" }
            },
            "required": ["title"]
        })
    }

    async fn execute(&self, args: Value) -> Result<String, String> {
        let Some(title) = arg_str(&args, "title") else {
            return Ok("⚠️ Error creating task: missing required argument 'title'".to_string());
        };
        let estimated_time = args
            .get("estimated_time")
            .and_then(|v| v.as_u64())
            .map(|v| v as u32);

        match self.store.create_task(
            title,
            arg_str(&args, "priority"),
            arg_str(&args, "deadline"),
            estimated_time,
            arg_str(&args, "plan_id"),
            arg_str(&args, "milestone_id"),
        ) {
            Ok(task) => Ok(format!("✅ Task created: {} (id={})", task.title, task.id)),
            Err(e) => Ok(format!("⚠️ Error creating task: {e}")),
        }
    }
}

/// 标记任务完成
pub struct CompleteTaskTool {
    store: Arc<PlannerStore>,
}

impl CompleteTaskTool {
    pub fn new(store: Arc<PlannerStore>) -> Self {
        Self { store }
    }
}

#[async_trait]
impl Tool for CompleteTaskTool {
    fn name(&self) -> &str {
        "complete_task"
    }

    fn description(&self) -> &str {
        "Mark the specified task as complete."
    }

    fn parameters_schema(&self) -> Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "task_id": { "type": "string" }
            },
            "required": ["task_id"]
        })
    }

    async fn execute(&self, args: Value) -> Result<String, String> {
        let Some(task_id) = arg_str(&args, "task_id") else {
            return Ok("⚠️ Error completing task: missing required argument 'task_id'".to_string());
        };
        match self.store.complete_task(task_id) {
            Ok(task) => Ok(format!(
                "✅ Task '{}' marked complete at {}.",
                task.title,
                task.complete_at
                    .map(|t| t.to_rfc3339())
                    .unwrap_or_default()
            )),
            Err(StoreError::NotFound { .. }) => {
                Ok(format!("⚠️ Task with ID {task_id} not found."))
            }
            Err(e) => Ok(format!("⚠️ Error completing task: {e}")),
        }
    }
}

/// 列出全部任务
pub struct ListTasksTool {
    store: Arc<PlannerStore>,
}

impl ListTasksTool {
    pub fn new(store: Arc<PlannerStore>) -> Self {
        Self { store }
    }
}

#[async_trait]
impl Tool for ListTasksTool {
    fn name(&self) -> &str {
        "list_tasks"
    }

    fn description(&self) -> &str {
        "Return all tasks stored in the system."
    }

    async fn execute(&self, _args: Value) -> Result<String, String> {
        match self.store.list_tasks() {
            Ok(tasks) if tasks.is_empty() => Ok("No tasks yet.".to_string()),
            Ok(tasks) => {
                let lines: Vec<String> = tasks
                    .iter()
                    .map(|t| {
                        format!(
                            "- [{}] {} (id={}{})",
                            if t.completed { "x" } else { " " },
                            t.title,
                            t.id,
                            t.deadline
                                .as_deref()
                                .map(|d| format!(", due {d}"))
                                .unwrap_or_default()
                        )
                    })
                    .collect();
                Ok(lines.join("\n"))
            }
            Err(e) => Ok(format!("⚠️ Error listing tasks: {e}")),
        }
    }
}
