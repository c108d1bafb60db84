//! 计划类工具：create_plan / find_similar_plans / summarize_plan
//!
//! 所有领域错误在工具内部转为 "⚠️ ..." 字符串负载返回，不向上抛出。

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;

use crate::store::{PlannerStore, StoreError, DEFAULT_SIMILARITY_THRESHOLD};
use crate::tools::Tool;

fn arg_str<'a>(args: &'a Value, key: &str) -> Option<&'a str> {
    args.get(key).and_then(|v| v.as_str())
}

/// 新建计划
pub struct CreatePlanTool {
    store: Arc<PlannerStore>,
}

impl CreatePlanTool {
    pub fn new(store: Arc<PlannerStore>) -> Self {
        Self { store }
    }
}

#[async_trait]
impl Tool for CreatePlanTool {
    fn name(&self) -> &str {
        "create_plan"
    }

    fn description(&self) -> &str {
        "Create a new plan with the given goal, deadline, priority and milestones."
    }

    fn parameters_schema(&self) -> Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "goal": { "type": "string" },
                "deadline": { "type": "string", "description": "ISO date, e.g. 2025-06-01" },
                "priority": { "type": "string", "enum": ["high", "medium", "low"] },
                "milestones": { "type": "array", "items": { "type": "string" } }
            },
            "required": ["goal", "deadline", "priority", "milestones"]
        })
    }

    async fn execute(&self, args: Value) -> Result<String, String> {
        let Some(goal) = arg_str(&args, "goal") else {
            return Ok("⚠️ Error creating plan: missing required argument 'goal'".to_string());
        };
        let deadline = arg_str(&args, "deadline").unwrap_or("");
        let priority = arg_str(&args, "priority").unwrap_or("medium");
        let milestones: Vec<String> = args
            .get("milestones")
            .and_then(|v| v.as_array())
            .map(|items| {
                items
                    .iter()
                    .filter_map(|m| m.as_str().map(String::from))
                    .collect()
            })
            .unwrap_or_default();

        match self.store.create_plan(goal, deadline, priority, &milestones) {
            Ok(plan) => Ok(format!("✅ Plan created: {} (id={})", plan.goal, plan.id)),
            Err(e) => Ok(format!("⚠️ Error creating plan: {e}")),
        }
    }
}

/// 按目标文本模糊查重
pub struct FindSimilarPlansTool {
    store: Arc<PlannerStore>,
}

impl FindSimilarPlansTool {
    pub fn new(store: Arc<PlannerStore>) -> Self {
        Self { store }
    }
}

#[async_trait]
impl Tool for FindSimilarPlansTool {
    fn name(&self) -> &str {
        "find_similar_plans"
    }

    fn description(&self) -> &str {
        "Return plans whose goal is fuzzy-matched to the given goal (similarity >= threshold)."
    }

    fn parameters_schema(&self) -> Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "goal": { "type": "string" },
                "threshold": { "type": "number", "minimum": 0.0, "maximum": 1.0 }
            },
            "required": ["goal"]
        })
    }

    async fn execute(&self, args: Value) -> Result<String, String> {
        let Some(goal) = arg_str(&args, "goal") else {
            return Ok("⚠️ Error finding plans: missing required argument 'goal'".to_string());
        };
        let threshold = args
            .get("threshold")
            .and_then(|v| v.as_f64())
            .unwrap_or(DEFAULT_SIMILARITY_THRESHOLD);

        match self.store.find_similar_plans(goal, threshold) {
            Ok(hits) if hits.is_empty() => Ok("No similar plans found.".to_string()),
            Ok(hits) => {
                let lines: Vec<String> = hits
                    .iter()
                    .map(|p| format!("- {} (id={}, deadline={})", p.goal, p.id, p.deadline))
                    .collect();
                Ok(format!("Similar plans:\n{}", lines.join("\n")))
            }
            Err(e) => Ok(format!("⚠️ Error finding plans: {e}")),
        }
    }
}

/// 按 id 摘要计划
pub struct SummarizePlanTool {
    store: Arc<PlannerStore>,
}

impl SummarizePlanTool {
    pub fn new(store: Arc<PlannerStore>) -> Self {
        Self { store }
    }
}

#[async_trait]
impl Tool for SummarizePlanTool {
    fn name(&self) -> &str {
        "summarize_plan"
    }

    fn description(&self) -> &str {
        "Generate a human-readable summary of the requested plan ID."
    }

    fn parameters_schema(&self) -> Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "plan_id": { "type": "string" }
            },
            "required": ["plan_id"]
        })
    }

    async fn execute(&self, args: Value) -> Result<String, String> {
        let Some(plan_id) = arg_str(&args, "plan_id") else {
            return Ok("⚠️ Error summarizing plan: missing required argument 'plan_id'".to_string());
        };
        match self.store.summarize_plan(plan_id) {
            Ok(summary) => Ok(summary),
            Err(StoreError::NotFound { .. }) => {
                Ok(format!("⚠️ Plan with ID {plan_id} not found."))
            }
            Err(e) => Ok(format!("⚠️ Error summarizing plan: {e}")),
        }
    }
}
