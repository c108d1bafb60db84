//! 工具箱：生产力工具集（计划 / 任务 / 日程）与执行器

pub mod executor;
pub mod plan;
pub mod registry;
pub mod schedule;
pub mod schema;
pub mod task;

pub use executor::ToolExecutor;
pub use plan::{CreatePlanTool, FindSimilarPlansTool, SummarizePlanTool};
pub use registry::{Tool, ToolRegistry};
pub use schedule::ScheduleDayTool;
pub use schema::tool_call_schema_json;
pub use task::{CompleteTaskTool, CreateTaskTool, ListTasksTool};

use std::sync::Arc;

use crate::store::PlannerStore;

/// 固定的生产力工具注册表（共 7 个工具）
pub fn productivity_tools(store: Arc<PlannerStore>) -> ToolRegistry {
    let mut tools = ToolRegistry::new();
    tools.register(CreatePlanTool::new(store.clone()));
    tools.register(FindSimilarPlansTool::new(store.clone()));
    tools.register(CreateTaskTool::new(store.clone()));
    tools.register(CompleteTaskTool::new(store.clone()));
    tools.register(ListTasksTool::new(store.clone()));
    tools.register(ScheduleDayTool::new(store.clone()));
    tools.register(SummarizePlanTool::new(store));
    tools
}
