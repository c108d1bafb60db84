//! 计划 / 里程碑 / 任务记录
//!
//! 与磁盘上 plans.json / tasks.json 的条目一一对应，写入前按 schemas/ 下的 JSON Schema 校验。

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// 生成无连字符的十六进制 id
pub fn new_id() -> String {
    Uuid::new_v4().simple().to_string()
}

/// 一条任务记录，可选挂接到计划与里程碑
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct TaskRecord {
    pub id: String,
    pub title: String,
    pub completed: bool,
    pub plan_id: Option<String>,
    pub milestone_id: Option<String>,
    pub priority: Option<String>,
    pub deadline: Option<String>,
    /// 预估耗时（小时）
    pub estimated_time: Option<u32>,
    pub created_at: DateTime<Utc>,
    pub complete_at: Option<DateTime<Utc>>,
}

/// 计划内的一个里程碑；完成态由其全部任务的完成态推导
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct MilestoneRecord {
    pub id: String,
    pub title: String,
    pub task_ids: Vec<String>,
    pub completed: bool,
}

impl MilestoneRecord {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            id: new_id(),
            title: title.into(),
            task_ids: Vec::new(),
            completed: false,
        }
    }
}

/// 一条计划记录
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct PlanRecord {
    pub id: String,
    pub goal: String,
    pub deadline: String,
    pub priority: String,
    pub status: Option<String>,
    pub milestones: Vec<MilestoneRecord>,
    /// 直接挂接到计划的任务 id 列表
    pub tasks: Vec<String>,
    pub created_at: DateTime<Utc>,
    /// 0..=100，completed 里程碑占比取整
    pub progress: u32,
}
