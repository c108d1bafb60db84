//! 计划 / 任务存储
//!
//! 两个扁平 JSON 文件（plans.json / tasks.json）上的全部领域操作：
//! 计划与任务的增删改查、里程碑完成态与计划进度的重算、按目标文本的模糊查重、
//! 日程编排与计划摘要。写入前按 JSON Schema 校验记录。
//!
//! 跨文件更新（如建任务后挂接计划）不是一个原子单元：两步之间崩溃会留下孤儿任务。

use std::path::Path;
use std::time::Duration;

use chrono::{Duration as ChronoDuration, Timelike, Utc};
use jsonschema::Validator;

use crate::store::json_file::LockedJsonFile;
use crate::store::records::{new_id, MilestoneRecord, PlanRecord, TaskRecord};
use crate::store::StoreError;

/// 目标文本查重的默认相似度阈值
pub const DEFAULT_SIMILARITY_THRESHOLD: f64 = 0.8;

const PLAN_SCHEMA: &str = include_str!("../../schemas/plan_schema.json");
const TASK_SCHEMA: &str = include_str!("../../schemas/task_schema.json");

/// 两个字符串的大小写无关相似度（0..=1）
pub fn string_similarity(a: &str, b: &str) -> f64 {
    strsim::normalized_levenshtein(&a.to_lowercase(), &b.to_lowercase())
}

/// 排序用的优先级序：high < medium < low < 其他
fn priority_rank(priority: Option<&str>) -> u8 {
    match priority {
        Some("high") => 0,
        Some("medium") => 1,
        Some("low") => 2,
        _ => 3,
    }
}

/// 日程中的一个整点时段
#[derive(Clone, Debug)]
pub struct ScheduleSlot {
    /// 如 "09:00 - 10:00"
    pub window: String,
    pub title: String,
}

/// 计划 / 任务存储：持有两个带锁 JSON 文件与编译好的校验器
pub struct PlannerStore {
    plans: LockedJsonFile,
    tasks: LockedJsonFile,
    plan_validator: Validator,
    task_validator: Validator,
}

impl PlannerStore {
    /// 打开 data_dir 下的 plans.json / tasks.json；Schema 编译失败视为构建错误
    pub fn open(data_dir: impl AsRef<Path>, lock_timeout: Duration) -> Result<Self, StoreError> {
        let dir = data_dir.as_ref();
        let plan_schema: serde_json::Value = serde_json::from_str(PLAN_SCHEMA)?;
        let task_schema: serde_json::Value = serde_json::from_str(TASK_SCHEMA)?;
        Ok(Self {
            plans: LockedJsonFile::new(dir.join("plans.json"), lock_timeout),
            tasks: LockedJsonFile::new(dir.join("tasks.json"), lock_timeout),
            plan_validator: jsonschema::validator_for(&plan_schema)
                .map_err(|e| StoreError::SchemaViolation(e.to_string()))?,
            task_validator: jsonschema::validator_for(&task_schema)
                .map_err(|e| StoreError::SchemaViolation(e.to_string()))?,
        })
    }

    fn validate(validator: &Validator, instance: &serde_json::Value) -> Result<(), StoreError> {
        let errors: Vec<String> = validator
            .iter_errors(instance)
            .map(|e| e.to_string())
            .collect();
        if errors.is_empty() {
            Ok(())
        } else {
            Err(StoreError::SchemaViolation(errors.join("; ")))
        }
    }

    // === 计划 ===

    pub fn list_plans(&self) -> Result<Vec<PlanRecord>, StoreError> {
        self.plans.load()
    }

    /// 新建计划：里程碑由标题列表生成，任务列表为空，进度为 0。查重由调用方负责。
    pub fn create_plan(
        &self,
        goal: &str,
        deadline: &str,
        priority: &str,
        milestones: &[String],
    ) -> Result<PlanRecord, StoreError> {
        let plan = PlanRecord {
            id: new_id(),
            goal: goal.to_string(),
            deadline: deadline.to_string(),
            priority: priority.to_string(),
            status: Some("in_progress".to_string()),
            milestones: milestones
                .iter()
                .map(|title| MilestoneRecord::new(title.clone()))
                .collect(),
            tasks: Vec::new(),
            created_at: Utc::now(),
            progress: 0,
        };
        Self::validate(&self.plan_validator, &serde_json::to_value(&plan)?)?;

        let mut plans = self.list_plans()?;
        plans.push(plan.clone());
        self.plans.save(&plans)?;
        Ok(plan)
    }

    /// 返回目标文本与 goal 相似度 ≥ threshold 的已存计划
    pub fn find_similar_plans(
        &self,
        goal: &str,
        threshold: f64,
    ) -> Result<Vec<PlanRecord>, StoreError> {
        Ok(self
            .list_plans()?
            .into_iter()
            .filter(|p| string_similarity(goal, &p.goal) >= threshold)
            .collect())
    }

    /// 按 id 摘要计划：目标、截止、优先级、里程碑标题
    pub fn summarize_plan(&self, plan_id: &str) -> Result<String, StoreError> {
        let plans = self.list_plans()?;
        let plan = plans
            .iter()
            .find(|p| p.id == plan_id)
            .ok_or_else(|| StoreError::NotFound {
                kind: "Plan",
                id: plan_id.to_string(),
            })?;
        let milestones = plan
            .milestones
            .iter()
            .map(|m| m.title.as_str())
            .collect::<Vec<_>>()
            .join(", ");
        Ok(format!(
            "Goal: {}\nDeadline: {}\nPriority: {}\nProgress: {}%\nMilestones: {}",
            plan.goal, plan.deadline, plan.priority, plan.progress, milestones
        ))
    }

    // === 任务 ===

    pub fn list_tasks(&self) -> Result<Vec<TaskRecord>, StoreError> {
        self.tasks.load()
    }

    /// 新建任务，可选挂接到计划与里程碑。挂接在任务写盘之后进行，两步不构成事务。
    pub fn create_task(
        &self,
        title: &str,
        priority: Option<&str>,
        deadline: Option<&str>,
        estimated_time: Option<u32>,
        plan_id: Option<&str>,
        milestone_id: Option<&str>,
    ) -> Result<TaskRecord, StoreError> {
        let task = TaskRecord {
            id: new_id(),
            title: title.to_string(),
            completed: false,
            plan_id: plan_id.map(String::from),
            milestone_id: milestone_id.map(String::from),
            priority: priority.map(String::from),
            deadline: deadline.map(String::from),
            estimated_time,
            created_at: Utc::now(),
            complete_at: None,
        };
        Self::validate(&self.task_validator, &serde_json::to_value(&task)?)?;

        let mut tasks = self.list_tasks()?;
        tasks.push(task.clone());
        self.tasks.save(&tasks)?;

        if let Some(pid) = plan_id {
            self.attach_task_to_plan(pid, &task.id)?;
            if let Some(mid) = milestone_id {
                self.attach_task_to_milestone(pid, mid, &task.id)?;
            }
        }
        Ok(task)
    }

    fn attach_task_to_plan(&self, plan_id: &str, task_id: &str) -> Result<(), StoreError> {
        let mut plans = self.list_plans()?;
        let plan = plans
            .iter_mut()
            .find(|p| p.id == plan_id)
            .ok_or_else(|| StoreError::NotFound {
                kind: "Plan",
                id: plan_id.to_string(),
            })?;
        plan.tasks.push(task_id.to_string());
        self.plans.save(&plans)
    }

    fn attach_task_to_milestone(
        &self,
        plan_id: &str,
        milestone_id: &str,
        task_id: &str,
    ) -> Result<(), StoreError> {
        let mut plans = self.list_plans()?;
        let plan = plans
            .iter_mut()
            .find(|p| p.id == plan_id)
            .ok_or_else(|| StoreError::NotFound {
                kind: "Plan",
                id: plan_id.to_string(),
            })?;
        let milestone = plan
            .milestones
            .iter_mut()
            .find(|m| m.id == milestone_id)
            .ok_or_else(|| StoreError::NotFound {
                kind: "Milestone",
                id: milestone_id.to_string(),
            })?;
        milestone.task_ids.push(task_id.to_string());
        self.plans.save(&plans)
    }

    /// 标记任务完成并写入 complete_at；随后重算所属里程碑完成态与计划进度
    pub fn complete_task(&self, task_id: &str) -> Result<TaskRecord, StoreError> {
        let mut tasks = self.list_tasks()?;
        let task = tasks
            .iter_mut()
            .find(|t| t.id == task_id)
            .ok_or_else(|| StoreError::NotFound {
                kind: "Task",
                id: task_id.to_string(),
            })?;
        task.completed = true;
        task.complete_at = Some(Utc::now());
        let completed = task.clone();
        self.tasks.save(&tasks)?;

        if let Some(plan_id) = completed.plan_id.as_deref() {
            self.refresh_milestones(plan_id)?;
            self.refresh_progress(plan_id)?;
        }
        Ok(completed)
    }

    /// 重算一个计划内所有里程碑的完成态：全部任务完成即里程碑完成
    fn refresh_milestones(&self, plan_id: &str) -> Result<(), StoreError> {
        let tasks = self.list_tasks()?;
        let mut plans = self.list_plans()?;
        let plan = plans
            .iter_mut()
            .find(|p| p.id == plan_id)
            .ok_or_else(|| StoreError::NotFound {
                kind: "Plan",
                id: plan_id.to_string(),
            })?;

        let mut changed = false;
        for milestone in &mut plan.milestones {
            let all_done = !milestone.task_ids.is_empty()
                && milestone.task_ids.iter().all(|tid| {
                    tasks
                        .iter()
                        .any(|t| &t.id == tid && t.completed)
                });
            if milestone.completed != all_done {
                milestone.completed = all_done;
                changed = true;
            }
        }
        if changed {
            self.plans.save(&plans)?;
        }
        Ok(())
    }

    /// progress = round(100 * 已完成里程碑 / 总里程碑)；无里程碑时为 0
    fn refresh_progress(&self, plan_id: &str) -> Result<(), StoreError> {
        let mut plans = self.list_plans()?;
        let plan = plans
            .iter_mut()
            .find(|p| p.id == plan_id)
            .ok_or_else(|| StoreError::NotFound {
                kind: "Plan",
                id: plan_id.to_string(),
            })?;
        let total = plan.milestones.len();
        let done = plan.milestones.iter().filter(|m| m.completed).count();
        plan.progress = if total == 0 {
            0
        } else {
            (100.0 * done as f64 / total as f64).round() as u32
        };
        self.plans.save(&plans)
    }

    // === 日程 ===

    /// 从 09:00 起为未完成任务编排整点时段，按优先级（high 在前）与截止日期排序，
    /// 至多 available_hours 个时段
    pub fn schedule_day(&self, available_hours: u32) -> Result<Vec<ScheduleSlot>, StoreError> {
        let mut open: Vec<TaskRecord> = self
            .list_tasks()?
            .into_iter()
            .filter(|t| !t.completed)
            .collect();
        open.sort_by(|a, b| {
            priority_rank(a.priority.as_deref())
                .cmp(&priority_rank(b.priority.as_deref()))
                .then_with(|| {
                    a.deadline
                        .as_deref()
                        .unwrap_or("9999-12-31")
                        .cmp(b.deadline.as_deref().unwrap_or("9999-12-31"))
                })
        });

        let mut slots = Vec::new();
        let mut current = Utc::now()
            .with_hour(9)
            .and_then(|t| t.with_minute(0))
            .and_then(|t| t.with_second(0))
            .unwrap_or_else(Utc::now);
        for task in open.into_iter().take(available_hours as usize) {
            let end = current + ChronoDuration::hours(1);
            slots.push(ScheduleSlot {
                window: format!("{} - {}", current.format("%H:%M"), end.format("%H:%M")),
                title: task.title,
            });
            current = end;
        }
        Ok(slots)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn open_store(dir: &Path) -> PlannerStore {
        PlannerStore::open(dir, Duration::from_secs(2)).unwrap()
    }

    #[test]
    fn test_create_plan_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let store = open_store(dir.path());

        let plan = store
            .create_plan(
                "Launch blog",
                "2025-06-01",
                "high",
                &["Pick niche".to_string(), "Write articles".to_string()],
            )
            .unwrap();

        assert_eq!(plan.milestones.len(), 2);
        assert!(plan.tasks.is_empty());
        assert_eq!(plan.progress, 0);
        assert_eq!(plan.status.as_deref(), Some("in_progress"));

        let stored = store.list_plans().unwrap();
        assert_eq!(stored.len(), 1);
        assert_eq!(stored[0].id, plan.id);

        // id 唯一
        let other = store
            .create_plan("Launch podcast", "2025-07-01", "low", &[])
            .unwrap();
        assert_ne!(other.id, plan.id);
    }

    #[test]
    fn test_complete_last_task_flips_milestone_and_progress() {
        let dir = tempfile::tempdir().unwrap();
        let store = open_store(dir.path());

        let plan = store
            .create_plan(
                "Launch blog",
                "2025-06-01",
                "high",
                &["Pick niche".to_string(), "Write articles".to_string()],
            )
            .unwrap();
        let ms = plan.milestones[0].id.clone();

        let t1 = store
            .create_task("Research niches", None, None, None, Some(&plan.id), Some(&ms))
            .unwrap();
        let t2 = store
            .create_task("Decide niche", None, None, None, Some(&plan.id), Some(&ms))
            .unwrap();

        store.complete_task(&t1.id).unwrap();
        let plans = store.list_plans().unwrap();
        assert!(!plans[0].milestones[0].completed);
        assert_eq!(plans[0].progress, 0);

        store.complete_task(&t2.id).unwrap();
        let plans = store.list_plans().unwrap();
        assert!(plans[0].milestones[0].completed);
        // 2 个里程碑完成 1 个 → 50%
        assert_eq!(plans[0].progress, 50);
    }

    #[test]
    fn test_complete_unknown_task_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let store = open_store(dir.path());
        let err = store.complete_task("nope").unwrap_err();
        assert!(matches!(err, StoreError::NotFound { kind: "Task", .. }));
    }

    #[test]
    fn test_find_similar_plans_threshold() {
        let dir = tempfile::tempdir().unwrap();
        let store = open_store(dir.path());
        store
            .create_plan("Launch blog", "2025-06-01", "high", &[])
            .unwrap();
        store
            .create_plan("Plant a vegetable garden", "2025-08-01", "low", &[])
            .unwrap();

        let hits = store.find_similar_plans("launch BLOG", 0.8).unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].goal, "Launch blog");

        let none = store.find_similar_plans("Write a novel", 0.8).unwrap();
        assert!(none.is_empty());
    }

    #[test]
    fn test_summarize_unknown_plan() {
        let dir = tempfile::tempdir().unwrap();
        let store = open_store(dir.path());
        let err = store.summarize_plan("missing").unwrap_err();
        assert!(matches!(err, StoreError::NotFound { kind: "Plan", .. }));
    }

    #[test]
    fn test_schedule_day_orders_and_limits() {
        let dir = tempfile::tempdir().unwrap();
        let store = open_store(dir.path());
        store
            .create_task("Low prio", Some("low"), None, None, None, None)
            .unwrap();
        store
            .create_task("High prio", Some("high"), None, None, None, None)
            .unwrap();
        let done = store
            .create_task("Already done", Some("high"), None, None, None, None)
            .unwrap();
        store.complete_task(&done.id).unwrap();

        let slots = store.schedule_day(8).unwrap();
        assert_eq!(slots.len(), 2);
        assert_eq!(slots[0].title, "High prio");
        assert!(slots[0].window.starts_with("09:00"));

        let limited = store.schedule_day(1).unwrap();
        assert_eq!(limited.len(), 1);
    }
}
