//! Prompt 组装
//!
//! 片段优先从 config/prompts/<name>.txt 读取，读不到时回落到编译内置的默认文本。
//! 结构化 prompt = base 片段 + 按意图选择的主题片段；意图缺失时退化为对历史的关键词匹配
//! （意图存在时始终优先，关键词不参与）。

use crate::core::{Intent, Turn};

const BASE_FRAGMENT: &str = r#"You are FocusFlow, a structured productivity assistant.

You help the user turn goals into plans, milestones and tasks, and keep them on track.
When an action is needed, call exactly one tool by responding with a single-line JSON
object of the form {"tool": "<name>", "args": {...}} and nothing else.
When no tool is needed, reply in short, clear plain text.

Guidelines:
- Ask for missing details (goal, deadline, priority, milestones) before creating records.
- Before creating a plan, check for duplicates with find_similar_plans.
- Confirm what you did after a tool call, in one or two sentences."#;

const PLANNING_FRAGMENT: &str = r#"Focus: planning.
Help the user define a concrete goal, a deadline, a priority and a handful of milestones,
then create the plan. Suggest realistic milestone breakdowns when the user is vague."#;

const TASKS_FRAGMENT: &str = r#"Focus: tasks.
Help the user capture actionable tasks, link them to plans and milestones when they
mention one, and complete or list tasks on request."#;

const SCHEDULING_FRAGMENT: &str = r#"Focus: scheduling.
Help the user lay out their day. Use schedule_day with their available hours and walk
them through the resulting time blocks."#;

const TRACKING_FRAGMENT: &str = r#"Focus: tracking.
Help the user review progress: summarize plans, report milestone completion and suggest
the next task to move the plan forward."#;

const FREEFORM_FRAGMENT: &str = r#"You are FocusFlow, a thoughtful and supportive assistant.

Your goal is to help the user reflect, explore thoughts, capture ideas, or maintain
motivation — especially when structured planning is not currently needed.

Guidelines:
- Be friendly, calm, and respectful.
- Use short, helpful replies that feel natural and human.
- Ask open-ended follow-up questions when appropriate.
- Help the user get clarity on their thoughts or intentions.
- Avoid giving rigid advice; offer suggestions gently.

Do not try to call tools or structured planning actions.
If the user seems ready to plan or take action, gently suggest starting a plan.

Keep it human. Keep it helpful."#;

fn intent_fragment_name(intent: Intent) -> &'static str {
    match intent {
        Intent::Planning => "planning",
        Intent::Scheduling => "scheduling",
        Intent::Tasks => "tasks",
        Intent::Tracking => "tracking",
    }
}

fn default_fragment(name: &str) -> &'static str {
    match name {
        "base" => BASE_FRAGMENT,
        "planning" => PLANNING_FRAGMENT,
        "tasks" => TASKS_FRAGMENT,
        "scheduling" => SCHEDULING_FRAGMENT,
        "tracking" => TRACKING_FRAGMENT,
        "freeform" => FREEFORM_FRAGMENT,
        _ => "",
    }
}

/// Prompt 片段库
#[derive(Default)]
pub struct PromptLibrary;

impl PromptLibrary {
    pub fn new() -> Self {
        Self
    }

    /// 读取片段：config/prompts/<name>.txt 或 ../config/prompts/<name>.txt，否则内置默认
    pub fn fragment(&self, name: &str) -> String {
        [
            format!("config/prompts/{name}.txt"),
            format!("../config/prompts/{name}.txt"),
        ]
        .into_iter()
        .find_map(|p| std::fs::read_to_string(p).ok())
        .unwrap_or_else(|| default_fragment(name).to_string())
    }

    /// 自由对话的固定 system prompt
    pub fn freeform_prompt(&self) -> String {
        self.fragment("freeform")
    }

    /// 结构化 system prompt：base + 意图片段；无意图时按历史关键词选择零或多个片段
    pub fn build_structured_prompt(&self, turns: &[Turn], intent: Option<Intent>) -> String {
        let mut parts = vec![self.fragment("base")];

        match intent {
            Some(intent) => parts.push(self.fragment(intent_fragment_name(intent))),
            None => {
                let context = turns
                    .iter()
                    .map(|t| t.content.as_str())
                    .collect::<Vec<_>>()
                    .join(" ")
                    .to_lowercase();
                if context.contains("plan") {
                    parts.push(self.fragment("planning"));
                }
                if ["task", "todo", "step"].iter().any(|k| context.contains(k)) {
                    parts.push(self.fragment("tasks"));
                }
                if ["schedule", "calendar", "time block"]
                    .iter()
                    .any(|k| context.contains(k))
                {
                    parts.push(self.fragment("scheduling"));
                }
                if ["progress", "milestone", "tracking"]
                    .iter()
                    .any(|k| context.contains(k))
                {
                    parts.push(self.fragment("tracking"));
                }
            }
        }

        parts.join("\n\n")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_intent_takes_precedence_over_keywords() {
        let lib = PromptLibrary::new();
        let turns = vec![Turn::user("my schedule and calendar are a mess")];
        let prompt = lib.build_structured_prompt(&turns, Some(Intent::Planning));
        assert!(prompt.contains("Focus: planning."));
        assert!(!prompt.contains("Focus: scheduling."));
    }

    #[test]
    fn test_keyword_fallback_without_intent() {
        let lib = PromptLibrary::new();
        let turns = vec![Turn::user("I need to sort my todo list and my calendar")];
        let prompt = lib.build_structured_prompt(&turns, None);
        assert!(prompt.contains("Focus: tasks."));
        assert!(prompt.contains("Focus: scheduling."));
        assert!(!prompt.contains("Focus: tracking."));
    }
}
