//! 核心层：对话状态、意图分类、状态机派发

pub mod classifier;
pub mod dispatcher;
pub mod error;
pub mod state;

pub use classifier::{validate_output, IntentClassifier};
pub use dispatcher::{finalize, Dispatcher, Stage};
pub use error::AgentError;
pub use state::{
    render_turns, ConversationState, Intent, Route, Turn, TurnRole, MAX_TURNS,
};
