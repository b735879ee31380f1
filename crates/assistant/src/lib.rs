//! Call assistant orchestration
//!
//! Decides per query between the dataset answer, the generative fallback
//! and the "no answer" reply.

mod orchestrator;
mod types;

pub use orchestrator::{AnswerPolicy, Orchestrator, NO_ANSWER_MESSAGE};
pub use types::{Answer, AnswerSource};
