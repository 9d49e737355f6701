//! Prompt assembly and turn orchestration for Advisor.

mod responder;
mod turn;

pub use responder::{
    NO_CONTEXT_WARNING, PERSONA, Reply, Responder, ResponderSettings, build_system_prompt,
    present_error,
};
pub use turn::{TurnOutcome, run_turn};
