pub mod codec;
pub mod engine;
pub mod explore;
pub mod states;

pub use codec::CodecError;
pub use engine::{Decision, DialogueEngine, Question, MAX_LABEL_CHARS, MAX_OPTIONS, NEXT_PAGE_VALUE};
pub use explore::{DeadEnd, ExplorationReport};
pub use states::{
    DialogueOption, DialogueOutcome, DialogueStep, FailureReason, NextStep, Resolution,
    SelectionState,
};
