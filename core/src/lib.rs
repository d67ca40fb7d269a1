pub mod agent;
pub mod config;
pub mod providers;
pub mod traits;

pub use agent::{
    Action, CommandRegistry, CompressError, Compressor, Dispatch, LoopError, ParseError,
    ParsedAction, PromptSet, ReactLoop, Transcript,
};
pub use config::*;
pub use providers::*;
pub use traits::*;
