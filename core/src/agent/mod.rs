pub mod compress;
pub mod loop_;
pub mod parser;
pub mod prompt;
pub mod registry;
pub mod transcript;

#[cfg(test)]
pub(crate) mod test_support;

pub use compress::{CompressError, Compressor};
pub use loop_::{LoopError, ReactLoop};
pub use parser::{Action, ParseError, ParsedAction};
pub use prompt::PromptSet;
pub use registry::{CommandRegistry, Dispatch};
pub use transcript::Transcript;
