pub mod command;
pub mod oracle;

pub use command::{Command, CommandResult};
pub use oracle::{Oracle, OracleError};
