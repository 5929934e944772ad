use crate::env::Environment;

/// The single line printed for every rejected command.
pub const REJECTION_MARKER: &str = "Invalid";

/// Why a command was refused.
///
/// The caller only ever sees [`REJECTION_MARKER`]; the variant exists so the
/// reason can be traced at debug level.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Rejected {
    #[error("unknown command")]
    UnknownCommand,
    #[error("malformed arguments")]
    BadArguments,
    #[error("insufficient privilege")]
    Privilege,
    #[error("no such {0}")]
    Missing(&'static str),
    #[error("{0} already exists")]
    Duplicate(&'static str),
    #[error("precondition failed: {0}")]
    Precondition(&'static str),
}

/// What a successful command prints: nothing, or one or more
/// newline-terminated lines.
pub type Reply = String;

/// Object-safe trait for any command the interpreter can dispatch.
pub trait ExecutableCommand {
    /// Validates preconditions against `env` and applies the effect.
    ///
    /// Implementations must not touch `env` before every check has passed,
    /// so that a rejection leaves no trace.
    fn execute(self: Box<Self>, env: &mut Environment) -> Result<Reply, Rejected>;
}

/// Factory that tries to create a command from a name and its arguments.
///
/// Returns `None` when the factory doesn't recognize the `name`. A recognized
/// name with unparseable arguments still yields a command, one that rejects
/// when executed.
pub trait CommandFactory {
    fn try_create(&self, name: &str, args: &[&str]) -> Option<Box<dyn ExecutableCommand>>;
}
