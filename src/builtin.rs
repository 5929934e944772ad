use crate::command::{CommandFactory, ExecutableCommand, Rejected, Reply};
use crate::env::Environment;
use crate::interpreter::Factory;
use argh::{EarlyExit, FromArgs};
use tracing::debug;

/// Commands known to the interpreter at compile time.
///
/// Arguments are parsed with [`argh`] (`FromArgs`), which takes care of the
/// argument count and of typed positionals such as quantities and prices.
/// Everything after the command word is handed to argh behind a `--`
/// separator, so ids and passwords that start with `-` stay positional.
pub(crate) trait BuiltinCommand: Sized + FromArgs {
    /// First word of the command, e.g. "buy" or "show".
    fn name() -> &'static str;

    /// Second word for commands that share a first word, e.g. "finance" in
    /// `show finance`.
    fn subcommand() -> Option<&'static str> {
        None
    }

    /// Validates privilege and preconditions, then applies the effect.
    fn execute(self, env: &mut Environment) -> Result<Reply, Rejected>;
}

impl<T: BuiltinCommand> ExecutableCommand for T {
    fn execute(self: Box<Self>, env: &mut Environment) -> Result<Reply, Rejected> {
        T::execute(*self, env)
    }
}

/// Stand-in produced when argh refuses the arguments.
struct InvalidArgs;

impl ExecutableCommand for InvalidArgs {
    fn execute(self: Box<Self>, _env: &mut Environment) -> Result<Reply, Rejected> {
        Err(Rejected::BadArguments)
    }
}

impl<T: BuiltinCommand + 'static> CommandFactory for Factory<T> {
    fn try_create(&self, name: &str, args: &[&str]) -> Option<Box<dyn ExecutableCommand>> {
        if name != T::name() {
            return None;
        }
        let (command_name, rest): (Vec<&str>, &[&str]) = match T::subcommand() {
            None => (vec![name], args),
            Some(sub) => match args.split_first() {
                Some((first, rest)) if *first == sub => (vec![name, sub], rest),
                _ => return None,
            },
        };

        let mut argv = Vec::with_capacity(rest.len() + 1);
        argv.push("--");
        argv.extend_from_slice(rest);

        Some(match T::from_args(&command_name, &argv) {
            Ok(cmd) => Box::new(cmd),
            Err(EarlyExit { output, .. }) => {
                debug!(command = %command_name.join(" "), %output, "argument parsing failed");
                Box::new(InvalidArgs)
            }
        })
    }
}
