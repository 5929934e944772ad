use crate::command::{CommandFactory, REJECTION_MARKER, Rejected, Reply};
use crate::env::Environment;
use crate::parser;
use anyhow::Context;
use rustyline::DefaultEditor;
use rustyline::error::ReadlineError;
use std::io::{BufRead, Write};
use tracing::debug;

/// Factory allows creating instances of ExecutableCommand.
///
/// Only supports commands defined in this crate, see `BuiltinCommand`.
pub(crate) struct Factory<T> {
    _phantom: std::marker::PhantomData<T>,
}

impl<T> Default for Factory<T> {
    fn default() -> Self {
        Self {
            _phantom: std::marker::PhantomData,
        }
    }
}

/// What the read loop should do after a line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Step {
    /// Print this (possibly empty) text and read the next line.
    Continue(Reply),
    /// `quit` or `exit` was entered.
    Quit,
}

/// Line-oriented command interpreter over a bookstore [`Environment`].
///
/// Factories are queried in order and the first one recognizing the command
/// wins. See [`Default`] for the command set included out of the box.
///
/// Example
/// ```
/// use bookshop::{Interpreter, Step};
/// let mut shop = Interpreter::default();
/// assert_eq!(shop.execute_line("su root sjtu"), Step::Continue(String::new()));
/// assert_eq!(shop.execute_line("show"), Step::Continue("\n".to_string()));
/// assert_eq!(shop.execute_line("logout now"), Step::Continue("Invalid\n".to_string()));
/// ```
pub struct Interpreter {
    env: Environment,
    commands: Vec<Box<dyn CommandFactory>>,
}

impl Interpreter {
    /// Create an interpreter with a custom set of command factories.
    pub fn new(env: Environment, commands: Vec<Box<dyn CommandFactory>>) -> Self {
        Self { env, commands }
    }

    /// Create an interpreter with the default command set.
    pub fn with_environment(env: Environment) -> Self {
        Self::new(env, default_commands())
    }

    pub fn environment(&self) -> &Environment {
        &self.env
    }

    pub fn into_environment(self) -> Environment {
        self.env
    }

    /// Run a single command invocation by name with arguments.
    pub fn run(&mut self, name: &str, args: &[&str]) -> Result<Reply, Rejected> {
        let cmd = self
            .commands
            .iter()
            .find_map(|factory| factory.try_create(name, args))
            .ok_or(Rejected::UnknownCommand)?;
        cmd.execute(&mut self.env)
    }

    /// Tokenize and run one input line, turning rejections into the marker.
    pub fn execute_line(&mut self, line: &str) -> Step {
        let tokens = parser::tokenize(line);
        let Some((name, args)) = tokens.split_first() else {
            return Step::Continue(Reply::new());
        };
        if args.is_empty() && matches!(*name, "quit" | "exit") {
            return Step::Quit;
        }
        match self.run(name, args) {
            Ok(reply) => Step::Continue(reply),
            Err(reason) => {
                debug!(line, %reason, "command rejected");
                Step::Continue(format!("{}\n", REJECTION_MARKER))
            }
        }
    }

    /// Feed every line of `input` through the interpreter until it ends or
    /// a quit command is read.
    ///
    /// Bytes that aren't valid UTF-8 are replaced, so such a line is simply
    /// an unknown command.
    pub fn run_script(&mut self, mut input: impl BufRead, mut output: impl Write) -> anyhow::Result<()> {
        let mut buf = Vec::new();
        loop {
            buf.clear();
            let read = input
                .read_until(b'\n', &mut buf)
                .context("failed to read command line")?;
            if read == 0 {
                break;
            }
            let line = String::from_utf8_lossy(&buf);
            let line = line.trim_end_matches(['\n', '\r']);
            match self.execute_line(line) {
                Step::Continue(reply) => output
                    .write_all(reply.as_bytes())
                    .context("failed to write reply")?,
                Step::Quit => break,
            }
        }
        output.flush().context("failed to flush output")?;
        Ok(())
    }

    /// Interactive loop with line editing and history.
    pub fn repl(&mut self) -> anyhow::Result<()> {
        let mut rl = DefaultEditor::new().context("failed to start line editor")?;
        let mut stdout = std::io::stdout();

        loop {
            match rl.readline("bookshop> ") {
                Ok(line) => {
                    if !line.trim().is_empty() {
                        rl.add_history_entry(line.as_str())?;
                    }
                    match self.execute_line(&line) {
                        Step::Continue(reply) => {
                            stdout.write_all(reply.as_bytes())?;
                            stdout.flush()?;
                        }
                        Step::Quit => break,
                    }
                }
                Err(ReadlineError::Interrupted) | Err(ReadlineError::Eof) => break,
                Err(err) => return Err(err).context("failed to read line"),
            }
        }

        Ok(())
    }
}

/// The full command set. Sub-command forms come before the plain command
/// sharing their first word.
fn default_commands() -> Vec<Box<dyn CommandFactory>> {
    use crate::account::*;
    use crate::catalog::*;
    use crate::report::*;
    vec![
        Box::new(Factory::<Su>::default()),
        Box::new(Factory::<Logout>::default()),
        Box::new(Factory::<Register>::default()),
        Box::new(Factory::<Passwd>::default()),
        Box::new(Factory::<UserAdd>::default()),
        Box::new(Factory::<Delete>::default()),
        Box::new(Factory::<ShowFinance>::default()),
        Box::new(Factory::<Show>::default()),
        Box::new(Factory::<Buy>::default()),
        Box::new(Factory::<Select>::default()),
        Box::new(Factory::<Modify>::default()),
        Box::new(Factory::<Import>::default()),
        Box::new(Factory::<ReportFinance>::default()),
        Box::new(Factory::<ReportEmployee>::default()),
        Box::new(Factory::<Log>::default()),
    ]
}

impl Default for Interpreter {
    /// An interpreter over a fresh store holding only the bootstrap
    /// administrator.
    fn default() -> Self {
        Self::with_environment(Environment::new(crate::store::RecordStore::bootstrap()))
    }
}
