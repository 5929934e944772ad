use anyhow::Result;
use bookshop::config::Config;
use bookshop::{Environment, Interpreter, persist};
use std::io::IsTerminal;

fn main() -> Result<()> {
    let config: Config = argh::from_env();
    config.init_tracing();

    let store = persist::load_all(&config.data_dir)?;
    let mut shop = Interpreter::with_environment(Environment::new(store));

    let stdin = std::io::stdin();
    let session = if stdin.is_terminal() {
        shop.repl()
    } else {
        shop.run_script(stdin.lock(), std::io::stdout().lock())
    };

    // Whatever ended the loop, keep what the session changed.
    if !config.no_save {
        persist::dump_all(&config.data_dir, shop.environment().store())?;
    }
    session
}
