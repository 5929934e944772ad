use argh::FromArgs;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(FromArgs, Debug, PartialEq)]
/// Bookstore inventory, accounts and sales ledger.
/// Reads one command per line from standard input.
pub struct Config {
    #[argh(option, short = 'd', default = "PathBuf::from(\".\")")]
    /// directory holding users.dat, books.dat and transactions.dat.
    pub data_dir: PathBuf,

    #[argh(switch)]
    /// leave the data files untouched on exit.
    pub no_save: bool,

    #[argh(option, default = "String::from(\"warn\")")]
    /// log filter used when RUST_LOG is not set, e.g. "debug".
    pub log_level: String,
}

impl Config {
    /// Install a stderr `tracing` subscriber. `RUST_LOG` wins over
    /// `--log-level`.
    pub fn init_tracing(&self) {
        let filter = EnvFilter::try_from_default_env()
            .or_else(|_| EnvFilter::try_new(&self.log_level))
            .unwrap_or_else(|_| EnvFilter::new("warn"));
        let _ = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(false)
            .with_writer(std::io::stderr)
            .try_init();
    }
}
