pub mod config;
pub mod run;

use crate::cli::args::{Cli, Command};
use crate::exit_codes;

pub async fn dispatch(cli: Cli) -> anyhow::Result<i32> {
    match cli.cmd {
        Command::Run(args) => run::run(args).await,
        Command::Config(args) => config::print_config(args),
        Command::Version => {
            println!("{}", env!("CARGO_PKG_VERSION"));
            Ok(exit_codes::EXIT_SUCCESS)
        }
    }
}
