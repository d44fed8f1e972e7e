// reqm - requirements manifest tool
// Main CLI entry point

use clap::Parser;
use reqm::cli::{init_logging, Cli, CliDispatcher};
use reqm::utils::error::UserError;
use std::process;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match CliDispatcher::execute(cli).await {
        Ok(code) => process::exit(code),
        Err(err) => {
            let user_error = UserError::from_reqm_error(&err);
            user_error.print();
            process::exit(user_error.exit_code);
        }
    }
}
