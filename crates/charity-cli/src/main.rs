//! The `charity` command-line client.

#[macro_use]
extern crate tracing;

use charity::CHARITIES;
use clap::Parser;
use eyre::Result;

mod args;
mod cmd;
mod handler;
mod opts;
mod render;
mod utils;

use args::{CharityArgs, CharitySubcommand};

fn main() -> Result<()> {
    handler::install();
    let args = CharityArgs::parse();
    utils::subscriber(args.shell);
    utils::enable_paint();
    run(args)
}

#[tokio::main]
async fn run(args: CharityArgs) -> Result<()> {
    let CharityArgs { connection, cmd, .. } = args;
    let config = || -> Result<_> {
        let config = connection.load_config()?;
        debug!(?config, "loaded config");
        Ok(config)
    };
    match cmd {
        CharitySubcommand::Charities => {
            println!("{}", render::charities(CHARITIES));
            Ok(())
        }
        CharitySubcommand::Donate(cmd) => cmd.run(&config()?).await,
        CharitySubcommand::Status(cmd) => cmd.run(&config()?).await,
        CharitySubcommand::Deploy(cmd) => cmd.run(&config()?).await,
        CharitySubcommand::Session => cmd::session::run(&config()?).await,
    }
}
