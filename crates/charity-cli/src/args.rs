use crate::{
    cmd::{deploy::DeployArgs, donate::DonateArgs, status::StatusArgs},
    opts::{ConnectionOpts, ShellOptions},
};
use clap::{Parser, Subcommand};

/// Donate to charities through the charity contract.
#[derive(Debug, Parser)]
#[command(name = "charity", version, next_display_order = None)]
pub struct CharityArgs {
    #[command(flatten)]
    pub shell: ShellOptions,

    #[command(flatten)]
    pub connection: ConnectionOpts,

    #[command(subcommand)]
    pub cmd: CharitySubcommand,
}

#[derive(Debug, Subcommand)]
pub enum CharitySubcommand {
    /// List the charities that accept donations.
    #[command(visible_alias = "ls")]
    Charities,

    /// Donate ether to a charity.
    #[command(visible_alias = "d")]
    Donate(DonateArgs),

    /// Check whether a charity has received a donation.
    #[command(visible_alias = "st")]
    Status(StatusArgs),

    /// Deploy the charity contract.
    Deploy(DeployArgs),

    /// Start an interactive donation session.
    #[command(visible_alias = "s")]
    Session,
}
