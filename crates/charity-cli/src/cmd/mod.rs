//! Subcommands of the `charity` binary.

use charity::{CharityConfig, DonationWorkflow};
use eyre::Result;

pub mod deploy;
pub mod donate;
pub mod session;
pub mod status;

/// Builds the workflow for `config` and connects the wallet.
pub async fn connect(config: &CharityConfig) -> Result<DonationWorkflow> {
    let workflow = DonationWorkflow::from_config(config)?;
    workflow.load().await;
    Ok(workflow)
}
