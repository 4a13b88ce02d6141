use charity::CharityConfig;
use clap::Parser;
use eyre::Result;

/// CLI arguments for `charity status`.
#[derive(Clone, Debug, Parser)]
pub struct StatusArgs {
    /// Id of the charity to check.
    #[arg(long, short, value_name = "ID")]
    pub charity: u64,
}

impl StatusArgs {
    pub async fn run(self, config: &CharityConfig) -> Result<()> {
        let workflow = super::connect(config).await?;
        let charity = workflow.select_charity(self.charity)?;
        workflow.check_status().await?;

        let state = workflow.session().snapshot();
        println!("{}: {}", charity.name, state.status.message().unwrap_or_default());
        Ok(())
    }
}
