use charity::CharityConfig;
use clap::Parser;
use eyre::Result;
use yansi::Paint;

/// CLI arguments for `charity donate`.
#[derive(Clone, Debug, Parser)]
pub struct DonateArgs {
    /// Id of the charity, see `charity charities`.
    #[arg(long, short, value_name = "ID")]
    pub charity: u64,

    /// The amount to donate, in ether.
    #[arg(long, short, value_name = "ETH", allow_hyphen_values = true)]
    pub amount: String,
}

impl DonateArgs {
    pub async fn run(self, config: &CharityConfig) -> Result<()> {
        let Self { charity, amount } = self;
        let workflow = super::connect(config).await?;
        workflow.select_charity(charity)?;
        workflow.set_amount(amount);

        let record = workflow.donate().await?;
        if let Some(message) = workflow.session().snapshot().status.message() {
            println!("{}", message.green());
        }
        println!("{record}");
        Ok(())
    }
}
