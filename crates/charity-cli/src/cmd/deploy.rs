use charity::{
    CharityConfig, WalletHost,
    config::save_contract_address,
    deploy::{deploy, load_bytecode},
};
use clap::Parser;
use eyre::{OptionExt, Result};
use std::path::Path;

/// CLI arguments for `charity deploy`.
#[derive(Clone, Debug, Parser)]
pub struct DeployArgs {
    /// Creation bytecode as hex, or the path to a compiled artifact.
    #[arg(value_name = "BYTECODE|ARTIFACT")]
    pub bytecode: String,

    /// Write the deployed address to `charity.toml`.
    #[arg(long)]
    pub save: bool,
}

impl DeployArgs {
    pub async fn run(self, config: &CharityConfig) -> Result<()> {
        let bytecode = load_bytecode(&self.bytecode)?;
        let host = config
            .wallet_host()?
            .ok_or_eyre("no RPC endpoint configured, pass --rpc-url or set CHARITY_RPC_URL")?;
        let from = host.request_accounts().await?.first().copied();

        let address = deploy(host.provider(), from, bytecode).await?;
        println!("Charity contract deployed to: {address}");

        if self.save {
            let path = Path::new(CharityConfig::FILE_NAME);
            save_contract_address(path, address)?;
            println!("Saved contract address to {}", path.display());
        }
        Ok(())
    }
}
