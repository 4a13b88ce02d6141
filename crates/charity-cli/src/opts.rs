use alloy_primitives::Address;
use charity::{CharityConfig, config::ConfigError};
use clap::Parser;
use figment::{
    Figment, Metadata, Profile,
    value::{Dict, Map},
};

/// Global output options.
#[derive(Clone, Copy, Debug, Default, Parser)]
pub struct ShellOptions {
    /// Show debug logs.
    #[arg(long, short, global = true, conflicts_with = "quiet")]
    pub verbose: bool,

    /// Only log errors.
    #[arg(long, short, global = true, alias = "silent", conflicts_with = "verbose")]
    pub quiet: bool,
}

impl ShellOptions {
    /// The log filter used when `RUST_LOG` is not set.
    pub fn default_filter(self) -> &'static str {
        match (self.verbose, self.quiet) {
            (true, _) => "charity=debug,charity_cli=debug,info",
            (_, true) => "error",
            _ => "charity=info,charity_cli=info,warn",
        }
    }
}

/// Wallet host and contract options, merged over `charity.toml` and `CHARITY_*` variables.
#[derive(Clone, Debug, Default, Parser)]
#[command(next_help_heading = "Connection options")]
pub struct ConnectionOpts {
    /// JSON-RPC endpoint of the wallet host.
    #[arg(long, short, global = true, value_name = "URL")]
    pub rpc_url: Option<String>,

    /// Address of the deployed charity contract.
    #[arg(long, global = true, value_name = "ADDRESS")]
    pub contract: Option<Address>,

    /// Private key to sign donations with, instead of an account unlocked on the node.
    #[arg(long, global = true, value_name = "HEX")]
    pub private_key: Option<String>,
}

impl figment::Provider for ConnectionOpts {
    fn metadata(&self) -> Metadata {
        Metadata::named("ConnectionOpts")
    }

    fn data(&self) -> Result<Map<Profile, Dict>, figment::Error> {
        Ok(Map::from([(Profile::Default, self.dict())]))
    }
}

impl ConnectionOpts {
    pub fn dict(&self) -> Dict {
        let mut dict = Dict::new();
        if let Some(url) = &self.rpc_url {
            dict.insert("rpc_url".into(), url.clone().into());
        }
        if let Some(contract) = self.contract {
            dict.insert("contract_address".into(), contract.to_string().into());
        }
        if let Some(key) = &self.private_key {
            dict.insert("private_key".into(), key.clone().into());
        }
        dict
    }

    /// The configuration figment with these options on top.
    pub fn figment(&self) -> Figment {
        CharityConfig::figment().merge(self.clone())
    }

    pub fn load_config(&self) -> Result<CharityConfig, ConfigError> {
        CharityConfig::from_provider(self.figment())
    }
}
