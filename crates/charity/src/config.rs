//! Layered configuration: defaults, `charity.toml`, then `CHARITY_*` environment variables.

use crate::{contract::DONATION_GAS_LIMIT, wallet::RpcWalletHost};
use alloy_primitives::Address;
use alloy_signer_local::{LocalSignerError, PrivateKeySigner};
use figment::{
    Figment, Provider,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};
use std::{
    fmt, fs, io,
    path::{Path, PathBuf},
    time::Duration,
};
use toml_edit::DocumentMut;
use url::Url;

/// Errors raised while loading or updating the configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error(transparent)]
    Extract(#[from] Box<figment::Error>),
    #[error("invalid RPC URL {url:?}: {source}")]
    RpcUrl {
        url: String,
        #[source]
        source: url::ParseError,
    },
    #[error("failed to create wallet from private key: {0}")]
    PrivateKey(#[from] LocalSignerError),
    #[error("failed to access {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("failed to parse {}: {source}", path.display())]
    Toml {
        path: PathBuf,
        #[source]
        source: toml_edit::TomlError,
    },
}

/// Runtime configuration of the donation client.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CharityConfig {
    /// JSON-RPC endpoint of the wallet host. Without it there is no wallet to connect.
    pub rpc_url: Option<String>,
    /// Address of the deployed charity contract.
    pub contract_address: Option<Address>,
    /// Hex private key used to sign locally. When unset, the node signs with an unlocked account.
    #[serde(skip_serializing)]
    pub private_key: Option<String>,
    /// Gas ceiling for donations.
    pub gas_limit: u64,
    /// Milliseconds between account/network polls.
    pub poll_interval_ms: u64,
}

impl Default for CharityConfig {
    fn default() -> Self {
        Self {
            rpc_url: None,
            contract_address: None,
            private_key: None,
            gas_limit: DONATION_GAS_LIMIT,
            poll_interval_ms: 1_000,
        }
    }
}

impl fmt::Debug for CharityConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CharityConfig")
            .field("rpc_url", &self.rpc_url)
            .field("contract_address", &self.contract_address)
            .field("private_key", &self.private_key.as_ref().map(|_| "<redacted>"))
            .field("gas_limit", &self.gas_limit)
            .field("poll_interval_ms", &self.poll_interval_ms)
            .finish()
    }
}

impl CharityConfig {
    /// File name of the project configuration.
    pub const FILE_NAME: &'static str = "charity.toml";

    /// Prefix of environment variable overrides, e.g. `CHARITY_RPC_URL`.
    pub const ENV_PREFIX: &'static str = "CHARITY_";

    /// The default figment rooted at the current directory.
    pub fn figment() -> Figment {
        Self::figment_with_root(Path::new("."))
    }

    /// The default figment with `charity.toml` looked up in `root`.
    pub fn figment_with_root(root: &Path) -> Figment {
        Figment::from(Serialized::defaults(Self::default()))
            .merge(Toml::file(root.join(Self::FILE_NAME)))
            .merge(Env::prefixed(Self::ENV_PREFIX))
    }

    /// Loads the configuration from the default figment.
    pub fn load() -> Result<Self, ConfigError> {
        Self::from_provider(Self::figment())
    }

    /// Extracts a configuration from `provider`.
    pub fn from_provider<T: Provider>(provider: T) -> Result<Self, ConfigError> {
        let figment = Figment::from(provider);
        trace!("load config with provider: {:?}", figment.metadata().collect::<Vec<_>>());
        figment.extract().map_err(|err| ConfigError::Extract(Box::new(err)))
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    /// Parses the configured private key, if any.
    pub fn signer(&self) -> Result<Option<PrivateKeySigner>, ConfigError> {
        let Some(key) = self.private_key.as_deref() else { return Ok(None) };
        let signer: PrivateKeySigner = key.trim().parse()?;
        Ok(Some(signer))
    }

    /// Builds the wallet host for the configured endpoint.
    ///
    /// Returns `None` when no endpoint is configured, the equivalent of a browser without a
    /// wallet extension.
    pub fn wallet_host(&self) -> Result<Option<RpcWalletHost>, ConfigError> {
        let Some(rpc_url) = self.rpc_url.as_deref() else { return Ok(None) };
        let url = parse_rpc_url(rpc_url)?;
        let host = RpcWalletHost::new(url, self.signer()?).with_poll_interval(self.poll_interval());
        Ok(Some(host))
    }
}

/// Parses an RPC URL, accepting the `localhost:8545` shorthand.
fn parse_rpc_url(url: &str) -> Result<Url, ConfigError> {
    let with_scheme;
    let url = if url.starts_with("localhost:") || url.starts_with("127.0.0.1:") {
        with_scheme = format!("http://{url}");
        with_scheme.as_str()
    } else {
        url
    };
    Url::parse(url).map_err(|source| ConfigError::RpcUrl { url: url.to_string(), source })
}

/// Writes `contract_address` into the config file at `path`, keeping everything else intact.
///
/// The file is created if it does not exist.
pub fn save_contract_address(path: &Path, address: Address) -> Result<(), ConfigError> {
    let io_err = |source| ConfigError::Io { path: path.to_path_buf(), source };
    let contents = match fs::read_to_string(path) {
        Ok(contents) => contents,
        Err(err) if err.kind() == io::ErrorKind::NotFound => String::new(),
        Err(err) => return Err(io_err(err)),
    };
    let mut doc: DocumentMut = contents
        .parse()
        .map_err(|source| ConfigError::Toml { path: path.to_path_buf(), source })?;
    doc["contract_address"] = toml_edit::value(address.to_checksum(None));
    fs::write(path, doc.to_string()).map_err(io_err)?;
    debug!(path = %path.display(), %address, "saved contract address");
    Ok(())
}
