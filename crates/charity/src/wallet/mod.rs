//! Wallet connection and account/network notifications.

use crate::{contract::CharityContract, error::WalletError};
use alloy_primitives::{Address, ChainId};
use async_trait::async_trait;
use std::{fmt, sync::Arc};
use tokio::sync::broadcast;

mod rpc;
pub use rpc::RpcWalletHost;

/// A notification pushed by the wallet host.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum WalletEvent {
    /// The set of authorized accounts changed. The first entry is the active account, an empty
    /// list means the wallet disconnected.
    AccountsChanged(Vec<Address>),
    /// The wallet switched to another network.
    ChainChanged(ChainId),
}

/// The host-supplied wallet interface.
#[async_trait]
pub trait WalletHost: fmt::Debug + Send + Sync {
    /// Asks the wallet to authorize accounts for this session.
    async fn request_accounts(&self) -> Result<Vec<Address>, WalletError>;

    /// Subscribes to account and network notifications.
    fn subscribe(&self) -> broadcast::Receiver<WalletEvent>;

    /// Binds the charity contract at `address` to this wallet.
    fn contract_at(&self, address: Address, gas_limit: u64) -> Arc<dyn CharityContract>;
}

/// Acquires the active account from an optional [`WalletHost`].
///
/// A connector without a host behaves like an environment without an injected wallet: every
/// connection attempt fails with [`WalletError::ProviderUnavailable`].
#[derive(Clone, Debug, Default)]
pub struct WalletConnector {
    host: Option<Arc<dyn WalletHost>>,
}

impl WalletConnector {
    pub fn new(host: Option<Arc<dyn WalletHost>>) -> Self {
        Self { host }
    }

    pub fn with_host(host: impl WalletHost + 'static) -> Self {
        Self::new(Some(Arc::new(host)))
    }

    /// Returns the host, if any.
    pub fn host(&self) -> Option<&Arc<dyn WalletHost>> {
        self.host.as_ref()
    }

    /// Requests account access and returns the first authorized account.
    pub async fn connect(&self) -> Result<Address, WalletError> {
        let host = self.host.as_ref().ok_or(WalletError::ProviderUnavailable)?;
        let accounts = host.request_accounts().await?;
        let account = accounts.first().copied().ok_or(WalletError::AuthorizationDenied)?;
        debug!(%account, authorized = accounts.len(), "wallet connected");
        Ok(account)
    }

    /// Subscribes to host notifications, `None` without a host.
    pub fn subscribe(&self) -> Option<broadcast::Receiver<WalletEvent>> {
        self.host.as_ref().map(|host| host.subscribe())
    }

    /// Binds the charity contract through the host.
    pub fn contract_at(
        &self,
        address: Address,
        gas_limit: u64,
    ) -> Result<Arc<dyn CharityContract>, WalletError> {
        let host = self.host.as_ref().ok_or(WalletError::ProviderUnavailable)?;
        Ok(host.contract_at(address, gas_limit))
    }
}
