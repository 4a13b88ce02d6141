use super::{WalletEvent, WalletHost};
use crate::{
    contract::{CharityContract, RpcCharityContract},
    error::WalletError,
};
use alloy_network::EthereumWallet;
use alloy_primitives::{Address, ChainId};
use alloy_provider::{DynProvider, Provider, ProviderBuilder};
use alloy_signer_local::PrivateKeySigner;
use alloy_transport::TransportError;
use async_trait::async_trait;
use parking_lot::Mutex;
use std::{fmt, sync::Arc, time::Duration};
use tokio::{
    sync::broadcast,
    task::JoinHandle,
    time::{self, MissedTickBehavior},
};
use url::Url;

/// JSON-RPC error code for an unknown method.
const METHOD_NOT_FOUND: i64 = -32601;

/// Default interval between account/network polls.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(1);

/// A [`WalletHost`] backed by a JSON-RPC endpoint.
///
/// Transactions are signed by the configured private key, or by the node itself when no key is
/// given (`eth_sendTransaction` with an unlocked account). The endpoint has no push
/// notifications, so account and network changes are detected by polling once somebody
/// subscribes.
pub struct RpcWalletHost {
    provider: DynProvider,
    /// Address of the local signer, if transactions are signed locally.
    local_account: Option<Address>,
    poll_interval: Duration,
    events: broadcast::Sender<WalletEvent>,
    watcher: Mutex<Option<JoinHandle<()>>>,
}

impl fmt::Debug for RpcWalletHost {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RpcWalletHost")
            .field("local_account", &self.local_account)
            .field("poll_interval", &self.poll_interval)
            .finish_non_exhaustive()
    }
}

impl RpcWalletHost {
    /// Creates a host for the endpoint at `url`.
    ///
    /// This does not touch the network; the first request happens on
    /// [`request_accounts`](WalletHost::request_accounts).
    pub fn new(url: Url, signer: Option<PrivateKeySigner>) -> Self {
        let (provider, local_account) = match signer {
            Some(signer) => {
                let account = signer.address();
                let provider = ProviderBuilder::new()
                    .wallet(EthereumWallet::from(signer))
                    .connect_http(url)
                    .erased();
                (provider, Some(account))
            }
            None => (ProviderBuilder::new().connect_http(url).erased(), None),
        };
        let (events, _) = broadcast::channel(16);
        Self {
            provider,
            local_account,
            poll_interval: DEFAULT_POLL_INTERVAL,
            events,
            watcher: Mutex::new(None),
        }
    }

    /// Sets the interval between account/network polls.
    pub fn with_poll_interval(mut self, poll_interval: Duration) -> Self {
        self.poll_interval = poll_interval;
        self
    }

    /// The underlying provider.
    pub fn provider(&self) -> &DynProvider {
        &self.provider
    }

    fn spawn_watcher(&self) -> JoinHandle<()> {
        trace!(interval = ?self.poll_interval, "starting wallet watcher");
        tokio::spawn(watch(
            self.provider.clone(),
            self.local_account,
            self.events.clone(),
            self.poll_interval,
        ))
    }
}

impl Drop for RpcWalletHost {
    fn drop(&mut self) {
        if let Some(watcher) = self.watcher.get_mut().take() {
            watcher.abort();
        }
    }
}

#[async_trait]
impl WalletHost for RpcWalletHost {
    async fn request_accounts(&self) -> Result<Vec<Address>, WalletError> {
        if let Some(account) = self.local_account {
            return Ok(vec![account]);
        }
        match self
            .provider
            .raw_request::<_, Vec<Address>>("eth_requestAccounts".into(), [(); 0])
            .await
        {
            Ok(accounts) => Ok(accounts),
            Err(err) if is_method_not_found(&err) => {
                debug!("eth_requestAccounts not supported, falling back to eth_accounts");
                Ok(self.provider.get_accounts().await?)
            }
            Err(err) => Err(err.into()),
        }
    }

    /// Must be called from within a tokio runtime.
    fn subscribe(&self) -> broadcast::Receiver<WalletEvent> {
        let receiver = self.events.subscribe();
        let mut watcher = self.watcher.lock();
        if watcher.as_ref().is_none_or(|handle| handle.is_finished()) {
            *watcher = Some(self.spawn_watcher());
        }
        receiver
    }

    fn contract_at(&self, address: Address, gas_limit: u64) -> Arc<dyn CharityContract> {
        Arc::new(RpcCharityContract::new(address, self.provider.clone()).with_gas_limit(gas_limit))
    }
}

fn is_method_not_found(err: &TransportError) -> bool {
    err.as_error_resp().is_some_and(|payload| payload.code == METHOD_NOT_FOUND)
}

/// Polls the endpoint and emits a [`WalletEvent`] for every observed change.
///
/// Exits once the last receiver is gone.
async fn watch(
    provider: DynProvider,
    local_account: Option<Address>,
    events: broadcast::Sender<WalletEvent>,
    interval: Duration,
) {
    let mut ticker = time::interval(interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    let mut chain_id: Option<ChainId> = None;
    let mut accounts: Option<Vec<Address>> = None;
    loop {
        ticker.tick().await;
        if events.receiver_count() == 0 {
            trace!("no more wallet subscribers, stopping watcher");
            break;
        }

        match provider.get_chain_id().await {
            Ok(current) => {
                if chain_id.is_some_and(|previous| previous != current) {
                    debug!(chain_id = current, "network changed");
                    let _ = events.send(WalletEvent::ChainChanged(current));
                }
                chain_id = Some(current);
            }
            Err(err) => trace!(%err, "failed to poll chain id"),
        }

        if local_account.is_some() {
            continue;
        }
        match provider.get_accounts().await {
            Ok(current) => {
                if accounts.as_ref().is_some_and(|previous| *previous != current) {
                    debug!(?current, "accounts changed");
                    let _ = events.send(WalletEvent::AccountsChanged(current.clone()));
                }
                accounts = Some(current);
            }
            Err(err) => trace!(%err, "failed to poll accounts"),
        }
    }
}
