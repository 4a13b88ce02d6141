use crate::{
    catalog::{self, Charity},
    config::{CharityConfig, ConfigError},
    contract::{CharityContract, DONATION_GAS_LIMIT, parse_amount},
    error::{DonationError, ValidationError, WalletError},
    session::{DonationRecord, SessionHandle, WorkflowStatus},
    wallet::{WalletConnector, WalletEvent, WalletHost},
};
use alloy_primitives::Address;
use parking_lot::Mutex;
use std::sync::Arc;

pub const DONATION_SUCCESSFUL: &str = "Donation successful";
pub const DONATION_FAILED: &str = "Donation failed. Please try again.";
pub const DONATION_RECEIVED: &str = "Donation received";
pub const NO_DONATIONS_RECEIVED: &str = "No donations received yet";
pub const STATUS_CHECK_FAILED: &str = "Error checking status";

/// Drives donations against the charity contract and keeps the [`SessionState`] up to date.
///
/// All methods take `&self`; the presentation layer reads the state through
/// [`session`](Self::session) and forwards user intents here.
///
/// [`SessionState`]: crate::SessionState
#[derive(Debug)]
pub struct DonationWorkflow {
    connector: WalletConnector,
    contract_address: Option<Address>,
    gas_limit: u64,
    /// The contract proxy, bound once a wallet account is available.
    proxy: Mutex<Option<Arc<dyn CharityContract>>>,
    session: SessionHandle,
}

impl DonationWorkflow {
    pub fn new(connector: WalletConnector, contract_address: Option<Address>) -> Self {
        Self {
            connector,
            contract_address,
            gas_limit: DONATION_GAS_LIMIT,
            proxy: Mutex::new(None),
            session: SessionHandle::new(),
        }
    }

    /// Creates a workflow for the configured endpoint and contract.
    pub fn from_config(config: &CharityConfig) -> Result<Self, ConfigError> {
        let host = config.wallet_host()?.map(|host| Arc::new(host) as Arc<dyn WalletHost>);
        Ok(Self::new(WalletConnector::new(host), config.contract_address)
            .with_gas_limit(config.gas_limit))
    }

    /// Overrides the gas ceiling used for donations.
    pub fn with_gas_limit(mut self, gas_limit: u64) -> Self {
        self.gas_limit = gas_limit;
        self
    }

    pub fn session(&self) -> &SessionHandle {
        &self.session
    }

    pub fn connector(&self) -> &WalletConnector {
        &self.connector
    }

    /// Whether the contract proxy is bound.
    pub fn is_bound(&self) -> bool {
        self.proxy.lock().is_some()
    }

    fn proxy(&self) -> Option<Arc<dyn CharityContract>> {
        self.proxy.lock().clone()
    }

    /// Connects the wallet and binds the contract proxy.
    ///
    /// Never fails: without a wallet the session simply stays disconnected.
    pub async fn load(&self) {
        match self.connector.connect().await {
            Ok(account) => {
                self.session.lock().account = Some(account);
                self.bind_contract();
            }
            Err(err @ WalletError::ProviderUnavailable) => error!("{err}"),
            Err(err) => error!(%err, "error connecting to blockchain"),
        }
        self.session.lock().loading = false;
    }

    fn bind_contract(&self) {
        let Some(address) = self.contract_address else {
            warn!("no contract address configured, donations are disabled");
            return;
        };
        match self.connector.contract_at(address, self.gas_limit) {
            Ok(proxy) => {
                debug!(%address, gas_limit = self.gas_limit, "bound charity contract");
                *self.proxy.lock() = Some(proxy);
            }
            Err(err) => error!(%err, "failed to bind charity contract"),
        }
    }

    /// Applies a wallet notification.
    ///
    /// An account change only replaces the active account. A network change starts a new
    /// session: the state is reset and the wallet is connected again.
    pub async fn handle_event(&self, event: WalletEvent) {
        match event {
            WalletEvent::AccountsChanged(accounts) => {
                let account = accounts.first().copied();
                info!(?account, "active account changed");
                self.session.lock().account = account;
            }
            WalletEvent::ChainChanged(chain_id) => {
                info!(chain_id, "network changed, starting a new session");
                self.proxy.lock().take();
                self.session.reset();
                self.load().await;
            }
        }
    }

    /// Selects the charity with the given id.
    pub fn select_charity(&self, id: u64) -> Result<Charity, ValidationError> {
        let charity = *catalog::find(id).ok_or(ValidationError::UnknownCharity(id))?;
        self.session.lock().selected_charity = Some(charity);
        Ok(charity)
    }

    pub fn clear_selection(&self) {
        self.session.lock().selected_charity = None;
    }

    /// Replaces the pending donation amount, in ether.
    pub fn set_amount(&self, amount: impl Into<String>) {
        self.session.lock().donation_amount = amount.into();
    }

    /// Donates the pending amount to the selected charity.
    ///
    /// On success the donation is appended to the history and the amount is cleared. On
    /// failure the amount and selection are kept so the user can retry. If the network changed
    /// while the transaction was pending, the outcome is only returned and the new session is
    /// left as it is.
    pub async fn donate(&self) -> Result<DonationRecord, DonationError> {
        let (proxy, charity, amount, from) = {
            let state = self.session.lock();
            let (Some(proxy), Some(from)) = (self.proxy(), state.account) else {
                return Err(ValidationError::NotConnected.into());
            };
            let amount = state.donation_amount.trim();
            let Some(charity) = state.selected_charity.filter(|_| !amount.is_empty()) else {
                return Err(ValidationError::MissingDonationInput.into());
            };
            (proxy, charity, amount.to_string(), from)
        };

        if !charity.trustworthy {
            warn!(charity = charity.name, "refusing to donate to an untrusted charity");
            return Err(DonationError::UntrustedCharity { name: charity.name });
        }

        let value = parse_amount(&amount).map_err(ValidationError::from)?;

        let Some(in_flight) = self.session.begin_donation() else {
            return Err(ValidationError::DonationInFlight.into());
        };
        info!(charity = charity.id, %amount, %from, "submitting donation");

        match proxy.donate(charity.id, from, value).await {
            Ok(receipt) => {
                info!(
                    tx = %receipt.transaction_hash,
                    block = ?receipt.block_number,
                    "donation confirmed"
                );
                let record = DonationRecord::now(&charity, &amount);
                let applied = in_flight.commit(|state| {
                    state.history.push(record.clone());
                    state.donation_amount.clear();
                    state.status = WorkflowStatus::Success(DONATION_SUCCESSFUL.to_string());
                });
                if !applied {
                    warn!(
                        tx = %receipt.transaction_hash,
                        "donation confirmed after the session was reset"
                    );
                }
                Ok(record)
            }
            Err(err) => {
                error!(%err, "donation error");
                in_flight.commit(|state| {
                    state.status = WorkflowStatus::Failure(DONATION_FAILED.to_string());
                });
                Err(DonationError::Submission(err))
            }
        }
    }

    /// Asks the contract whether the selected charity has received a donation.
    pub async fn check_status(&self) -> Result<bool, DonationError> {
        let Some(proxy) = self.proxy() else {
            return Err(ValidationError::NotConnected.into());
        };
        let Some(charity) = self.session.lock().selected_charity else {
            return Err(ValidationError::NoCharitySelected.into());
        };

        match proxy.has_received_donation(charity.id).await {
            Ok(received) => {
                let message = if received { DONATION_RECEIVED } else { NO_DONATIONS_RECEIVED };
                self.session.lock().status = WorkflowStatus::Success(message.to_string());
                Ok(received)
            }
            Err(err) => {
                error!(%err, "error checking donation status");
                self.session.lock().status =
                    WorkflowStatus::Failure(STATUS_CHECK_FAILED.to_string());
                Err(DonationError::Status(err))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        catalog::CHARITIES,
        error::ContractError,
        wallet::tests::{ALICE, BOB, CHARITY, DonateCall, MockContract, MockHost},
    };
    use alloy_primitives::{TxHash, U256};
    use alloy_transport::TransportErrorKind;
    use similar_asserts::assert_eq;
    use std::time::Duration;
    use tokio::sync::Notify;

    async fn connected() -> (DonationWorkflow, Arc<MockHost>) {
        connected_with(MockHost::new(vec![ALICE])).await
    }

    async fn connected_with(host: MockHost) -> (DonationWorkflow, Arc<MockHost>) {
        let host = Arc::new(host);
        let connector = WalletConnector::new(Some(host.clone() as Arc<dyn WalletHost>));
        let workflow = DonationWorkflow::new(connector, Some(CHARITY));
        workflow.load().await;
        (workflow, host)
    }

    fn half_ether() -> U256 {
        U256::from(500_000_000_000_000_000u64)
    }

    #[tokio::test]
    async fn load_connects_and_binds() {
        let (workflow, host) = connected().await;
        let state = workflow.session().snapshot();
        assert_eq!(state.account, Some(ALICE));
        assert!(!state.loading);
        assert!(workflow.is_bound());
        assert_eq!(*host.requests.lock(), 1);
    }

    #[tokio::test]
    async fn load_without_provider_resolves_disconnected() {
        let workflow = DonationWorkflow::new(WalletConnector::default(), Some(CHARITY));
        workflow.load().await;

        let state = workflow.session().snapshot();
        assert_eq!(state.account, None);
        assert!(!state.loading);
        assert!(!workflow.is_bound());

        workflow.select_charity(1).unwrap();
        workflow.set_amount("0.5");
        assert!(matches!(
            workflow.donate().await,
            Err(DonationError::Validation(ValidationError::NotConnected))
        ));
        assert!(matches!(
            workflow.check_status().await,
            Err(DonationError::Validation(ValidationError::NotConnected))
        ));
    }

    #[tokio::test]
    async fn load_denied_stays_disconnected() {
        let (workflow, host) = connected_with(MockHost::denying()).await;
        assert_eq!(workflow.session().snapshot().account, None);
        assert!(!workflow.is_bound());
        assert_eq!(host.contract.call_count(), 0);
    }

    #[tokio::test]
    async fn load_without_contract_address() {
        let connector = WalletConnector::with_host(MockHost::new(vec![ALICE]));
        let workflow = DonationWorkflow::new(connector, None);
        workflow.load().await;
        assert_eq!(workflow.session().snapshot().account, Some(ALICE));
        assert!(!workflow.is_bound());
    }

    #[tokio::test]
    async fn successful_donation() {
        let (workflow, host) = connected().await;
        workflow.select_charity(1).unwrap();
        workflow.set_amount("0.5");

        let record = workflow.donate().await.unwrap();
        assert_eq!(record.charity_name, "Hope for Education");
        assert_eq!(record.amount, "0.5");
        assert!(!record.timestamp.is_empty());

        let state = workflow.session().snapshot();
        assert_eq!(state.history, vec![record]);
        assert_eq!(state.donation_amount, "");
        assert!(!state.is_donating);
        assert_eq!(state.status, WorkflowStatus::Success(DONATION_SUCCESSFUL.to_string()));
        assert_eq!(state.selected_charity.map(|c| c.id), Some(1));

        assert_eq!(
            *host.contract.donations.lock(),
            vec![DonateCall { charity_id: 1, from: ALICE, value: half_ether() }]
        );
    }

    #[tokio::test]
    async fn each_success_appends_once() {
        let (workflow, _host) = connected().await;
        for (i, (id, amount)) in [(1, "0.5"), (2, "1"), (5, "0.25")].into_iter().enumerate() {
            workflow.select_charity(id).unwrap();
            workflow.set_amount(amount);
            workflow.donate().await.unwrap();

            let history = workflow.session().snapshot().history;
            assert_eq!(history.len(), i + 1);
            let last = history.last().unwrap();
            assert_eq!(last.amount, amount);
            assert_eq!(last.charity_name, catalog::find(id).unwrap().name);
        }
    }

    #[tokio::test]
    async fn untrusted_charity_is_blocked() {
        let (workflow, host) = connected().await;
        workflow.select_charity(3).unwrap();
        workflow.set_amount("1.0");

        let err = workflow.donate().await.unwrap_err();
        assert!(matches!(err, DonationError::UntrustedCharity { name: "Animal Welfare Org" }));
        assert!(err.is_prompt());

        let state = workflow.session().snapshot();
        assert!(state.history.is_empty());
        assert_eq!(state.donation_amount, "1.0");
        assert_eq!(state.status, WorkflowStatus::Idle);
        assert_eq!(host.contract.call_count(), 0);
    }

    #[tokio::test]
    async fn no_untrusted_charity_reaches_the_contract() {
        let (workflow, host) = connected().await;
        for charity in CHARITIES.iter().filter(|c| !c.trustworthy) {
            workflow.select_charity(charity.id).unwrap();
            workflow.set_amount("0.1");
            assert!(matches!(
                workflow.donate().await,
                Err(DonationError::UntrustedCharity { .. })
            ));
        }
        assert!(host.contract.donations.lock().is_empty());
        assert!(workflow.session().snapshot().history.is_empty());
    }

    #[tokio::test]
    async fn failed_submissions_leave_history_untouched() {
        let (workflow, host) = connected().await;
        workflow.select_charity(1).unwrap();
        workflow.set_amount("0.5");

        let failures = [
            ContractError::Rejected("User denied transaction signature.".to_string()),
            ContractError::Reverted(TxHash::random()),
            ContractError::Network(TransportErrorKind::custom_str("connection refused")),
        ];
        for failure in failures {
            host.contract.push_donate(Err(failure));
            let err = workflow.donate().await.unwrap_err();
            assert!(matches!(err, DonationError::Submission(_)));
            assert_eq!(err.to_string(), DONATION_FAILED);

            let state = workflow.session().snapshot();
            assert!(state.history.is_empty());
            assert!(!state.is_donating);
            assert_eq!(state.donation_amount, "0.5");
            assert_eq!(state.selected_charity.map(|c| c.id), Some(1));
            assert_eq!(state.status, WorkflowStatus::Failure(DONATION_FAILED.to_string()));
        }
        assert_eq!(host.contract.donations.lock().len(), 3);

        // a manual retry goes through
        workflow.donate().await.unwrap();
        assert_eq!(workflow.session().snapshot().history.len(), 1);
    }

    #[tokio::test]
    async fn missing_input_is_a_prompt() {
        let (workflow, host) = connected().await;

        let err = workflow.donate().await.unwrap_err();
        assert!(matches!(err, DonationError::Validation(ValidationError::MissingDonationInput)));
        let err = workflow.check_status().await.unwrap_err();
        assert!(matches!(err, DonationError::Validation(ValidationError::NoCharitySelected)));

        workflow.select_charity(1).unwrap();
        workflow.set_amount("   ");
        let err = workflow.donate().await.unwrap_err();
        assert!(matches!(err, DonationError::Validation(ValidationError::MissingDonationInput)));

        let bad_amounts = ["abc", "-1", "1.2.3", "0.0000000000000000001", "1.1234567890123456789"];
        for amount in bad_amounts {
            workflow.set_amount(amount);
            let err = workflow.donate().await.unwrap_err();
            assert!(matches!(err, DonationError::Validation(ValidationError::Amount(_))));
        }

        assert!(matches!(workflow.select_charity(42), Err(ValidationError::UnknownCharity(42))));
        assert_eq!(host.contract.call_count(), 0);
        assert_eq!(workflow.session().snapshot().status, WorkflowStatus::Idle);
    }

    #[tokio::test]
    async fn check_status_messages() {
        let (workflow, host) = connected().await;
        workflow.select_charity(1).unwrap();

        host.contract.push_status(Ok(true));
        assert!(workflow.check_status().await.unwrap());
        assert_eq!(
            workflow.session().snapshot().status,
            WorkflowStatus::Success(DONATION_RECEIVED.to_string())
        );

        host.contract.push_status(Ok(false));
        assert!(!workflow.check_status().await.unwrap());
        assert_eq!(
            workflow.session().snapshot().status,
            WorkflowStatus::Success(NO_DONATIONS_RECEIVED.to_string())
        );

        host.contract
            .push_status(Err(ContractError::Network(TransportErrorKind::custom_str("timeout"))));
        assert!(matches!(workflow.check_status().await, Err(DonationError::Status(_))));
        let state = workflow.session().snapshot();
        assert_eq!(state.status, WorkflowStatus::Failure(STATUS_CHECK_FAILED.to_string()));
        assert!(!state.is_donating);
        assert!(state.history.is_empty());
        assert_eq!(*host.contract.status_calls.lock(), vec![1, 1, 1]);
    }

    #[tokio::test]
    async fn account_change_keeps_session() {
        let (workflow, host) = connected().await;
        workflow.select_charity(2).unwrap();
        workflow.set_amount("1");
        workflow.donate().await.unwrap();
        workflow.set_amount("0.3");
        let before = workflow.session().snapshot();

        workflow.handle_event(WalletEvent::AccountsChanged(vec![BOB])).await;

        let after = workflow.session().snapshot();
        assert_eq!(after.account, Some(BOB));
        assert_eq!(after.selected_charity, before.selected_charity);
        assert_eq!(after.history, before.history);
        assert_eq!(after.donation_amount, "0.3");

        workflow.donate().await.unwrap();
        assert_eq!(host.contract.donations.lock().last().unwrap().from, BOB);

        workflow.handle_event(WalletEvent::AccountsChanged(vec![])).await;
        assert_eq!(workflow.session().snapshot().account, None);
    }

    #[tokio::test]
    async fn network_change_starts_new_session() {
        let (workflow, host) = connected().await;
        workflow.select_charity(1).unwrap();
        workflow.set_amount("0.5");
        workflow.donate().await.unwrap();
        workflow.set_amount("2");

        workflow.handle_event(WalletEvent::ChainChanged(11155111)).await;

        let state = workflow.session().snapshot();
        assert_eq!(state.account, Some(ALICE));
        assert!(state.history.is_empty());
        assert_eq!(state.selected_charity, None);
        assert_eq!(state.donation_amount, "");
        assert!(!state.loading);
        assert!(workflow.is_bound());
        assert_eq!(*host.requests.lock(), 2);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn one_donation_in_flight() {
        let gate = Arc::new(Notify::new());
        let contract = Arc::new(MockContract { gate: Some(gate.clone()), ..Default::default() });
        let host = MockHost::new(vec![ALICE]).with_contract(contract);
        let (workflow, host) = connected_with(host).await;
        let workflow = Arc::new(workflow);
        workflow.select_charity(1).unwrap();
        workflow.set_amount("0.5");

        let pending = tokio::spawn({
            let workflow = workflow.clone();
            async move { workflow.donate().await }
        });
        tokio::time::timeout(Duration::from_secs(5), async {
            while !workflow.session().snapshot().is_donating {
                tokio::task::yield_now().await;
            }
        })
        .await
        .unwrap();
        assert_eq!(workflow.session().snapshot().status, WorkflowStatus::Pending);

        let err = workflow.donate().await.unwrap_err();
        assert!(matches!(err, DonationError::Validation(ValidationError::DonationInFlight)));

        gate.notify_one();
        pending.await.unwrap().unwrap();

        let state = workflow.session().snapshot();
        assert!(!state.is_donating);
        assert_eq!(state.history.len(), 1);
        assert_eq!(host.contract.donations.lock().len(), 1);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn network_change_detaches_pending_donation() {
        let gate = Arc::new(Notify::new());
        let contract = Arc::new(MockContract { gate: Some(gate.clone()), ..Default::default() });
        let host = MockHost::new(vec![ALICE]).with_contract(contract);
        let (workflow, host) = connected_with(host).await;
        let workflow = Arc::new(workflow);
        workflow.select_charity(1).unwrap();
        workflow.set_amount("0.5");

        let pending = tokio::spawn({
            let workflow = workflow.clone();
            async move { workflow.donate().await }
        });
        tokio::time::timeout(Duration::from_secs(5), async {
            while host.contract.donations.lock().is_empty() {
                tokio::task::yield_now().await;
            }
        })
        .await
        .unwrap();

        workflow.handle_event(WalletEvent::ChainChanged(5)).await;
        let state = workflow.session().snapshot();
        assert!(state.is_donating);
        assert!(state.history.is_empty());
        assert_eq!(state.selected_charity, None);

        workflow.select_charity(2).unwrap();
        workflow.set_amount("1");
        let err = workflow.donate().await.unwrap_err();
        assert!(matches!(err, DonationError::Validation(ValidationError::DonationInFlight)));

        gate.notify_one();
        let record = pending.await.unwrap().unwrap();
        assert_eq!(record.charity_name, "Hope for Education");

        let state = workflow.session().snapshot();
        assert!(!state.is_donating);
        assert!(state.history.is_empty());
        assert_eq!(state.donation_amount, "1");
        assert_eq!(state.selected_charity.map(|c| c.id), Some(2));
        assert_eq!(state.status, WorkflowStatus::Idle);
        assert_eq!(host.contract.donations.lock().len(), 1);
    }
}
