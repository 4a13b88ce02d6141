//! Typed access to the deployed charity contract.
//!
//! Everything that depends on the contract's numeric conventions lives here: the conversion from
//! a human-entered ether amount to wei and the gas ceiling for donations.

use crate::error::{AmountError, ContractError};
use alloy_network::ReceiptResponse;
use alloy_primitives::{
    Address, TxHash, U256,
    utils::{ParseUnits, parse_units},
};
use alloy_provider::DynProvider;
use alloy_sol_types::sol;
use async_trait::async_trait;
use std::fmt;

sol! {
    #[sol(rpc)]
    interface ICharity {
        function donate(uint256 charityId) external payable;
        function hasReceivedDonation(uint256 charityId) external view returns (bool);
    }
}

/// Gas ceiling attached to every donation.
pub const DONATION_GAS_LIMIT: u64 = 3_000_000;

/// Decimal places of one ether in wei.
const ETHER_DECIMALS: usize = 18;

/// Converts a decimal ether amount such as `"0.5"` into wei.
///
/// Surrounding whitespace is ignored. Negative values are rejected instead of being folded into
/// their absolute value, and amounts finer than one wei are rejected instead of truncated.
pub fn parse_amount(input: &str) -> Result<U256, AmountError> {
    let amount = input.trim();
    if amount.is_empty() {
        return Err(AmountError::Empty);
    }
    if amount.starts_with('-') {
        return Err(AmountError::Negative(amount.to_string()));
    }
    if amount.split_once('.').is_some_and(|(_, fraction)| fraction.len() > ETHER_DECIMALS) {
        return Err(AmountError::TooPrecise(amount.to_string()));
    }
    match parse_units(amount, "ether") {
        Ok(ParseUnits::U256(wei)) => Ok(wei),
        Ok(ParseUnits::I256(_)) => Err(AmountError::Negative(amount.to_string())),
        Err(source) => Err(AmountError::Invalid { input: amount.to_string(), source }),
    }
}

/// What the proxy reports for a mined donation.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DonationReceipt {
    pub transaction_hash: TxHash,
    pub block_number: Option<u64>,
    pub gas_used: u64,
}

/// The method contract of the charity contract.
///
/// `donate` is a transaction: it is signed by `from`, pays `value` wei and resolves once the
/// transaction is mined. `has_received_donation` is a read-only call.
#[async_trait]
pub trait CharityContract: fmt::Debug + Send + Sync {
    /// The address the proxy is bound to.
    fn address(&self) -> Address;

    async fn donate(
        &self,
        charity_id: u64,
        from: Address,
        value: U256,
    ) -> Result<DonationReceipt, ContractError>;

    async fn has_received_donation(&self, charity_id: u64) -> Result<bool, ContractError>;
}

/// [`CharityContract`] backed by an alloy provider.
#[derive(Clone, Debug)]
pub struct RpcCharityContract {
    instance: ICharity::ICharityInstance<DynProvider>,
    gas_limit: u64,
}

impl RpcCharityContract {
    pub fn new(address: Address, provider: DynProvider) -> Self {
        Self { instance: ICharity::new(address, provider), gas_limit: DONATION_GAS_LIMIT }
    }

    /// Overrides the gas ceiling used for donations.
    pub fn with_gas_limit(mut self, gas_limit: u64) -> Self {
        self.gas_limit = gas_limit;
        self
    }
}

#[async_trait]
impl CharityContract for RpcCharityContract {
    fn address(&self) -> Address {
        *self.instance.address()
    }

    async fn donate(
        &self,
        charity_id: u64,
        from: Address,
        value: U256,
    ) -> Result<DonationReceipt, ContractError> {
        let pending = self
            .instance
            .donate(U256::from(charity_id))
            .from(from)
            .value(value)
            .gas(self.gas_limit)
            .send()
            .await?;
        let tx_hash = *pending.tx_hash();
        debug!(%tx_hash, charity_id, "donation submitted, waiting for receipt");

        let receipt = pending.get_receipt().await?;
        if !receipt.status() {
            return Err(ContractError::Reverted(tx_hash));
        }
        Ok(DonationReceipt {
            transaction_hash: tx_hash,
            block_number: receipt.block_number(),
            gas_used: receipt.gas_used(),
        })
    }

    async fn has_received_donation(&self, charity_id: u64) -> Result<bool, ContractError> {
        Ok(self.instance.hasReceivedDonation(U256::from(charity_id)).call().await?)
    }
}
