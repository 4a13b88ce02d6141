use alloy_primitives::{TxHash, hex::FromHexError, utils::UnitsError};
use alloy_provider::PendingTransactionError;
use alloy_transport::{TransportError, TransportErrorKind};

/// The error code wallets return when the user declines a request, see EIP-1193.
pub const USER_REJECTED_REQUEST: i64 = 4001;

/// Returns the wallet's rejection message if `err` is a user rejection.
pub(crate) fn user_rejection(err: &TransportError) -> Option<String> {
    err.as_error_resp()
        .filter(|payload| payload.code == USER_REJECTED_REQUEST)
        .map(|payload| payload.message.to_string())
}

/// Errors raised while acquiring an account from the wallet host.
#[derive(Debug, thiserror::Error)]
pub enum WalletError {
    #[error("Ethereum provider not found. Configure an RPC endpoint to connect a wallet.")]
    ProviderUnavailable,
    #[error("account access was denied by the wallet")]
    AuthorizationDenied,
    #[error(transparent)]
    Network(TransportError),
}

impl From<TransportError> for WalletError {
    fn from(err: TransportError) -> Self {
        if user_rejection(&err).is_some() { Self::AuthorizationDenied } else { Self::Network(err) }
    }
}

/// Errors raised by the contract proxy.
#[derive(Debug, thiserror::Error)]
pub enum ContractError {
    #[error("transaction rejected by the signer: {0}")]
    Rejected(String),
    #[error("transaction {0} reverted")]
    Reverted(TxHash),
    #[error(transparent)]
    Network(TransportError),
}

impl From<TransportError> for ContractError {
    fn from(err: TransportError) -> Self {
        match user_rejection(&err) {
            Some(reason) => Self::Rejected(reason),
            None => Self::Network(err),
        }
    }
}

impl From<PendingTransactionError> for ContractError {
    fn from(err: PendingTransactionError) -> Self {
        match err {
            PendingTransactionError::TransportError(err) => err.into(),
            err => Self::Network(TransportErrorKind::custom(err)),
        }
    }
}

impl From<alloy_contract::Error> for ContractError {
    fn from(err: alloy_contract::Error) -> Self {
        match err {
            alloy_contract::Error::TransportError(err) => err.into(),
            alloy_contract::Error::PendingTransactionError(err) => err.into(),
            err => Self::Network(TransportErrorKind::custom(err)),
        }
    }
}

/// A donation amount that cannot be converted to wei.
#[derive(Debug, thiserror::Error)]
pub enum AmountError {
    #[error("donation amount is empty")]
    Empty,
    #[error("donation amount must not be negative: {0}")]
    Negative(String),
    #[error("donation amount {0} has more than 18 decimal places")]
    TooPrecise(String),
    #[error("invalid donation amount {input:?}: {source}")]
    Invalid {
        input: String,
        #[source]
        source: UnitsError,
    },
}

/// Input problems that stop a donation or status check before any contract call.
#[derive(Debug, thiserror::Error)]
pub enum ValidationError {
    #[error("Wallet is not connected or no contract is configured.")]
    NotConnected,
    #[error("Please select a charity and enter a valid donation amount.")]
    MissingDonationInput,
    #[error("Please select a charity to check its donation status.")]
    NoCharitySelected,
    #[error("no charity with id {0}")]
    UnknownCharity(u64),
    #[error("A donation is already being processed.")]
    DonationInFlight,
    #[error(transparent)]
    Amount(#[from] AmountError),
}

/// The outcome of a donation or status check that did not complete.
///
/// Every variant is reported to the user; none of them end the session.
#[derive(Debug, thiserror::Error)]
pub enum DonationError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error("Warning: The selected charity is not trustworthy. Proceed with caution.")]
    UntrustedCharity { name: &'static str },
    #[error("Donation failed. Please try again.")]
    Submission(#[source] ContractError),
    #[error("Error checking status")]
    Status(#[source] ContractError),
}

impl DonationError {
    /// Whether this is a prompt for the user rather than a failed operation.
    pub const fn is_prompt(&self) -> bool {
        matches!(self, Self::Validation(_) | Self::UntrustedCharity { .. })
    }
}

/// Errors raised while deploying the charity contract.
#[derive(Debug, thiserror::Error)]
pub enum DeployError {
    #[error("failed to read artifact: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse artifact: {0}")]
    Json(#[from] serde_json::Error),
    #[error("artifact has no creation bytecode")]
    MissingBytecode,
    #[error("invalid creation bytecode: {0}")]
    Hex(#[from] FromHexError),
    #[error("deployment transaction {0} reverted")]
    Reverted(TxHash),
    #[error("receipt of deployment transaction {0} has no contract address")]
    MissingAddress(TxHash),
    #[error(transparent)]
    Network(#[from] TransportError),
    #[error(transparent)]
    Pending(#[from] PendingTransactionError),
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy_json_rpc::ErrorPayload;
    use alloy_transport::RpcError;
    use std::borrow::Cow;

    fn error_resp(code: i64, message: &'static str) -> TransportError {
        RpcError::ErrorResp(ErrorPayload { code, message: Cow::Borrowed(message), data: None })
    }

    #[test]
    fn classifies_user_rejection() {
        let err = ContractError::from(error_resp(4001, "User denied transaction signature."));
        assert!(matches!(err, ContractError::Rejected(reason) if reason.contains("denied")));

        let err = ContractError::from(error_resp(-32000, "insufficient funds"));
        assert!(matches!(err, ContractError::Network(_)));

        let err = WalletError::from(error_resp(4001, "User rejected the request."));
        assert!(matches!(err, WalletError::AuthorizationDenied));
    }

    #[test]
    fn prompts_are_not_failures() {
        assert!(DonationError::from(ValidationError::NoCharitySelected).is_prompt());
        assert!(DonationError::UntrustedCharity { name: "Fake Fundraisers" }.is_prompt());
        let failed = DonationError::Submission(ContractError::Rejected("no".into()));
        assert!(!failed.is_prompt());
        assert_eq!(failed.to_string(), "Donation failed. Please try again.");
    }
}
