//! Deploys the charity contract and reports its address.

use crate::error::DeployError;
use alloy_network::{ReceiptResponse, TransactionBuilder};
use alloy_primitives::{Address, Bytes, hex};
use alloy_provider::Provider;
use alloy_rpc_types::TransactionRequest;
use serde_json::Value;
use std::{fs, path::Path};

/// Reads creation bytecode from `source`.
///
/// `source` is either a path to a compiler artifact or the hex encoded bytecode itself.
pub fn load_bytecode(source: &str) -> Result<Bytes, DeployError> {
    let path = Path::new(source);
    if path.is_file() {
        return artifact_bytecode(&fs::read_to_string(path)?);
    }
    decode_bytecode(source)
}

/// Extracts the creation bytecode from a Hardhat or Foundry artifact.
///
/// Hardhat stores it as `"bytecode": "0x..."`, Foundry as `"bytecode": { "object": "0x..." }`.
pub fn artifact_bytecode(artifact: &str) -> Result<Bytes, DeployError> {
    let artifact: Value = serde_json::from_str(artifact)?;
    let code = match &artifact["bytecode"] {
        Value::String(code) => code.as_str(),
        Value::Object(bytecode) => {
            bytecode.get("object").and_then(Value::as_str).ok_or(DeployError::MissingBytecode)?
        }
        _ => return Err(DeployError::MissingBytecode),
    };
    decode_bytecode(code)
}

fn decode_bytecode(code: &str) -> Result<Bytes, DeployError> {
    let code = hex::decode(code.trim())?;
    if code.is_empty() {
        return Err(DeployError::MissingBytecode);
    }
    Ok(code.into())
}

/// Sends a CREATE transaction with `bytecode` and waits for the contract address.
///
/// `from` selects the sender when the node signs; with a local signer it may be left empty.
pub async fn deploy<P: Provider>(
    provider: &P,
    from: Option<Address>,
    bytecode: Bytes,
) -> Result<Address, DeployError> {
    let mut tx = TransactionRequest::default().with_deploy_code(bytecode);
    if let Some(from) = from {
        tx = tx.with_from(from);
    }

    let pending = provider.send_transaction(tx).await?;
    let tx_hash = *pending.tx_hash();
    info!(%tx_hash, "deployment transaction sent");

    let receipt = pending.get_receipt().await?;
    if !receipt.status() {
        return Err(DeployError::Reverted(tx_hash));
    }
    let address = receipt.contract_address().ok_or(DeployError::MissingAddress(tx_hash))?;
    info!(%address, "charity contract deployed");
    Ok(address)
}
