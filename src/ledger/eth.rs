//! EVM Ledger Implementation
//!
//! Talks to the tip contract through a JSON-RPC node (Base, Anvil, Geth...).
//! Reads use `eth_call`; transfers are signed locally as EIP-1559
//! transactions and broadcast with `eth_sendRawTransaction`.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::time::Duration;
use tokio::time::Instant;
use tracing::{debug, info, warn};

use super::abi::{decode_uint, encode_balance_of, encode_transfer};
use super::signer::{Address, Eip1559Tx, TxSigner, parse_address};
use super::{Ledger, LedgerError, Receipt, SubmitError};
use crate::config::LedgerConfig;
use crate::core_types::{AccountId, Amount, TxHandle};

/// Serializes as `[]`; some nodes reject `null` params
const NO_PARAMS: [u8; 0] = [];

/// EVM ledger connected to a node via JSON-RPC over HTTP
pub struct EthLedger {
    client: reqwest::Client,
    rpc_url: String,
    chain_id: u64,
    contract: Address,
    signer: TxSigner,
    request_timeout: Duration,
    required_confirmations: u64,
    poll_interval: Duration,
}

/// JSON-RPC request structure
#[derive(Serialize)]
struct JsonRpcRequest<T> {
    jsonrpc: &'static str,
    method: &'static str,
    params: T,
    id: u64,
}

/// JSON-RPC response structure
#[derive(Deserialize)]
struct JsonRpcResponse<T> {
    result: Option<T>,
    error: Option<JsonRpcError>,
}

#[derive(Deserialize)]
struct JsonRpcError {
    code: i64,
    message: String,
}

/// Only the block field the fee calculation needs
#[derive(Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
struct EthBlockHeader {
    #[serde(default)]
    base_fee_per_gas: Option<String>,
}

/// Transaction receipt from RPC
#[derive(Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
struct EthReceipt {
    block_number: Option<String>,
    status: Option<String>,
}

impl EthLedger {
    /// Create the adapter without touching the network
    pub fn new(config: &LedgerConfig, signer: TxSigner) -> Result<Self, LedgerError> {
        let client = reqwest::Client::builder()
            .timeout(config.request_timeout())
            .build()
            .map_err(|e| {
                LedgerError::RpcConnection(format!("Failed to create HTTP client: {}", e))
            })?;

        Ok(Self {
            client,
            rpc_url: config.rpc_url.clone(),
            chain_id: config.chain_id,
            contract: parse_address(&config.contract_address)?,
            signer,
            request_timeout: config.request_timeout(),
            required_confirmations: config.required_confirmations.max(1),
            poll_interval: config.poll_interval(),
        })
    }

    /// Create the adapter and check the node serves the configured chain
    pub async fn connect(config: &LedgerConfig, signer: TxSigner) -> Result<Self, LedgerError> {
        let ledger = Self::new(config, signer)?;
        let connected = ledger.node_chain_id().await?;
        if connected != ledger.chain_id {
            return Err(LedgerError::ChainMismatch {
                connected,
                expected: ledger.chain_id,
            });
        }
        info!(
            rpc = %ledger.rpc_url,
            chain_id = connected,
            signer = %ledger.signer.address_hex(),
            "Connected to ledger"
        );
        Ok(ledger)
    }

    pub fn signer_address(&self) -> String {
        self.signer.address_hex()
    }

    /// Make a JSON-RPC call whose result may legitimately be `null`
    async fn rpc_call_optional<T, R>(
        &self,
        method: &'static str,
        params: T,
    ) -> Result<Option<R>, LedgerError>
    where
        T: Serialize,
        R: for<'de> Deserialize<'de>,
    {
        let request = JsonRpcRequest {
            jsonrpc: "2.0",
            method,
            params,
            id: 1,
        };

        let response = self
            .client
            .post(&self.rpc_url)
            .json(&request)
            .send()
            .await
            .map_err(|e| self.classify_transport(method, e))?;

        let rpc_response: JsonRpcResponse<R> = response.json().await.map_err(|e| {
            LedgerError::Transport(format!("{}: failed to parse response: {}", method, e))
        })?;

        if let Some(error) = rpc_response.error {
            return Err(LedgerError::Rpc {
                code: error.code,
                message: error.message,
            });
        }

        Ok(rpc_response.result)
    }

    /// Make a JSON-RPC call that must return a result
    async fn rpc_call<T, R>(&self, method: &'static str, params: T) -> Result<R, LedgerError>
    where
        T: Serialize,
        R: for<'de> Deserialize<'de>,
    {
        self.rpc_call_optional(method, params)
            .await?
            .ok_or_else(|| LedgerError::Decode(format!("{}: no result in RPC response", method)))
    }

    fn classify_transport(&self, method: &str, e: reqwest::Error) -> LedgerError {
        if e.is_connect() {
            LedgerError::RpcConnection(format!("{}: {}", method, e))
        } else if e.is_timeout() {
            LedgerError::Timeout(self.request_timeout)
        } else {
            LedgerError::Transport(format!("{}: {}", method, e))
        }
    }

    async fn node_chain_id(&self) -> Result<u64, LedgerError> {
        let result: String = self.rpc_call("eth_chainId", NO_PARAMS).await?;
        parse_quantity(&result).map(|v| v as u64)
    }

    async fn pending_nonce(&self) -> Result<u64, LedgerError> {
        let result: String = self
            .rpc_call(
                "eth_getTransactionCount",
                (self.signer.address_hex(), "pending"),
            )
            .await?;
        parse_quantity(&result).map(|v| v as u64)
    }

    /// `(max_priority_fee, max_fee)` using `max_fee = 2 * base_fee + priority`
    async fn fees(&self) -> Result<(u128, u128), LedgerError> {
        let priority: String = self.rpc_call("eth_maxPriorityFeePerGas", NO_PARAMS).await?;
        let priority = parse_quantity(&priority)?;

        let block: EthBlockHeader = self
            .rpc_call("eth_getBlockByNumber", ("latest", false))
            .await?;
        let base_fee = match block.base_fee_per_gas {
            Some(ref fee) => parse_quantity(fee)?,
            None => 0,
        };

        let max_fee = base_fee
            .checked_mul(2)
            .and_then(|v| v.checked_add(priority))
            .ok_or_else(|| LedgerError::Decode("fee overflow".into()))?;
        Ok((priority, max_fee))
    }

    async fn estimate_gas(&self, data: &[u8]) -> Result<u64, LedgerError> {
        let call = json!({
            "from": self.signer.address_hex(),
            "to": hex_bytes(&self.contract),
            "data": hex_bytes(data),
        });
        let result: String = self.rpc_call("eth_estimateGas", [call]).await?;
        let estimate = parse_quantity(&result)? as u64;
        // 20% headroom
        Ok(estimate.saturating_mul(6) / 5)
    }

    async fn block_number(&self) -> Result<u64, LedgerError> {
        let result: String = self.rpc_call("eth_blockNumber", NO_PARAMS).await?;
        parse_quantity(&result).map(|v| v as u64)
    }

    /// One receipt poll: `Some` once the receipt is deep enough
    async fn poll_receipt(&self, tx: &TxHandle) -> Result<Option<Receipt>, LedgerError> {
        let receipt: Option<EthReceipt> = self
            .rpc_call_optional("eth_getTransactionReceipt", [tx.to_string()])
            .await?;

        let Some(receipt) = receipt else {
            return Ok(None);
        };
        // Pending receipts (some nodes) have no block yet
        let Some(ref block) = receipt.block_number else {
            return Ok(None);
        };
        let block_number = parse_quantity(block)? as u64;

        if self.required_confirmations > 1 {
            let head = self.block_number().await?;
            let depth = head.saturating_sub(block_number) + 1;
            if depth < self.required_confirmations {
                debug!(tx = %tx, depth, "Receipt found, waiting for more confirmations");
                return Ok(None);
            }
        }

        Ok(Some(Receipt {
            tx: *tx,
            block_number,
            success: receipt.status.as_deref() == Some("0x1"),
        }))
    }
}

#[async_trait]
impl Ledger for EthLedger {
    fn name(&self) -> &'static str {
        "evm"
    }

    async fn read_balance(&self, account: AccountId) -> Result<Amount, LedgerError> {
        let call = json!({
            "to": hex_bytes(&self.contract),
            "data": hex_bytes(&encode_balance_of(account)),
        });
        let result: String = self.rpc_call("eth_call", (call, "latest")).await?;
        let raw = hex::decode(result.trim_start_matches("0x"))
            .map_err(|e| LedgerError::Decode(format!("eth_call result is not hex: {}", e)))?;
        decode_uint(&raw)
    }

    async fn submit_transfer(
        &self,
        from: AccountId,
        to: AccountId,
        amount: Amount,
    ) -> Result<TxHandle, SubmitError> {
        let data = encode_transfer(from, to, amount);

        // Everything up to the broadcast is local or read-only: failures mean nothing was sent
        let nonce = self.pending_nonce().await.map_err(SubmitError::NotSent)?;
        let (max_priority_fee_per_gas, max_fee_per_gas) =
            self.fees().await.map_err(SubmitError::NotSent)?;
        let gas_limit = self.estimate_gas(&data).await.map_err(SubmitError::NotSent)?;

        let tx = Eip1559Tx {
            chain_id: self.chain_id,
            nonce,
            max_priority_fee_per_gas,
            max_fee_per_gas,
            gas_limit,
            to: self.contract,
            value: 0,
            data,
        };
        let signed = self.signer.sign(&tx);
        debug!(
            tx = %signed.hash,
            nonce,
            gas_limit,
            max_fee_per_gas,
            "Broadcasting transfer"
        );

        match self
            .rpc_call::<_, String>("eth_sendRawTransaction", [signed.raw_hex()])
            .await
        {
            Ok(returned) => {
                if TxHandle::from_hex(&returned) != Some(signed.hash) {
                    warn!(
                        local = %signed.hash,
                        node = %returned,
                        "Node returned a different tx hash, keeping the local one"
                    );
                }
                Ok(signed.hash)
            }
            // Explicit refusal or unreachable node: the tx never entered the mempool
            Err(e @ (LedgerError::Rpc { .. } | LedgerError::RpcConnection(_))) => {
                Err(SubmitError::NotSent(e))
            }
            Err(e) => Err(SubmitError::Unknown {
                tx: Some(signed.hash),
                source: e,
            }),
        }
    }

    async fn await_confirmation(
        &self,
        tx: &TxHandle,
        timeout: Duration,
    ) -> Result<Receipt, LedgerError> {
        let deadline = Instant::now() + timeout;
        let mut last_error = None;

        loop {
            match self.poll_receipt(tx).await {
                Ok(Some(receipt)) => return Ok(receipt),
                Ok(None) => {}
                Err(e) => {
                    warn!(tx = %tx, error = %e, "Receipt poll failed (will retry)");
                    last_error = Some(e);
                }
            }

            if Instant::now() + self.poll_interval > deadline {
                return Err(last_error.unwrap_or(LedgerError::Timeout(timeout)));
            }
            tokio::time::sleep(self.poll_interval).await;
        }
    }
}

fn hex_bytes(bytes: &[u8]) -> String {
    format!("0x{}", hex::encode(bytes))
}

/// Parse a JSON-RPC hex quantity (`"0x1a"`)
fn parse_quantity(s: &str) -> Result<u128, LedgerError> {
    let digits = s.trim_start_matches("0x");
    if digits.is_empty() {
        return Ok(0);
    }
    u128::from_str_radix(digits, 16)
        .map_err(|e| LedgerError::Decode(format!("invalid quantity {}: {}", s, e)))
}
