//! Submission client for the token contract

use serde::de::DeserializeOwned;

use crate::client::config::ClientConfig;
use crate::client::retry::RetryPolicy;
use crate::ledger::transaction::{Invocation, Operation};
use crate::traits::LedgerGateway;
use crate::types::*;

/// Typed front end to the token contract.
///
/// Owns one gateway connection for its whole lifetime. Reads are evaluated
/// directly; writes are submitted through the configured [`RetryPolicy`].
pub struct TokenClient<G: LedgerGateway> {
    gateway: G,
    retry: RetryPolicy,
    identity: String,
}

impl<G: LedgerGateway> TokenClient<G> {
    /// Create a client over an already connected gateway
    pub fn new(config: &ClientConfig, gateway: G) -> LedgerResult<Self> {
        config.validate()?;
        Ok(Self {
            gateway,
            retry: config.retry.clone(),
            identity: format!("{}@{}", config.identity.name, config.identity.msp_id),
        })
    }

    pub fn retry_policy(&self) -> &RetryPolicy {
        &self.retry
    }

    pub fn gateway(&self) -> &G {
        &self.gateway
    }

    /// Release the gateway connection
    pub async fn close(self) -> LedgerResult<()> {
        tracing::debug!(identity = %self.identity, "closing gateway connection");
        self.gateway.close().await
    }

    /// Register a client with an initial balance
    pub async fn add_client(&self, id: &str, init_amount: u64) -> LedgerResult<u64> {
        self.call(Operation::AddClient, &[id.to_string(), init_amount.to_string()])
            .await
    }

    pub async fn get_tokens(&self, id: &str) -> LedgerResult<u64> {
        self.call(Operation::GetTokens, &[id.to_string()]).await
    }

    /// Overwrite a client's balance
    pub async fn put_tokens(&self, id: &str, new_amount: u64) -> LedgerResult<u64> {
        self.call(Operation::PutTokens, &[id.to_string(), new_amount.to_string()])
            .await
    }

    pub async fn delete_client(&self, id: &str) -> LedgerResult<()> {
        let _: Option<u64> = self.call(Operation::DeleteClient, &[id.to_string()]).await?;
        Ok(())
    }

    pub async fn client_exists(&self, id: &str) -> LedgerResult<bool> {
        self.call(Operation::ClientExists, &[id.to_string()]).await
    }

    /// Earn `ceil(len(data) / 10)` tokens; returns the new balance
    pub async fn contribute_resource(&self, id: &str, data: &str) -> LedgerResult<u64> {
        self.call(
            Operation::ContributeResource,
            &[id.to_string(), data.to_string()],
        )
        .await
    }

    /// Spend `ceil(required_length / 10)` tokens; returns the new balance
    pub async fn consume_resource(&self, id: &str, required_length: u64) -> LedgerResult<u64> {
        self.call(
            Operation::ConsumeResource,
            &[id.to_string(), required_length.to_string()],
        )
        .await
    }

    /// Every registered client and its balance, ordered by client ID
    pub async fn get_all_tokens(&self) -> LedgerResult<Vec<Account>> {
        self.call(Operation::GetAllTokens, &[]).await
    }

    async fn call<T: DeserializeOwned>(&self, op: Operation, args: &[String]) -> LedgerResult<T> {
        let bytes = match op.invocation() {
            Invocation::Evaluate => self.gateway.evaluate(op.name(), args).await?,
            Invocation::Submit => {
                self.retry
                    .run(op, || {
                        tracing::debug!(identity = %self.identity, operation = %op, "submitting");
                        self.gateway.submit(op.name(), args)
                    })
                    .await?
            }
        };
        Ok(serde_json::from_slice(&bytes)?)
    }
}
