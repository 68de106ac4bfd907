//! The client surface: per-resource queries and batched writes.

use crate::config::ChainConfig;
use crate::constants::{
    ATTRIBUTE_ACCOUNT_PAGE_SIZE, ATTRIBUTE_BATCH_SIZE, ATTRIBUTE_FEE_SURCHARGE,
    ATTRIBUTE_PAGE_SIZE, BALANCE_PAGE_SIZE, DELEGATION_PAGE_SIZE, VALIDATOR_PAGE_SIZE,
};
use crate::error::ClientError;
use crate::fees::FeeCalculator;
use crate::pagination::{self, PageStream};
use crate::pipeline::{self, BatchResults, BatchSubmitter};
use crate::progress::ProgressReporter;
use crate::rpc::{AttributeQuery, QueryRegistry};
use crate::sequence::SequenceAllocator;
use crate::tx::{AnyMsg, BroadcastAck, TxGateway, TxSubmitter};
use crate::types::{AccountInfo, Attribute, AttributeInput, Block, Coin, Delegation, Validator};
use std::collections::HashSet;
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::info;

/// Client for one chain and one signing identity.
///
/// Reads go through the [`QueryRegistry`]; writes go through the
/// [`TxGateway`] with sequences from a client-owned allocator, seeded from
/// chain state at construction. Keep one client per signing identity per
/// process: a second writer on the same identity diverges the sequence and
/// the chain rejects everything after the first collision.
#[derive(Debug, Clone)]
pub struct ProvenanceClient {
    config: ChainConfig,
    query: QueryRegistry,
    gateway: Arc<dyn TxGateway>,
    address: String,
    account_number: u64,
    sequence: Arc<SequenceAllocator>,
    fees: FeeCalculator,
}

impl ProvenanceClient {
    /// Builds a client, seeding the sequence allocator from the signing
    /// account's on-chain state.
    pub async fn new(
        config: ChainConfig,
        query: QueryRegistry,
        gateway: Arc<dyn TxGateway>,
        address: impl Into<String>,
    ) -> Result<Self, ClientError> {
        let address = address.into();
        let account = query.auth.account(&address).await?;
        info!(
            address = %account.address,
            account_number = account.account_number,
            sequence = account.sequence,
            chain_id = %config.chain_id,
            "initialized client"
        );

        let fees = FeeCalculator::new(config.gas_price, config.denom.clone());
        Ok(Self {
            config,
            query,
            gateway,
            address,
            account_number: account.account_number,
            sequence: Arc::new(SequenceAllocator::new(account.sequence)),
            fees,
        })
    }

    /// The signing identity's address.
    pub fn address(&self) -> &str {
        &self.address
    }

    /// The signing account's number.
    pub fn account_number(&self) -> u64 {
        self.account_number
    }

    /// The chain configuration this client was built with.
    pub fn config(&self) -> &ChainConfig {
        &self.config
    }

    /// Streams all balances held by `address`.
    pub fn balances_stream(
        &self,
        cancel: CancellationToken,
        address: impl Into<String>,
    ) -> PageStream<Coin> {
        let bank = self.query.bank.clone();
        let address = address.into();
        pagination::stream_pages(cancel, BALANCE_PAGE_SIZE, move |page| {
            let bank = bank.clone();
            let address = address.clone();
            async move { bank.all_balances(&address, page).await }
        })
    }

    /// All balances held by `address`, in provider order.
    pub async fn balances(
        &self,
        cancel: CancellationToken,
        address: impl Into<String>,
    ) -> Result<Vec<Coin>, ClientError> {
        self.balances_stream(cancel, address).collect().await
    }

    /// The balance of a single denomination. Zero if the account holds none.
    pub async fn balance(&self, address: &str, denom: &str) -> Result<Coin, ClientError> {
        let balance = self.query.bank.balance(address, denom).await?;
        Ok(balance.unwrap_or_else(|| Coin::zero(denom)))
    }

    /// Streams the attributes named `name` on `account`.
    pub fn attributes_stream(
        &self,
        cancel: CancellationToken,
        account: impl Into<String>,
        name: impl Into<String>,
    ) -> PageStream<Attribute> {
        attributes_stream(self.query.attributes.clone(), cancel, account.into(), name.into())
    }

    /// The attributes named `name` on `account`.
    pub async fn attributes(
        &self,
        cancel: CancellationToken,
        account: impl Into<String>,
        name: impl Into<String>,
    ) -> Result<Vec<Attribute>, ClientError> {
        self.attributes_stream(cancel, account, name).collect().await
    }

    /// Streams the accounts carrying the attribute `name`.
    pub fn attribute_accounts_stream(
        &self,
        cancel: CancellationToken,
        name: impl Into<String>,
    ) -> PageStream<String> {
        let attributes = self.query.attributes.clone();
        let name = name.into();
        pagination::stream_pages(cancel, ATTRIBUTE_ACCOUNT_PAGE_SIZE, move |page| {
            let attributes = attributes.clone();
            let name = name.clone();
            async move { attributes.attribute_accounts(&name, page).await }
        })
    }

    /// All accounts carrying the attribute `name`.
    pub async fn attribute_accounts(
        &self,
        cancel: CancellationToken,
        name: impl Into<String>,
    ) -> Result<Vec<String>, ClientError> {
        self.attribute_accounts_stream(cancel, name).collect().await
    }

    /// Streams the validator set.
    pub fn validators_stream(&self, cancel: CancellationToken) -> PageStream<Validator> {
        let staking = self.query.staking.clone();
        pagination::stream_pages(cancel, VALIDATOR_PAGE_SIZE, move |page| {
            let staking = staking.clone();
            async move { staking.validators(page).await }
        })
    }

    /// The full validator set.
    pub async fn validators(&self, cancel: CancellationToken) -> Result<Vec<Validator>, ClientError> {
        self.validators_stream(cancel).collect().await
    }

    /// Streams the delegations made by `delegator`.
    pub fn delegations_stream(
        &self,
        cancel: CancellationToken,
        delegator: impl Into<String>,
    ) -> PageStream<Delegation> {
        let staking = self.query.staking.clone();
        let delegator = delegator.into();
        pagination::stream_pages(cancel, DELEGATION_PAGE_SIZE, move |page| {
            let staking = staking.clone();
            let delegator = delegator.clone();
            async move { staking.delegations(&delegator, page).await }
        })
    }

    /// All delegations made by `delegator`.
    pub async fn delegations(
        &self,
        cancel: CancellationToken,
        delegator: impl Into<String>,
    ) -> Result<Vec<Delegation>, ClientError> {
        self.delegations_stream(cancel, delegator).collect().await
    }

    /// The block at the given height.
    pub async fn block_by_height(&self, height: u64) -> Result<Block, ClientError> {
        Ok(self.query.node.block_by_height(height).await?)
    }

    /// The most recent block.
    pub async fn latest_block(&self) -> Result<Block, ClientError> {
        Ok(self.query.node.latest_block().await?)
    }

    /// Account number and current sequence for `address`.
    pub async fn account(&self, address: &str) -> Result<AccountInfo, ClientError> {
        Ok(self.query.auth.account(address).await?)
    }

    /// Writes attributes in bounded batches.
    ///
    /// Each input is checked for pre-existence (both against earlier inputs
    /// in this run and against chain state); existing targets are reported as
    /// [`ClientError::AttributeExists`] and skipped. Eligible inputs are
    /// converted to wire messages and submitted in batches of
    /// [`ATTRIBUTE_BATCH_SIZE`], each batch simulated, signed and broadcast
    /// exactly once with the attribute fee surcharge applied per message. A
    /// failed batch is reported and does not stop later batches.
    ///
    /// The caller must drain both returned channels until they close, or the
    /// submission tasks leak.
    pub fn add_attributes(
        &self,
        cancel: CancellationToken,
        attrs: Vec<AttributeInput>,
    ) -> BatchResults<BroadcastAck> {
        self.spawn_attribute_pipeline(cancel, attrs, None)
    }

    /// [`add_attributes`](Self::add_attributes) with progress reporting.
    pub fn add_attributes_with_progress(
        &self,
        cancel: CancellationToken,
        attrs: Vec<AttributeInput>,
        progress: ProgressReporter,
    ) -> BatchResults<BroadcastAck> {
        self.spawn_attribute_pipeline(cancel, attrs, Some(progress))
    }

    fn spawn_attribute_pipeline(
        &self,
        cancel: CancellationToken,
        attrs: Vec<AttributeInput>,
        progress: Option<ProgressReporter>,
    ) -> BatchResults<BroadcastAck> {
        let (msg_tx, msg_rx) = mpsc::channel(ATTRIBUTE_BATCH_SIZE);
        let (err_tx, err_rx) = mpsc::channel(ATTRIBUTE_BATCH_SIZE);

        let mut submitter = TxSubmitter::new(
            self.gateway.clone(),
            self.fees.clone(),
            self.sequence.clone(),
            ATTRIBUTE_FEE_SURCHARGE,
        );
        if let Some(progress) = &progress {
            submitter = submitter.with_progress(progress.clone());
        }
        let acks = pipeline::spawn_batch_collector(
            cancel.clone(),
            msg_rx,
            ATTRIBUTE_BATCH_SIZE,
            err_tx.clone(),
            submitter,
        );

        let attributes = self.query.attributes.clone();
        let gateway = self.gateway.clone();
        let owner = self.address.clone();

        // Filter/convert stage. Never blocks on signing or broadcasting;
        // the bounded message channel is the backpressure point. On
        // cancellation it exits silently and lets the collector report the
        // single `Cancelled` error for the run.
        tokio::spawn(async move {
            if let Some(progress) = &progress {
                progress.set_current(format!("adding {} attributes", attrs.len()));
            }

            let mut seen: HashSet<(String, String)> = HashSet::new();
            for attr in attrs {
                if let Some(progress) = &progress {
                    progress.increment();
                    progress.set_current(format!("checking {} on {}", attr.name, attr.account));
                }

                // The remote check cannot catch a duplicate submitted twice
                // in one run: the first copy is still in flight when the
                // second is checked.
                if !seen.insert((attr.name.clone(), attr.account.clone())) {
                    let conflict =
                        ClientError::AttributeExists { name: attr.name, account: attr.account };
                    if err_tx.send(conflict).await.is_err() {
                        return;
                    }
                    continue;
                }

                let existing = attributes_stream(
                    attributes.clone(),
                    cancel.clone(),
                    attr.account.clone(),
                    attr.name.clone(),
                )
                .collect()
                .await;
                let existing = match existing {
                    Ok(existing) => existing,
                    Err(err) if err.is_cancelled() => return,
                    Err(err) => {
                        if err_tx.send(err).await.is_err() {
                            return;
                        }
                        continue;
                    }
                };
                if !existing.is_empty() {
                    let conflict =
                        ClientError::AttributeExists { name: attr.name, account: attr.account };
                    if err_tx.send(conflict).await.is_err() {
                        return;
                    }
                    continue;
                }

                let msg = gateway.attribute_msg(&attr, &owner);
                tokio::select! {
                    biased;
                    _ = cancel.cancelled() => return,
                    sent = msg_tx.send(msg) => {
                        if sent.is_err() {
                            return;
                        }
                    }
                }
            }
        });

        BatchResults { acks, errors: err_rx }
    }

    /// Signs and broadcasts one batch of messages immediately.
    ///
    /// Allocates a single sequence number and applies `surcharge_per_msg` on
    /// top of the gas-derived fee.
    ///
    /// # Panics
    ///
    /// Panics if `msgs` is empty.
    pub async fn broadcast_messages(
        &self,
        msgs: Vec<AnyMsg>,
        surcharge_per_msg: u128,
    ) -> Result<BroadcastAck, ClientError> {
        assert!(!msgs.is_empty(), "cannot broadcast an empty batch");
        let mut submitter = TxSubmitter::new(
            self.gateway.clone(),
            self.fees.clone(),
            self.sequence.clone(),
            surcharge_per_msg,
        );
        submitter.submit(msgs).await
    }
}

/// Attribute lookup as a page stream, callable from spawned stages.
fn attributes_stream(
    attributes: Arc<dyn AttributeQuery>,
    cancel: CancellationToken,
    account: String,
    name: String,
) -> PageStream<Attribute> {
    pagination::stream_pages(cancel, ATTRIBUTE_PAGE_SIZE, move |page| {
        let attributes = attributes.clone();
        let account = account.clone();
        let name = name.clone();
        async move { attributes.attributes(&account, &name, page).await }
    })
}
