//! Transaction gateway seam and batch submission.
//!
//! The gateway owns everything this crate treats as opaque: the message
//! schema, proto encoding, key material and the broadcast transport. The
//! client hands it ordered message batches, a sequence number and a fee, and
//! gets back signed bytes and broadcast acknowledgements.

use crate::error::{ClientError, TransportError};
use crate::fees::{Fee, FeeCalculator};
use crate::pipeline::BatchSubmitter;
use crate::progress::ProgressReporter;
use crate::sequence::SequenceAllocator;
use crate::types::AttributeInput;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use tracing::debug;

/// An opaque wire message.
///
/// The client never inspects the payload beyond counting messages for batch
/// sizing and fee purposes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnyMsg {
    /// Proto type URL identifying the message kind.
    pub type_url: String,
    /// Encoded message bytes.
    pub value: Vec<u8>,
}

impl AnyMsg {
    /// Creates a message from its type URL and encoded bytes.
    pub fn new(type_url: impl Into<String>, value: Vec<u8>) -> Self {
        Self { type_url: type_url.into(), value }
    }
}

/// A fully signed, broadcast-ready transaction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignedTx(pub Vec<u8>);

/// Acknowledgement of a broadcast transaction.
///
/// One acknowledgement per batch, never per message; callers needing
/// per-message attribution must track which intents went into which batch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BroadcastAck {
    /// Transaction hash.
    pub txhash: String,
    /// Chain result code. Zero means accepted.
    pub code: u32,
    /// Raw log returned by the chain.
    pub raw_log: String,
    /// Height the transaction was included at, if known at broadcast time.
    pub height: u64,
}

/// Signs and broadcasts transactions for one signing identity.
///
/// Implementations hold the identity (key, account number, chain id) and the
/// message codec; [`simulate`](Self::simulate) builds the candidate
/// transaction with a placeholder signature carrying `sequence`, since the
/// chain validates the sequence even in dry runs.
#[async_trait]
pub trait TxGateway: fmt::Debug + Send + Sync {
    /// Dry-runs the batch, returning the gas the chain reports it would use.
    async fn simulate(&self, msgs: &[AnyMsg], sequence: u64) -> Result<u64, TransportError>;

    /// Signs the batch with the given sequence and fee.
    async fn sign(
        &self,
        msgs: &[AnyMsg],
        sequence: u64,
        fee: &Fee,
    ) -> Result<SignedTx, TransportError>;

    /// Broadcasts a signed transaction.
    async fn broadcast(&self, tx: SignedTx) -> Result<BroadcastAck, TransportError>;

    /// Builds the wire message attaching an attribute owned by `owner`.
    fn attribute_msg(&self, attr: &AttributeInput, owner: &str) -> AnyMsg;
}

/// Drives message batches through allocate → estimate → sign → broadcast.
///
/// One sequence number is consumed per batch, in submission order. A batch
/// that fails estimation or signing still burns its sequence number; the
/// chain will reject later transactions until the gap is resolved, which is
/// the documented cost of keeping allocation free of I/O.
#[derive(Debug, Clone)]
pub struct TxSubmitter {
    gateway: Arc<dyn TxGateway>,
    fees: FeeCalculator,
    sequence: Arc<SequenceAllocator>,
    surcharge_per_msg: u128,
    progress: Option<ProgressReporter>,
}

impl TxSubmitter {
    /// Creates a submitter for one signing identity.
    ///
    /// `surcharge_per_msg` is a flat fee added per message on top of the
    /// gas-derived amount, for message kinds the chain taxes separately.
    pub fn new(
        gateway: Arc<dyn TxGateway>,
        fees: FeeCalculator,
        sequence: Arc<SequenceAllocator>,
        surcharge_per_msg: u128,
    ) -> Self {
        Self { gateway, fees, sequence, surcharge_per_msg, progress: None }
    }

    /// Attaches a progress reporter updated around each submission.
    pub fn with_progress(mut self, progress: ProgressReporter) -> Self {
        self.progress = Some(progress);
        self
    }
}

#[async_trait]
impl BatchSubmitter for TxSubmitter {
    type Msg = AnyMsg;
    type Ack = BroadcastAck;

    async fn submit(&mut self, batch: Vec<AnyMsg>) -> Result<BroadcastAck, ClientError> {
        let sequence = self.sequence.allocate();
        let surcharge = self.surcharge_per_msg * batch.len() as u128;

        if let Some(progress) = &self.progress {
            progress.set_current(format!(
                "submitting {} messages at sequence {sequence}",
                batch.len()
            ));
        }

        let fee = self.fees.estimate(self.gateway.as_ref(), &batch, sequence, surcharge).await?;
        let signed = self.gateway.sign(&batch, sequence, &fee).await?;
        let ack = self.gateway.broadcast(signed).await?;

        if ack.code != 0 {
            return Err(ClientError::BroadcastRejected {
                txhash: ack.txhash,
                code: ack.code,
                raw_log: ack.raw_log,
            });
        }

        debug!(txhash = %ack.txhash, msgs = batch.len(), sequence, "broadcast batch");
        if let Some(progress) = &self.progress {
            progress.set_current(format!("broadcast {}", ack.txhash));
        }
        Ok(ack)
    }
}
