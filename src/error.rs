//! Client error types.

use thiserror::Error;

/// Errors surfaced by queries, streams and the submission pipeline.
///
/// Stream-level errors are terminal for that stream: at most one is emitted
/// before the stream's channels close. Pipeline-level errors are scoped to a
/// single item or batch and never stop processing of later items.
#[derive(Debug, Error)]
pub enum ClientError {
    /// The caller's cancellation token fired.
    ///
    /// Always takes precedence over a transport error observed while the
    /// token was already cancelled, since such an error usually only exists
    /// *because* of the cancellation.
    #[error("operation cancelled")]
    Cancelled,

    /// An RPC collaborator (query provider or tx gateway) failed.
    ///
    /// Surfaced as-is; retry policy belongs to the caller or the transport.
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// The write target already carries this attribute.
    ///
    /// Reported per item; the rest of the pipeline run is unaffected.
    #[error("attribute {name} already exists on account {account}")]
    AttributeExists {
        /// Attribute name of the rejected write intent.
        name: String,
        /// Account the intent targeted.
        account: String,
    },

    /// Simulation reported zero gas for a non-empty batch.
    ///
    /// A zero estimate would produce a zero fee and a guaranteed rejection,
    /// so it is surfaced instead of being coerced to a minimum.
    #[error("simulation returned zero gas for a batch of {msg_count} messages")]
    ZeroGasEstimate {
        /// Number of messages in the simulated batch.
        msg_count: usize,
    },

    /// The chain accepted the broadcast but rejected the transaction.
    ///
    /// This is also where a diverged sequence number shows up, as the chain's
    /// sequence-mismatch rejection code.
    #[error("broadcast {txhash} rejected with code {code}: {raw_log}")]
    BroadcastRejected {
        /// Hash of the rejected transaction.
        txhash: String,
        /// Chain error code.
        code: u32,
        /// Raw log returned by the chain.
        raw_log: String,
    },
}

impl ClientError {
    /// Whether this error is a cancellation.
    pub const fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled)
    }
}

/// Error returned by an RPC collaborator.
///
/// The transport itself is opaque to this crate, so implementations wrap
/// whatever their stack produces (a gRPC status, a connection error, ...)
/// behind a message and an optional source.
#[derive(Debug, Error)]
#[error("{context}")]
pub struct TransportError {
    context: String,
    #[source]
    source: Option<Box<dyn std::error::Error + Send + Sync + 'static>>,
}

impl TransportError {
    /// A transport error from a bare message.
    pub fn msg(context: impl Into<String>) -> Self {
        Self { context: context.into(), source: None }
    }

    /// A transport error wrapping an underlying error.
    pub fn new(
        context: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self { context: context.into(), source: Some(Box::new(source)) }
    }
}
