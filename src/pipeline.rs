//! Bounded batch collection and submission.
//!
//! Generalizes the "accumulate until a size threshold or end of input, then
//! flush" shape so every bulk write path shares one implementation instead of
//! re-rolling the two-task/two-channel dance per resource kind.

use crate::error::ClientError;
use async_trait::async_trait;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::debug;

/// Submits one accumulated batch.
///
/// Implementations own whatever a submission means — for transactions this is
/// allocate-sequence → estimate → sign → broadcast (see
/// [`TxSubmitter`](crate::tx::TxSubmitter)).
#[async_trait]
pub trait BatchSubmitter: Send + 'static {
    /// Item accumulated into batches.
    type Msg: Send + 'static;
    /// Acknowledgement produced per successful batch.
    type Ack: Send + 'static;

    /// Submits a full or final partial batch. Never called with an empty one.
    async fn submit(&mut self, batch: Vec<Self::Msg>) -> Result<Self::Ack, ClientError>;
}

/// Output channels of a batched submission run.
///
/// Callers must drain both until they close; results and errors arrive
/// independently, one per batch (or per rejected item).
#[derive(Debug)]
pub struct BatchResults<A> {
    /// One acknowledgement per successfully submitted batch.
    pub acks: mpsc::Receiver<A>,
    /// Per-item and per-batch errors. A failed batch does not stop the run.
    pub errors: mpsc::Receiver<ClientError>,
}

/// Spawns a collector that drains `rx` into batches of at most `batch_size`.
///
/// A batch is flushed when the buffer reaches `batch_size`, or when `rx`
/// closes with a partial batch pending. Submission failures go to `errors`
/// and accumulation resumes with an empty buffer. The returned channel (and
/// the collector's clone of `errors`) closes once the input is exhausted and
/// the final batch submitted. Cancellation is raced against every receive and
/// every submission and ends the run with a single [`ClientError::Cancelled`].
pub fn spawn_batch_collector<S>(
    cancel: CancellationToken,
    mut rx: mpsc::Receiver<S::Msg>,
    batch_size: usize,
    errors: mpsc::Sender<ClientError>,
    mut submitter: S,
) -> mpsc::Receiver<S::Ack>
where
    S: BatchSubmitter,
{
    assert!(batch_size > 0, "batch size must be positive");
    let (ack_tx, ack_rx) = mpsc::channel(1);

    tokio::spawn(async move {
        let mut buffer: Vec<S::Msg> = Vec::with_capacity(batch_size);
        loop {
            let next = tokio::select! {
                biased;
                _ = cancel.cancelled() => {
                    let _ = errors.send(ClientError::Cancelled).await;
                    return;
                }
                next = rx.recv() => next,
            };

            let input_done = next.is_none();
            if let Some(msg) = next {
                buffer.push(msg);
            }

            if buffer.len() == batch_size || (input_done && !buffer.is_empty()) {
                let batch = std::mem::replace(&mut buffer, Vec::with_capacity(batch_size));
                let size = batch.len();

                let result = tokio::select! {
                    biased;
                    _ = cancel.cancelled() => {
                        let _ = errors.send(ClientError::Cancelled).await;
                        return;
                    }
                    result = submitter.submit(batch) => result,
                };

                match result {
                    Ok(ack) => {
                        debug!(size, "submitted batch");
                        if ack_tx.send(ack).await.is_err() {
                            return;
                        }
                    }
                    Err(err) => {
                        debug!(size, %err, "batch submission failed");
                        if errors.send(err).await.is_err() {
                            return;
                        }
                    }
                }
            }

            if input_done {
                return;
            }
        }
    });

    ack_rx
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::TransportError;
    use std::time::Duration;
    use tokio::time::timeout;

    /// Records batch sizes; fails the batches whose 1-based index is listed.
    struct RecordingSubmitter {
        sizes: Vec<usize>,
        fail_on: Vec<usize>,
    }

    impl RecordingSubmitter {
        fn new(fail_on: Vec<usize>) -> Self {
            Self { sizes: Vec::new(), fail_on }
        }
    }

    #[async_trait]
    impl BatchSubmitter for RecordingSubmitter {
        type Msg = u32;
        type Ack = Vec<u32>;

        async fn submit(&mut self, batch: Vec<u32>) -> Result<Vec<u32>, ClientError> {
            assert!(!batch.is_empty());
            self.sizes.push(batch.len());
            if self.fail_on.contains(&self.sizes.len()) {
                return Err(ClientError::Transport(TransportError::msg("broadcast failed")));
            }
            Ok(batch)
        }
    }

    async fn run_collector(
        inputs: Vec<u32>,
        batch_size: usize,
        fail_on: Vec<usize>,
    ) -> (Vec<Vec<u32>>, Vec<ClientError>) {
        let (msg_tx, msg_rx) = mpsc::channel(batch_size);
        let (err_tx, mut err_rx) = mpsc::channel(batch_size);
        let mut acks = spawn_batch_collector(
            CancellationToken::new(),
            msg_rx,
            batch_size,
            err_tx,
            RecordingSubmitter::new(fail_on),
        );

        tokio::spawn(async move {
            for input in inputs {
                if msg_tx.send(input).await.is_err() {
                    return;
                }
            }
        });

        let mut batches = Vec::new();
        let mut errors = Vec::new();
        loop {
            tokio::select! {
                ack = acks.recv() => match ack {
                    Some(batch) => batches.push(batch),
                    None => break,
                },
                Some(err) = err_rx.recv() => errors.push(err),
            }
        }
        while let Some(err) = err_rx.recv().await {
            errors.push(err);
        }
        (batches, errors)
    }

    #[tokio::test]
    async fn flushes_full_and_final_partial_batches() {
        // batch_size * 2 + 3 eligible items.
        let (batches, errors) = run_collector((0..11).collect(), 4, vec![]).await;
        let sizes: Vec<usize> = batches.iter().map(Vec::len).collect();
        assert_eq!(sizes, vec![4, 4, 3]);
        assert_eq!(batches[2], vec![8, 9, 10]);
        assert!(errors.is_empty());
    }

    #[tokio::test]
    async fn exact_multiple_produces_no_partial_batch() {
        let (batches, errors) = run_collector((0..8).collect(), 4, vec![]).await;
        let sizes: Vec<usize> = batches.iter().map(Vec::len).collect();
        assert_eq!(sizes, vec![4, 4]);
        assert!(errors.is_empty());
    }

    #[tokio::test]
    async fn failed_batch_does_not_poison_the_rest() {
        let (batches, errors) = run_collector((0..11).collect(), 4, vec![2]).await;
        // Batches 1 and 3 still report results; batch 2 becomes one error.
        assert_eq!(batches.len(), 2);
        assert_eq!(batches[0], vec![0, 1, 2, 3]);
        assert_eq!(batches[1], vec![8, 9, 10]);
        assert_eq!(errors.len(), 1);
        assert!(matches!(errors[0], ClientError::Transport(_)));
    }

    #[tokio::test]
    async fn empty_input_submits_nothing() {
        let (batches, errors) = run_collector(Vec::new(), 4, vec![]).await;
        assert!(batches.is_empty());
        assert!(errors.is_empty());
    }

    #[tokio::test]
    async fn cancellation_ends_the_run() {
        let cancel = CancellationToken::new();
        let (_msg_tx, msg_rx) = mpsc::channel::<u32>(4);
        let (err_tx, mut err_rx) = mpsc::channel(4);
        let mut acks = spawn_batch_collector(
            cancel.clone(),
            msg_rx,
            4,
            err_tx,
            RecordingSubmitter::new(vec![]),
        );

        cancel.cancel();

        let err = timeout(Duration::from_secs(1), err_rx.recv())
            .await
            .expect("collector terminated in bounded time")
            .expect("cancellation error");
        assert!(err.is_cancelled(), "got {err:?}");
        assert!(acks.recv().await.is_none());
    }
}
