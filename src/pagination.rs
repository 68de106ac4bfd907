//! Cursor-paginated streaming query engine.
//!
//! Every paginated list endpoint on the chain returns `(items, next_key)`
//! where an empty `next_key` means the listing is exhausted. [`stream_pages`]
//! turns one such endpoint into a lazily-produced, cancellable stream of
//! items, so callers never manage cursors and never hold more than one page
//! plus a channel buffer in memory. [`PageStream::collect`] is the eager form
//! built on the same producer.

use crate::error::{ClientError, TransportError};
use std::future::Future;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::trace;

/// A request for one page of a listing.
///
/// The key is an opaque continuation token, round-tripped to the provider
/// exactly as it was returned. An empty key requests the first page.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PageRequest {
    /// Continuation token from the previous page, empty for the first page.
    pub key: Vec<u8>,
    /// Maximum number of items to return.
    pub limit: u64,
}

impl PageRequest {
    /// Request for the first page of a listing.
    pub fn first(limit: u64) -> Self {
        Self { key: Vec::new(), limit }
    }
}

/// One page of a listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Page<T> {
    /// Items in provider order.
    pub items: Vec<T>,
    /// Continuation token for the next page. Empty when exhausted.
    pub next_key: Vec<u8>,
}

impl<T> Page<T> {
    /// A page followed by more pages.
    pub fn new(items: Vec<T>, next_key: Vec<u8>) -> Self {
        Self { items, next_key }
    }

    /// The final page of a listing.
    pub fn last(items: Vec<T>) -> Self {
        Self { items, next_key: Vec::new() }
    }
}

/// A stream of items produced from a paginated listing.
///
/// The producer task emits exactly one terminal event: either `items` drains
/// to completion, or a single error arrives on `errors`. Both channels always
/// close, including on cancellation, so draining both never leaks the
/// producer. Callers that stop early should drop the stream instead.
#[derive(Debug)]
pub struct PageStream<T> {
    /// Items in provider order. Bounded at one page of buffer.
    pub items: mpsc::Receiver<T>,
    /// Terminal error, if any.
    pub errors: mpsc::Receiver<ClientError>,
    cancel: CancellationToken,
}

impl<T> PageStream<T> {
    /// Drains the stream into an ordered collection.
    ///
    /// Returns immediately with [`ClientError::Cancelled`] if the token fires
    /// before the stream finishes.
    pub async fn collect(mut self) -> Result<Vec<T>, ClientError> {
        let mut out = Vec::new();
        loop {
            tokio::select! {
                biased;
                _ = self.cancel.cancelled() => return Err(ClientError::Cancelled),
                item = self.items.recv() => match item {
                    Some(item) => out.push(item),
                    // Item channel closed; the producer has terminated and the
                    // error channel tells us how.
                    None => {
                        return match self.errors.recv().await {
                            Some(err) => Err(err),
                            None => Ok(out),
                        };
                    }
                },
            }
        }
    }
}

/// Starts a producer task draining a paginated listing.
///
/// `fetch` is called with a cursor and a page size and returns one page at a
/// time; the producer pushes each item in provider order, advances the cursor
/// and stops on the first empty `next_key`. A fetch error ends the stream with
/// that error — there is no retry at this layer. Cancellation is honored
/// before every push and raced against every fetch, and wins over a transport
/// error observed while the token was already cancelled.
///
/// Timeouts are cancellation tokens cancelled after a deadline; there is no
/// separate mechanism.
pub fn stream_pages<T, F, Fut>(
    cancel: CancellationToken,
    page_size: u64,
    mut fetch: F,
) -> PageStream<T>
where
    T: Send + 'static,
    F: FnMut(PageRequest) -> Fut + Send + 'static,
    Fut: Future<Output = Result<Page<T>, TransportError>> + Send + 'static,
{
    let (item_tx, item_rx) = mpsc::channel(page_size.max(1) as usize);
    // Buffer of one so the producer can report its terminal error and exit
    // without waiting on the consumer.
    let (err_tx, err_rx) = mpsc::channel(1);

    let token = cancel.clone();
    tokio::spawn(async move {
        let mut key = Vec::new();
        loop {
            let request = PageRequest { key: key.clone(), limit: page_size };
            let page = tokio::select! {
                biased;
                _ = token.cancelled() => {
                    let _ = err_tx.send(ClientError::Cancelled).await;
                    return;
                }
                fetched = fetch(request) => match fetched {
                    Ok(page) => page,
                    Err(err) => {
                        let err = if token.is_cancelled() {
                            ClientError::Cancelled
                        } else {
                            ClientError::Transport(err)
                        };
                        let _ = err_tx.send(err).await;
                        return;
                    }
                },
            };

            trace!(items = page.items.len(), more = !page.next_key.is_empty(), "fetched page");

            for item in page.items {
                tokio::select! {
                    biased;
                    _ = token.cancelled() => {
                        let _ = err_tx.send(ClientError::Cancelled).await;
                        return;
                    }
                    sent = item_tx.send(item) => {
                        // Consumer dropped the stream; stop producing.
                        if sent.is_err() {
                            return;
                        }
                    }
                }
            }

            if page.next_key.is_empty() {
                return;
            }
            key = page.next_key;
        }
    });

    PageStream { items: item_rx, errors: err_rx, cancel }
}

/// Drains a paginated listing into an ordered collection.
///
/// Convenience over [`stream_pages`] + [`PageStream::collect`].
pub async fn collect_pages<T, F, Fut>(
    cancel: CancellationToken,
    page_size: u64,
    fetch: F,
) -> Result<Vec<T>, ClientError>
where
    T: Send + 'static,
    F: FnMut(PageRequest) -> Fut + Send + 'static,
    Fut: Future<Output = Result<Page<T>, TransportError>> + Send + 'static,
{
    stream_pages(cancel, page_size, fetch).collect().await
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{
        Arc,
        atomic::{AtomicUsize, Ordering},
    };
    use std::time::Duration;
    use tokio::time::timeout;

    /// Fetch closure serving fixed pages and counting calls.
    fn paged_fetch(
        pages: Vec<Page<&'static str>>,
    ) -> (
        impl FnMut(PageRequest) -> std::future::Ready<Result<Page<&'static str>, TransportError>>,
        Arc<AtomicUsize>,
    ) {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = calls.clone();
        let fetch = move |request: PageRequest| {
            let index = counter.fetch_add(1, Ordering::SeqCst);
            // First page must carry an empty cursor, later pages the token we
            // handed out.
            if index == 0 {
                assert!(request.key.is_empty());
            } else {
                assert_eq!(request.key, vec![index as u8]);
            }
            let page = &pages[index];
            let next_key = page.next_key.clone();
            std::future::ready(Ok(Page::new(page.items.clone(), next_key)))
        };
        (fetch, calls)
    }

    #[tokio::test]
    async fn collect_returns_all_pages_in_order() {
        let (fetch, calls) = paged_fetch(vec![
            Page::new(vec!["a", "b"], vec![1]),
            Page::last(vec!["c"]),
        ]);

        let items = collect_pages(CancellationToken::new(), 2, fetch).await.unwrap();
        assert_eq!(items, vec!["a", "b", "c"]);
        // The second page signals no-next inline, so exactly two calls.
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn stream_closes_both_channels_on_success() {
        let (fetch, _) = paged_fetch(vec![Page::last(vec!["a"])]);
        let mut stream = stream_pages(CancellationToken::new(), 10, fetch);

        assert_eq!(stream.items.recv().await, Some("a"));
        assert_eq!(stream.items.recv().await, None);
        assert!(stream.errors.recv().await.is_none());
    }

    #[tokio::test]
    async fn fetch_error_is_terminal() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = calls.clone();
        let fetch = move |_request: PageRequest| {
            let index = counter.fetch_add(1, Ordering::SeqCst);
            std::future::ready(if index == 0 {
                Ok(Page::new(vec!["a"], vec![9]))
            } else {
                Err(TransportError::msg("connection reset"))
            })
        };

        let mut stream = stream_pages(CancellationToken::new(), 10, fetch);
        assert_eq!(stream.items.recv().await, Some("a"));
        assert_eq!(stream.items.recv().await, None);
        let err = stream.errors.recv().await.expect("terminal error");
        assert!(matches!(err, ClientError::Transport(_)), "got {err:?}");
        assert!(stream.errors.recv().await.is_none());
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn cancellation_takes_precedence_over_fetch_error() {
        let cancel = CancellationToken::new();
        cancel.cancel();
        let fetch = |_request: PageRequest| {
            std::future::ready(Err::<Page<&'static str>, _>(TransportError::msg(
                "stream torn down",
            )))
        };

        let err = collect_pages(cancel, 10, fetch).await.unwrap_err();
        assert!(err.is_cancelled(), "got {err:?}");
    }

    #[tokio::test]
    async fn cancellation_unblocks_a_full_item_channel() {
        let cancel = CancellationToken::new();
        // Page of four items against a channel of two: the producer blocks on
        // the third push and must exit once the token fires.
        let fetch = |_request: PageRequest| {
            std::future::ready(Ok(Page::last(vec!["a", "b", "c", "d"])))
        };
        let mut stream = stream_pages(cancel.clone(), 2, fetch);

        tokio::task::yield_now().await;
        cancel.cancel();

        let err = timeout(Duration::from_secs(1), stream.errors.recv())
            .await
            .expect("producer terminated in bounded time")
            .expect("terminal error");
        assert!(err.is_cancelled(), "got {err:?}");
    }

    #[tokio::test]
    async fn collect_returns_immediately_on_cancellation() {
        let cancel = CancellationToken::new();
        let pending = cancel.clone();
        // Fetch that never resolves; only cancellation can end the stream.
        let fetch = move |_request: PageRequest| {
            let _keep = pending.clone();
            std::future::pending::<Result<Page<&'static str>, TransportError>>()
        };
        let stream = stream_pages(cancel.clone(), 10, fetch);

        let collect = tokio::spawn(stream.collect());
        tokio::task::yield_now().await;
        cancel.cancel();

        let err = timeout(Duration::from_secs(1), collect)
            .await
            .expect("collect returned in bounded time")
            .unwrap()
            .unwrap_err();
        assert!(err.is_cancelled(), "got {err:?}");
    }
}
