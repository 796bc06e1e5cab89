//! Shared types and streaming infrastructure for the YouTube API clients.

use serde::Deserialize;
use std::collections::VecDeque;
use std::future::Future;
use std::pin::Pin;
use std::task::{Context as TaskContext, Poll};
use tokio_stream::{Stream, StreamExt};

/// The largest `maxResults` the YouTube Data API accepts for list endpoints.
pub const MAX_PAGE_SIZE: u32 = 50;

type OneFuturePage<'a, F, T> =
    Pin<Box<dyn Future<Output = eyre::Result<(F, ListResponse<T>)>> + 'a + Send>>;

/// Parameters that select one page of a list endpoint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageRequest {
    /// Number of items to ask for, already capped to [`MAX_PAGE_SIZE`].
    pub max_results: u32,
    /// Continuation token from the previous page, `None` for the first page.
    pub page_token: Option<String>,
}

/// One page of a list endpoint's response.
///
/// Requests use a `fields` projection of `items(...),nextPageToken`, so the
/// usual `kind` and `pageInfo` members are never present.
#[derive(Debug, Deserialize)]
pub struct ListResponse<T> {
    /// Items on this page, in server order.
    #[serde(default = "VecDeque::new")]
    pub items: VecDeque<T>,
    /// Token that can be used as the value of the pageToken parameter to retrieve the next page in the result set.
    #[serde(rename = "nextPageToken")]
    pub next_page_token: Option<String>,
}

/// A paginated stream that automatically fetches subsequent pages from a YouTube API list endpoint.
///
/// This stream yields items one by one, fetching the next page only once the current page is
/// exhausted. Nothing is requested until the stream is first polled. Only supports forward
/// pagination, and the stream cannot be restarted once it has ended.
///
/// If fetching a page fails, the error is yielded once and the stream ends.
pub struct PagedStream<'a, T, F> {
    /// Current batch of items from the most recent API response
    current_items: VecDeque<T>,
    /// Future representing the currently pending API request, if any
    pending_request: Option<OneFuturePage<'a, F, T>>,
    /// Page size sent with every request
    max_results: u32,
    /// Whether we've reached the end of all available data
    is_done: bool,
}

impl<'a, T, F> PagedStream<'a, T, F> {
    /// Create a new PagedStream that will fetch pages of `page_size` items using `fetcher`.
    ///
    /// `page_size` is clamped to `1..=`[`MAX_PAGE_SIZE`].
    pub fn new<Fut>(page_size: u32, fetcher: F) -> Self
    where
        T: 'a,
        F: Fn(PageRequest) -> Fut,
        F: Send + 'a,
        Fut: Future<Output = eyre::Result<ListResponse<T>>> + Send + 'a,
    {
        let max_results = page_size.clamp(1, MAX_PAGE_SIZE);
        Self {
            pending_request: Some(fetch_page(fetcher, max_results, None)),
            current_items: VecDeque::new(),
            max_results,
            is_done: false,
        }
    }
}

fn fetch_page<'a, T, F, Fut>(
    fetcher: F,
    max_results: u32,
    page_token: Option<String>,
) -> OneFuturePage<'a, F, T>
where
    T: 'a,
    F: Fn(PageRequest) -> Fut,
    F: Send + 'a,
    Fut: Future<Output = eyre::Result<ListResponse<T>>> + Send + 'a,
{
    Box::pin(async move {
        let page = fetcher(PageRequest {
            max_results,
            page_token,
        })
        .await?;
        Ok((fetcher, page))
    })
}

impl<'a, T: Unpin, F> Unpin for PagedStream<'a, T, F> {}

impl<'a, T: Unpin, F, Fut> Stream for PagedStream<'a, T, F>
where
    T: 'a,
    F: Fn(PageRequest) -> Fut,
    F: Send + 'a,
    Fut: Future<Output = eyre::Result<ListResponse<T>>> + Send + 'a,
{
    type Item = eyre::Result<T>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut TaskContext<'_>) -> Poll<Option<Self::Item>> {
        loop {
            if let Some(item) = self.current_items.pop_front() {
                return Poll::Ready(Some(Ok(item)));
            }

            if self.is_done {
                return Poll::Ready(None);
            }

            let polled = match self.pending_request.as_mut() {
                Some(pending) => pending.as_mut().poll(cx),
                None => {
                    self.is_done = true;
                    return Poll::Ready(None);
                }
            };

            match polled {
                Poll::Ready(Ok((fetcher, page))) => {
                    self.current_items.extend(page.items);

                    if let Some(next_token) = page.next_page_token {
                        // Set up the future for the next page, but only poll it
                        // once the items we just got have been handed out.
                        let max_results = self.max_results;
                        self.pending_request =
                            Some(fetch_page(fetcher, max_results, Some(next_token)));
                    } else {
                        self.is_done = true;
                        self.pending_request = None;
                    }

                    continue;
                }
                Poll::Ready(Err(e)) => {
                    self.pending_request = None;
                    self.is_done = true;
                    return Poll::Ready(Some(Err(e)));
                }
                Poll::Pending => return Poll::Pending,
            }
        }
    }
}

/// Drains a paged stream into a `Vec`, stopping at the first error.
pub async fn collect_all<T, S>(stream: S) -> eyre::Result<Vec<T>>
where
    S: Stream<Item = eyre::Result<T>>,
{
    let mut stream = std::pin::pin!(stream);
    let mut items = Vec::new();
    while let Some(item) = stream.next().await {
        items.push(item?);
    }
    Ok(items)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::sync::{Arc, Mutex};

    /// Serves `total` numbered items in pages, handing out opaque tokens and
    /// recording every request it sees.
    type Page = std::future::Ready<eyre::Result<ListResponse<usize>>>;

    fn numbered_pages(
        total: usize,
        requests: Arc<Mutex<Vec<PageRequest>>>,
    ) -> impl Fn(PageRequest) -> Page + Send {
        move |request: PageRequest| {
            requests.lock().unwrap().push(request.clone());
            let start = match request.page_token.as_deref() {
                None => 0,
                Some(token) => token
                    .strip_prefix("opaque/")
                    .and_then(|offset| offset.parse().ok())
                    .expect("token was round-tripped"),
            };
            let end = (start + request.max_results as usize).min(total);
            std::future::ready(Ok(ListResponse {
                items: (start..end).collect(),
                next_page_token: (end < total).then(|| format!("opaque/{end}")),
            }))
        }
    }

    #[tokio::test]
    async fn concatenates_all_pages_in_order() {
        let requests = Arc::new(Mutex::new(Vec::new()));
        let stream = PagedStream::new(50, numbered_pages(120, Arc::clone(&requests)));
        let items = collect_all(stream).await.unwrap();

        assert_eq!(items, (0..120).collect::<Vec<_>>());
        let requests = requests.lock().unwrap();
        assert_eq!(requests.len(), 3);
        assert_eq!(
            requests
                .iter()
                .map(|r| r.page_token.clone())
                .collect::<Vec<_>>(),
            vec![
                None,
                Some("opaque/50".to_string()),
                Some("opaque/100".to_string())
            ]
        );
        assert!(requests.iter().all(|r| r.max_results == 50));
    }

    #[tokio::test]
    async fn issues_one_call_per_page() {
        for (total, page_size, expected_calls) in
            [(1, 50, 1), (50, 50, 1), (51, 50, 2), (10, 3, 4), (9, 3, 3)]
        {
            let requests = Arc::new(Mutex::new(Vec::new()));
            let stream = PagedStream::new(page_size, numbered_pages(total, Arc::clone(&requests)));
            let items = collect_all(stream).await.unwrap();
            assert_eq!(items.len(), total);
            assert_eq!(
                requests.lock().unwrap().len(),
                expected_calls,
                "{total} items in pages of {page_size}"
            );
        }
    }

    #[tokio::test]
    async fn empty_listing_asks_once() {
        let requests = Arc::new(Mutex::new(Vec::new()));
        let stream = PagedStream::new(50, numbered_pages(0, Arc::clone(&requests)));
        assert!(collect_all(stream).await.unwrap().is_empty());
        assert_eq!(requests.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn page_size_is_capped() {
        let requests = Arc::new(Mutex::new(Vec::new()));
        let stream = PagedStream::new(500, numbered_pages(75, Arc::clone(&requests)));
        assert_eq!(collect_all(stream).await.unwrap().len(), 75);
        assert!(
            requests
                .lock()
                .unwrap()
                .iter()
                .all(|r| r.max_results == MAX_PAGE_SIZE)
        );
    }

    #[tokio::test]
    async fn nothing_is_fetched_until_polled() {
        let requests = Arc::new(Mutex::new(Vec::new()));
        let stream = PagedStream::new(10, numbered_pages(25, Arc::clone(&requests)));
        assert!(requests.lock().unwrap().is_empty());

        let mut stream = std::pin::pin!(stream);
        assert_eq!(stream.next().await.unwrap().unwrap(), 0);
        assert_eq!(requests.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn error_ends_the_stream() {
        let calls = Arc::new(Mutex::new(0));
        let stream = PagedStream::new(2, {
            let calls = Arc::clone(&calls);
            move |request: PageRequest| {
                *calls.lock().unwrap() += 1;
                std::future::ready(match request.page_token {
                    None => Ok(ListResponse {
                        items: VecDeque::from([1, 2]),
                        next_page_token: Some("next".to_string()),
                    }),
                    Some(_) => Err(eyre::eyre!("quota exceeded")),
                })
            }
        });

        let mut stream = std::pin::pin!(stream);
        assert_eq!(stream.next().await.unwrap().unwrap(), 1);
        assert_eq!(stream.next().await.unwrap().unwrap(), 2);
        let err = stream.next().await.unwrap().unwrap_err();
        assert!(err.to_string().contains("quota exceeded"));
        assert!(stream.next().await.is_none());
        assert_eq!(*calls.lock().unwrap(), 2);
    }

    #[tokio::test]
    async fn collect_all_propagates_errors() {
        let stream = PagedStream::new(50, |_: PageRequest| {
            std::future::ready(Err::<ListResponse<u8>, _>(eyre::eyre!("bad gateway")))
        });
        let err = collect_all(stream).await.unwrap_err();
        assert!(err.to_string().contains("bad gateway"));
    }

    #[test]
    fn list_response_tolerates_missing_items() {
        let page: ListResponse<String> = serde_json::from_str("{}").unwrap();
        assert!(page.items.is_empty());
        assert_eq!(page.next_page_token, None);

        let page: ListResponse<String> =
            serde_json::from_str(r#"{"items": ["a"], "nextPageToken": "CAUQAA"}"#).unwrap();
        assert_eq!(page.items, VecDeque::from(["a".to_string()]));
        assert_eq!(page.next_page_token.as_deref(), Some("CAUQAA"));
    }
}
