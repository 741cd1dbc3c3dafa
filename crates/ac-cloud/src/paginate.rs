//! Turning page-at-a-time listing calls into item streams

use crate::error::{CloudError, CloudResult};
use crate::traits::Page;
use futures::stream::{self, Stream, TryStreamExt};
use std::future::Future;

/// Stream every item of a paginated listing.
///
/// `fetch` is called with `None` for the first page and with each returned
/// token afterwards. The stream is lazy: no call is made until it is polled.
/// It ends after a page without a token, or if the service hands back the
/// token it was just given.
pub fn paginate<T, F, Fut>(fetch: F) -> impl Stream<Item = CloudResult<T>>
where
    F: FnMut(Option<String>) -> Fut,
    Fut: Future<Output = CloudResult<Page<T>>>,
{
    stream::try_unfold(
        (fetch, Some(None::<String>)),
        |(mut fetch, cursor)| async move {
            let Some(token) = cursor else {
                return Ok::<_, CloudError>(None);
            };
            let page = fetch(token.clone()).await?;
            let next = match page.next_token {
                Some(next) if next.is_empty() => None,
                Some(next) if token.as_deref() == Some(next.as_str()) => {
                    log::warn!("Listing returned the same page token twice; stopping");
                    None
                }
                Some(next) => Some(Some(next)),
                None => None,
            };
            Ok(Some((page.items, (fetch, next))))
        },
    )
    .map_ok(|items| stream::iter(items.into_iter().map(Ok::<T, CloudError>)))
    .try_flatten()
}

/// Drain a paginated listing into a vector.
pub async fn collect_all<T, F, Fut>(fetch: F) -> CloudResult<Vec<T>>
where
    F: FnMut(Option<String>) -> Fut,
    Fut: Future<Output = CloudResult<Page<T>>>,
{
    paginate(fetch).try_collect().await
}

#[cfg(test)]
#[path = "paginate_test.rs"]
mod tests;
