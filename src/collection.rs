//! Lazy walker over hydra linked collections.

use std::collections::VecDeque;

use serde::de::DeserializeOwned;

use crate::Result;
use crate::connection::ConnectionManager;
use crate::models::{LinkedCollection, Token};

/// Forward-only iterator over one paginated list endpoint.
///
/// Pages are fetched on demand, one at a time, only when the buffer of
/// already-downloaded items runs dry; items come back in server order
/// across page boundaries. The walk is single-pass: construct a fresh
/// instance to iterate again.
pub struct CollectionIter<'a, T> {
    connection: &'a ConnectionManager,
    token: Option<Token>,
    current_url: Option<String>,
    buffer: VecDeque<T>,
}

impl<'a, T: DeserializeOwned> CollectionIter<'a, T> {
    pub(crate) fn new(
        connection: &'a ConnectionManager,
        endpoint: &str,
        token: Option<&Token>,
    ) -> Self {
        Self {
            connection,
            token: token.cloned(),
            current_url: Some(format!("{endpoint}?page=1")),
            buffer: VecDeque::new(),
        }
    }

    /// The next item, or `None` once the collection is exhausted.
    ///
    /// At most one page is fetched per call; a page whose member list is
    /// empty, or one without a `hydra:next` link, ends the walk. An `Err`
    /// leaves the walk in place: calling again retries the same page.
    pub async fn next(&mut self) -> Result<Option<T>> {
        if self.buffer.is_empty() {
            if let Some(url) = self.current_url.clone() {
                // The cursor is only advanced after a successful fetch, so a
                // failed call can be retried with another `next()`.
                let page: LinkedCollection<T> =
                    self.connection.get_json(&url, self.token.as_ref()).await?;
                self.buffer = page.members.into();
                self.current_url = page.view.and_then(|view| view.next);
                if self.buffer.is_empty() {
                    // An empty page ends the walk even when a next link exists.
                    self.current_url = None;
                }
            }
        }
        Ok(self.buffer.pop_front())
    }

    /// Drain the rest of the walk into a vector.
    pub async fn collect_remaining(mut self) -> Result<Vec<T>> {
        let mut items = Vec::new();
        while let Some(item) = self.next().await? {
            items.push(item);
        }
        Ok(items)
    }
}
