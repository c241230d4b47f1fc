//! Server-sent message events from the mail.tm Mercure hub.

use std::pin::Pin;
use std::task::{Context, Poll};

use futures::stream::{Stream, StreamExt};
use reqwest_eventsource::{Event, EventSource, RequestBuilderExt};
use tracing::{debug, warn};

use crate::models::{MessageIntro, Token};
use crate::{Error, Result};

/// A live feed of message events for one account.
///
/// Every item is new by construction: the hub only pushes events for
/// changes that happen after the subscription opened, so no snapshot
/// diffing is needed. The stream is infinite and blocks between events;
/// cancel by dropping it (which closes the underlying connection) or by
/// racing it against a timeout or signal with `tokio::select!`.
///
/// A malformed event payload yields a recoverable
/// [`Error::EventDecode`] item and the subscription stays open; a
/// connection-level failure yields [`Error::Stream`] and ends it, after
/// which the caller may resubscribe.
pub struct MessageStream {
    event_source: EventSource,
}

impl MessageStream {
    pub(crate) fn open(
        http: &reqwest::Client,
        stream_url: &str,
        account_id: &str,
        token: &Token,
    ) -> Result<Self> {
        let request = http
            .get(stream_url)
            .query(&[("topic", format!("/accounts/{account_id}"))])
            .bearer_auth(&token.token);
        let event_source = request
            .eventsource()
            .map_err(|e| Error::Stream(e.to_string()))?;
        debug!(stream_url, account_id, "event stream subscription opened");
        Ok(Self { event_source })
    }

    /// Block until the next decodable message event arrives.
    ///
    /// Skips payloads that fail to decode (they only fail that one event)
    /// and fails when the subscription itself dies.
    pub async fn next_message(&mut self) -> Result<MessageIntro> {
        loop {
            match self.next().await {
                Some(Ok(intro)) => return Ok(intro),
                Some(Err(Error::EventDecode(reason))) => {
                    warn!(reason, "skipping undecodable event");
                }
                Some(Err(e)) => return Err(e),
                None => return Err(Error::Stream("subscription closed".into())),
            }
        }
    }
}

impl Stream for MessageStream {
    type Item = Result<MessageIntro>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        loop {
            match Pin::new(&mut self.event_source).poll_next(cx) {
                Poll::Ready(Some(Ok(Event::Open))) => {
                    debug!("event stream connected");
                    continue;
                }
                Poll::Ready(Some(Ok(Event::Message(event)))) => match decode_event(&event.data) {
                    Ok(Some(intro)) => return Poll::Ready(Some(Ok(intro))),
                    // Account updates share the topic; skip them silently.
                    Ok(None) => continue,
                    Err(e) => return Poll::Ready(Some(Err(e))),
                },
                Poll::Ready(Some(Err(e))) => {
                    // Connection failures are fatal for this subscription;
                    // stop the EventSource from reconnecting on its own.
                    self.event_source.close();
                    return Poll::Ready(Some(Err(Error::Stream(e.to_string()))));
                }
                Poll::Ready(None) => return Poll::Ready(None),
                Poll::Pending => return Poll::Pending,
            }
        }
    }
}

/// Decode one event payload. `Ok(None)` means the event was valid JSON
/// but not a message resource.
fn decode_event(data: &str) -> Result<Option<MessageIntro>> {
    let value: serde_json::Value =
        serde_json::from_str(data).map_err(|e| Error::EventDecode(e.to_string()))?;
    if value.get("@type").and_then(|t| t.as_str()) != Some("Message") {
        return Ok(None);
    }
    serde_json::from_value(value)
        .map(Some)
        .map_err(|e| Error::EventDecode(e.to_string()))
}
