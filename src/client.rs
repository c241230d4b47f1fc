//! mail.tm async client implementation.

use std::collections::HashSet;
use std::time::Duration;

use rand::Rng;
use rand::distr::Alphanumeric;
use serde_json::json;
use tracing::warn;

use crate::collection::CollectionIter;
use crate::connection::ConnectionManager;
use crate::inbox::Inbox;
use crate::models::{
    Account, Credentials, Domain, LinkedCollection, Message, MessageIntro, Source, Token,
};
use crate::stream::MessageStream;
use crate::{Error, Result};

/// Async client for the mail.tm temporary email service.
///
/// Use [`Client::new`] for defaults or [`Client::builder`] for custom
/// settings like the API origin, rate-limit delay, and poll interval.
///
/// Operations that need authentication take a [`Token`] obtained from
/// [`Client::authenticate`]. Tokens carry no client-side expiry; when the
/// server starts answering 401 the caller re-authenticates.
#[derive(Debug, Clone)]
pub struct Client {
    connection: ConnectionManager,
    http: reqwest::Client,
    stream_url: String,
    poll_interval: Duration,
}

impl Client {
    /// Create a builder for configuring the client.
    pub fn builder() -> ClientBuilder {
        ClientBuilder::new()
    }

    /// Create a new mail.tm client with default settings.
    ///
    /// # Examples
    /// ```no_run
    /// # use mailtm_client::Client;
    /// # fn main() -> Result<(), mailtm_client::Error> {
    /// let client = Client::new()?;
    /// # Ok(())
    /// # }
    /// ```
    pub fn new() -> Result<Self> {
        ClientBuilder::new().build()
    }

    /// Exchange credentials for a bearer token.
    ///
    /// Wrong credentials surface as [`Error::Status`] with status 401,
    /// unchanged; use [`Error::is_unauthorized`] to tell them apart from
    /// other failures. There is no refresh operation; call this again to
    /// rotate the token.
    ///
    /// # Examples
    /// ```no_run
    /// # use mailtm_client::{Client, Credentials};
    /// # #[tokio::main]
    /// # async fn main() -> Result<(), mailtm_client::Error> {
    /// let client = Client::new()?;
    /// let credentials = Credentials {
    ///     address: "nick@domain.example".into(),
    ///     password: "secure".into(),
    /// };
    /// let token = client.authenticate(&credentials).await?;
    /// # Ok(())
    /// # }
    /// ```
    pub async fn authenticate(&self, credentials: &Credentials) -> Result<Token> {
        self.connection
            .post_json("token", &serde_json::to_value(credentials)?, None)
            .await
    }

    /// Create an account from the given credentials.
    pub async fn create_account(&self, credentials: &Credentials) -> Result<Account> {
        self.connection
            .post_json("accounts", &serde_json::to_value(credentials)?, None)
            .await
    }

    /// Fetch one account by id.
    pub async fn get_account(&self, id: &str, token: &Token) -> Result<Account> {
        self.connection
            .get_json(&format!("accounts/{id}"), Some(token))
            .await
    }

    /// Fetch the account that generated the token.
    pub async fn get_me(&self, token: &Token) -> Result<Account> {
        self.connection.get_json("me", Some(token)).await
    }

    /// Delete an account. Returns `true` when the server confirms with
    /// 204 No Content.
    pub async fn delete_account(&self, id: &str, token: &Token) -> Result<bool> {
        self.connection
            .delete(&format!("accounts/{id}"), Some(token))
            .await
    }

    /// Fetch one page of the domain list.
    pub async fn get_domains_page(&self, page: u32) -> Result<LinkedCollection<Domain>> {
        self.connection
            .get_json(&format!("domains?page={page}"), None)
            .await
    }

    /// Fetch one domain by id.
    pub async fn get_domain(&self, id: &str) -> Result<Domain> {
        self.connection.get_json(&format!("domains/{id}"), None).await
    }

    /// Walk every available domain, one page at a time.
    pub fn domains(&self) -> CollectionIter<'_, Domain> {
        CollectionIter::new(&self.connection, "domains", None)
    }

    /// Total number of domains, taken from the first page's envelope.
    pub async fn get_domains_count(&self) -> Result<u64> {
        Ok(self.get_domains_page(1).await?.total_items)
    }

    /// Any currently active domain, or `None` when the service offers none.
    ///
    /// This is the domain credential generation builds addresses with.
    pub async fn get_a_domain(&self) -> Result<Option<Domain>> {
        Ok(self.get_domains_page(1).await?.members.into_iter().next())
    }

    /// Generate credentials for a new account.
    ///
    /// Missing parts are filled in: a random lowercase username, a random
    /// 8-character alphanumeric password, and any active domain. Passing a
    /// domain that is not in the active list fails locally with
    /// [`Error::DomainNotAvailable`] before any account request is made.
    ///
    /// # Examples
    /// ```no_run
    /// # use mailtm_client::Client;
    /// # #[tokio::main]
    /// # async fn main() -> Result<(), mailtm_client::Error> {
    /// let client = Client::new()?;
    /// let credentials = client.generate_credentials(None, None, None).await?;
    /// let account = client.create_account(&credentials).await?;
    /// println!("{}", account.address);
    /// # Ok(())
    /// # }
    /// ```
    pub async fn generate_credentials(
        &self,
        username: Option<&str>,
        domain: Option<&str>,
        password: Option<&str>,
    ) -> Result<Credentials> {
        let active = self.domains().collect_remaining().await?;
        let domain = match domain {
            Some(name) => {
                if !active.iter().any(|d| d.domain == name) {
                    return Err(Error::DomainNotAvailable(name.to_string()));
                }
                name.to_string()
            }
            None => active
                .into_iter()
                .next()
                .ok_or(Error::NoActiveDomain)?
                .domain,
        };
        let username = match username {
            Some(name) => name.to_lowercase(),
            None => random_username(),
        };
        let password = match password {
            Some(password) => password.to_string(),
            None => random_password(PASSWORD_LENGTH),
        };
        Ok(Credentials {
            address: format!("{username}@{domain}"),
            password,
        })
    }

    /// Fetch one page of message intros.
    pub async fn get_message_intros_page(
        &self,
        page: u32,
        token: &Token,
    ) -> Result<LinkedCollection<MessageIntro>> {
        self.connection
            .get_json(&format!("messages?page={page}"), Some(token))
            .await
    }

    /// Walk every message intro in the account, one page at a time.
    ///
    /// # Examples
    /// ```no_run
    /// # use mailtm_client::{Client, Credentials};
    /// # #[tokio::main]
    /// # async fn main() -> Result<(), mailtm_client::Error> {
    /// # let client = Client::new()?;
    /// # let credentials = Credentials { address: "a@b".into(), password: "c".into() };
    /// let token = client.authenticate(&credentials).await?;
    /// let mut intros = client.message_intros(&token);
    /// while let Some(intro) = intros.next().await? {
    ///     println!("{}: {}", intro.from.address, intro.subject);
    /// }
    /// # Ok(())
    /// # }
    /// ```
    pub fn message_intros(&self, token: &Token) -> CollectionIter<'_, MessageIntro> {
        CollectionIter::new(&self.connection, "messages", Some(token))
    }

    /// Walk every message in the account in its full form, fetching each
    /// one by id as the intro walk advances.
    pub fn messages(&self, token: &Token) -> MessageIter<'_> {
        MessageIter {
            client: self,
            intros: self.message_intros(token),
            token: token.clone(),
        }
    }

    /// Re-list the account's messages into `inbox`.
    ///
    /// New messages are appended, known ones get their summary fields
    /// refreshed, and any full message already fetched into the inbox
    /// (via [`Inbox::upgrade`]) is kept.
    ///
    /// # Examples
    /// ```no_run
    /// # use mailtm_client::{Client, Credentials, Inbox};
    /// # #[tokio::main]
    /// # async fn main() -> Result<(), mailtm_client::Error> {
    /// # let client = Client::new()?;
    /// # let credentials = Credentials { address: "a@b".into(), password: "c".into() };
    /// let token = client.authenticate(&credentials).await?;
    /// let mut inbox = Inbox::new();
    /// client.refresh_inbox(&mut inbox, &token).await?;
    /// for entry in inbox.iter() {
    ///     println!("{}: {}", entry.intro.from.address, entry.intro.subject);
    /// }
    /// # Ok(())
    /// # }
    /// ```
    pub async fn refresh_inbox(&self, inbox: &mut Inbox, token: &Token) -> Result<()> {
        let intros = self.message_intros(token).collect_remaining().await?;
        inbox.merge_intros(intros);
        Ok(())
    }

    /// Total number of messages, taken from the first page's envelope.
    pub async fn get_messages_count(&self, token: &Token) -> Result<u64> {
        Ok(self.get_message_intros_page(1, token).await?.total_items)
    }

    /// Fetch one full message by id.
    pub async fn get_message(&self, id: &str, token: &Token) -> Result<Message> {
        self.connection
            .get_json(&format!("messages/{id}"), Some(token))
            .await
    }

    /// Delete a message. Returns `true` when the server confirms with
    /// 204 No Content.
    pub async fn delete_message(&self, id: &str, token: &Token) -> Result<bool> {
        self.connection
            .delete(&format!("messages/{id}"), Some(token))
            .await
    }

    /// Mark a message as seen via merge-patch.
    pub async fn mark_as_seen(&self, id: &str, token: &Token) -> Result<bool> {
        let status = self
            .connection
            .patch(&format!("messages/{id}"), &json!({"seen": true}), Some(token))
            .await?;
        Ok(status.is_success())
    }

    /// Download the raw rfc822 source of a message.
    ///
    /// Returns the same content as [`Client::get_source`], through the
    /// `/messages/{id}/download` endpoint.
    pub async fn download_message_source(&self, id: &str, token: &Token) -> Result<String> {
        self.connection
            .get_text(&format!("messages/{id}/download"), Some(token))
            .await
    }

    /// Fetch the source resource of a message from `/sources/{id}`.
    ///
    /// `data` holds the same bytes as [`Client::download_message_source`].
    pub async fn get_source(&self, id: &str, token: &Token) -> Result<Source> {
        self.connection
            .get_json(&format!("sources/{id}"), Some(token))
            .await
    }

    /// Download one attachment as raw bytes.
    pub async fn download_attachment(
        &self,
        message_id: &str,
        attachment_id: &str,
        token: &Token,
    ) -> Result<Vec<u8>> {
        self.connection
            .get_bytes(
                &format!("messages/{message_id}/attachment/{attachment_id}"),
                Some(token),
            )
            .await
    }

    /// Subscribe to the account's server-push event stream.
    ///
    /// This is the primary "wait for mail" mechanism: each decoded event
    /// is a message that arrived after the subscription opened. See
    /// [`MessageStream`] for the failure and cancellation contract.
    pub fn subscribe(&self, account_id: &str, token: &Token) -> Result<MessageStream> {
        MessageStream::open(&self.http, &self.stream_url, account_id, token)
    }

    /// Block until the next message arrives on the event stream.
    ///
    /// Suspends for an unbounded time; run it on its own task (or race it
    /// with `tokio::select!`) when the rest of the program must stay
    /// responsive.
    ///
    /// # Examples
    /// ```no_run
    /// # use mailtm_client::{Client, Credentials};
    /// # #[tokio::main]
    /// # async fn main() -> Result<(), mailtm_client::Error> {
    /// # let client = Client::new()?;
    /// # let credentials = Credentials { address: "a@b".into(), password: "c".into() };
    /// let token = client.authenticate(&credentials).await?;
    /// let account = client.get_me(&token).await?;
    /// let intro = client.wait_for_new_message(&account.id, &token).await?;
    /// println!("new mail from {}", intro.from.address);
    /// # Ok(())
    /// # }
    /// ```
    pub async fn wait_for_new_message(
        &self,
        account_id: &str,
        token: &Token,
    ) -> Result<MessageIntro> {
        let mut stream = self.subscribe(account_id, token)?;
        stream.next_message().await
    }

    /// Block until a message not present in the initial snapshot appears,
    /// by re-listing intros every poll interval.
    ///
    /// Fallback for environments where the event stream is unreachable.
    /// The snapshot and the poll loop both retry transient failures
    /// silently after the poll interval, so this only ever returns a
    /// message that was absent from the snapshot. Impose a deadline
    /// externally (`tokio::time::timeout`) if one is needed.
    pub async fn wait_for_new_message_polling(&self, token: &Token) -> Result<MessageIntro> {
        let known = loop {
            match self.message_intros(token).collect_remaining().await {
                Ok(intros) => {
                    break intros
                        .into_iter()
                        .map(|intro| intro.id)
                        .collect::<HashSet<_>>();
                }
                Err(e) if e.is_unauthorized() => return Err(e),
                Err(e) => {
                    warn!(error = %e, "snapshot of existing messages failed, retrying");
                    tokio::time::sleep(self.poll_interval).await;
                }
            }
        };
        loop {
            tokio::time::sleep(self.poll_interval).await;
            match self.message_intros(token).collect_remaining().await {
                Ok(intros) => {
                    // Server order is preserved; the first unknown id wins.
                    if let Some(intro) = intros.into_iter().find(|m| !known.contains(&m.id)) {
                        return Ok(intro);
                    }
                }
                Err(e) if e.is_unauthorized() => return Err(e),
                Err(e) => warn!(error = %e, "poll failed, retrying"),
            }
        }
    }
}

/// Walker over full messages, driven by the intro walk underneath.
pub struct MessageIter<'a> {
    client: &'a Client,
    intros: CollectionIter<'a, MessageIntro>,
    token: Token,
}

impl MessageIter<'_> {
    /// The next full message, or `None` once the account is exhausted.
    pub async fn next(&mut self) -> Result<Option<Message>> {
        match self.intros.next().await? {
            Some(intro) => Ok(Some(self.client.get_message(&intro.id, &self.token).await?)),
            None => Ok(None),
        }
    }
}

const API_URL: &str = "https://api.mail.tm";
const STREAM_URL: &str = "https://mercure.mail.tm/.well-known/mercure";
const USER_AGENT_VALUE: &str = concat!("mailtm-client-rs/", env!("CARGO_PKG_VERSION"));
const RATE_LIMIT_DELAY: Duration = Duration::from_secs(1);
const POLL_INTERVAL: Duration = Duration::from_secs(2);
const PASSWORD_LENGTH: usize = 8;
const USERNAME_LENGTH: usize = 10;

fn random_username() -> String {
    random_password(USERNAME_LENGTH).to_lowercase()
}

fn random_password(length: usize) -> String {
    rand::rng()
        .sample_iter(Alphanumeric)
        .take(length)
        .map(char::from)
        .collect()
}

/// Builder for configuring a mail.tm client.
///
/// Start with [`Client::builder`] to override defaults.
#[derive(Debug, Clone)]
pub struct ClientBuilder {
    base_url: String,
    stream_url: String,
    user_agent: String,
    handle_rate_limit: bool,
    rate_limit_delay: Duration,
    poll_interval: Duration,
}

impl ClientBuilder {
    /// Create a new builder with default settings.
    ///
    /// Defaults:
    /// - API origin `https://api.mail.tm`
    /// - Event stream origin `https://mercure.mail.tm/.well-known/mercure`
    /// - Rate-limit handling on, 1 second delay
    /// - 2 second poll interval
    /// - Default user agent
    pub fn new() -> Self {
        Self {
            base_url: API_URL.to_string(),
            stream_url: STREAM_URL.to_string(),
            user_agent: USER_AGENT_VALUE.to_string(),
            handle_rate_limit: true,
            rate_limit_delay: RATE_LIMIT_DELAY,
            poll_interval: POLL_INTERVAL,
        }
    }

    /// Override the REST API origin. Useful for tests against a local mock.
    pub fn base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Override the event-stream origin.
    pub fn stream_url(mut self, stream_url: impl Into<String>) -> Self {
        self.stream_url = stream_url.into();
        self
    }

    /// Override the default user agent string.
    pub fn user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }

    /// Control whether HTTP 429 responses are absorbed by retrying
    /// (default: true). When off, they surface as [`Error::Status`].
    pub fn handle_rate_limit(mut self, value: bool) -> Self {
        self.handle_rate_limit = value;
        self
    }

    /// Delay between rate-limit retries (default: 1 second).
    pub fn rate_limit_delay(mut self, delay: Duration) -> Self {
        self.rate_limit_delay = delay;
        self
    }

    /// Sleep between list polls in the polling wait (default: 2 seconds).
    pub fn poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    /// Build the client.
    ///
    /// # Examples
    /// ```no_run
    /// # use mailtm_client::Client;
    /// # fn main() -> Result<(), mailtm_client::Error> {
    /// let client = Client::builder()
    ///     .user_agent("my-app/1.0")
    ///     .build()?;
    /// # Ok(())
    /// # }
    /// ```
    pub fn build(self) -> Result<Client> {
        let http = reqwest::Client::builder()
            .user_agent(&self.user_agent)
            .build()?;
        let connection = ConnectionManager::new(
            http.clone(),
            self.base_url,
            self.handle_rate_limit,
            self.rate_limit_delay,
        );
        Ok(Client {
            connection,
            http,
            stream_url: self.stream_url,
            poll_interval: self.poll_interval,
        })
    }
}

impl Default for ClientBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn random_password_is_alphanumeric_with_requested_length() {
        let password = random_password(PASSWORD_LENGTH);
        assert_eq!(password.len(), PASSWORD_LENGTH);
        assert!(password.chars().all(|c| c.is_ascii_alphanumeric()));
    }

    #[test]
    fn random_username_is_lowercase() {
        let username = random_username();
        assert_eq!(username.len(), USERNAME_LENGTH);
        assert!(!username.chars().any(|c| c.is_ascii_uppercase()));
    }
}
