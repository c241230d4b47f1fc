//! # mail.tm Client
//! Asynchronous wrapper around the mail.tm disposable email REST API, providing typed methods to create accounts, authenticate, page through messages, and wait for new mail from Rust using [`Client`] and [`ClientBuilder`].
//!
//! ## Audience and uses
//! For Rust developers who need throwaway addresses in integration tests, demos, or automation scripts without running mail infrastructure: generate credentials, create an account, authenticate for a [`Token`], then either walk the inbox ([`MessageIntro`], [`Message`]) or block on the account's event stream ([`MessageStream`]) until mail arrives.
//!
//! ## Runtime requirements
//! Async-only; run inside a Tokio (v1) runtime. HTTP calls use `reqwest` and the event stream uses `reqwest-eventsource`, so ensure the chosen Tokio features (`rt-multi-thread` or `current_thread`) are available in your application.
//!
//! ## Rate limiting
//! The API answers 429 when polled too eagerly. By default the client absorbs those by retrying the same request after a one second delay, indefinitely; impose a hard deadline with `tokio::time::timeout` if you need one, or disable the behavior through [`ClientBuilder::handle_rate_limit`].
//!
//! ## Out of scope
//! Not a general-purpose mail client, SMTP sender, or durable mailbox. It only wraps the mail.tm service and inherits its availability, quotas, and retention limits. Credential persistence, clipboard, and browser integration are left to the caller.
//!
//! ## Errors
//! All network calls surface transport failures as [`Error::Request`] and non-2xx statuses as [`Error::Status`] carrying the status code and body; 401 means re-authenticate. The crate-wide [`Result`] alias wraps these errors.
//!
//! ## Example
//! ```no_run
//! use mailtm_client::Client;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), mailtm_client::Error> {
//!     let client = Client::new()?;
//!     let credentials = client.generate_credentials(None, None, None).await?;
//!     let account = client.create_account(&credentials).await?;
//!     println!("Created: {}", account.address);
//!
//!     let token = client.authenticate(&credentials).await?;
//!     let intro = client.wait_for_new_message(&account.id, &token).await?;
//!     println!("From: {}, Subject: {}", intro.from.address, intro.subject);
//!
//!     client.delete_account(&account.id, &token).await?;
//!     Ok(())
//! }
//! ```

mod client;
mod collection;
mod connection;
mod error;
mod inbox;
mod models;
mod stream;

pub use client::{Client, ClientBuilder, MessageIter};
pub use collection::CollectionIter;
pub use error::Error;
pub use inbox::{Inbox, InboxEntry};
pub use models::{
    Account, Address, Attachment, Credentials, Domain, LinkedCollection, Message, MessageIntro,
    Source, Token, View,
};
pub use stream::MessageStream;

/// Result type alias for mail.tm operations.
///
/// This is equivalent to `std::result::Result<T, Error>`.
pub type Result<T> = std::result::Result<T, Error>;
