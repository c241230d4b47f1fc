//! Typed records for the mail.tm API resources.
//!
//! Every type here is a plain value object built from a server response;
//! unknown wire keys (`@id`, `@context`, ...) are ignored on decode and
//! the hydra pagination keys are preserved verbatim through serde renames.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A domain usable for temporary addresses. Read-only.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Domain {
    pub id: String,
    pub domain: String,
    pub is_active: bool,
    pub is_private: bool,
    pub created_at: String,
    pub updated_at: String,
}

/// Address and password pair, used as the body of account and token requests.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credentials {
    pub address: String,
    pub password: String,
}

/// Opaque bearer token returned by `POST /token`.
///
/// There is no client-visible expiry: the token is valid until the server
/// rejects it with 401, at which point the only recovery is a fresh
/// [`authenticate`](crate::Client::authenticate) call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Token {
    pub token: String,
}

/// An account resource from the mail.tm API.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Account {
    pub id: String,
    pub address: String,
    pub quota: u64,
    pub used: u64,
    pub is_disabled: bool,
    pub is_deleted: bool,
    pub created_at: String,
    pub updated_at: String,
}

/// A single mailbox participant in `from`/`to`/`cc`/`bcc` lists.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Address {
    pub address: String,
    #[serde(default)]
    pub name: String,
}

/// The summary form of a message, as returned by the list endpoint and
/// by the account event stream.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MessageIntro {
    pub id: String,
    pub msgid: String,
    pub from: Address,
    pub to: Vec<Address>,
    pub subject: String,
    /// Truncated body preview. Absent on some event payloads.
    #[serde(default)]
    pub intro: Option<String>,
    pub seen: bool,
    #[serde(default)]
    pub is_deleted: bool,
    pub has_attachments: bool,
    pub size: u64,
    #[serde(default)]
    pub download_url: String,
    pub created_at: String,
    pub updated_at: String,
    pub account_id: String,
}

/// Attachment metadata carried by a full message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Attachment {
    pub id: String,
    pub filename: String,
    pub content_type: String,
    /// Either a disposition string or `false` on the wire.
    #[serde(default)]
    pub disposition: Value,
    #[serde(default)]
    pub transfer_encoding: String,
    #[serde(default)]
    pub related: bool,
    pub size: u64,
    pub download_url: String,
}

/// The full message resource, fetched individually by id.
///
/// Shares its identity key (`id`) with [`MessageIntro`]; an intro can be
/// upgraded to this richer form without becoming a different entity (see
/// [`Inbox`](crate::Inbox)).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Message {
    pub id: String,
    pub msgid: String,
    pub from: Address,
    pub to: Vec<Address>,
    #[serde(default)]
    pub cc: Vec<Address>,
    #[serde(default)]
    pub bcc: Vec<Address>,
    pub subject: String,
    #[serde(default)]
    pub intro: Option<String>,
    pub seen: bool,
    #[serde(default)]
    pub flagged: bool,
    #[serde(default)]
    pub is_deleted: bool,
    #[serde(default)]
    pub verifications: Value,
    #[serde(default)]
    pub retention: bool,
    #[serde(default)]
    pub retention_date: Option<String>,
    #[serde(default)]
    pub text: Option<String>,
    #[serde(default)]
    pub html: Vec<String>,
    pub has_attachments: bool,
    #[serde(default)]
    pub attachments: Vec<Attachment>,
    pub size: u64,
    pub download_url: String,
    #[serde(default)]
    pub source_url: Option<String>,
    pub created_at: String,
    pub updated_at: String,
    pub account_id: String,
}

impl From<&Message> for MessageIntro {
    fn from(message: &Message) -> Self {
        MessageIntro {
            id: message.id.clone(),
            msgid: message.msgid.clone(),
            from: message.from.clone(),
            to: message.to.clone(),
            subject: message.subject.clone(),
            intro: message.intro.clone(),
            seen: message.seen,
            is_deleted: message.is_deleted,
            has_attachments: message.has_attachments,
            size: message.size,
            download_url: message.download_url.clone(),
            created_at: message.created_at.clone(),
            updated_at: message.updated_at.clone(),
            account_id: message.account_id.clone(),
        }
    }
}

/// The raw rfc822 source of a message, from `GET /sources/{id}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Source {
    pub id: String,
    pub data: String,
    pub download_url: String,
}

/// Navigation links of a partial collection view.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct View {
    #[serde(rename = "hydra:first")]
    pub first: String,
    #[serde(rename = "hydra:last")]
    pub last: String,
    #[serde(rename = "hydra:next", default)]
    pub next: Option<String>,
    #[serde(rename = "hydra:previous", default)]
    pub previous: Option<String>,
}

/// Generic paginated envelope used by every list endpoint.
///
/// `view` is absent entirely on single-page collections; that means "no
/// further pages", not an error.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LinkedCollection<T> {
    #[serde(rename = "hydra:member")]
    pub members: Vec<T>,
    #[serde(rename = "hydra:totalItems")]
    pub total_items: u64,
    #[serde(rename = "hydra:view", default)]
    pub view: Option<View>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn collection_without_view_decodes_as_single_page() {
        let collection: LinkedCollection<Domain> = serde_json::from_value(json!({
            "@context": "/contexts/Domain",
            "@id": "/domains",
            "@type": "hydra:Collection",
            "hydra:member": [],
            "hydra:totalItems": 0,
        }))
        .unwrap();
        assert!(collection.members.is_empty());
        assert_eq!(collection.total_items, 0);
        assert!(collection.view.is_none());
    }

    #[test]
    fn view_keeps_optional_links() {
        let view: View = serde_json::from_value(json!({
            "hydra:first": "/domains?page=1",
            "hydra:last": "/domains?page=2",
            "hydra:next": "/domains?page=2",
        }))
        .unwrap();
        assert_eq!(view.next.as_deref(), Some("/domains?page=2"));
        assert!(view.previous.is_none());
    }

    #[test]
    fn intro_derived_from_full_message_keeps_identity() {
        let message: Message = serde_json::from_value(json!({
            "id": "66b9d17cf26da89c18382e2c",
            "msgid": "<96ff6d36ae6646cd655be56d6a75f605@yagmail>",
            "from": {"address": "sender@domain.example", "name": ""},
            "to": [{"address": "nick@domain.example", "name": ""}],
            "subject": "subject",
            "intro": "test",
            "seen": false,
            "isDeleted": false,
            "hasAttachments": false,
            "size": 3901,
            "downloadUrl": "/messages/66b9d17cf26da89c18382e2c/download",
            "createdAt": "2024-08-12T09:10:18+00:00",
            "updatedAt": "2024-08-12T09:10:20+00:00",
            "accountId": "/accounts/66b66d9cfdf11bf4bf13e676",
        }))
        .unwrap();
        let intro = MessageIntro::from(&message);
        assert_eq!(intro.id, message.id);
        assert_eq!(intro.subject, "subject");
    }
}
