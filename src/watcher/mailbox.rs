//! Mailbox collaborator boundary.
//!
//! The external source must expose three capabilities: list unread items
//! with a bounded count, fetch full content by id, and an idempotent
//! mark-as-read. Authentication and token lifecycle belong to the
//! collaborator; this client only attaches a bearer token when given one.

use serde::Deserialize;

use crate::error::ExternalSourceError;

/// One fetched mailbox item.
#[derive(Debug, Clone, Deserialize)]
pub struct MailMessage {
    pub id: String,
    #[serde(default)]
    pub subject: String,
    #[serde(default)]
    pub body: String,
}

/// The three-capability contract of the external event source.
#[allow(async_fn_in_trait)]
pub trait MailboxSource {
    /// Ids of up to `limit` unread items, oldest first.
    async fn list_unread(&self, limit: usize) -> Result<Vec<String>, ExternalSourceError>;

    /// Full content of one item.
    async fn fetch(&self, id: &str) -> Result<MailMessage, ExternalSourceError>;

    /// Mark an item consumed. Marking an already-consumed item is a no-op,
    /// not an error.
    async fn mark_read(&self, id: &str) -> Result<(), ExternalSourceError>;
}

#[derive(Debug, Deserialize)]
struct MessageRef {
    id: String,
}

/// REST mailbox client.
pub struct RestMailbox {
    base_url: String,
    bearer_token: Option<String>,
    http: reqwest::Client,
}

impl RestMailbox {
    pub fn new(base_url: &str, bearer_token: Option<String>, timeout: std::time::Duration) -> Self {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .unwrap_or_default();

        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            bearer_token,
            http,
        }
    }

    fn request(&self, builder: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.bearer_token {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        }
    }
}

impl MailboxSource for RestMailbox {
    async fn list_unread(&self, limit: usize) -> Result<Vec<String>, ExternalSourceError> {
        let url = format!("{}/messages?unread=true&limit={}", self.base_url, limit);
        let response = self.request(self.http.get(&url)).send().await?;

        if !response.status().is_success() {
            return Err(ExternalSourceError::Status(response.status().as_u16()));
        }

        let refs: Vec<MessageRef> = response.json().await?;
        Ok(refs.into_iter().map(|r| r.id).collect())
    }

    async fn fetch(&self, id: &str) -> Result<MailMessage, ExternalSourceError> {
        let url = format!("{}/messages/{}", self.base_url, id);
        let response = self.request(self.http.get(&url)).send().await?;

        if !response.status().is_success() {
            return Err(ExternalSourceError::Status(response.status().as_u16()));
        }

        Ok(response.json().await?)
    }

    async fn mark_read(&self, id: &str) -> Result<(), ExternalSourceError> {
        let url = format!("{}/messages/{}/read", self.base_url, id);
        let response = self.request(self.http.post(&url)).send().await?;

        // 404 means the source already dropped the item from its unread
        // set, which is exactly the already-consumed no-op case.
        let status = response.status();
        if status.is_success() || status.as_u16() == 404 {
            Ok(())
        } else {
            Err(ExternalSourceError::Status(status.as_u16()))
        }
    }
}
