//! The seam between the connection manager and the MongoDB driver.
//!
//! `Driver` is the minimal surface the retry loop depends on; `MongoDriver`
//! is the production implementation. Tests substitute a scripted fake to
//! exercise the retry and primary-tracking behavior without a server.

use crate::error::DriverError;
use async_trait::async_trait;
use mongodb::Client;
use mongodb::bson::doc;
use tracing::{debug, info};

/// Driver operations the connection manager needs.
#[async_trait]
pub trait Driver: Send + Sync {
    type Client: Clone + Send + Sync;

    /// Construct a client from a connection URI.
    async fn connect(&self, uri: &str) -> Result<Self::Client, DriverError>;

    /// Liveness probe for an existing client. A `false` result causes the
    /// manager to discard the handle and reconnect.
    async fn is_alive(&self, client: &Self::Client) -> bool;

    /// Whether the server the client talks to is the writable primary.
    async fn is_primary(&self, client: &Self::Client) -> Result<bool, DriverError>;
}

/// Production driver over `mongodb::Client`.
#[derive(Debug, Default, Clone, Copy)]
pub struct MongoDriver;

impl MongoDriver {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Driver for MongoDriver {
    type Client = Client;

    /// Construct a client and verify it can reach a server.
    ///
    /// The driver connects lazily, so an eager ping is issued to surface
    /// unreachable-server conditions here, where the retry loop can see
    /// them, instead of on first use.
    async fn connect(&self, uri: &str) -> Result<Client, DriverError> {
        let client = Client::with_uri_str(uri).await.map_err(DriverError::from)?;
        client
            .database("admin")
            .run_command(doc! { "ping": 1 })
            .await
            .map_err(DriverError::from)?;
        Ok(client)
    }

    async fn is_alive(&self, client: &Client) -> bool {
        match client.database("admin").run_command(doc! { "ping": 1 }).await {
            Ok(_) => true,
            Err(err) => {
                debug!(error = %err, "liveness ping failed");
                false
            }
        }
    }

    /// Run `hello` against the admin database.
    ///
    /// Servers older than 5.0 answer with the legacy `ismaster` field, so
    /// both spellings are checked. When the server is not the primary the
    /// full reply is logged to aid replica-set debugging.
    async fn is_primary(&self, client: &Client) -> Result<bool, DriverError> {
        let reply = client
            .database("admin")
            .run_command(doc! { "hello": 1 })
            .await
            .map_err(DriverError::from)?;

        let primary = reply
            .get_bool("isWritablePrimary")
            .or_else(|_| reply.get_bool("ismaster"))
            .unwrap_or(false);

        if !primary {
            info!(
                reply = %serde_json::to_string(&reply).unwrap_or_default(),
                "mongodb server is not the writable primary"
            );
        }
        Ok(primary)
    }
}
