//! Connection lifecycle management.
//!
//! `ConnectionManager` owns one lazily-created client handle. Every access
//! revalidates it: a dead or non-primary client is discarded and rebuilt,
//! with transient failures and non-primary results drawing from a single
//! bounded retry budget. All state lives behind a mutex so concurrent
//! callers cannot race to double-construct a client.

use crate::config::Config;
use crate::driver::{Driver, MongoDriver};
use crate::error::{ConnError, ConnResult, DriverError};
use crate::naming::Entity;
use mongodb::{Collection, Database};
use tokio::sync::Mutex;
use tokio::time::{Instant, sleep};
use tracing::{error, info};

/// Snapshot of manager state for diagnostics (no secrets exposed).
#[derive(Debug, Clone, serde::Serialize)]
pub struct ManagerStatus {
    /// Whether a client handle currently exists.
    pub connected: bool,
    /// Database all handles are scoped to.
    pub database: String,
    /// Milliseconds since primary status was last verified.
    pub since_last_primary_check_ms: u64,
}

struct State<C> {
    client: Option<C>,
    last_primary_check: Instant,
}

/// Outcome of a single connection attempt.
enum Retry {
    /// Worth another attempt if budget remains.
    Transient(DriverError),
    /// Connected, but not to the writable primary.
    NotPrimary,
    /// Not retryable; surfaced immediately.
    Fatal(DriverError),
}

pub struct ConnectionManager<D: Driver = MongoDriver> {
    config: Config,
    driver: D,
    state: Mutex<State<D::Client>>,
}

impl<D: Driver> ConnectionManager<D> {
    /// Create a manager over a custom driver implementation.
    pub fn with_driver(config: Config, driver: D) -> Self {
        Self {
            config,
            driver,
            state: Mutex::new(State {
                client: None,
                // Start the throttle window now; the first primary check
                // happens once health_check_interval has elapsed.
                last_primary_check: Instant::now(),
            }),
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn driver(&self) -> &D {
        &self.driver
    }

    /// Whether the current client talks to the writable primary.
    ///
    /// Never fails: any error during the status command is logged and
    /// reported as `false`, as is the absence of a client.
    pub async fn ensure_primary(&self) -> bool {
        // Clone the handle out before issuing the status command; a slow
        // server must not hold the state lock against concurrent callers.
        let client = {
            let state = self.state.lock().await;
            state.client.clone()
        };
        match client {
            Some(client) => self.check_primary(&client).await,
            None => false,
        }
    }

    /// A live client handle, connecting with the configured retry budget.
    ///
    /// Blocks on network I/O and on the fixed delay between attempts;
    /// treat it as a slow call on failure paths.
    pub async fn connection(&self) -> ConnResult<D::Client> {
        self.connection_with_retries(self.config.max_retries).await
    }

    /// Like [`connection`](Self::connection) with an explicit retry budget.
    ///
    /// The budget is shared by both failure modes: transient driver errors
    /// and connected-but-not-primary results each consume one retry.
    pub async fn connection_with_retries(&self, retries: u32) -> ConnResult<D::Client> {
        let mut used: u32 = 0;
        loop {
            match self.try_connection().await {
                Ok(client) => return Ok(client),
                Err(Retry::Fatal(source)) => {
                    error!(error = %source, "non-retryable connection failure");
                    return Err(ConnError::Driver(source));
                }
                Err(Retry::Transient(source)) => {
                    if used >= retries {
                        error!(
                            attempts = used + 1,
                            error = %source,
                            "persistent errors while acquiring mongo connection"
                        );
                        return Err(ConnError::RetriesExhausted {
                            attempts: used + 1,
                            source,
                        });
                    }
                    used += 1;
                    info!(attempt = used, error = %source, "retrying mongo connection");
                }
                Err(Retry::NotPrimary) => {
                    if used >= retries {
                        error!(attempts = used + 1, "no writable primary found");
                        return Err(ConnError::NoPrimary { attempts: used + 1 });
                    }
                    used += 1;
                    info!(attempt = used, "not connected to a writable primary, retrying");
                }
            }
            sleep(self.config.retry_delay).await;
        }
    }

    /// One attempt: revive or create the client, then verify primary status
    /// if the throttle window has elapsed.
    async fn try_connection(&self) -> Result<D::Client, Retry> {
        let mut state = self.state.lock().await;

        let mut current = state.client.clone();
        if let Some(existing) = &current {
            if !self.driver.is_alive(existing).await {
                current = None;
            }
        }

        let client = match current {
            Some(client) => client,
            None => {
                state.client = None;
                let fresh = self
                    .driver
                    .connect(self.config.uri())
                    .await
                    .map_err(|err| {
                        if err.is_transient() {
                            Retry::Transient(err)
                        } else {
                            Retry::Fatal(err)
                        }
                    })?;
                info!(database = %self.config.database, "established new mongo connection");
                state.client = Some(fresh.clone());
                fresh
            }
        };

        if state.last_primary_check.elapsed() >= self.config.health_check_interval {
            state.last_primary_check = Instant::now();
            if !self.check_primary(&client).await {
                state.client = None;
                return Err(Retry::NotPrimary);
            }
        }

        Ok(client)
    }

    async fn check_primary(&self, client: &D::Client) -> bool {
        match self.driver.is_primary(client).await {
            Ok(primary) => primary,
            Err(err) => {
                info!(error = %err, "primary status check failed, treating as not primary");
                false
            }
        }
    }

    /// Discard the current client; the next access reconnects.
    pub async fn reset(&self) {
        let mut state = self.state.lock().await;
        state.client = None;
    }

    /// Diagnostic snapshot of the manager state.
    pub async fn status(&self) -> ManagerStatus {
        let state = self.state.lock().await;
        ManagerStatus {
            connected: state.client.is_some(),
            database: self.config.database.clone(),
            since_last_primary_check_ms: state.last_primary_check.elapsed().as_millis() as u64,
        }
    }
}

impl ConnectionManager<MongoDriver> {
    /// Create a manager over the production MongoDB driver.
    pub fn new(config: Config) -> Self {
        Self::with_driver(config, MongoDriver::new())
    }

    /// Create a manager from `MONGO_URI` and `MONGO_DATABASE`.
    pub fn from_env() -> ConnResult<Self> {
        Ok(Self::new(Config::from_env()?))
    }

    /// Handle to the configured database.
    ///
    /// Inherits all failure modes of [`connection`](Self::connection).
    pub async fn database(&self) -> ConnResult<Database> {
        let client = self.connection().await?;
        Ok(client.database(&self.config.database))
    }

    /// Typed handle to the collection named after `T`.
    pub async fn collection<T>(&self) -> ConnResult<Collection<T>>
    where
        T: Entity + Send + Sync,
    {
        Ok(self.database().await?.collection(&T::collection_name()))
    }

    /// Typed handle to an explicitly named collection (no case conversion).
    pub async fn collection_named<T>(&self, name: &str) -> ConnResult<Collection<T>>
    where
        T: Send + Sync,
    {
        Ok(self.database().await?.collection(name))
    }

    /// Irreversibly delete all data in the configured database.
    ///
    /// Intended for test teardown only; keep it off production control
    /// paths.
    pub async fn drop_database(&self) -> ConnResult<()> {
        self.database()
            .await?
            .drop()
            .await
            .map_err(DriverError::from)?;
        info!(database = %self.config.database, "dropped database");
        Ok(())
    }
}
