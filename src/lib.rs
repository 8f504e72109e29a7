//! Resilient MongoDB connection management.
//!
//! This library wraps the MongoDB driver with a small lifecycle layer:
//! lazy client creation, throttled verification that the connection points
//! at the writable primary of a replica set, and bounded retry on transient
//! connection failures. It also derives collection names from entity type
//! names (`UserProfile` -> `user_profile`) and exposes a destructive
//! drop-database helper for test teardown.

pub mod config;
pub mod driver;
pub mod error;
pub mod manager;
pub mod naming;

pub use config::Config;
pub use driver::{Driver, MongoDriver};
pub use error::{ConnError, ConnResult, DriverError};
pub use manager::{ConnectionManager, ManagerStatus};
pub use naming::{Entity, camel_to_snake};
