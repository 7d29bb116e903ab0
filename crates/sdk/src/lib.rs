//! Squonk2 SDK - Rust client for the Squonk2 REST APIs
//!
//! Simplified access to the Data Manager (projects, files, job instances,
//! tasks) and the Account Server (organisations, units, products, assets).
//! Every method returns a typed `Result`; failures carry an [`ErrorKind`].
//!
//! # Example
//!
//! ```no_run
//! use squonk2_sdk::{get_access_token, ClientConfig, DmClient, KeycloakCredentials};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let credentials = KeycloakCredentials::new(
//!         "https://example.com/auth",
//!         "squonk2",
//!         "data-manager-api",
//!         "dlister",
//!         "secret",
//!     );
//!     let token = get_access_token(&credentials).await?;
//!
//!     let dm = DmClient::new(ClientConfig::new("https://example.com/data-manager-api"))?;
//!     dm.ping(&token).await?;
//!
//!     for project in dm.get_available_projects(&token).await?.projects {
//!         println!("{} ({})", project.name, project.project_id);
//!     }
//!
//!     Ok(())
//! }
//! ```

pub mod as_api;
pub mod auth;
pub mod config;
pub mod dm_api;
pub mod environment;
mod error;
pub mod executor;
pub mod types;

pub use as_api::AsClient;
pub use auth::{get_access_token, get_access_token_with_timeout, KeycloakCredentials};
pub use crate::config::{ClientConfig, Timeouts};
pub use dm_api::{DmClient, DmProbe, InstanceOptions, TEST_PRODUCT_ID};
pub use environment::Environment;
pub use error::{ApiError, EnvironmentError, ErrorKind, Result, TokenError};
pub use executor::{ApiRequest, ApiResponse, HttpMethod, RequestExecutor};
pub use types::*;

// Core types callers need alongside the clients
pub use squonk2_core::application::{
    wait_for_instance, wait_for_task, JobOutcome, PollPolicy, TaskOutcome,
};
pub use squonk2_core::domain::{InstancePhase, JobSpecification};
