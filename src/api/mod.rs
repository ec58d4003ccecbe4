//! Azure DevOps API access.
//!
//! This module wraps the `azure_devops_rust_api` policy and service endpoint
//! clients behind async traits so resource lifecycles can be tested against
//! in-memory implementations.
//!
//! ## Example
//!
//! ```rust,no_run
//! use azdo_provider::api::AggregatedClient;
//!
//! # #[tokio::main]
//! # async fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let clients = AggregatedClient::new("my-org".to_string(), "my-pat".to_string());
//!
//! let config = clients
//!     .policy()
//!     .get_policy_configuration(clients.organization(), "my-project", 42)
//!     .await?;
//! println!("Policy {:?} is enabled: {:?}", config.id, config.is_enabled);
//! # Ok(())
//! # }
//! ```

mod client;
mod mappers;
pub mod traits;

pub use client::AggregatedClient;
pub use traits::{PolicyOperations, ServiceEndpointOperations};
