// Squonk2 Core - Domain types, ports and polling use-cases
// NO HTTP dependencies (adapters live in squonk2-sdk)

pub mod application;
pub mod domain;
pub mod port;

pub use domain::DomainError;

pub const VERSION: &str = env!("CARGO_PKG_VERSION");
