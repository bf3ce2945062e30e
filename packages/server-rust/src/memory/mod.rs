//! In-memory collaborators: a registry and an address pool that only store
//! what the binder publishes.
//!
//! - [`bind_center`]: `DashMap`-backed service registry
//! - [`address_pool`]: per-service addresses, flow control, and route scripts

pub mod address_pool;
pub mod bind_center;

pub use address_pool::InMemoryAddressPool;
pub use bind_center::InMemoryBindCenter;
