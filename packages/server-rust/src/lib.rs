//! RSF Server: service binder, binding sessions, registration, and in-memory
//! registry and address pool.

pub mod binder;
pub mod config;
pub mod context;
pub mod memory;
pub mod traits;

pub use binder::{
    FilterRegistry, LinkedBuilder, RegisterReference, RsfBinder, ServiceDefinition, ServiceInfo,
    ServiceKind, SessionState,
};
pub use config::RsfSettings;
pub use context::RsfContext;
pub use traits::{AddressPool, BindCenter, PublishedService};
