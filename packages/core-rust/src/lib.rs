//! RSF Core: service identity, address forms, routing scripts, filters,
//! implementation providers, and the shared error type.

pub mod address;
pub mod contract;
pub mod error;
pub mod filter;
pub mod identity;
pub mod provider;
pub mod script;

pub use address::{AddressSet, BindAddress, InterAddress, InterServiceAddress};
pub use contract::{ContractMeta, ServiceContract};
pub use error::{Result, RsfError};
pub use filter::{FilterChain, FilterDefine, FilterProvider, RsfFilter, RsfRequest, RsfResponse};
pub use identity::ServiceIdentity;
pub use provider::{ConstructorPanic, ImplementationSource, Provider};
pub use script::{FlowControlRef, RouteScriptKind, ScriptResourceRef};
