//! Routing-script and flow-control overrides carried by a binding session.
//!
//! Script bodies are opaque here. A blank or absent body means "leave the
//! existing policy for this level untouched", never "clear it".

use std::fmt;

use serde::{Deserialize, Serialize};

/// Granularity at which a routing script selects addresses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum RouteScriptKind {
    ServiceLevel,
    MethodLevel,
    ArgsLevel,
}

impl RouteScriptKind {
    pub const ALL: [Self; 3] = [Self::ServiceLevel, Self::MethodLevel, Self::ArgsLevel];

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::ServiceLevel => "service",
            Self::MethodLevel => "method",
            Self::ArgsLevel => "args",
        }
    }
}

impl fmt::Display for RouteScriptKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Returns the body only if it has non-whitespace content.
#[must_use]
pub fn non_blank(body: Option<&str>) -> Option<&str> {
    body.filter(|b| !b.trim().is_empty())
}

/// Per-level routing script overrides.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScriptResourceRef {
    pub service_level: Option<String>,
    pub method_level: Option<String>,
    pub args_level: Option<String>,
}

impl ScriptResourceRef {
    pub fn set(&mut self, kind: RouteScriptKind, body: Option<String>) {
        match kind {
            RouteScriptKind::ServiceLevel => self.service_level = body,
            RouteScriptKind::MethodLevel => self.method_level = body,
            RouteScriptKind::ArgsLevel => self.args_level = body,
        }
    }

    #[must_use]
    pub fn get(&self, kind: RouteScriptKind) -> Option<&str> {
        match kind {
            RouteScriptKind::ServiceLevel => self.service_level.as_deref(),
            RouteScriptKind::MethodLevel => self.method_level.as_deref(),
            RouteScriptKind::ArgsLevel => self.args_level.as_deref(),
        }
    }

    /// Non-blank overrides in `ServiceLevel`, `MethodLevel`, `ArgsLevel` order.
    pub fn effective(&self) -> impl Iterator<Item = (RouteScriptKind, &str)> + '_ {
        RouteScriptKind::ALL
            .into_iter()
            .filter_map(|kind| non_blank(self.get(kind)).map(|body| (kind, body)))
    }
}

/// Flow-control policy override.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FlowControlRef {
    pub policy_body: Option<String>,
}

impl FlowControlRef {
    #[must_use]
    pub fn effective(&self) -> Option<&str> {
        non_blank(self.policy_body.as_deref())
    }
}
