//! Error taxonomy shared by the binder, the registry, and the address pool.

/// Errors raised while configuring, publishing, or using a service binding.
#[derive(Debug, thiserror::Error)]
pub enum RsfError {
    /// A configuration value violates a structural constraint.
    #[error("invalid format: {0}")]
    InvalidFormat(String),
    /// A filter id collides with one already present.
    #[error("repeated filter id: {id}")]
    DuplicateIdentifier { id: String },
    /// The service registry already holds an entry for this bind-ID.
    #[error("service already published: {bind_id}")]
    DuplicateRegistration { bind_id: String },
    /// Constructing a bound implementation failed.
    #[error("failed to instantiate {type_name}")]
    Instantiation {
        type_name: &'static str,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync + 'static>,
    },
    /// The binding session was already registered and is now read-only.
    #[error("binding session already committed: {bind_id}")]
    AlreadyCommitted { bind_id: String },
    /// The registration has no local implementation (consumer-side binding).
    #[error("no implementation bound for {bind_id}")]
    NoProvider { bind_id: String },
    /// No registry or address-pool entry exists for the bind-ID.
    #[error("service not found: {bind_id}")]
    NotFound { bind_id: String },
    /// Failure reported by an external collaborator.
    #[error(transparent)]
    Collaborator(#[from] anyhow::Error),
}

impl RsfError {
    /// Builds an [`RsfError::InvalidFormat`] from anything printable.
    pub fn invalid_format(msg: impl Into<String>) -> Self {
        Self::InvalidFormat(msg.into())
    }

    /// Stable numeric framework code for this error.
    ///
    /// Codes follow the HTTP-style status ranges used on the wire: 4xx for
    /// caller mistakes, 5xx for framework or collaborator failures.
    #[must_use]
    pub fn code(&self) -> u16 {
        match self {
            Self::InvalidFormat(_) => 400,
            Self::NotFound { .. } | Self::NoProvider { .. } => 404,
            Self::DuplicateIdentifier { .. } | Self::DuplicateRegistration { .. } => 409,
            Self::AlreadyCommitted { .. } => 412,
            Self::Instantiation { .. } => 500,
            Self::Collaborator(_) => 502,
        }
    }
}

/// Result alias used throughout the RSF crates.
pub type Result<T> = std::result::Result<T, RsfError>;
