//! Implementation sources a service can be bound to.

use std::any::{type_name, Any};
use std::fmt;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;

use crate::error::{Result, RsfError};

/// Supplies service instances on demand.
///
/// Closures returning `Result<Arc<T>>` are providers.
pub trait Provider<T: ?Sized>: Send + Sync {
    /// # Errors
    ///
    /// Returns an error if no instance can be produced.
    fn get(&self) -> Result<Arc<T>>;
}

impl<T: ?Sized, F> Provider<T> for F
where
    F: Fn() -> Result<Arc<T>> + Send + Sync,
{
    fn get(&self) -> Result<Arc<T>> {
        self()
    }
}

/// A constructor that panicked instead of returning an error.
#[derive(Debug, thiserror::Error)]
#[error("constructor panicked: {0}")]
pub struct ConstructorPanic(pub String);

impl ConstructorPanic {
    fn from_payload(payload: &(dyn Any + Send)) -> Self {
        let message = if let Some(s) = payload.downcast_ref::<String>() {
            s.clone()
        } else if let Some(s) = payload.downcast_ref::<&str>() {
            (*s).to_string()
        } else {
            "unknown panic".to_string()
        };
        Self(message)
    }
}

/// Where a bound service's instances come from. Exactly one per binding.
pub enum ImplementationSource<T: ?Sized> {
    /// Constructs a fresh instance per call; constructor failures are wrapped.
    Factory(Arc<dyn Provider<T>>),
    /// A fixed shared instance.
    Instance(Arc<T>),
    /// A provider owned by the caller.
    External(Arc<dyn Provider<T>>),
}

impl<T: ?Sized + 'static> ImplementationSource<T> {
    /// Builds a factory source from a fallible constructor.
    ///
    /// Any constructor error is returned as [`RsfError::Instantiation`]
    /// carrying the original error as its source. A panicking constructor is
    /// reported the same way, with a [`ConstructorPanic`] source.
    pub fn factory<F, E>(ctor: F) -> Self
    where
        F: Fn() -> std::result::Result<Arc<T>, E> + Send + Sync + 'static,
        E: std::error::Error + Send + Sync + 'static,
    {
        let wrapped = move || {
            let instantiation = |source: Box<dyn std::error::Error + Send + Sync>| {
                RsfError::Instantiation {
                    type_name: type_name::<T>(),
                    source,
                }
            };
            match catch_unwind(AssertUnwindSafe(&ctor)) {
                Ok(built) => built.map_err(|cause| instantiation(Box::new(cause))),
                Err(payload) => {
                    let panic = ConstructorPanic::from_payload(payload.as_ref());
                    tracing::error!(type_name = type_name::<T>(), %panic, "constructor panicked");
                    Err(instantiation(Box::new(panic)))
                }
            }
        };
        Self::Factory(Arc::new(wrapped))
    }

    /// Resolves an instance.
    ///
    /// # Errors
    ///
    /// Returns the provider's error, or [`RsfError::Instantiation`] for a
    /// failing factory.
    pub fn get(&self) -> Result<Arc<T>> {
        match self {
            Self::Factory(provider) | Self::External(provider) => provider.get(),
            Self::Instance(instance) => Ok(Arc::clone(instance)),
        }
    }

    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Factory(_) => "factory",
            Self::Instance(_) => "instance",
            Self::External(_) => "provider",
        }
    }
}

impl<T: ?Sized> Clone for ImplementationSource<T> {
    fn clone(&self) -> Self {
        match self {
            Self::Factory(provider) => Self::Factory(Arc::clone(provider)),
            Self::Instance(instance) => Self::Instance(Arc::clone(instance)),
            Self::External(provider) => Self::External(Arc::clone(provider)),
        }
    }
}

impl<T: ?Sized> fmt::Debug for ImplementationSource<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let kind = match self {
            Self::Factory(_) => "Factory",
            Self::Instance(_) => "Instance",
            Self::External(_) => "External",
        };
        f.write_str(kind)
    }
}

#[cfg(test)]
mod tests {
    use std::error::Error as _;
    use std::sync::atomic::{AtomicU32, Ordering};

    use super::*;

    trait Greeter: Send + Sync {
        fn greet(&self) -> String;
    }

    struct English;

    impl Greeter for English {
        fn greet(&self) -> String {
            "hello".into()
        }
    }

    #[derive(Debug, thiserror::Error)]
    #[error("constructor panicked")]
    struct Broken;

    #[test]
    fn factory_builds_a_fresh_instance_per_call() {
        let built = Arc::new(AtomicU32::new(0));
        let counter = built.clone();
        let source = ImplementationSource::<dyn Greeter>::factory(move || {
            counter.fetch_add(1, Ordering::SeqCst);
            Ok::<_, Broken>(Arc::new(English) as Arc<dyn Greeter>)
        });
        let a = source.get().unwrap();
        let b = source.get().unwrap();
        assert!(!Arc::ptr_eq(&a, &b));
        assert_eq!(built.load(Ordering::SeqCst), 2);
        assert_eq!(source.kind(), "factory");
    }

    #[test]
    fn factory_failure_is_wrapped_with_cause() {
        let source =
            ImplementationSource::<dyn Greeter>::factory(|| Err::<Arc<dyn Greeter>, _>(Broken));
        let Err(err) = source.get() else {
            panic!("factory error must be returned");
        };
        match &err {
            RsfError::Instantiation { type_name, .. } => assert!(type_name.contains("Greeter")),
            other => panic!("unexpected error: {other:?}"),
        }
        assert_eq!(err.source().unwrap().to_string(), "constructor panicked");
    }

    fn unreachable_database() -> std::result::Result<Arc<dyn Greeter>, Broken> {
        panic!("no database")
    }

    #[test]
    fn panicking_factory_is_wrapped() {
        let source = ImplementationSource::<dyn Greeter>::factory(unreachable_database);
        let Err(err) = source.get() else {
            panic!("a panicking constructor must surface as an error");
        };
        assert!(matches!(err, RsfError::Instantiation { .. }));
        assert_eq!(err.code(), 500);
        assert_eq!(
            err.source().unwrap().to_string(),
            "constructor panicked: no database"
        );
    }

    #[test]
    fn instance_is_shared() {
        let instance: Arc<dyn Greeter> = Arc::new(English);
        let source = ImplementationSource::Instance(instance.clone());
        assert!(Arc::ptr_eq(&source.get().unwrap(), &instance));
        assert_eq!(source.get().unwrap().greet(), "hello");
    }

    #[test]
    fn external_provider_errors_pass_through() {
        let provider = || -> Result<Arc<dyn Greeter>> {
            Err(RsfError::NotFound {
                bind_id: "x".into(),
            })
        };
        let source = ImplementationSource::<dyn Greeter>::External(Arc::new(provider));
        assert!(matches!(source.get(), Err(RsfError::NotFound { .. })));
        assert_eq!(format!("{source:?}"), "External");
    }
}
