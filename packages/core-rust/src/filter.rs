//! Request filters and the chain that runs them around a service call.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::Result;

// ---------------------------------------------------------------------------
// Request / response
// ---------------------------------------------------------------------------

/// A call routed to one published service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RsfRequest {
    pub bind_id: String,
    pub method: String,
    pub args: Vec<Value>,
    /// Free-form attributes filters may read or attach (auth tokens, trace ids).
    #[serde(default)]
    pub attributes: BTreeMap<String, String>,
}

impl RsfRequest {
    #[must_use]
    pub fn new(bind_id: impl Into<String>, method: impl Into<String>, args: Vec<Value>) -> Self {
        Self {
            bind_id: bind_id.into(),
            method: method.into(),
            args,
            attributes: BTreeMap::new(),
        }
    }
}

/// Outcome of a call as seen by the filters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RsfResponse {
    pub status: u16,
    pub value: Value,
    pub message: Option<String>,
}

impl RsfResponse {
    pub const OK: u16 = 200;

    /// Marks the response as finished with a non-OK status.
    pub fn reject(&mut self, status: u16, message: impl Into<String>) {
        self.status = status;
        self.value = Value::Null;
        self.message = Some(message.into());
    }

    #[must_use]
    pub fn is_ok(&self) -> bool {
        self.status == Self::OK
    }
}

impl Default for RsfResponse {
    fn default() -> Self {
        Self {
            status: Self::OK,
            value: Value::Null,
            message: None,
        }
    }
}

// ---------------------------------------------------------------------------
// RsfFilter
// ---------------------------------------------------------------------------

/// A named processing step applied around service invocation.
///
/// A filter continues the call with `chain.do_next(..)` or short-circuits by
/// returning without calling it.
pub trait RsfFilter: Send + Sync {
    /// # Errors
    ///
    /// Returns whatever error the filter or the rest of the chain raises.
    fn do_filter(
        &self,
        request: &mut RsfRequest,
        response: &mut RsfResponse,
        chain: FilterChain<'_>,
    ) -> Result<()>;
}

/// Produces the filter instance used for a call.
pub type FilterProvider = Arc<dyn Fn() -> Arc<dyn RsfFilter> + Send + Sync>;

/// A filter registered under a unique id.
#[derive(Clone)]
pub struct FilterDefine {
    id: String,
    provider: FilterProvider,
}

impl FilterDefine {
    /// Wraps a single shared instance.
    pub fn from_instance(id: impl Into<String>, filter: impl RsfFilter + 'static) -> Self {
        let filter: Arc<dyn RsfFilter> = Arc::new(filter);
        Self {
            id: id.into(),
            provider: Arc::new(move || Arc::clone(&filter)),
        }
    }

    pub fn from_provider(id: impl Into<String>, provider: FilterProvider) -> Self {
        Self {
            id: id.into(),
            provider,
        }
    }

    #[must_use]
    pub fn id(&self) -> &str {
        &self.id
    }

    #[must_use]
    pub fn provider(&self) -> FilterProvider {
        Arc::clone(&self.provider)
    }

    /// Resolves the filter instance from the provider.
    #[must_use]
    pub fn filter(&self) -> Arc<dyn RsfFilter> {
        (self.provider)()
    }
}

impl fmt::Debug for FilterDefine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FilterDefine").field("id", &self.id).finish_non_exhaustive()
    }
}

// ---------------------------------------------------------------------------
// FilterChain
// ---------------------------------------------------------------------------

/// Terminal step of the chain: dispatches to the service implementation.
pub type Invoker<'a> = dyn Fn(&RsfRequest, &mut RsfResponse) -> Result<()> + 'a;

/// The remaining filters of one call, followed by the invoker.
pub struct FilterChain<'a> {
    filters: &'a [FilterDefine],
    invoker: &'a Invoker<'a>,
}

impl<'a> FilterChain<'a> {
    #[must_use]
    pub fn new(filters: &'a [FilterDefine], invoker: &'a Invoker<'a>) -> Self {
        Self { filters, invoker }
    }

    /// Runs the next filter, or the invoker once every filter has run.
    ///
    /// # Errors
    ///
    /// Propagates the first error raised by a filter or the invoker.
    pub fn do_next(self, request: &mut RsfRequest, response: &mut RsfResponse) -> Result<()> {
        match self.filters.split_first() {
            Some((head, rest)) => {
                tracing::trace!(filter_id = head.id(), bind_id = %request.bind_id, "filter");
                let next = FilterChain {
                    filters: rest,
                    invoker: self.invoker,
                };
                head.filter().do_filter(request, response, next)
            }
            None => (self.invoker)(request, response),
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use serde_json::json;

    use super::*;

    struct Tag {
        name: &'static str,
        log: Arc<Mutex<Vec<String>>>,
    }

    impl RsfFilter for Tag {
        fn do_filter(
            &self,
            request: &mut RsfRequest,
            response: &mut RsfResponse,
            chain: FilterChain<'_>,
        ) -> Result<()> {
            self.log.lock().unwrap().push(format!("before:{}", self.name));
            let result = chain.do_next(request, response);
            self.log.lock().unwrap().push(format!("after:{}", self.name));
            result
        }
    }

    struct Deny;

    impl RsfFilter for Deny {
        fn do_filter(
            &self,
            _request: &mut RsfRequest,
            response: &mut RsfResponse,
            _chain: FilterChain<'_>,
        ) -> Result<()> {
            response.reject(403, "denied");
            Ok(())
        }
    }

    #[test]
    fn filters_wrap_invoker_in_order() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let filters = vec![
            FilterDefine::from_instance("a", Tag { name: "a", log: log.clone() }),
            FilterDefine::from_instance("b", Tag { name: "b", log: log.clone() }),
        ];
        let invoke_log = log.clone();
        let invoker = move |req: &RsfRequest, resp: &mut RsfResponse| -> Result<()> {
            invoke_log.lock().unwrap().push("invoke".to_string());
            resp.value = req.args[0].clone();
            Ok(())
        };

        let mut request = RsfRequest::new("[g]svc-1.0", "echo", vec![json!("hi")]);
        let mut response = RsfResponse::default();
        FilterChain::new(&filters, &invoker)
            .do_next(&mut request, &mut response)
            .unwrap();

        assert_eq!(response.value, json!("hi"));
        assert_eq!(
            *log.lock().unwrap(),
            vec!["before:a", "before:b", "invoke", "after:b", "after:a"]
        );
    }

    #[test]
    fn filter_can_short_circuit() {
        let filters = vec![FilterDefine::from_instance("deny", Deny)];
        let invoker = |_: &RsfRequest, _: &mut RsfResponse| -> Result<()> {
            panic!("invoker must not run")
        };
        let mut request = RsfRequest::new("b", "m", Vec::new());
        let mut response = RsfResponse::default();
        FilterChain::new(&filters, &invoker)
            .do_next(&mut request, &mut response)
            .unwrap();
        assert_eq!(response.status, 403);
        assert!(!response.is_ok());
    }

    #[test]
    fn provider_is_consulted_per_resolution() {
        let calls = Arc::new(Mutex::new(0));
        let counter = calls.clone();
        let define = FilterDefine::from_provider(
            "fresh",
            Arc::new(move || {
                *counter.lock().unwrap() += 1;
                Arc::new(Deny) as Arc<dyn RsfFilter>
            }),
        );
        let _ = define.filter();
        let _ = define.filter();
        assert_eq!(*calls.lock().unwrap(), 2);
        assert_eq!(format!("{define:?}"), "FilterDefine { id: \"fresh\", .. }");
    }

    #[test]
    fn request_serializes_without_attributes() {
        let request: RsfRequest =
            serde_json::from_str(r#"{"bind_id":"b","method":"m","args":[1]}"#).unwrap();
        assert!(request.attributes.is_empty());
        assert_eq!(request.args, vec![json!(1)]);
    }
}
