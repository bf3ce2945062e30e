//! Binds a demo echo service against the in-memory registry, calls it once
//! through its filter chain, and prints the published descriptor.

use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use rsf_core::{
    ContractMeta, FilterChain, RsfFilter, RsfRequest, RsfResponse, ServiceContract,
};
use rsf_server::{RsfBinder, RsfContext, RsfSettings};
use serde_json::{json, Value};
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(name = "rsf-bind", about = "Register a demo RSF service and call it once")]
struct Args {
    /// Logical unit completing bare host:port addresses.
    #[arg(long, env = "RSF_UNIT", default_value = "default")]
    unit: String,

    /// Group of the demo service.
    #[arg(long, env = "RSF_GROUP", default_value = "demo")]
    group: String,

    /// Version of the demo service.
    #[arg(long, env = "RSF_VERSION", default_value = "1.0.0")]
    version: String,

    /// Client-side call timeout in milliseconds.
    #[arg(long, env = "RSF_TIMEOUT_MS", default_value_t = 6000)]
    timeout_ms: i64,

    /// Address to bind, as an RSF URI or host:port. Repeatable.
    #[arg(long = "address", env = "RSF_ADDRESSES", value_delimiter = ',')]
    addresses: Vec<String>,

    /// Flow-control policy pushed at registration.
    #[arg(long, env = "RSF_FLOW_CONTROL")]
    flow_control: Option<String>,

    /// Text sent to the echo service.
    #[arg(long, default_value = "hello")]
    message: String,

    /// Emit logs as JSON lines.
    #[arg(long, env = "RSF_JSON_LOGS")]
    json_logs: bool,
}

trait Echo: Send + Sync {
    fn echo(&self, text: &str) -> String;
}

impl ServiceContract for dyn Echo {
    fn contract() -> ContractMeta {
        ContractMeta::default().name("echo").serialize_type("json")
    }
}

struct Reverse;

impl Echo for Reverse {
    fn echo(&self, text: &str) -> String {
        text.chars().rev().collect()
    }
}

struct Audit;

impl RsfFilter for Audit {
    fn do_filter(
        &self,
        request: &mut RsfRequest,
        response: &mut RsfResponse,
        chain: FilterChain<'_>,
    ) -> rsf_core::Result<()> {
        debug!(bind_id = %request.bind_id, method = %request.method, "audit");
        chain.do_next(request, response)
    }
}

fn init_tracing(json: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    if json {
        tracing_subscriber::fmt().with_env_filter(filter).json().init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }
}

fn main() -> Result<()> {
    let args = Args::parse();
    init_tracing(args.json_logs);

    let settings = RsfSettings {
        unit_name: args.unit.clone(),
        ..RsfSettings::default()
    };
    let local = settings.local_address()?;
    let binder = RsfBinder::new(RsfContext::in_memory(settings)?);
    binder.bind_filter("audit", Audit)?;

    let mut session = binder.rsf_service_instance::<dyn Echo>(Arc::new(Reverse))?;
    session
        .group(&args.group)?
        .version(&args.version)?
        .timeout(args.timeout_ms)?
        .bind_address(&local.to_uri())?;
    for address in &args.addresses {
        session
            .bind_address(address)
            .with_context(|| format!("invalid address {address}"))?;
    }
    if let Some(policy) = &args.flow_control {
        session.update_route(policy.as_str())?;
    }
    let reference = session.register()?;
    info!(bind_id = %reference.bind_id(), "service ready");

    let request = RsfRequest::new("", "echo", vec![json!(args.message)]);
    let response = reference.invoke(request, |echo, req| {
        let text = req.args.first().and_then(Value::as_str).unwrap_or_default();
        Ok(Value::String(echo.echo(text)))
    })?;

    let addresses = reference
        .addresses()
        .map(|set| set.iter().map(ToString::to_string).collect::<Vec<_>>())
        .unwrap_or_default();
    let summary = json!({
        "service": reference.info().as_ref(),
        "addresses": addresses,
        "response": response,
    });
    println!("{}", serde_json::to_string_pretty(&summary)?);

    reference.unregister()?;
    Ok(())
}
