// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

use anyhow::{anyhow, Result};
use clap::Parser;
use futures::future::try_join_all;
use kube::Client;
use orc::{
    config::Args,
    constants::{EVENT_REPORTER, TOKIO_WORKER_THREADS},
    context::Context,
    controller::run_controller,
    crd::all_crds,
    events::KubeEventPublisher,
    metrics,
};
use std::net::SocketAddr;
use std::sync::Arc;
use tracing::{debug, error, info};

fn main() -> Result<()> {
    // Build Tokio runtime with custom thread names
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .worker_threads(TOKIO_WORKER_THREADS)
        .thread_name("orc-controller")
        .enable_all()
        .build()?;

    runtime.block_on(async_main())
}

/// All CRDs as one multi-document YAML stream.
fn crd_manifests() -> Result<String> {
    let mut out = String::new();
    for crd in all_crds() {
        out.push_str("---\n");
        out.push_str(&serde_yaml::to_string(&crd)?);
    }
    Ok(out)
}

fn init_logging() {
    // Respects RUST_LOG (default: info) and RUST_LOG_FORMAT (text or json)
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));

    let log_format = std::env::var("RUST_LOG_FORMAT").unwrap_or_else(|_| "text".to_string());

    match log_format.to_lowercase().as_str() {
        "json" => {
            tracing_subscriber::fmt()
                .with_env_filter(env_filter)
                .with_file(true)
                .with_line_number(true)
                .with_thread_names(true)
                .with_target(false)
                .json()
                .init();
        }
        _ => {
            tracing_subscriber::fmt()
                .with_env_filter(env_filter)
                .with_file(true)
                .with_line_number(true)
                .with_thread_names(true)
                .with_target(false)
                .with_ansi(true)
                .compact()
                .init();
        }
    }
}

async fn async_main() -> Result<()> {
    let args = Args::parse();

    if args.crd {
        print!("{}", crd_manifests()?);
        return Ok(());
    }

    init_logging();
    info!(version = env!("CARGO_PKG_VERSION"), "Starting OpenStack resource controller");

    rustls::crypto::ring::default_provider()
        .install_default()
        .map_err(|_| anyhow!("a rustls crypto provider is already installed"))?;

    let kinds = args.enabled_kinds()?;
    let metrics_addr: SocketAddr = args.metrics_bind_address.parse()?;

    debug!("Initializing Kubernetes client");
    let client = Client::try_default().await?;
    let events = Arc::new(KubeEventPublisher::new(client.clone(), EVENT_REPORTER));
    let ctx = Arc::new(Context::new(client, events));

    info!(controllers = ?kinds, namespace = ?args.namespace, "Starting controllers");

    let controllers = kinds
        .into_iter()
        .map(|kind| run_controller(kind, ctx.clone(), args.clone()));

    // Controllers stop on SIGTERM/SIGINT; the metrics server should never exit.
    tokio::select! {
        result = metrics::serve(metrics_addr) => {
            error!("CRITICAL: metrics server exited unexpectedly: {:?}", result);
            result?;
            anyhow::bail!("metrics server exited unexpectedly without error")
        }
        result = try_join_all(controllers) => {
            result?;
            info!("All controllers stopped");
            Ok(())
        }
    }
}
