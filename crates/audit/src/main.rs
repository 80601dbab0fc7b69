//! Integrity audit entry point.
//!
//! Loads configuration, connects to the configured document store and
//! reports every record whose relationships are broken. Exits non-zero when
//! violations are found.

use anyhow::{Context, bail};
use musclegram_common::{Config, LoggingConfig};
use musclegram_core::IntegrityAuditor;
use musclegram_db::Repositories;
use tracing::{error, info};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

fn init_tracing(logging: &LoggingConfig) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&logging.filter));
    let registry = tracing_subscriber::registry().with(filter);
    if logging.json {
        registry.with(tracing_subscriber::fmt::layer().json()).init();
    } else {
        registry.with(tracing_subscriber::fmt::layer()).init();
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::load().context("failed to load configuration")?;
    init_tracing(&config.logging);

    info!(backend = ?config.store.backend, "Starting integrity audit");
    let store = musclegram_db::init(&config).await?;
    let repos = Repositories::new(store, &config);
    let auditor = IntegrityAuditor::new(repos, config.consistency.max_comment_depth);

    let report = auditor.run().await?;
    for (collection, count) in &report.scanned {
        info!(collection = %collection, records = count, "Scanned");
    }

    if report.is_clean() {
        info!("No integrity violations");
        return Ok(());
    }

    for violation in &report.violations {
        error!(
            collection = %violation.collection,
            record_id = %violation.record_id,
            "{violation}"
        );
    }
    if config.logging.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    }
    bail!("{} integrity violations found", report.violations.len())
}
