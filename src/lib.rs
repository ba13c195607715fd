pub mod cli;
pub mod core;
pub mod providers;
pub mod store;

use crate::core::cache::RateCache;
use crate::core::clock::{Clock, SystemClock};
use crate::core::config::AppConfig;
use crate::core::session::ConverterSession;
use crate::providers::vatcomply::VatComplyProvider;
use crate::store::KeyValueStore;
use anyhow::Result;
use std::sync::Arc;
use tracing::{debug, info, warn};

pub enum AppCommand {
    Convert {
        amount: Option<String>,
        from: Option<String>,
        to: Option<String>,
    },
    Swap,
    Rates,
    Currencies {
        query: Option<String>,
    },
    Refresh,
    Watch {
        interval_secs: u64,
    },
}

pub async fn run_command(
    command: AppCommand,
    config_path: Option<&str>,
    offline: bool,
) -> Result<()> {
    info!("xfx starting...");

    let config = match config_path {
        Some(path) => AppConfig::load_from_path(path)?,
        None => AppConfig::load()?,
    };
    debug!("Loaded config: {config:#?}");

    if let AppCommand::Currencies { query } = &command {
        cli::currencies::run(query.as_deref());
        return Ok(());
    }

    let store = match config.default_data_path() {
        Ok(data_dir) => KeyValueStore::open(&data_dir),
        Err(e) => {
            warn!("No data directory, rates and selections will not be kept: {e:#}");
            KeyValueStore::in_memory()
        }
    };
    let clock: Arc<dyn Clock> = Arc::new(SystemClock);
    let cache = RateCache::new(
        store.durable_or_memory("rates"),
        config.cache.clone(),
        Arc::clone(&clock),
    );
    let online = !(offline || config.offline);
    let mut session = ConverterSession::init(
        config.session.clone(),
        cache,
        store.durable_or_memory("session"),
        clock,
        online,
    );
    let provider = VatComplyProvider::new(&config.providers.vatcomply);

    match command {
        AppCommand::Convert { amount, from, to } => {
            cli::convert::run(
                &mut session,
                &provider,
                amount.as_deref(),
                from.as_deref(),
                to.as_deref(),
            )
            .await
        }
        AppCommand::Swap => cli::convert::swap(&mut session, &provider).await,
        AppCommand::Rates => cli::rates::run(&mut session, &provider).await,
        AppCommand::Refresh => cli::refresh::run(&mut session, &provider).await,
        AppCommand::Watch { interval_secs } => {
            cli::watch::run(&mut session, &provider, interval_secs).await
        }
        AppCommand::Currencies { .. } => Ok(()),
    }
}
