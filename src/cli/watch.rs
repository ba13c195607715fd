use super::convert::{ensure_rates, render};
use super::ui;
use crate::core::currency::RateProvider;
use crate::core::session::ConverterSession;
use anyhow::Result;
use std::future::Future;
use std::time::Duration;
use tracing::{info, warn};

/// Re-checks staleness every `interval_secs` and reprints the conversion until Ctrl-C.
pub async fn run(
    session: &mut ConverterSession,
    provider: &dyn RateProvider,
    interval_secs: u64,
) -> Result<()> {
    let shutdown = until_signal(tokio::signal::ctrl_c());
    watch_until(session, provider, interval_secs, shutdown).await;
    Ok(())
}

/// Resolves when `signal` fires. If the listener cannot be installed this
/// never resolves, so the watch keeps running instead of exiting at once.
async fn until_signal(signal: impl Future<Output = std::io::Result<()>>) {
    if let Err(e) = signal.await {
        warn!("Could not listen for Ctrl-C, watching until killed: {e}");
        std::future::pending::<()>().await;
    }
}

/// Runs the watch loop until `shutdown` resolves. Returns the number of checks made.
pub async fn watch_until(
    session: &mut ConverterSession,
    provider: &dyn RateProvider,
    interval_secs: u64,
    shutdown: impl Future<Output = ()>,
) -> usize {
    let mut ticker = tokio::time::interval(Duration::from_secs(interval_secs.max(1)));
    ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
    tokio::pin!(shutdown);

    let mut checks = 0;
    loop {
        tokio::select! {
            _ = ticker.tick() => {
                ensure_rates(session, provider).await;
                checks += 1;
                println!(
                    "\n{}",
                    ui::style_text(
                        &format!("Checked at {}", session.now().format("%H:%M:%S UTC")),
                        ui::StyleType::Subtle
                    )
                );
                println!("{}", render(session.state()));
            }
            _ = &mut shutdown => {
                info!("Stopping watch after {} checks", checks);
                break;
            }
        }
    }
    checks
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::cache::RateCache;
    use crate::core::clock::ManualClock;
    use crate::core::config::{CacheConfig, SessionConfig};
    use crate::core::currency::{RateSnapshot, RateTable};
    use crate::store::memory::MemoryCollection;
    use async_trait::async_trait;
    use chrono::DateTime;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Default)]
    struct CountingProvider {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl RateProvider for CountingProvider {
        async fn fetch_rates(&self) -> anyhow::Result<RateSnapshot> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let mut table = RateTable::new();
            table.insert("EUR".to_string(), 0.9);
            Ok(RateSnapshot::new("USD", "2026-10-17", table))
        }
    }

    #[tokio::test]
    async fn test_watch_checks_until_shutdown() {
        let clock = Arc::new(ManualClock::new(
            DateTime::from_timestamp_millis(1_790_000_000_000).unwrap(),
        ));
        let cache = RateCache::new(
            Arc::new(MemoryCollection::new()),
            CacheConfig::default(),
            clock.clone(),
        );
        let mut session = ConverterSession::init(
            SessionConfig::default(),
            cache,
            Arc::new(MemoryCollection::new()),
            clock,
            true,
        );
        let provider = CountingProvider::default();

        let checks = watch_until(
            &mut session,
            &provider,
            3600,
            tokio::time::sleep(Duration::from_millis(100)),
        )
        .await;

        assert_eq!(checks, 1);
        assert_eq!(provider.calls.load(Ordering::SeqCst), 1);
        assert!(session.state().result.is_some());
    }

    #[tokio::test]
    async fn test_signal_listener_failure_keeps_watching() {
        let failed = until_signal(async { Err(std::io::Error::other("no signal driver")) });
        let outcome = tokio::time::timeout(Duration::from_millis(50), failed).await;
        assert!(outcome.is_err(), "watch must not stop when Ctrl-C cannot be observed");

        let fired = until_signal(async { Ok(()) });
        assert!(tokio::time::timeout(Duration::from_millis(50), fired).await.is_ok());
    }
}
