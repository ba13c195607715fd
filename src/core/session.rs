//! Converter session: current selections, rate refreshes and the derived
//! conversion result.
//!
//! All transitions run to completion on `&mut self`. The only suspending step
//! is the provider call inside [`ConverterSession::refresh`]; callers that
//! drive fetches themselves use [`ConverterSession::begin_refresh`] and
//! [`ConverterSession::complete_refresh`].

use crate::core::cache::{KeyValueCollection, RateCache};
use crate::core::clock::Clock;
use crate::core::config::SessionConfig;
use crate::core::conversion::{self, ConversionResult};
use crate::core::currency::{self, Currency, RateProvider, RateSnapshot};
use anyhow::Result;
use chrono::NaiveDate;
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};

pub const FETCH_ERROR_MESSAGE: &str =
    "Failed to fetch exchange rates. Using cached data if available.";

#[derive(Debug, Clone)]
pub struct SessionState {
    /// Amount exactly as typed.
    pub amount: String,
    pub from: &'static Currency,
    pub to: &'static Currency,
    pub online: bool,
    pub loading: bool,
    pub error: Option<String>,
    pub last_updated: Option<String>,
    pub snapshot: Option<Arc<RateSnapshot>>,
    pub result: Option<ConversionResult>,
}

pub struct ConverterSession {
    state: SessionState,
    cache: RateCache,
    selections: Arc<dyn KeyValueCollection>,
    config: SessionConfig,
    clock: Arc<dyn Clock>,
}

impl ConverterSession {
    /// Restores remembered selections and adopts a fresh cached snapshot if
    /// there is one. Never touches the network.
    pub fn init(
        config: SessionConfig,
        cache: RateCache,
        selections: Arc<dyn KeyValueCollection>,
        clock: Arc<dyn Clock>,
        online: bool,
    ) -> Self {
        let amount = selections
            .get(&config.amount_key)
            .unwrap_or_else(|| config.default_amount.clone());
        let from = remembered_currency(selections.as_ref(), &config.from_key, &config.default_from);
        let to = remembered_currency(selections.as_ref(), &config.to_key, &config.default_to);

        let mut session = Self {
            state: SessionState {
                amount,
                from,
                to,
                online,
                loading: false,
                error: None,
                last_updated: None,
                snapshot: None,
                result: None,
            },
            cache,
            selections,
            config,
            clock,
        };

        if let Some(snapshot) = session.cache.load() {
            debug!(base = %snapshot.base, as_of = %snapshot.as_of, "Adopting cached rates");
            session.adopt(snapshot);
        }
        session.recompute();
        session
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    pub fn currencies(&self) -> &'static [Currency] {
        currency::currency_list()
    }

    pub fn set_amount(&mut self, amount: impl Into<String>) {
        self.state.amount = amount.into();
        self.selections_changed();
    }

    pub fn select_from(&mut self, currency: &'static Currency) {
        self.state.from = currency;
        self.selections_changed();
    }

    pub fn select_to(&mut self, currency: &'static Currency) {
        self.state.to = currency;
        self.selections_changed();
    }

    pub fn swap(&mut self) {
        std::mem::swap(&mut self.state.from, &mut self.state.to);
        self.selections_changed();
    }

    /// Records connectivity. Going online does not fetch by itself.
    pub fn set_online(&mut self, online: bool) {
        self.state.online = online;
    }

    /// True when online with a snapshot older than the expiry window.
    pub fn is_stale(&self) -> bool {
        if !self.state.online {
            return false;
        }
        self.state
            .snapshot
            .as_ref()
            .is_some_and(|snapshot| !self.cache.is_fresh(snapshot))
    }

    /// Marks a refresh as in flight. Returns false when the request is
    /// dropped: offline, or a fetch is already running and will serve it.
    pub fn begin_refresh(&mut self) -> bool {
        if !self.state.online {
            debug!("Offline, ignoring refresh request");
            return false;
        }
        if self.state.loading {
            debug!("Refresh already in flight");
            return false;
        }
        self.state.loading = true;
        self.state.error = None;
        true
    }

    /// Applies the outcome of a fetch started with [`Self::begin_refresh`].
    pub fn complete_refresh(&mut self, outcome: Result<RateSnapshot>) {
        self.state.loading = false;
        match outcome {
            Ok(snapshot) => {
                let snapshot = self.cache.store(snapshot);
                info!(base = %snapshot.base, as_of = %snapshot.as_of, "Exchange rates refreshed");
                self.adopt(snapshot);
                self.recompute();
            }
            Err(e) => {
                warn!("Failed to fetch exchange rates: {e:#}");
                self.state.error = Some(FETCH_ERROR_MESSAGE.to_string());
            }
        }
    }

    #[instrument(name = "RefreshRates", skip_all)]
    pub async fn refresh(&mut self, provider: &dyn RateProvider) {
        if !self.begin_refresh() {
            return;
        }
        let outcome = provider.fetch_rates().await;
        self.complete_refresh(outcome);
    }

    pub async fn refresh_if_stale(&mut self, provider: &dyn RateProvider) {
        if self.is_stale() {
            debug!("Cached rates are stale");
            self.refresh(provider).await;
        }
    }

    /// Derives the conversion result from the current amount, currencies and
    /// snapshot. Cleared when there is no snapshot or the amount is not positive.
    pub fn recompute(&mut self) {
        let amount = conversion::parse_amount(&self.state.amount);
        self.state.result = match &self.state.snapshot {
            Some(snapshot) if amount > 0.0 => Some(conversion::convert(
                amount,
                self.state.from.code,
                self.state.to.code,
                &snapshot.table,
                &snapshot.base,
            )),
            _ => None,
        };
    }

    fn adopt(&mut self, snapshot: RateSnapshot) {
        self.state.last_updated = Some(display_as_of(&snapshot.as_of));
        self.state.snapshot = Some(Arc::new(snapshot));
    }

    fn selections_changed(&mut self) {
        self.persist_selections();
        self.recompute();
    }

    fn persist_selections(&self) {
        let entries = [
            (&self.config.amount_key, self.state.amount.as_str()),
            (&self.config.from_key, self.state.from.code),
            (&self.config.to_key, self.state.to.code),
        ];
        for (key, value) in entries {
            if let Err(e) = self.selections.set(key, value) {
                warn!("Failed to remember selection {key}: {e}");
            }
        }
    }

    /// Current wall-clock time as seen by the session.
    pub fn now(&self) -> chrono::DateTime<chrono::Utc> {
        self.clock.now()
    }
}

fn remembered_currency(
    selections: &dyn KeyValueCollection,
    key: &str,
    default_code: &str,
) -> &'static Currency {
    selections
        .get(key)
        .and_then(|code| currency::find_currency(&code))
        .or_else(|| currency::find_currency(default_code))
        .unwrap_or(&currency::SUPPORTED_CURRENCIES[0])
}

/// Renders the as-of date the way it is shown next to "Last updated".
fn display_as_of(as_of: &str) -> String {
    NaiveDate::parse_from_str(as_of, "%Y-%m-%d")
        .map(|date| date.format("%b %-d, %Y").to_string())
        .unwrap_or_else(|_| as_of.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::clock::ManualClock;
    use crate::core::config::CacheConfig;
    use crate::core::currency::{RateTable, find_currency};
    use crate::store::memory::MemoryCollection;
    use anyhow::anyhow;
    use async_trait::async_trait;
    use chrono::{DateTime, Duration};
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn assert_close(actual: f64, expected: f64) {
        assert!(
            (actual - expected).abs() < 1e-9,
            "expected {expected}, got {actual}"
        );
    }

    struct MockProvider {
        call_count: AtomicUsize,
        fail: bool,
    }

    impl MockProvider {
        fn ok() -> Self {
            Self {
                call_count: AtomicUsize::new(0),
                fail: false,
            }
        }

        fn failing() -> Self {
            Self {
                call_count: AtomicUsize::new(0),
                fail: true,
            }
        }

        fn calls(&self) -> usize {
            self.call_count.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl RateProvider for MockProvider {
        async fn fetch_rates(&self) -> Result<RateSnapshot> {
            self.call_count.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                return Err(anyhow!("HTTP error: 503 Service Unavailable"));
            }
            let mut table = RateTable::new();
            table.insert("EUR".to_string(), 0.9);
            table.insert("JPY".to_string(), 150.0);
            Ok(RateSnapshot::new("USD", "2026-10-17", table))
        }
    }

    struct Fixture {
        clock: Arc<ManualClock>,
        rates: Arc<MemoryCollection>,
        selections: Arc<MemoryCollection>,
    }

    impl Fixture {
        fn new() -> Self {
            let start = DateTime::from_timestamp_millis(1_790_000_000_000).unwrap();
            Self {
                clock: Arc::new(ManualClock::new(start)),
                rates: Arc::new(MemoryCollection::new()),
                selections: Arc::new(MemoryCollection::new()),
            }
        }

        fn cache(&self) -> RateCache {
            RateCache::new(self.rates.clone(), CacheConfig::default(), self.clock.clone())
        }

        fn session(&self, online: bool) -> ConverterSession {
            ConverterSession::init(
                SessionConfig::default(),
                self.cache(),
                self.selections.clone(),
                self.clock.clone(),
                online,
            )
        }

        fn seed_cache(&self) {
            let mut table = RateTable::new();
            table.insert("EUR".to_string(), 0.8);
            self.cache().store(RateSnapshot::new("USD", "2026-10-16", table));
        }
    }

    #[test]
    fn test_init_without_cache() {
        let fixture = Fixture::new();
        let session = fixture.session(true);
        let state = session.state();

        assert_eq!(state.amount, "1");
        assert_eq!(state.from.code, "USD");
        assert_eq!(state.to.code, "EUR");
        assert!(state.snapshot.is_none());
        assert!(state.result.is_none());
        assert!(state.last_updated.is_none());
        assert!(!state.loading);
        assert_eq!(session.currencies().len(), 20);
    }

    #[test]
    fn test_init_adopts_cached_snapshot() {
        let fixture = Fixture::new();
        fixture.seed_cache();

        let session = fixture.session(false);
        let state = session.state();
        assert_eq!(state.snapshot.as_ref().map(|s| s.base.as_str()), Some("USD"));
        assert_eq!(state.last_updated.as_deref(), Some("Oct 16, 2026"));

        let result = state.result.as_ref().expect("result from cached rates");
        assert_eq!(result.rate, 0.8);
        assert_eq!(result.converted_amount, 0.8);
    }

    #[test]
    fn test_init_restores_remembered_selections() {
        let fixture = Fixture::new();
        fixture.selections.set("currency_converter_amount", "250").unwrap();
        fixture.selections.set("currency_converter_from", "GBP").unwrap();
        fixture.selections.set("currency_converter_to", "NOPE").unwrap();

        let session = fixture.session(true);
        assert_eq!(session.state().amount, "250");
        assert_eq!(session.state().from.code, "GBP");
        assert_eq!(session.state().to.code, "EUR", "unknown code falls back to default");
    }

    #[test]
    fn test_edits_recompute_and_persist() {
        let fixture = Fixture::new();
        fixture.seed_cache();
        let mut session = fixture.session(true);

        session.set_amount("100");
        assert_close(session.state().result.as_ref().unwrap().converted_amount, 80.0);
        assert_eq!(
            fixture.selections.get("currency_converter_amount").as_deref(),
            Some("100")
        );

        session.swap();
        assert_eq!(session.state().from.code, "EUR");
        assert_eq!(session.state().to.code, "USD");
        assert_close(session.state().result.as_ref().unwrap().converted_amount, 125.0);
        assert_eq!(
            fixture.selections.get("currency_converter_from").as_deref(),
            Some("EUR")
        );
        assert_eq!(
            fixture.selections.get("currency_converter_to").as_deref(),
            Some("USD")
        );

        session.select_to(find_currency("JPY").unwrap());
        let result = session.state().result.as_ref().unwrap();
        assert_eq!(result.rate, 0.0, "JPY is missing from the cached table");
        assert_eq!(result.converted_amount, 0.0);
    }

    #[test]
    fn test_non_positive_amount_clears_result() {
        let fixture = Fixture::new();
        fixture.seed_cache();
        let mut session = fixture.session(true);
        assert!(session.state().result.is_some());

        session.set_amount("-3");
        assert!(session.state().result.is_none());

        session.set_amount("abc");
        assert!(session.state().result.is_none());

        session.set_amount("2,5");
        assert_eq!(session.state().result.as_ref().unwrap().amount, 2.5);
    }

    #[test]
    fn test_edits_without_snapshot_keep_result_empty() {
        let fixture = Fixture::new();
        let mut session = fixture.session(true);

        session.set_amount("10");
        session.select_from(find_currency("JPY").unwrap());
        assert!(session.state().result.is_none());
    }

    #[tokio::test]
    async fn test_refresh_success_replaces_snapshot() {
        let fixture = Fixture::new();
        fixture.seed_cache();
        let mut session = fixture.session(true);
        session.set_amount("100");
        let previous = session.state().snapshot.clone().unwrap();

        let provider = MockProvider::ok();
        session.refresh(&provider).await;

        let state = session.state();
        assert_eq!(provider.calls(), 1);
        assert!(!state.loading);
        assert!(state.error.is_none());
        assert_eq!(state.last_updated.as_deref(), Some("Oct 17, 2026"));

        let snapshot = state.snapshot.as_ref().unwrap();
        assert!(!Arc::ptr_eq(snapshot, &previous));
        assert_eq!(previous.table.get("EUR"), Some(&0.8), "old snapshot untouched");
        assert_eq!(snapshot.fetched_at, fixture.clock.now());
        assert_close(state.result.as_ref().unwrap().converted_amount, 90.0);

        // Persisted for the next session
        let cached = fixture.cache().load().expect("stored after refresh");
        assert_eq!(&cached, snapshot.as_ref());
    }

    #[tokio::test]
    async fn test_refresh_offline_is_noop() {
        let fixture = Fixture::new();
        let mut session = fixture.session(false);
        let provider = MockProvider::ok();

        session.refresh(&provider).await;

        assert_eq!(provider.calls(), 0);
        assert!(!session.state().loading);
        assert!(session.state().error.is_none());
        assert!(session.state().snapshot.is_none());
    }

    #[tokio::test]
    async fn test_refresh_failure_keeps_previous_data() {
        let fixture = Fixture::new();
        fixture.seed_cache();
        let mut session = fixture.session(true);
        let before_snapshot = session.state().snapshot.clone();
        let before_result = session.state().result.clone();

        let provider = MockProvider::failing();
        session.refresh(&provider).await;

        let state = session.state();
        assert_eq!(provider.calls(), 1);
        assert!(!state.loading);
        assert_eq!(state.error.as_deref(), Some(FETCH_ERROR_MESSAGE));
        assert_eq!(state.snapshot, before_snapshot);
        assert_eq!(state.result, before_result);
    }

    #[tokio::test]
    async fn test_successful_refresh_clears_previous_error() {
        let fixture = Fixture::new();
        let mut session = fixture.session(true);

        session.refresh(&MockProvider::failing()).await;
        assert!(session.state().error.is_some());

        session.refresh(&MockProvider::ok()).await;
        assert!(session.state().error.is_none());
        assert!(session.state().snapshot.is_some());
    }

    #[test]
    fn test_overlapping_refresh_requests_are_joined() {
        let fixture = Fixture::new();
        let mut session = fixture.session(true);

        assert!(session.begin_refresh());
        assert!(session.state().loading);
        assert!(!session.begin_refresh(), "second request joins the first");

        session.complete_refresh(Err(anyhow!("timeout")));
        assert!(!session.state().loading);
        assert!(session.begin_refresh(), "a new request may start afterwards");
    }

    #[test]
    fn test_late_completion_applies_to_current_selections() {
        let fixture = Fixture::new();
        let mut session = fixture.session(true);
        assert!(session.begin_refresh());

        session.set_amount("10");
        session.select_to(find_currency("JPY").unwrap());

        let mut table = RateTable::new();
        table.insert("JPY".to_string(), 150.0);
        session.complete_refresh(Ok(RateSnapshot::new("USD", "2026-10-17", table)));

        let result = session.state().result.as_ref().unwrap();
        assert_eq!(result.to_currency, "JPY");
        assert_close(result.converted_amount, 1500.0);
    }

    #[tokio::test]
    async fn test_staleness_triggers_refresh_only_when_online() {
        let fixture = Fixture::new();
        fixture.seed_cache();
        let mut session = fixture.session(true);
        let provider = MockProvider::ok();

        session.refresh_if_stale(&provider).await;
        assert_eq!(provider.calls(), 0, "fresh rates are not refetched");

        fixture.clock.advance(Duration::minutes(5) + Duration::seconds(1));
        session.set_online(false);
        assert!(!session.is_stale());
        session.refresh_if_stale(&provider).await;
        assert_eq!(provider.calls(), 0, "offline never fetches");

        session.set_online(true);
        assert!(session.is_stale());
        session.refresh_if_stale(&provider).await;
        assert_eq!(provider.calls(), 1);
        assert!(!session.is_stale());
    }

    #[tokio::test]
    async fn test_no_snapshot_is_not_stale() {
        let fixture = Fixture::new();
        let mut session = fixture.session(true);
        let provider = MockProvider::ok();

        assert!(!session.is_stale());
        session.refresh_if_stale(&provider).await;
        assert_eq!(provider.calls(), 0);
    }

    #[test]
    fn test_display_as_of() {
        assert_eq!(display_as_of("2026-01-05"), "Jan 5, 2026");
        assert_eq!(display_as_of("yesterday"), "yesterday");
    }
}
