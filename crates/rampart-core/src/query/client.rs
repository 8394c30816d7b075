// ── Query cache and scheduler ──
//
// One `QueryEntry` per key: a `watch` channel carrying the state observers
// see, the in-flight request slot that deduplicates triggers, and an
// observer count. Each subscription owns a poll task driven by its own
// interval and the shared focus broadcast.
//
// Invalidation bumps the entry's generation. A trigger only joins an
// in-flight request started at the current generation, and a request that
// finishes after a newer generation began publishes nothing.

use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use chrono::Utc;
use dashmap::DashMap;
use tokio::sync::{broadcast, watch};
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use super::fetcher::QueryFetcher;
use super::key::QueryKey;
use super::state::{QueryData, QueryError, QueryState};
use super::subscription::{ObserverGuard, Subscription};

const FOCUS_CHANNEL_SIZE: usize = 16;

type FetchOutcome = Result<Arc<QueryData>, QueryError>;

/// How a subscription keeps its data fresh.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RefreshPolicy {
    /// Refetch period. `None` fetches once and then only on focus,
    /// invalidation, or manual refresh.
    pub interval: Option<Duration>,
    pub refetch_on_focus: bool,
}

impl RefreshPolicy {
    pub fn every(interval: Duration) -> Self {
        Self {
            interval: Some(interval),
            refetch_on_focus: true,
        }
    }

    pub fn manual() -> Self {
        Self {
            interval: None,
            refetch_on_focus: true,
        }
    }
}

struct InFlight {
    generation: u64,
    done: watch::Receiver<Option<FetchOutcome>>,
}

pub(crate) struct QueryEntry {
    state: watch::Sender<QueryState>,
    in_flight: Mutex<Option<InFlight>>,
    generation: AtomicU64,
    observers: AtomicUsize,
    /// Set once the last observer leaves.
    released: AtomicBool,
}

impl QueryEntry {
    fn new() -> Self {
        let (state, _) = watch::channel(QueryState::default());
        Self {
            state,
            in_flight: Mutex::new(None),
            generation: AtomicU64::new(0),
            observers: AtomicUsize::new(0),
            released: AtomicBool::new(false),
        }
    }

    pub(crate) fn add_observer(&self) {
        self.observers.fetch_add(1, Ordering::SeqCst);
    }

    pub(crate) fn remove_observer(&self) {
        if self.observers.fetch_sub(1, Ordering::SeqCst) == 1 {
            self.released.store(true, Ordering::SeqCst);
        }
    }

    fn has_observers(&self) -> bool {
        self.observers.load(Ordering::SeqCst) > 0
    }

    fn generation(&self) -> u64 {
        self.generation.load(Ordering::SeqCst)
    }

    /// Was observed, no longer is, and has nothing outstanding.
    fn is_abandoned(&self) -> bool {
        self.released.load(Ordering::SeqCst)
            && !self.has_observers()
            && self
                .in_flight
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .is_none()
    }
}

/// Key-addressed cache with periodic refresh, focus refetch, in-flight
/// deduplication, and invalidation.
///
/// Cheaply cloneable; clones share the cache.
pub struct QueryClient<F: QueryFetcher> {
    inner: Arc<QueryInner<F>>,
}

impl<F: QueryFetcher> Clone for QueryClient<F> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

struct QueryInner<F> {
    fetcher: F,
    entries: DashMap<QueryKey, Arc<QueryEntry>>,
    focus: broadcast::Sender<()>,
    cancel: CancellationToken,
}

impl<F: QueryFetcher> QueryClient<F> {
    pub fn new(fetcher: F) -> Self {
        let (focus, _) = broadcast::channel(FOCUS_CHANNEL_SIZE);
        Self {
            inner: Arc::new(QueryInner {
                fetcher,
                entries: DashMap::new(),
                focus,
                cancel: CancellationToken::new(),
            }),
        }
    }

    pub fn fetcher(&self) -> &F {
        &self.inner.fetcher
    }

    /// Start observing `key`. Fetches immediately, then per `policy`,
    /// until the returned handle is dropped or unsubscribed.
    pub fn subscribe(&self, key: QueryKey, policy: RefreshPolicy) -> Subscription {
        self.inner.prune();
        let entry = self.inner.entry(&key);
        entry.add_observer();

        let cancel = self.inner.cancel.child_token();
        let receiver = entry.state.subscribe();
        debug!(%key, ?policy, "subscribing");

        tokio::spawn(poll_task(
            Arc::clone(&self.inner),
            key.clone(),
            policy,
            cancel.clone(),
        ));

        Subscription::new(key, receiver, ObserverGuard::new(entry, cancel))
    }

    /// Fetch `key` now, joining an outstanding request if there is one.
    pub async fn refresh(&self, key: &QueryKey) -> Result<Arc<QueryData>, QueryError> {
        self.inner.fetch(key).await
    }

    /// Snapshot of the current state for `key`, if it was ever requested.
    pub fn state(&self, key: &QueryKey) -> Option<QueryState> {
        self.inner
            .entries
            .get(key)
            .map(|e| e.state.borrow().clone())
    }

    /// Mark `key` stale and refetch it if anyone is watching.
    ///
    /// A request already in flight was issued before the change being
    /// signalled, so it is never joined and its result is discarded.
    pub async fn invalidate(&self, key: &QueryKey) {
        self.invalidate_matching(|k| k == key).await;
    }

    /// [`invalidate`](Self::invalidate) every cached key matching `pred`.
    pub async fn invalidate_matching(&self, pred: impl Fn(&QueryKey) -> bool) {
        let matched: Vec<(QueryKey, Arc<QueryEntry>)> = self
            .inner
            .entries
            .iter()
            .filter(|e| pred(e.key()))
            .map(|e| (e.key().clone(), Arc::clone(e.value())))
            .collect();

        for (key, entry) in matched {
            entry.generation.fetch_add(1, Ordering::SeqCst);
            entry.state.send_modify(|s| s.is_stale = true);
            if entry.has_observers() {
                debug!(%key, "invalidated; refetching");
                // Failures are already recorded in the entry's state.
                let _ = self.inner.fetch(&key).await;
            } else {
                debug!(%key, "invalidated");
            }
        }
    }

    /// The view regained focus: subscriptions with `refetch_on_focus`
    /// refetch.
    pub fn focus(&self) {
        let _ = self.inner.focus.send(());
    }

    /// Stop every poll task. In-flight requests still complete.
    pub fn shutdown(&self) {
        self.inner.cancel.cancel();
    }
}

impl<F: QueryFetcher> QueryInner<F> {
    fn entry(&self, key: &QueryKey) -> Arc<QueryEntry> {
        Arc::clone(
            self.entries
                .entry(key.clone())
                .or_insert_with(|| Arc::new(QueryEntry::new()))
                .value(),
        )
    }

    /// Drop entries nobody watches any more.
    fn prune(&self) {
        self.entries.retain(|key, entry| {
            let abandoned = entry.is_abandoned();
            if abandoned {
                debug!(%key, "dropping unobserved entry");
            }
            !abandoned
        });
    }

    async fn fetch(self: &Arc<Self>, key: &QueryKey) -> FetchOutcome {
        let entry = self.entry(key);
        let mut rx = {
            let mut slot = entry
                .in_flight
                .lock()
                .unwrap_or_else(PoisonError::into_inner);
            let generation = entry.generation();
            let current = slot
                .as_ref()
                .filter(|req| req.generation >= generation)
                .map(|req| req.done.clone());
            if let Some(rx) = current {
                debug!(%key, "joining in-flight request");
                rx
            } else {
                if slot.is_some() {
                    debug!(%key, "in-flight request predates invalidation; refetching");
                }
                let (tx, rx) = watch::channel(None);
                *slot = Some(InFlight {
                    generation,
                    done: rx.clone(),
                });
                entry.state.send_modify(|s| s.is_fetching = true);
                tokio::spawn(run_fetch(
                    Arc::clone(self),
                    key.clone(),
                    Arc::clone(&entry),
                    generation,
                    tx,
                ));
                rx
            }
        };

        match rx.wait_for(Option::is_some).await {
            Ok(outcome) => outcome.clone().unwrap_or_else(|| Err(aborted())),
            Err(_) => Err(aborted()),
        }
    }
}

fn aborted() -> QueryError {
    QueryError {
        message: "request aborted before completing".into(),
        status: None,
        transient: true,
    }
}

/// Perform one request and publish its outcome to every caller waiting on
/// it, and to the entry unless the entry was invalidated meanwhile.
async fn run_fetch<F: QueryFetcher>(
    inner: Arc<QueryInner<F>>,
    key: QueryKey,
    entry: Arc<QueryEntry>,
    generation: u64,
    done: watch::Sender<Option<FetchOutcome>>,
) {
    let outcome: FetchOutcome = match inner.fetcher.fetch(&key).await {
        Ok(data) => Ok(Arc::new(data)),
        Err(e) => {
            warn!(%key, error = %e, "refresh failed");
            Err(QueryError::from(&e))
        }
    };

    {
        let mut slot = entry
            .in_flight
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        let owns_slot = slot.as_ref().is_some_and(|req| req.generation == generation);
        if owns_slot {
            slot.take();
        }

        if generation < entry.generation() {
            debug!(%key, "discarding result from before invalidation");
            if owns_slot {
                entry.state.send_modify(|s| s.is_fetching = false);
            }
        } else {
            entry.state.send_modify(|s| {
                s.is_fetching = false;
                s.fetch_count += 1;
                match &outcome {
                    Ok(data) => {
                        s.data = Some(Arc::clone(data));
                        s.error = None;
                        s.is_stale = false;
                        s.updated_at = Some(Utc::now());
                    }
                    Err(err) => s.error = Some(err.clone()),
                }
            });
        }
    }
    let _ = done.send(Some(outcome));
}

/// Drive one subscription: an initial fetch, then interval ticks and focus
/// events until cancelled.
async fn poll_task<F: QueryFetcher>(
    inner: Arc<QueryInner<F>>,
    key: QueryKey,
    policy: RefreshPolicy,
    cancel: CancellationToken,
) {
    tokio::select! {
        biased;
        () = cancel.cancelled() => return,
        _ = inner.fetch(&key) => {}
    }

    let mut focus = inner.focus.subscribe();
    let mut interval = match policy.interval {
        Some(period) if !period.is_zero() => {
            let mut interval = tokio::time::interval(period);
            interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
            interval.tick().await; // consume the immediate first tick
            Some(interval)
        }
        _ => None,
    };

    loop {
        tokio::select! {
            biased;
            () = cancel.cancelled() => break,
            () = next_tick(interval.as_mut()) => {
                debug!(%key, "scheduled refresh");
                let _ = inner.fetch(&key).await;
            }
            event = focus.recv(), if policy.refetch_on_focus => {
                match event {
                    Ok(()) | Err(broadcast::error::RecvError::Lagged(_)) => {
                        debug!(%key, "focus refetch");
                        let _ = inner.fetch(&key).await;
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                }
            }
        }
    }
    debug!(%key, "poll task stopped");
}

async fn next_tick(interval: Option<&mut tokio::time::Interval>) {
    match interval {
        Some(interval) => {
            interval.tick().await;
        }
        None => std::future::pending().await,
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::error::CoreError;
    use rampart_api::ModeStatus;

    /// Counts calls, sleeps `delay` per call, and fails while `failing` is set.
    struct FakeFetcher {
        calls: AtomicUsize,
        delay: Duration,
        failing: AtomicBool,
    }

    impl FakeFetcher {
        fn new(delay: Duration) -> Self {
            Self {
                calls: AtomicUsize::new(0),
                delay,
                failing: AtomicBool::new(false),
            }
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    impl QueryFetcher for FakeFetcher {
        async fn fetch(&self, _key: &QueryKey) -> Result<QueryData, CoreError> {
            let n = self.calls.fetch_add(1, Ordering::SeqCst);
            tokio::time::sleep(self.delay).await;
            if self.failing.load(Ordering::SeqCst) {
                Err(CoreError::Rejected {
                    status: 503,
                    message: "HTTP error 503: Service Unavailable".into(),
                })
            } else {
                Ok(QueryData::Mode(ModeStatus::from(n % 2 == 0)))
            }
        }
    }

    #[tokio::test(start_paused = true)]
    async fn concurrent_refreshes_share_one_request() {
        let client = QueryClient::new(FakeFetcher::new(Duration::from_secs(1)));
        let key = QueryKey::Rules;

        let (a, b, c) = tokio::join!(
            client.refresh(&key),
            client.refresh(&key),
            client.refresh(&key)
        );

        assert_eq!(client.fetcher().calls(), 1);
        assert_eq!(a.unwrap(), b.unwrap());
        assert!(c.is_ok());
        assert_eq!(client.state(&key).unwrap().fetch_count, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn manual_refresh_joins_scheduled_refresh() {
        let client = QueryClient::new(FakeFetcher::new(Duration::from_secs(2)));
        let key = QueryKey::LogStats;

        let _sub = client.subscribe(key.clone(), RefreshPolicy::every(Duration::from_secs(10)));
        // Let the initial fetch start, then trigger manually while it is outstanding.
        tokio::time::sleep(Duration::from_millis(500)).await;
        assert!(client.state(&key).unwrap().is_fetching);

        client.refresh(&key).await.unwrap();
        assert_eq!(client.fetcher().calls(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn subscription_polls_on_interval_until_dropped() {
        let client = QueryClient::new(FakeFetcher::new(Duration::ZERO));
        let key = QueryKey::BlockedLogs { limit: 50 };

        let sub = client.subscribe(key.clone(), RefreshPolicy::every(Duration::from_secs(5)));
        tokio::time::sleep(Duration::from_millis(12_500)).await;
        // initial + ticks at 5s and 10s
        assert_eq!(client.fetcher().calls(), 3);

        sub.unsubscribe();
        tokio::time::sleep(Duration::from_secs(60)).await;
        assert_eq!(client.fetcher().calls(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn failed_refresh_keeps_previous_data() {
        let client = QueryClient::new(FakeFetcher::new(Duration::ZERO));
        let key = QueryKey::Whitelist;

        client.refresh(&key).await.unwrap();
        client.fetcher().failing.store(true, Ordering::SeqCst);
        let err = client.refresh(&key).await.unwrap_err();
        assert_eq!(err.status, Some(503));

        let state = client.state(&key).unwrap();
        assert!(state.data.is_some());
        assert_eq!(state.error, Some(err));
        assert_eq!(state.fetch_count, 2);

        client.fetcher().failing.store(false, Ordering::SeqCst);
        client.refresh(&key).await.unwrap();
        assert!(client.state(&key).unwrap().error.is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn failing_subscription_keeps_ticking() {
        let client = QueryClient::new(FakeFetcher::new(Duration::ZERO));
        client.fetcher().failing.store(true, Ordering::SeqCst);

        let _sub = client.subscribe(QueryKey::LogStats, RefreshPolicy::every(Duration::from_secs(10)));
        tokio::time::sleep(Duration::from_secs(31)).await;
        assert_eq!(client.fetcher().calls(), 4);
    }

    #[tokio::test(start_paused = true)]
    async fn invalidate_refetches_only_observed_keys() {
        let client = QueryClient::new(FakeFetcher::new(Duration::ZERO));

        client.refresh(&QueryKey::Rules).await.unwrap();
        client.invalidate(&QueryKey::Rules).await;
        assert_eq!(client.fetcher().calls(), 1);
        assert!(client.state(&QueryKey::Rules).unwrap().is_stale);

        let _sub = client.subscribe(QueryKey::Whitelist, RefreshPolicy::manual());
        tokio::time::sleep(Duration::from_millis(10)).await;
        assert_eq!(client.fetcher().calls(), 2);

        client.invalidate(&QueryKey::Whitelist).await;
        assert_eq!(client.fetcher().calls(), 3);
        assert!(!client.state(&QueryKey::Whitelist).unwrap().is_stale);
    }

    /// Answers with whatever the server held when the request was sent.
    struct ModeServer {
        on: AtomicBool,
        calls: AtomicUsize,
        delay: Duration,
    }

    impl QueryFetcher for ModeServer {
        async fn fetch(&self, _key: &QueryKey) -> Result<QueryData, CoreError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let on = self.on.load(Ordering::SeqCst);
            tokio::time::sleep(self.delay).await;
            Ok(QueryData::Mode(ModeStatus::from(on)))
        }
    }

    #[tokio::test(start_paused = true)]
    async fn invalidate_does_not_join_request_sent_before_mutation() {
        let client = QueryClient::new(ModeServer {
            on: AtomicBool::new(false),
            calls: AtomicUsize::new(0),
            delay: Duration::from_secs(2),
        });
        let key = QueryKey::Mode(rampart_api::ConfigMode::Lockdown);

        let sub = client.subscribe(key.clone(), RefreshPolicy::every(Duration::from_secs(30)));
        tokio::time::sleep(Duration::from_millis(500)).await;
        assert!(client.state(&key).unwrap().is_fetching);

        // The mutation lands while the initial request is still outstanding.
        client.fetcher().on.store(true, Ordering::SeqCst);
        client.invalidate(&key).await;

        assert_eq!(client.fetcher().calls.load(Ordering::SeqCst), 2);
        let state = client.state(&key).unwrap();
        assert_eq!(state.data.as_deref().and_then(QueryData::as_mode), Some(ModeStatus::On));
        assert!(!state.is_stale);

        // The superseded request published nothing.
        let state = sub.current();
        assert!(!state.is_fetching);
        assert_eq!(state.fetch_count, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn invalidate_without_observers_discards_in_flight_result() {
        let client = QueryClient::new(FakeFetcher::new(Duration::from_secs(2)));
        let key = QueryKey::Rules;

        let pending = {
            let client = client.clone();
            let key = key.clone();
            tokio::spawn(async move { client.refresh(&key).await })
        };
        tokio::time::sleep(Duration::from_millis(500)).await;
        client.invalidate(&key).await;
        pending.await.unwrap().unwrap();

        let state = client.state(&key).unwrap();
        assert!(state.is_stale);
        assert!(!state.is_fetching);
        assert!(state.data.is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn unobserved_entries_are_dropped() {
        let client = QueryClient::new(FakeFetcher::new(Duration::ZERO));
        let history = QueryKey::AllLogs(rampart_api::LogFilter::default());

        let sub = client.subscribe(history.clone(), RefreshPolicy::manual());
        tokio::time::sleep(Duration::from_millis(10)).await;
        assert!(client.state(&history).is_some());
        drop(sub);

        // Entries that were only refreshed by hand stay cached.
        client.refresh(&QueryKey::Whitelist).await.unwrap();

        let _rules = client.subscribe(QueryKey::Rules, RefreshPolicy::manual());
        assert!(client.state(&history).is_none());
        assert!(client.state(&QueryKey::Whitelist).is_some());
    }

    #[tokio::test(start_paused = true)]
    async fn invalidate_matching_selects_by_predicate() {
        let client = QueryClient::new(FakeFetcher::new(Duration::ZERO));
        let realtime = QueryKey::RealtimeLogs {
            limit: 10,
            include_server: false,
        };

        let _a = client.subscribe(realtime.clone(), RefreshPolicy::manual());
        let _b = client.subscribe(QueryKey::Rules, RefreshPolicy::manual());
        tokio::time::sleep(Duration::from_millis(10)).await;
        assert_eq!(client.fetcher().calls(), 2);

        client.invalidate_matching(QueryKey::is_log_data).await;
        assert_eq!(client.fetcher().calls(), 3);
        assert!(!client.state(&QueryKey::Rules).unwrap().is_stale);
    }

    #[tokio::test(start_paused = true)]
    async fn focus_refetches_opted_in_subscriptions() {
        let client = QueryClient::new(FakeFetcher::new(Duration::ZERO));

        let _focused = client.subscribe(QueryKey::Rules, RefreshPolicy::manual());
        let _unfocused = client.subscribe(
            QueryKey::Whitelist,
            RefreshPolicy {
                interval: None,
                refetch_on_focus: false,
            },
        );
        tokio::time::sleep(Duration::from_millis(10)).await;
        assert_eq!(client.fetcher().calls(), 2);

        client.focus();
        tokio::time::sleep(Duration::from_millis(10)).await;
        assert_eq!(client.fetcher().calls(), 3);
        assert_eq!(client.state(&QueryKey::Rules).unwrap().fetch_count, 2);
        assert_eq!(client.state(&QueryKey::Whitelist).unwrap().fetch_count, 1);
    }
}
