//! The poll orchestrator: runs every account's poller concurrently on a
//! timer, bounds each check with a timeout, periodically rebuilds the
//! poller set, deduplicates notifications, and fans them out to the
//! registered delivery targets.

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use mailwatch_core::{
    Account, AccountSource, AccountUser, DedupWindow, DeliverySink, Notification, PollConfig,
    TargetId,
};
use mailwatch_mail::{AccountPoller, ImapPoller, Mailbox};

type SharedPoller = Arc<Mutex<ImapPoller>>;
type PollerMap = HashMap<AccountUser, SharedPoller>;

enum CheckOutcome {
    Notifications(Vec<Notification>),
    TimedOut,
    Busy,
    Failed(String),
}

struct RunningState {
    task: JoinHandle<()>,
    shutdown: watch::Sender<bool>,
}

/// Everything the cycle task needs, shared with the watcher handle so
/// configuration changes land before the next cycle.
#[derive(Clone)]
struct CycleContext {
    accounts: Arc<dyn AccountSource>,
    sink: Arc<dyn DeliverySink>,
    config: Arc<Mutex<PollConfig>>,
    targets: Arc<Mutex<HashSet<TargetId>>>,
    pollers: Arc<Mutex<PollerMap>>,
    dirty: Arc<AtomicBool>,
}

pub struct MailWatcher {
    ctx: CycleContext,
    running: Mutex<Option<RunningState>>,
}

impl MailWatcher {
    pub fn new(
        accounts: Arc<dyn AccountSource>,
        sink: Arc<dyn DeliverySink>,
        config: PollConfig,
    ) -> Self {
        Self {
            ctx: CycleContext {
                accounts,
                sink,
                config: Arc::new(Mutex::new(config.normalized())),
                targets: Arc::new(Mutex::new(HashSet::new())),
                pollers: Arc::new(Mutex::new(PollerMap::new())),
                dirty: Arc::new(AtomicBool::new(false)),
            },
            running: Mutex::new(None),
        }
    }

    pub fn is_running(&self) -> bool {
        self.running
            .lock()
            .map(|state| state.is_some())
            .unwrap_or(false)
    }

    /// Builds the poller set and launches the cycle task. No-op when
    /// already running.
    pub fn start(&self) {
        let Ok(mut running) = self.running.lock() else {
            return;
        };
        if running.is_some() {
            debug!("watcher already running");
            return;
        }
        let config = snapshot_config(&self.ctx.config);
        rebuild_pollers(&self.ctx.pollers, self.ctx.accounts.as_ref(), &config);
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let task = tokio::spawn(run_cycles(self.ctx.clone(), shutdown_rx));
        *running = Some(RunningState {
            task,
            shutdown: shutdown_tx,
        });
        info!("mail watcher started");
    }

    /// Signals the cycle task, waits at most the stop timeout for it to
    /// exit, then closes every poller connection best-effort. No-op when
    /// not running; safe to call repeatedly.
    pub async fn stop(&self) {
        let state = {
            let Ok(mut running) = self.running.lock() else {
                return;
            };
            running.take()
        };
        let Some(RunningState { task, shutdown }) = state else {
            debug!("watcher not running");
            return;
        };
        let stop_timeout = snapshot_config(&self.ctx.config).stop_timeout;
        let _ = shutdown.send(true);
        let mut task = task;
        tokio::select! {
            _ = &mut task => {}
            _ = tokio::time::sleep(stop_timeout) => {
                warn!("cycle did not observe shutdown in time, aborting");
                task.abort();
            }
        }
        if let Ok(mut map) = self.ctx.pollers.lock() {
            for (user, poller) in map.drain() {
                match poller.try_lock() {
                    Ok(mut guard) => guard.close(),
                    Err(_) => {
                        debug!(user = %user, "poller busy during shutdown, connection left for reaping")
                    }
                }
            }
        }
        info!("mail watcher stopped");
    }

    /// Registers a delivery target. Returns false when it was already
    /// registered.
    pub fn add_target(&self, target: TargetId) -> bool {
        self.ctx
            .targets
            .lock()
            .map(|mut targets| targets.insert(target))
            .unwrap_or(false)
    }

    pub fn remove_target(&self, target: &TargetId) -> bool {
        self.ctx
            .targets
            .lock()
            .map(|mut targets| targets.remove(target))
            .unwrap_or(false)
    }

    pub fn target_count(&self) -> usize {
        self.ctx
            .targets
            .lock()
            .map(|targets| targets.len())
            .unwrap_or(0)
    }

    pub fn set_interval(&self, secs: f64) {
        if let Ok(mut config) = self.ctx.config.lock() {
            config.interval_secs = secs;
            *config = config.clone().normalized();
            info!(interval_secs = config.interval_secs, "poll interval updated");
        }
        self.ctx.dirty.store(true, Ordering::SeqCst);
    }

    pub fn set_text_limit(&self, limit: usize) {
        if let Ok(mut config) = self.ctx.config.lock() {
            config.text_limit = limit;
            *config = config.clone().normalized();
            info!(text_limit = config.text_limit, "text limit updated");
        }
        self.ctx.dirty.store(true, Ordering::SeqCst);
    }

    pub fn config(&self) -> PollConfig {
        snapshot_config(&self.ctx.config)
    }

    /// Marks the poller set for reinitialization before the next cycle;
    /// cursors are carried over by account user.
    pub fn reload_accounts(&self) {
        self.ctx.dirty.store(true, Ordering::SeqCst);
    }
}

fn snapshot_config(config: &Arc<Mutex<PollConfig>>) -> PollConfig {
    config
        .lock()
        .map(|config| config.clone())
        .unwrap_or_default()
}

async fn run_cycles(ctx: CycleContext, mut shutdown: watch::Receiver<bool>) {
    let initial = snapshot_config(&ctx.config);
    let mut dedup = DedupWindow::new(initial.dedup_clear_interval);
    let mut last_rebuild = Instant::now();

    loop {
        if *shutdown.borrow() {
            break;
        }
        let config = snapshot_config(&ctx.config);

        // Bounds the lifetime of every IMAP session and recovers from
        // connections that still answer NOOP but have gone bad.
        if ctx.dirty.swap(false, Ordering::SeqCst)
            || last_rebuild.elapsed() > config.recreate_interval
        {
            rebuild_pollers(&ctx.pollers, ctx.accounts.as_ref(), &config);
            last_rebuild = Instant::now();
        }

        for (user, outcome) in run_checks(&ctx.pollers, config.check_timeout).await {
            match outcome {
                CheckOutcome::Notifications(notifications) => {
                    if !notifications.is_empty() {
                        info!(user = %user, count = notifications.len(), "new mail");
                    }
                    dispatch_notifications(&mut dedup, &ctx.sink, &ctx.targets, notifications)
                        .await;
                }
                CheckOutcome::TimedOut => warn!(user = %user, "check timed out"),
                CheckOutcome::Busy => debug!(user = %user, "previous check still running, skipped"),
                CheckOutcome::Failed(reason) => {
                    error!(user = %user, error = %reason, "check failed")
                }
            }
        }

        tokio::select! {
            _ = tokio::time::sleep(config.interval()) => {}
            changed = shutdown.changed() => {
                // A dropped sender means no stop() can ever arrive.
                if changed.is_err() {
                    break;
                }
            }
        }
    }
}

/// Rebuilds the poller map from the current account configuration,
/// carrying each account's cursor forward by user so a rebuild never
/// reintroduces already-seen mail. A poller whose check is still in
/// flight is kept as-is rather than losing its cursor.
fn rebuild_pollers(
    pollers: &Arc<Mutex<PollerMap>>,
    accounts: &dyn AccountSource,
    config: &PollConfig,
) {
    let Ok(mut map) = pollers.lock() else {
        return;
    };
    let old = std::mem::take(&mut *map);
    let mut carried = 0usize;

    for descriptor in accounts.descriptors() {
        let account = match Account::parse(&descriptor) {
            Ok(account) => account,
            Err(err) => {
                warn!(error = %err, "skipping malformed account descriptor");
                continue;
            }
        };
        let user = account.user_id();
        if map.contains_key(&user) {
            warn!(user = %user, "duplicate account entry ignored");
            continue;
        }
        let mut poller = ImapPoller::for_account(account, config.text_limit, config.recency_window);
        if let Some(previous) = old.get(&user) {
            match previous.try_lock() {
                Ok(mut guard) => {
                    poller.restore_cursor(guard.cursor());
                    guard.close();
                    carried += 1;
                }
                Err(_) => {
                    map.insert(user, Arc::clone(previous));
                    continue;
                }
            }
        }
        map.insert(user, Arc::new(Mutex::new(poller)));
    }

    // Accounts removed from the configuration release their sessions.
    for (user, poller) in old {
        if map.contains_key(&user) {
            continue;
        }
        if let Ok(mut guard) = poller.try_lock() {
            guard.close();
        }
        debug!(user = %user, "poller removed");
    }

    info!(pollers = map.len(), carried, "poller set rebuilt");
}

/// One bounded, independent check per account. A timeout or failure for
/// one account never affects the others.
async fn run_checks<M>(
    pollers: &Arc<Mutex<HashMap<AccountUser, Arc<Mutex<AccountPoller<M>>>>>>,
    check_timeout: Duration,
) -> Vec<(AccountUser, CheckOutcome)>
where
    M: Mailbox + Send + 'static,
{
    let snapshot: Vec<(AccountUser, Arc<Mutex<AccountPoller<M>>>)> = match pollers.lock() {
        Ok(map) => map
            .iter()
            .map(|(user, poller)| (user.clone(), Arc::clone(poller)))
            .collect(),
        Err(_) => Vec::new(),
    };

    let handles: Vec<(AccountUser, JoinHandle<CheckOutcome>)> = snapshot
        .into_iter()
        .map(|(user, poller)| (user, tokio::spawn(check_account(poller, check_timeout))))
        .collect();

    let mut outcomes = Vec::new();
    for (user, handle) in handles {
        let outcome = match handle.await {
            Ok(outcome) => outcome,
            Err(err) => CheckOutcome::Failed(err.to_string()),
        };
        outcomes.push((user, outcome));
    }
    outcomes
}

async fn check_account<M>(
    poller: Arc<Mutex<AccountPoller<M>>>,
    check_timeout: Duration,
) -> CheckOutcome
where
    M: Mailbox + Send + 'static,
{
    let blocking = tokio::task::spawn_blocking(move || {
        // try_lock: if a previous check overran its timeout it still holds
        // the poller; skip this cycle instead of queueing behind it.
        let Ok(mut guard) = poller.try_lock() else {
            return CheckOutcome::Busy;
        };
        match guard.poll() {
            Ok(notifications) => CheckOutcome::Notifications(notifications),
            Err(err) => CheckOutcome::Failed(err.to_string()),
        }
    });
    match tokio::time::timeout(check_timeout, blocking).await {
        Ok(Ok(outcome)) => outcome,
        Ok(Err(err)) => CheckOutcome::Failed(err.to_string()),
        Err(_) => CheckOutcome::TimedOut,
    }
}

/// Runs each notification through the dedup window and forwards the
/// survivors to every registered target concurrently. Per-target failures
/// are logged and isolated.
async fn dispatch_notifications(
    dedup: &mut DedupWindow,
    sink: &Arc<dyn DeliverySink>,
    targets: &Arc<Mutex<HashSet<TargetId>>>,
    notifications: Vec<Notification>,
) {
    for notification in notifications {
        if dedup.insert_checked(
            &notification.account_user,
            &notification.subject,
            notification.received_at.as_ref(),
        ) {
            debug!(user = %notification.account_user, subject = %notification.subject, "duplicate suppressed");
            continue;
        }

        let snapshot: Vec<TargetId> = match targets.lock() {
            Ok(targets) => targets.iter().cloned().collect(),
            Err(_) => Vec::new(),
        };
        if snapshot.is_empty() {
            continue;
        }

        let handles: Vec<(TargetId, JoinHandle<anyhow::Result<()>>)> = snapshot
            .into_iter()
            .map(|target| {
                let sink = Arc::clone(sink);
                let notification = notification.clone();
                let send_to = target.clone();
                (
                    target,
                    tokio::spawn(async move { sink.deliver(&send_to, &notification).await }),
                )
            })
            .collect();

        for (target, handle) in handles {
            match handle.await {
                Ok(Ok(())) => debug!(target = %target, "notification delivered"),
                Ok(Err(err)) => error!(target = %target, error = %err, "delivery failed"),
                Err(err) => error!(target = %target, error = %err, "delivery task failed"),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::{BTreeMap, HashMap, HashSet};
    use std::sync::{Arc, Mutex};
    use std::time::Duration;

    use anyhow::anyhow;
    use async_trait::async_trait;
    use chrono::Local;

    use mailwatch_core::{
        AccountUser, DedupWindow, DeliverySink, Notification, PollConfig, TargetId,
    };
    use mailwatch_mail::{AccountPoller, MailError, Mailbox, Uid};

    use crate::config::StaticAccountSource;

    use super::{CheckOutcome, MailWatcher, dispatch_notifications, rebuild_pollers, run_checks};

    #[derive(Default)]
    struct CollectingSink {
        delivered: Mutex<Vec<(TargetId, String)>>,
        fail_target: Option<TargetId>,
    }

    #[async_trait]
    impl DeliverySink for CollectingSink {
        async fn deliver(
            &self,
            target: &TargetId,
            notification: &Notification,
        ) -> anyhow::Result<()> {
            if self.fail_target.as_ref() == Some(target) {
                return Err(anyhow!("target rejected the message"));
            }
            self.delivered
                .lock()
                .unwrap()
                .push((target.clone(), notification.subject.clone()));
            Ok(())
        }
    }

    fn notification(subject: &str) -> Notification {
        Notification {
            account_user: AccountUser("watcher@example.com".to_string()),
            received_at: Some(Local::now()),
            subject: subject.to_string(),
            body_excerpt: "body".to_string(),
        }
    }

    fn targets(ids: &[&str]) -> Arc<Mutex<HashSet<TargetId>>> {
        Arc::new(Mutex::new(
            ids.iter().map(|id| TargetId(id.to_string())).collect(),
        ))
    }

    #[tokio::test]
    async fn start_and_stop_are_idempotent() {
        let watcher = MailWatcher::new(
            Arc::new(StaticAccountSource::new(Vec::new())),
            Arc::new(CollectingSink::default()),
            PollConfig::default(),
        );
        assert!(!watcher.is_running());

        watcher.start();
        assert!(watcher.is_running());
        watcher.start();
        assert!(watcher.is_running());

        watcher.stop().await;
        assert!(!watcher.is_running());
        watcher.stop().await;
        assert!(!watcher.is_running());
    }

    #[tokio::test]
    async fn stop_returns_within_grace_period() {
        let watcher = MailWatcher::new(
            Arc::new(StaticAccountSource::new(Vec::new())),
            Arc::new(CollectingSink::default()),
            PollConfig::default(),
        );
        watcher.start();

        let stop_timeout = watcher.config().stop_timeout;
        let started = std::time::Instant::now();
        watcher.stop().await;
        assert!(started.elapsed() < stop_timeout + Duration::from_secs(1));
    }

    #[test]
    fn rebuild_skips_malformed_descriptors() {
        let pollers = Arc::new(Mutex::new(Default::default()));
        let source = StaticAccountSource::new(vec![
            "imap.example.com,good@example.com,secret".to_string(),
            "not-an-account".to_string(),
            "imap.example.com,,secret".to_string(),
        ]);
        rebuild_pollers(&pollers, &source, &PollConfig::default());

        let map = pollers.lock().unwrap();
        assert_eq!(map.len(), 1);
        assert!(map.contains_key(&AccountUser("good@example.com".to_string())));
    }

    #[test]
    fn rebuild_carries_cursor_by_user() {
        let pollers = Arc::new(Mutex::new(Default::default()));
        let source = StaticAccountSource::new(vec![
            "imap.example.com,keep@example.com,secret".to_string(),
        ]);
        let config = PollConfig::default();

        rebuild_pollers(&pollers, &source, &config);
        {
            let map = pollers.lock().unwrap();
            let poller = map
                .get(&AccountUser("keep@example.com".to_string()))
                .unwrap();
            poller.lock().unwrap().restore_cursor(Some(42));
        }

        rebuild_pollers(&pollers, &source, &config);
        let map = pollers.lock().unwrap();
        let poller = map
            .get(&AccountUser("keep@example.com".to_string()))
            .unwrap();
        assert_eq!(poller.lock().unwrap().cursor(), Some(42));
    }

    #[test]
    fn rebuild_keeps_busy_poller_instead_of_dropping_cursor() {
        let pollers = Arc::new(Mutex::new(Default::default()));
        let source = StaticAccountSource::new(vec![
            "imap.example.com,busy@example.com,secret".to_string(),
        ]);
        let config = PollConfig::default();
        rebuild_pollers(&pollers, &source, &config);

        let held = {
            let map = pollers.lock().unwrap();
            Arc::clone(map.get(&AccountUser("busy@example.com".to_string())).unwrap())
        };
        let guard = held.lock().unwrap();
        rebuild_pollers(&pollers, &source, &config);
        drop(guard);

        let map = pollers.lock().unwrap();
        let kept = map.get(&AccountUser("busy@example.com".to_string())).unwrap();
        assert!(Arc::ptr_eq(kept, &held));
    }

    #[test]
    fn rebuild_drops_removed_accounts() {
        let pollers = Arc::new(Mutex::new(Default::default()));
        let config = PollConfig::default();
        rebuild_pollers(
            &pollers,
            &StaticAccountSource::new(vec![
                "imap.example.com,one@example.com,secret".to_string(),
                "imap.example.com,two@example.com,secret".to_string(),
            ]),
            &config,
        );
        rebuild_pollers(
            &pollers,
            &StaticAccountSource::new(vec![
                "imap.example.com,two@example.com,secret".to_string(),
            ]),
            &config,
        );

        let map = pollers.lock().unwrap();
        assert_eq!(map.len(), 1);
        assert!(map.contains_key(&AccountUser("two@example.com".to_string())));
    }

    /// Minimal scripted mailbox for driving pollers through `run_checks`
    /// without a server.
    struct ScriptedMailbox {
        messages: BTreeMap<Uid, Vec<u8>>,
        fail_connect: bool,
    }

    impl ScriptedMailbox {
        fn with_message(uid: Uid, subject: &str) -> Self {
            let raw = format!(
                "Subject: {}\r\nDate: {}\r\nContent-Type: text/plain\r\n\r\nbody\r\n",
                subject,
                Local::now().to_rfc2822()
            );
            Self {
                messages: BTreeMap::from([(uid, raw.into_bytes())]),
                fail_connect: false,
            }
        }

        fn failing() -> Self {
            Self {
                messages: BTreeMap::new(),
                fail_connect: true,
            }
        }
    }

    impl Mailbox for ScriptedMailbox {
        fn ensure_connected(&mut self) -> Result<(), MailError> {
            if self.fail_connect {
                return Err(MailError::Connection("host unreachable".to_string()));
            }
            Ok(())
        }

        fn search_all(&mut self) -> Result<Vec<Uid>, MailError> {
            Ok(self.messages.keys().copied().collect())
        }

        fn search_unseen(&mut self) -> Result<Vec<Uid>, MailError> {
            Ok(Vec::new())
        }

        fn fetch_raw(&mut self, uid: Uid) -> Result<Option<Vec<u8>>, MailError> {
            Ok(self.messages.get(&uid).cloned())
        }

        fn close(&mut self) {}
    }

    fn scripted_poller(
        user: &str,
        mailbox: ScriptedMailbox,
        cursor: Option<Uid>,
    ) -> Arc<Mutex<AccountPoller<ScriptedMailbox>>> {
        let mut poller = AccountPoller::new(
            mailbox,
            AccountUser(user.to_string()),
            50,
            Duration::from_secs(120),
        );
        poller.restore_cursor(cursor);
        Arc::new(Mutex::new(poller))
    }

    #[tokio::test]
    async fn failing_account_does_not_block_siblings() {
        let mut map = HashMap::new();
        map.insert(
            AccountUser("ok1@example.com".to_string()),
            scripted_poller("ok1@example.com", ScriptedMailbox::with_message(2, "for ok1"), Some(1)),
        );
        map.insert(
            AccountUser("down@example.com".to_string()),
            scripted_poller("down@example.com", ScriptedMailbox::failing(), Some(3)),
        );
        map.insert(
            AccountUser("ok2@example.com".to_string()),
            scripted_poller("ok2@example.com", ScriptedMailbox::with_message(9, "for ok2"), Some(8)),
        );
        let pollers = Arc::new(Mutex::new(map));

        let outcomes = run_checks(&pollers, Duration::from_secs(30)).await;
        assert_eq!(outcomes.len(), 3);

        let mut delivered = 0;
        let mut failed = 0;
        for (user, outcome) in outcomes {
            match outcome {
                CheckOutcome::Notifications(notifications) => {
                    delivered += notifications.len();
                    assert_eq!(notifications.len(), 1);
                    assert_ne!(user, AccountUser("down@example.com".to_string()));
                }
                CheckOutcome::Failed(reason) => {
                    failed += 1;
                    assert_eq!(user, AccountUser("down@example.com".to_string()));
                    assert!(reason.contains("connection failed"));
                }
                _ => panic!("unexpected outcome for {}", user),
            }
        }
        assert_eq!(delivered, 2);
        assert_eq!(failed, 1);

        // The failing account's cursor is untouched and resumes later.
        let map = pollers.lock().unwrap();
        let down = map
            .get(&AccountUser("down@example.com".to_string()))
            .unwrap();
        assert_eq!(down.lock().unwrap().cursor(), Some(3));
    }

    #[tokio::test]
    async fn duplicate_notification_is_delivered_once() {
        let sink: Arc<CollectingSink> = Arc::new(CollectingSink::default());
        let sink_dyn: Arc<dyn DeliverySink> = sink.clone();
        let targets = targets(&["chat"]);
        let mut dedup = DedupWindow::new(Duration::from_secs(300));

        dispatch_notifications(&mut dedup, &sink_dyn, &targets, vec![notification("hello")])
            .await;
        dispatch_notifications(&mut dedup, &sink_dyn, &targets, vec![notification("hello")])
            .await;

        assert_eq!(sink.delivered.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn cleared_dedup_window_allows_redelivery() {
        let sink: Arc<CollectingSink> = Arc::new(CollectingSink::default());
        let sink_dyn: Arc<dyn DeliverySink> = sink.clone();
        let targets = targets(&["chat"]);
        let mut dedup = DedupWindow::new(Duration::from_millis(20));

        dispatch_notifications(&mut dedup, &sink_dyn, &targets, vec![notification("hello")])
            .await;
        tokio::time::sleep(Duration::from_millis(30)).await;
        dispatch_notifications(&mut dedup, &sink_dyn, &targets, vec![notification("hello")])
            .await;

        assert_eq!(sink.delivered.lock().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn failing_target_does_not_block_others() {
        let sink: Arc<CollectingSink> = Arc::new(CollectingSink {
            delivered: Mutex::new(Vec::new()),
            fail_target: Some(TargetId("bad".to_string())),
        });
        let sink_dyn: Arc<dyn DeliverySink> = sink.clone();
        let targets = targets(&["bad", "good"]);
        let mut dedup = DedupWindow::new(Duration::from_secs(300));

        dispatch_notifications(&mut dedup, &sink_dyn, &targets, vec![notification("hello")])
            .await;

        let delivered = sink.delivered.lock().unwrap();
        assert_eq!(delivered.len(), 1);
        assert_eq!(delivered[0].0, TargetId("good".to_string()));
    }

    #[tokio::test]
    async fn target_registration_reports_membership() {
        let watcher = MailWatcher::new(
            Arc::new(StaticAccountSource::new(Vec::new())),
            Arc::new(CollectingSink::default()),
            PollConfig::default(),
        );

        assert!(watcher.add_target(TargetId("chat".to_string())));
        assert!(!watcher.add_target(TargetId("chat".to_string())));
        assert_eq!(watcher.target_count(), 1);
        assert!(watcher.remove_target(&TargetId("chat".to_string())));
        assert!(!watcher.remove_target(&TargetId("chat".to_string())));
        assert_eq!(watcher.target_count(), 0);
    }

    #[tokio::test]
    async fn runtime_config_changes_apply_floors() {
        let watcher = MailWatcher::new(
            Arc::new(StaticAccountSource::new(Vec::new())),
            Arc::new(CollectingSink::default()),
            PollConfig::default(),
        );

        watcher.set_interval(0.1);
        watcher.set_text_limit(3);
        let config = watcher.config();
        assert_eq!(config.interval_secs, mailwatch_core::MIN_INTERVAL_SECS);
        assert_eq!(config.text_limit, mailwatch_core::MIN_TEXT_LIMIT);
    }
}
