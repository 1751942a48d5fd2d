use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use anyhow::{anyhow, Result};
use chrono::{Duration, TimeZone, Utc};
use govwatch::{
    FileMuteStorage, MuteRule, MuteScope, MuteStorage, MuteStore, NotificationDispatcher,
    NotificationItem, Report, Reporter, RequesterContext, SendResult, MuteCommandHandler,
};
use tempfile::tempdir;

/// 记录收到的条目；可配置为全部失败
struct RecordingReporter {
    name: String,
    fail: bool,
    calls: AtomicUsize,
    received: Mutex<Vec<String>>,
}

impl RecordingReporter {
    fn new(name: &str, fail: bool) -> Arc<Self> {
        Arc::new(Self {
            name: name.to_string(),
            fail,
            calls: AtomicUsize::new(0),
            received: Mutex::new(Vec::new()),
        })
    }

    fn received(&self) -> Vec<String> {
        self.received.lock().unwrap().clone()
    }
}

impl Reporter for RecordingReporter {
    fn name(&self) -> &str {
        &self.name
    }

    fn send(&self, item: &NotificationItem) -> Result<SendResult> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.fail {
            return Err(anyhow!("connection refused"));
        }
        self.received.lock().unwrap().push(item.key());
        Ok(SendResult::Sent)
    }
}

fn governance_report() -> Report {
    Report::new(vec![
        NotificationItem::new("cosmoshub", "55"),
        NotificationItem::new("cosmoshub", "56"),
        NotificationItem::new("osmosis", "10"),
    ])
}

#[test]
fn test_chain_mute_suppresses_only_that_chain() {
    let temp = tempdir().unwrap();
    let store = MuteStore::new(Arc::new(FileMuteStorage::new(temp.path()).unwrap()));
    let now = Utc.with_ymd_and_hms(2026, 3, 1, 12, 0, 0).unwrap();

    let rule = MuteRule::new(
        MuteScope {
            chain: Some("cosmoshub".to_string()),
            ..MuteScope::default()
        },
        "alice",
        now,
    )
    .with_expires_at(now + Duration::hours(1));
    store.add_mute(rule).unwrap();

    let reporter = RecordingReporter::new("chat", false);
    let dispatcher = NotificationDispatcher::new(store, vec![reporter.clone() as Arc<dyn Reporter>]);

    let outcome = dispatcher
        .dispatch_at(governance_report(), now + Duration::minutes(5))
        .unwrap();
    assert_eq!(outcome.total_items, 3);
    assert_eq!(outcome.suppressed, 2);
    assert_eq!(reporter.received(), vec!["osmosis/10"]);

    // 过期后不再生效
    let outcome = dispatcher
        .dispatch_at(governance_report(), now + Duration::hours(2))
        .unwrap();
    assert_eq!(outcome.suppressed, 0);
    assert_eq!(reporter.received().len(), 4);
}

#[test]
fn test_failing_reporter_does_not_block_others() {
    let temp = tempdir().unwrap();
    let store = MuteStore::new(Arc::new(FileMuteStorage::new(temp.path()).unwrap()));

    let failing = RecordingReporter::new("a", true);
    let healthy = RecordingReporter::new("b", false);
    let dispatcher = NotificationDispatcher::new(
        store,
        vec![
            failing.clone() as Arc<dyn Reporter>,
            healthy.clone() as Arc<dyn Reporter>,
        ],
    );

    let outcome = dispatcher.dispatch(governance_report()).unwrap();

    // 失败的渠道也会尝试每一条
    assert_eq!(failing.calls.load(Ordering::SeqCst), 3);
    assert_eq!(healthy.received().len(), 3);

    let a = outcome.outcome_for("a").unwrap();
    assert_eq!(a.failures.len(), 3);
    assert!(a.failures[0].error.contains("connection refused"));
    assert_eq!(outcome.outcome_for("b").unwrap().delivered, 3);
    assert_eq!(outcome.failed_reporters(), vec!["a"]);
}

#[test]
fn test_corrupted_mute_file_skips_dispatch() {
    let temp = tempdir().unwrap();
    let storage = FileMuteStorage::new(temp.path()).unwrap();
    std::fs::write(storage.path(), "{ definitely not json").unwrap();

    let reporter = RecordingReporter::new("chat", false);
    let dispatcher = NotificationDispatcher::new(
        MuteStore::new(Arc::new(storage)),
        vec![reporter.clone() as Arc<dyn Reporter>],
    );

    let result = dispatcher.dispatch(governance_report());
    assert!(result.is_err());
    assert_eq!(reporter.calls.load(Ordering::SeqCst), 0);
}

#[test]
fn test_command_to_dispatch() {
    let temp = tempdir().unwrap();
    let storage = Arc::new(FileMuteStorage::new(temp.path()).unwrap());
    let store = MuteStore::new(storage.clone());
    let handler = MuteCommandHandler::new(store.clone());
    let requester = RequesterContext::new("12345").with_display_name("alice");

    let reply = handler.handle(
        "/mute chain=CosmosHub proposal=55 duration=1h reason=\"already voted\"",
        &requester,
    );
    assert!(reply.starts_with("Notifications muted until"), "{}", reply);
    assert!(reply.contains("Chain: cosmoshub"));

    let persisted = storage.list().unwrap();
    assert_eq!(persisted.len(), 1);
    assert_eq!(persisted[0].creator, "alice");
    assert_eq!(persisted[0].reason.as_deref(), Some("already voted"));

    let reporter = RecordingReporter::new("chat", false);
    let dispatcher = NotificationDispatcher::new(store, vec![reporter.clone() as Arc<dyn Reporter>]);
    let outcome = dispatcher.dispatch(governance_report()).unwrap();

    assert_eq!(outcome.suppressed, 1);
    assert_eq!(reporter.received(), vec!["cosmoshub/56", "osmosis/10"]);

    // 删除后恢复发送
    let id = persisted[0].id.clone();
    assert_eq!(
        handler.handle(&format!("/unmute {}", id), &requester),
        format!("Mute {} removed", id)
    );
    let outcome = dispatcher.dispatch(governance_report()).unwrap();
    assert_eq!(outcome.suppressed, 0);
}

#[test]
fn test_global_mute_requires_confirm() {
    let temp = tempdir().unwrap();
    let store = MuteStore::new(Arc::new(FileMuteStorage::new(temp.path()).unwrap()));
    let handler = MuteCommandHandler::new(store.clone());
    let requester = RequesterContext::new("bob");

    let reply = handler.handle("/mute duration=permanent", &requester);
    assert!(reply.starts_with("Error muting notification: ambiguous"), "{}", reply);
    assert!(store.all_mutes().unwrap().is_empty());

    let reply = handler.handle("/mute duration=permanent confirm", &requester);
    assert!(reply.contains("muted permanently"), "{}", reply);

    let reporter = RecordingReporter::new("chat", false);
    let dispatcher = NotificationDispatcher::new(store, vec![reporter.clone() as Arc<dyn Reporter>]);
    let outcome = dispatcher.dispatch(governance_report()).unwrap();
    assert_eq!(outcome.suppressed, 3);
    assert_eq!(reporter.calls.load(Ordering::SeqCst), 0);
}

#[test]
fn test_purge_expired_keeps_active() {
    let temp = tempdir().unwrap();
    let store = MuteStore::new(Arc::new(FileMuteStorage::new(temp.path()).unwrap()));
    let now = Utc::now();
    let scope = MuteScope {
        chain: Some("juno".to_string()),
        ..MuteScope::default()
    };

    store
        .add_mute(
            MuteRule::new(scope.clone(), "alice", now - Duration::hours(2))
                .with_expires_at(now - Duration::hours(1)),
        )
        .unwrap();
    store
        .add_mute(MuteRule::new(scope, "alice", now))
        .unwrap();

    assert_eq!(store.purge_expired(now).unwrap(), 1);
    let remaining = store.all_mutes().unwrap();
    assert_eq!(remaining.len(), 1);
    assert!(remaining[0].is_permanent());
}
