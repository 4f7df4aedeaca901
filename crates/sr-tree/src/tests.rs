//! Unit tests for sr-tree.

use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;

use sr_core::{ResourcePath, Timestamp};

use crate::ChangeEvent;

// ── Helpers ───────────────────────────────────────────────────────────────────

fn p(s: &str) -> ResourcePath {
    s.parse().unwrap()
}

const SHORT_MS: u64 = 20;

/// Listener that records every event it receives.
#[derive(Default)]
struct Recorder {
    seen: Mutex<Vec<ChangeEvent>>,
}

impl Recorder {
    fn paths(&self) -> Vec<String> {
        self.seen.lock().iter().map(|e| e.path.to_string()).collect()
    }
}

impl crate::ResourceListener for Recorder {
    fn on_change(&self, event: &ChangeEvent) {
        self.seen.lock().push(event.clone());
    }
}

// ── StructuralLock ────────────────────────────────────────────────────────────

#[cfg(test)]
mod lock_tests {
    use super::*;
    use crate::{StructuralLock, TreeError};

    #[test]
    fn readers_share() {
        let lock = StructuralLock::new(SHORT_MS);
        let _a = lock.read().unwrap();
        let _b = lock.read().unwrap();
    }

    #[test]
    fn writer_times_out_behind_reader() {
        let lock = StructuralLock::new(SHORT_MS);
        let _r = lock.read().unwrap();
        match lock.write() {
            Err(TreeError::LockTimeout { what, timeout_ms }) => {
                assert_eq!(what, "structural write");
                assert_eq!(timeout_ms, 20);
            }
            other => panic!("expected timeout, got {:?}", other.map(|_| ())),
        }
    }

    #[test]
    fn released_on_drop() {
        let lock = StructuralLock::new(SHORT_MS);
        drop(lock.write().unwrap());
        assert!(lock.write().is_ok());
    }
}

// ── TransactionManager ────────────────────────────────────────────────────────

#[cfg(test)]
mod transaction_tests {
    use super::*;
    use crate::{TransactionManager, TransactionStats, TreeError};

    #[test]
    fn commit_and_rollback_are_counted() {
        let tm = TransactionManager::new(SHORT_MS);
        let tx = tm.begin().unwrap();
        assert_eq!(tx.id(), 1);
        tx.commit();
        drop(tm.begin().unwrap());

        assert_eq!(
            tm.stats(),
            TransactionStats { begun: 2, committed: 1, rolled_back: 1 }
        );
        assert_eq!(tm.stats().open(), 0);
    }

    #[test]
    fn one_transaction_at_a_time() {
        let tm = TransactionManager::new(SHORT_MS);
        let _tx = tm.begin().unwrap();
        assert_eq!(tm.stats().open(), 1);
        assert!(matches!(
            tm.begin(),
            Err(TreeError::TransactionTimeout { timeout_ms: 20 })
        ));
    }

    #[test]
    fn finished_on_early_return() {
        fn fails(tm: &TransactionManager) -> Result<(), &'static str> {
            let _tx = tm.begin().map_err(|_| "begin")?;
            Err("store refused")
        }
        let tm = TransactionManager::new(SHORT_MS);
        assert!(fails(&tm).is_err());
        assert_eq!(tm.stats().rolled_back, 1);
        assert!(tm.begin().is_ok(), "gate released after early return");
    }

    #[test]
    fn serializes_threads() {
        let tm = Arc::new(TransactionManager::new(5_000));
        let inside = Arc::new(Mutex::new(0_u32));
        let handles: Vec<_> = (0..4)
            .map(|_| {
                let tm = Arc::clone(&tm);
                let inside = Arc::clone(&inside);
                std::thread::spawn(move || {
                    for _ in 0..50 {
                        let tx = tm.begin().unwrap();
                        {
                            let mut n = inside.lock();
                            *n += 1;
                            assert_eq!(*n, 1, "two transactions overlapped");
                        }
                        *inside.lock() -= 1;
                        tx.commit();
                    }
                })
            })
            .collect();
        for h in handles {
            h.join().unwrap();
        }
        assert_eq!(tm.stats().committed, 200);
    }
}

// ── Access control ────────────────────────────────────────────────────────────

#[cfg(test)]
mod access_tests {
    use super::*;
    use crate::{AccessController, AccessPolicy, AllowAll};

    #[test]
    fn allow_all() {
        assert!(AllowAll.has_write_access(&p("a")));
        assert!(AllowAll.check_write_permission(&p("a/b")).is_ok());
    }

    #[test]
    fn read_only_prefix_fails_both_checks() {
        let policy = AccessPolicy::new();
        policy.deny_writes(p("plant"));
        assert!(!policy.has_write_access(&p("plant/boiler")));
        assert!(policy.check_write_permission(&p("plant/boiler")).is_err());
        // Sibling that merely shares a string prefix is not covered.
        assert!(policy.has_write_access(&p("plant2")));
    }

    #[test]
    fn forbidden_prefix_fails_only_strict_check() {
        let policy = AccessPolicy::new();
        policy.forbid(p("plant/boiler"));
        assert!(policy.has_write_access(&p("plant/boiler")));
        let err = policy.check_write_permission(&p("plant/boiler/setpoint")).unwrap_err();
        assert_eq!(err.path, p("plant/boiler/setpoint"));
        assert!(policy.check_write_permission(&p("plant")).is_ok());
    }

    #[test]
    fn allow_removes_rules() {
        let policy = AccessPolicy::new();
        policy.deny_writes(p("a"));
        policy.forbid(p("a"));
        policy.allow(&p("a"));
        assert!(policy.has_write_access(&p("a/b")));
        assert!(policy.check_write_permission(&p("a/b")).is_ok());
    }
}

// ── Notifications ─────────────────────────────────────────────────────────────

#[cfg(test)]
mod notify_tests {
    use super::*;
    use crate::{ChangeKind, NotificationHub};

    #[test]
    fn nothing_delivered_before_flush() {
        let hub = NotificationHub::new();
        let rec = Arc::new(Recorder::default());
        hub.subscribe(rec.clone());

        hub.notify(ChangeEvent::created(p("a")));
        hub.notify(ChangeEvent::value_changed(p("a"), Some(Timestamp(7))));
        assert_eq!(hub.pending(), 2);
        assert!(rec.seen.lock().is_empty());

        assert_eq!(hub.flush(), 2);
        assert_eq!(hub.pending(), 0);
        let seen = rec.seen.lock();
        assert_eq!(seen[0].kind, ChangeKind::Created);
        assert_eq!(seen[1].time, Some(Timestamp(7)));
    }

    #[test]
    fn scoped_subscription() {
        let hub = NotificationHub::new();
        let rec = Arc::new(Recorder::default());
        hub.subscribe_under(p("house/kitchen"), rec.clone());

        hub.notify(ChangeEvent::deleted(p("house/kitchen/temp")));
        hub.notify(ChangeEvent::deleted(p("house/hall/temp")));
        hub.flush();
        assert_eq!(rec.paths(), vec!["house/kitchen/temp"]);
    }

    #[test]
    fn unsubscribe_stops_delivery() {
        let hub = NotificationHub::new();
        let rec = Arc::new(Recorder::default());
        let id = hub.subscribe(rec.clone());
        assert!(hub.unsubscribe(id));
        assert!(!hub.unsubscribe(id));
        assert_eq!(hub.listener_count(), 0);

        hub.notify(ChangeEvent::created(p("a")));
        assert_eq!(hub.flush(), 1);
        assert!(rec.seen.lock().is_empty());
    }

    #[test]
    fn closure_listener_may_reenter_hub() {
        let hub = Arc::new(NotificationHub::new());
        let inner = Arc::clone(&hub);
        hub.subscribe(Arc::new(move |e: &ChangeEvent| {
            // Recording from inside a listener must not deadlock.
            if e.kind == ChangeKind::Created {
                inner.notify(ChangeEvent::value_changed(e.path.clone(), None));
            }
        }));
        hub.notify(ChangeEvent::created(p("a")));
        assert_eq!(hub.flush(), 1);
        assert_eq!(hub.pending(), 1);
    }

    #[test]
    fn display() {
        let e = ChangeEvent::value_changed(p("a/b"), Some(Timestamp(5)));
        assert_eq!(e.to_string(), "value-changed a/b @ 5ms");
    }
}

// ── Configuration and context ─────────────────────────────────────────────────

#[cfg(test)]
mod config_tests {
    use std::path::PathBuf;

    use super::*;
    use crate::{StoreBackend, TreeConfig, TreeContextBuilder, TreeError};

    #[test]
    fn default_is_valid() {
        let cfg = TreeConfig::default();
        assert!(cfg.validate().is_ok());
        assert_eq!(cfg.store, StoreBackend::Memory);
        assert_eq!(cfg.lock_timeout(), Duration::from_secs(5));
    }

    #[test]
    fn zero_timeout_rejected() {
        let cfg = TreeConfig { transaction_timeout_ms: 0, ..TreeConfig::default() };
        assert!(matches!(cfg.validate(), Err(TreeError::Config(_))));
    }

    #[test]
    fn parses_partial_json() {
        let cfg: TreeConfig = serde_json::from_str(
            r#"{ "lock_timeout_ms": 250, "store": { "backend": "sqlite", "path": "s.db" } }"#,
        )
        .unwrap();
        assert_eq!(cfg.lock_timeout_ms, 250);
        assert_eq!(cfg.transaction_timeout_ms, 5_000);
        assert!(cfg.deliver_immediately);
        assert_eq!(cfg.store, StoreBackend::Sqlite { path: PathBuf::from("s.db") });
    }

    #[test]
    fn empty_sqlite_path_rejected() {
        let cfg = TreeConfig {
            store: StoreBackend::Sqlite { path: PathBuf::new() },
            ..TreeConfig::default()
        };
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn builder_applies_config_and_clock() {
        let clock = Arc::new(sr_core::ManualClock::new(Timestamp(1_000)));
        let ctx = TreeContextBuilder::new()
            .config(TreeConfig { lock_timeout_ms: 30, ..TreeConfig::default() })
            .clock(clock)
            .build()
            .unwrap();
        assert_eq!(ctx.structure.timeout(), Duration::from_millis(30));
        assert_eq!(ctx.clock.now(), Timestamp(1_000));
        assert!(ctx.access.has_write_access(&p("anything")));
    }

    #[test]
    fn builder_rejects_invalid_config() {
        let result = TreeContextBuilder::new()
            .config(TreeConfig { lock_timeout_ms: 0, ..TreeConfig::default() })
            .build();
        assert!(result.is_err());
    }

    #[test]
    fn deferred_delivery_leaves_events_pending() {
        let ctx = TreeContextBuilder::new()
            .config(TreeConfig { deliver_immediately: false, ..TreeConfig::default() })
            .build()
            .unwrap();
        ctx.notifications.notify(ChangeEvent::created(p("a")));
        ctx.deliver();
        assert_eq!(ctx.notifications.pending(), 1);
    }
}
