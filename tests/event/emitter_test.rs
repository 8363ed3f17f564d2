use night_emitter::{args, DispatchMode, EmitterConfig, EventArgs, EventEmitter, Listener};
use std::collections::HashSet;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{mpsc, Arc, Mutex};
use std::thread;
use tokio::sync::Barrier;
use tokio::sync::mpsc::{unbounded_channel, UnboundedReceiver, UnboundedSender};
use tokio::time::Duration;

#[cfg(test)]
mod tests {
    use super::*;

    const WAIT: Duration = Duration::from_secs(5);

    /// Receive exactly `n` messages, failing the test on timeout.
    async fn collect<T>(rx: &mut UnboundedReceiver<T>, n: usize) -> Vec<T> {
        let mut received = Vec::with_capacity(n);
        for _ in 0..n {
            let item = tokio::time::timeout(WAIT, rx.recv())
                .await
                .expect("Timed out waiting for listener")
                .expect("Channel closed");
            received.push(item);
        }
        received
    }

    /// Nothing further arrives within a short grace period.
    async fn assert_quiet<T: std::fmt::Debug>(rx: &mut UnboundedReceiver<T>) {
        let extra = tokio::time::timeout(Duration::from_millis(100), rx.recv()).await;
        assert!(extra.is_err(), "Unexpected extra message: {:?}", extra);
    }

    fn tagging_listener(tag: &'static str, tx: UnboundedSender<&'static str>) -> Listener {
        Listener::new(move |_args| {
            let _ = tx.send(tag);
        })
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_ticks_count_exactly() {
        let emitter = EventEmitter::new();
        let counter = Arc::new(AtomicUsize::new(0));
        let (tx, mut rx) = unbounded_channel();

        let counter_clone = counter.clone();
        emitter.on(
            "tick",
            Listener::new(move |_args| {
                counter_clone.fetch_add(1, Ordering::SeqCst);
                let _ = tx.send(());
            }),
        );

        // all three emits are released together on separate workers
        let barrier = Arc::new(Barrier::new(3));
        let handles: Vec<_> = (0..3)
            .map(|_| {
                let emitter = emitter.clone();
                let barrier = barrier.clone();
                tokio::spawn(async move {
                    barrier.wait().await;
                    emitter.emit("tick", EventArgs::new())
                })
            })
            .collect();
        for handle in handles {
            assert!(handle.await.unwrap());
        }

        collect(&mut rx, 3).await;
        assert_quiet(&mut rx).await;
        assert_eq!(counter.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_listeners_fire_in_registration_order() {
        let emitter = EventEmitter::new();
        let (tx, mut rx) = unbounded_channel();
        emitter
            .on("order", tagging_listener("L1", tx.clone()))
            .on("order", tagging_listener("L2", tx.clone()))
            .prepend_listener("order", tagging_listener("L0", tx));

        assert!(emitter.emit("order", EventArgs::new()));
        assert_eq!(collect(&mut rx, 3).await, vec!["L0", "L1", "L2"]);
    }

    #[tokio::test]
    async fn test_arguments_pass_through_to_every_listener() {
        let emitter = EventEmitter::new();
        let (tx, mut rx) = unbounded_channel();

        for _ in 0..2 {
            let tx = tx.clone();
            emitter.on(
                "payload",
                Listener::new(move |args| {
                    let number = args.get::<i64>(0).copied();
                    let text = args.get::<String>(1).cloned();
                    let _ = tx.send((args.len(), number, text));
                }),
            );
        }

        assert!(emitter.emit("payload", args![20_i64, String::from("twenty")]));
        let received = collect(&mut rx, 2).await;
        for item in received {
            assert_eq!(item, (2, Some(20), Some("twenty".to_string())));
        }
    }

    #[tokio::test]
    async fn test_duplicate_registration_fires_twice() {
        let emitter = EventEmitter::new();
        let (tx, mut rx) = unbounded_channel();
        let listener = tagging_listener("dup", tx);

        emitter.on("dup", listener.clone()).on("dup", listener.clone());
        assert_eq!(emitter.listener_count("dup"), 2);

        assert!(emitter.emit("dup", EventArgs::new()));
        assert_eq!(collect(&mut rx, 2).await, vec!["dup", "dup"]);
        assert_quiet(&mut rx).await;

        emitter.off("dup", &listener);
        assert_eq!(emitter.listener_count("dup"), 1);
        emitter.off("dup", &listener);
        assert_eq!(emitter.listener_count("dup"), 0);
        assert!(!emitter.emit("dup", EventArgs::new()));
    }

    #[tokio::test]
    async fn test_emit_uses_snapshot() {
        let emitter = EventEmitter::new();
        let (tx, mut rx) = unbounded_channel();
        let listener = tagging_listener("snap", tx.clone());
        emitter.on("snap", listener.clone());

        assert!(emitter.emit("snap", EventArgs::new()));
        // changes after emit returns do not affect the batch already taken
        emitter
            .off("snap", &listener)
            .on("snap", tagging_listener("late", tx));

        assert_eq!(collect(&mut rx, 1).await, vec!["snap"]);
        assert_quiet(&mut rx).await;
    }

    #[tokio::test]
    async fn test_panicking_listener_is_isolated() {
        let emitter = EventEmitter::new();
        let (tx, mut rx) = unbounded_channel();
        emitter
            .on("fragile", Listener::new(|_args| panic!("boom")))
            .on("fragile", tagging_listener("survivor", tx));

        assert!(emitter.emit("fragile", EventArgs::new()));
        assert!(emitter.emit("fragile", EventArgs::new()));
        assert_eq!(collect(&mut rx, 2).await, vec!["survivor", "survivor"]);

        // the registry is still intact and usable
        assert_eq!(emitter.listener_count("fragile"), 2);
    }

    #[tokio::test]
    async fn test_listener_can_reenter_emitter() {
        let emitter = EventEmitter::new();
        let (tx, mut rx) = unbounded_channel();

        let inner_tx = tx.clone();
        let reentrant = emitter.clone();
        emitter.on(
            "outer",
            Listener::new(move |_args| {
                reentrant.on("inner", tagging_listener("inner", inner_tx.clone()));
                reentrant.emit("inner", EventArgs::new());
            }),
        );

        assert!(emitter.emit("outer", EventArgs::new()));
        assert_eq!(collect(&mut rx, 1).await, vec!["inner"]);
        assert_eq!(emitter.listener_count("inner"), 1);
        drop(tx);
    }

    #[tokio::test]
    async fn test_once_listener_fires_for_one_emit() {
        let emitter = EventEmitter::new();
        let (tx, mut rx) = unbounded_channel();
        emitter
            .once("ready", tagging_listener("once", tx.clone()))
            .on("ready", tagging_listener("always", tx));

        assert!(emitter.emit("ready", EventArgs::new()));
        assert_eq!(emitter.listener_count("ready"), 1);
        assert!(emitter.emit("ready", EventArgs::new()));

        let mut received = collect(&mut rx, 3).await;
        received.sort();
        assert_eq!(received, vec!["always", "always", "once"]);
        assert_quiet(&mut rx).await;
    }

    #[tokio::test]
    async fn test_thread_dispatch_mode() {
        let emitter = EventEmitter::with_config(&EmitterConfig {
            dispatch: DispatchMode::Thread,
            ..EmitterConfig::default()
        });
        let (tx, mut rx) = unbounded_channel();
        emitter.on("threaded", tagging_listener("threaded", tx));

        assert!(emitter.emit("threaded", EventArgs::new()));
        assert_eq!(collect(&mut rx, 1).await, vec!["threaded"]);
    }

    #[test]
    fn test_parallel_register_emit_remove() {
        const THREADS: usize = 8;
        const ROUNDS: usize = 200;

        let runtime = tokio::runtime::Builder::new_multi_thread()
            .worker_threads(2)
            .build()
            .unwrap();
        let emitter = EventEmitter::new().with_runtime(runtime.handle().clone());
        let (tx, rx) = mpsc::channel::<usize>();
        let tx = Arc::new(Mutex::new(tx));
        let start = Arc::new(std::sync::Barrier::new(THREADS));

        let workers: Vec<_> = (0..THREADS)
            .map(|t| {
                let emitter = emitter.clone();
                let tx = tx.clone();
                let start = start.clone();
                thread::spawn(move || {
                    let own_event = format!("stress-{}", t);
                    start.wait();
                    for _ in 0..ROUNDS {
                        let own_tx = tx.clone();
                        let own = Listener::new(move |_args| {
                            let _ = own_tx.lock().unwrap().send(t);
                        });
                        emitter.on(&own_event, own.clone());
                        assert!(emitter.emit(&own_event, EventArgs::new()));
                        emitter.off(&own_event, &own);

                        // once entries on a shared key: whichever emit snapshots
                        // an entry first fires it, so each fires exactly once
                        let once_tx = tx.clone();
                        emitter.once(
                            "shared",
                            Listener::new(move |_args| {
                                let _ = once_tx.lock().unwrap().send(t);
                            }),
                        );
                        emitter.emit("shared", EventArgs::new());
                    }
                })
            })
            .collect();
        for worker in workers {
            worker.join().unwrap();
        }

        let expected = THREADS * ROUNDS * 2;
        let mut per_thread = vec![0_usize; THREADS];
        for _ in 0..expected {
            let t = rx
                .recv_timeout(std::time::Duration::from_secs(10))
                .expect("Timed out waiting for listener");
            per_thread[t] += 1;
        }
        assert!(rx.recv_timeout(std::time::Duration::from_millis(100)).is_err());
        assert!(per_thread.iter().all(|&n| n == ROUNDS * 2));

        assert!(emitter.event_names().is_empty());
        assert_eq!(emitter.total_listener_count(), 0);
    }

    #[test]
    fn test_unsubscribe_by_handle() {
        let emitter = EventEmitter::new();
        let id = emitter.subscribe("handle", |_args| {});
        emitter.subscribe("handle", |_args| {});
        assert_eq!(emitter.listener_count("handle"), 2);

        emitter.remove_listener("handle", id);
        assert_eq!(emitter.listener_count("handle"), 1);
        assert!(emitter.listeners("handle").iter().all(|l| l.id() != id));

        // removing the same handle again is a no-op
        emitter.remove_listener("handle", id);
        assert_eq!(emitter.listener_count("handle"), 1);
    }

    #[test]
    fn test_remove_all_listeners() {
        let emitter = EventEmitter::new();
        let dummy = Listener::new(|_args| {});
        emitter
            .on("event_a", dummy.clone())
            .on("event_b", dummy.clone())
            .on("event_b", dummy.clone())
            .on("event_c", dummy.clone());

        emitter.remove_all_listeners(&["event_a", "event_b", "missing"]);
        assert_eq!(emitter.listener_count("event_a"), 0);
        assert_eq!(emitter.listener_count("event_b"), 0);
        assert_eq!(emitter.listener_count("event_c"), 1);
        assert_eq!(emitter.event_names(), vec!["event_c".to_string()]);

        emitter.on("event_d", dummy);
        emitter.remove_all_listeners(&[]);
        assert!(emitter.event_names().is_empty());
        assert_eq!(emitter.total_listener_count(), 0);
    }

    #[test]
    fn test_event_names_track_registrations() {
        let emitter = EventEmitter::default();
        assert!(emitter.event_names().is_empty());

        let dummy = Listener::new(|_args| {});
        emitter
            .on("event_a", dummy.clone())
            .on("event_b", dummy.clone())
            .on("", dummy.clone());
        let names: HashSet<String> = emitter.event_names().into_iter().collect();
        let expected: HashSet<String> = ["event_a", "event_b", ""]
            .iter()
            .map(|s| s.to_string())
            .collect();
        assert_eq!(names, expected);

        // names are case-sensitive
        assert_eq!(emitter.listener_count("EVENT_A"), 0);
    }

    #[test]
    fn test_listeners_returns_independent_copy() {
        let emitter = EventEmitter::new();
        let dummy = Listener::new(|_args| {});
        emitter.on("copy", dummy.clone()).on("copy", dummy);

        let mut copy = emitter.listeners("copy");
        copy.clear();
        copy.push(Listener::new(|_args| {}));
        assert_eq!(emitter.listener_count("copy"), 2);
    }
}
