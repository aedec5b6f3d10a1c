//! Integration tests for the actor runtime.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use quadpong_actor::{Actor, ActorSystem, AskError, Context, Ticker, ask};
use tokio::sync::oneshot;

// =========================================================================
// Test actors
// =========================================================================

/// Records every event (lifecycle + messages) into a shared log.
struct Recorder {
    log: Arc<Mutex<Vec<String>>>,
}

enum RecorderMsg {
    Note(String),
    Panic,
    StopSelf,
}

impl Actor for Recorder {
    type Msg = RecorderMsg;

    fn started(&mut self, _ctx: &mut Context<Self::Msg>) {
        self.log.lock().unwrap().push("started".into());
    }

    async fn handle(&mut self, ctx: &mut Context<Self::Msg>, msg: Self::Msg) {
        match msg {
            RecorderMsg::Note(s) => self.log.lock().unwrap().push(s),
            RecorderMsg::Panic => panic!("boom"),
            RecorderMsg::StopSelf => ctx.stop_self(),
        }
    }

    fn stopping(&mut self, _ctx: &mut Context<Self::Msg>) {
        self.log.lock().unwrap().push("stopping".into());
    }
}

/// Replies to asks with a fixed value.
struct Echo;

enum EchoMsg {
    Get { reply: oneshot::Sender<u32> },
    Ignore { _reply: oneshot::Sender<u32> },
}

impl Actor for Echo {
    type Msg = EchoMsg;

    async fn handle(&mut self, _ctx: &mut Context<Self::Msg>, msg: Self::Msg) {
        match msg {
            EchoMsg::Get { reply } => {
                let _ = reply.send(7);
            }
            EchoMsg::Ignore { _reply } => {
                // Drop the reply sender without answering.
            }
        }
    }
}

/// Counts ticks, optionally stalling to force coalescing.
struct TickCounter {
    ticks: Arc<AtomicU64>,
    stall: Duration,
    gate: Option<quadpong_actor::TickGate>,
}

struct Tick;

impl Actor for TickCounter {
    type Msg = Tick;

    async fn handle(&mut self, _ctx: &mut Context<Self::Msg>, _msg: Tick) {
        if let Some(gate) = &self.gate {
            gate.acknowledge();
        }
        self.ticks.fetch_add(1, Ordering::Relaxed);
        if !self.stall.is_zero() {
            tokio::time::sleep(self.stall).await;
        }
    }
}

/// Never finishes handling a message — for shutdown-timeout tests.
struct Stuck;

impl Actor for Stuck {
    type Msg = ();

    async fn handle(&mut self, _ctx: &mut Context<Self::Msg>, _msg: ()) {
        std::future::pending::<()>().await;
    }
}

fn recorder() -> (Recorder, Arc<Mutex<Vec<String>>>) {
    let log = Arc::new(Mutex::new(Vec::new()));
    (Recorder { log: Arc::clone(&log) }, log)
}

async fn settle() {
    tokio::time::sleep(Duration::from_millis(20)).await;
}

// =========================================================================
// Lifecycle and delivery
// =========================================================================

#[tokio::test]
async fn test_messages_delivered_in_order() {
    let system = ActorSystem::new();
    let (actor, log) = recorder();
    let addr = system.spawn(actor);

    for i in 0..5 {
        addr.send(RecorderMsg::Note(format!("m{i}")));
    }
    settle().await;

    let log = log.lock().unwrap();
    assert_eq!(
        *log,
        vec!["started", "m0", "m1", "m2", "m3", "m4"]
    );
}

#[tokio::test]
async fn test_stop_runs_stopping_hook() {
    let system = ActorSystem::new();
    let (actor, log) = recorder();
    let addr = system.spawn(actor);

    addr.send(RecorderMsg::Note("one".into()));
    settle().await;
    addr.stop();
    settle().await;

    assert!(addr.is_stopped());
    assert_eq!(*log.lock().unwrap(), vec!["started", "one", "stopping"]);
    assert_eq!(system.actor_count(), 0);
}

#[tokio::test]
async fn test_stop_self_from_handler() {
    let system = ActorSystem::new();
    let (actor, log) = recorder();
    let addr = system.spawn(actor);

    addr.send(RecorderMsg::StopSelf);
    settle().await;

    assert!(addr.is_stopped());
    assert_eq!(*log.lock().unwrap(), vec!["started", "stopping"]);
}

#[tokio::test]
async fn test_send_to_stopped_actor_is_silent_drop() {
    let system = ActorSystem::new();
    let (actor, log) = recorder();
    let addr = system.spawn(actor);

    addr.stop();
    settle().await;

    // No panic, no effect.
    addr.send(RecorderMsg::Note("late".into()));
    settle().await;
    assert_eq!(*log.lock().unwrap(), vec!["started", "stopping"]);
}

#[tokio::test]
async fn test_stop_is_idempotent() {
    let system = ActorSystem::new();
    let (actor, log) = recorder();
    let addr = system.spawn(actor);

    addr.stop();
    addr.stop();
    settle().await;

    // `stopping` ran exactly once.
    let stops = log
        .lock()
        .unwrap()
        .iter()
        .filter(|s| *s == "stopping")
        .count();
    assert_eq!(stops, 1);
}

// =========================================================================
// Overflow and panic containment
// =========================================================================

#[tokio::test]
async fn test_full_mailbox_drops_and_counts() {
    let system = ActorSystem::new();
    let (actor, _log) = recorder();
    // Tiny mailbox; on the current-thread runtime the actor task gets
    // no chance to drain while we fill it synchronously.
    let addr = system.spawn_with_capacity(actor, 2);

    let before = quadpong_actor::dropped_messages();
    // Burst more than the capacity synchronously — no awaits in between,
    // so the actor task cannot drain the queue while we fill it.
    let mut enqueued = 0;
    for i in 0..50 {
        if addr.try_send(RecorderMsg::Note(format!("m{i}"))) {
            enqueued += 1;
        }
    }
    assert!(enqueued < 50, "some sends must have been dropped");
    assert!(quadpong_actor::dropped_messages() > before);
}

#[tokio::test]
async fn test_panic_contained_to_one_actor() {
    let system = ActorSystem::new();
    let (victim, victim_log) = recorder();
    let (bystander, bystander_log) = recorder();
    let victim_addr = system.spawn(victim);
    let bystander_addr = system.spawn(bystander);

    victim_addr.send(RecorderMsg::Panic);
    settle().await;

    // The panicking actor stopped and ran its stopping hook.
    assert!(victim_addr.is_stopped());
    assert_eq!(*victim_log.lock().unwrap(), vec!["started", "stopping"]);

    // The other actor is unaffected.
    bystander_addr.send(RecorderMsg::Note("alive".into()));
    settle().await;
    assert_eq!(
        *bystander_log.lock().unwrap(),
        vec!["started", "alive"]
    );
    assert_eq!(system.actor_count(), 1);
}

// =========================================================================
// Ask
// =========================================================================

#[tokio::test]
async fn test_ask_replies() {
    let system = ActorSystem::new();
    let addr = system.spawn(Echo);

    let value = ask(&addr, |tx| EchoMsg::Get { reply: tx }, Duration::from_secs(1))
        .await
        .unwrap();
    assert_eq!(value, 7);
}

#[tokio::test]
async fn test_ask_dropped_reply() {
    let system = ActorSystem::new();
    let addr = system.spawn(Echo);

    let result = ask(
        &addr,
        |tx| EchoMsg::Ignore { _reply: tx },
        Duration::from_secs(1),
    )
    .await;
    assert_eq!(result.unwrap_err(), AskError::Dropped);
}

#[tokio::test]
async fn test_ask_stopped_actor_fails_fast() {
    let system = ActorSystem::new();
    let addr = system.spawn(Echo);
    addr.stop();
    settle().await;

    // The message is dropped on the closed mailbox, so the reply sender
    // is dropped too — no need to wait out the timeout.
    let result = ask(&addr, |tx| EchoMsg::Get { reply: tx }, Duration::from_secs(5)).await;
    assert_eq!(result.unwrap_err(), AskError::Dropped);
}

// =========================================================================
// Shutdown
// =========================================================================

#[tokio::test]
async fn test_shutdown_stops_all_actors() {
    let system = ActorSystem::new();
    let (a, log_a) = recorder();
    let (b, log_b) = recorder();
    system.spawn(a);
    system.spawn(b);

    system.shutdown(Duration::from_secs(1)).await;

    assert_eq!(system.actor_count(), 0);
    assert!(log_a.lock().unwrap().contains(&"stopping".to_string()));
    assert!(log_b.lock().unwrap().contains(&"stopping".to_string()));
}

#[tokio::test]
async fn test_shutdown_aborts_stuck_actor() {
    let system = ActorSystem::new();
    let addr = system.spawn(Stuck);
    addr.send(());
    settle().await;

    // The stuck actor never observes the stop signal; shutdown must
    // still return promptly and clear the registry.
    let start = std::time::Instant::now();
    system.shutdown(Duration::from_millis(100)).await;
    assert!(start.elapsed() < Duration::from_secs(2));
    assert_eq!(system.actor_count(), 0);
}

// =========================================================================
// Ticker
// =========================================================================

#[tokio::test]
async fn test_ticker_delivers_ticks() {
    let system = ActorSystem::new();
    let ticks = Arc::new(AtomicU64::new(0));
    let addr = system.spawn(TickCounter {
        ticks: Arc::clone(&ticks),
        stall: Duration::ZERO,
        gate: None,
    });

    let ticker = Ticker::start(addr.clone(), Duration::from_millis(10), || Tick);
    // Without acknowledgment only the first tick can land; install the
    // gate wiring by acknowledging through a fresh handle per tick is
    // what real actors do. Here we exercise the raw delivery path.
    let gate = ticker.gate();
    tokio::time::sleep(Duration::from_millis(100)).await;
    gate.acknowledge();
    tokio::time::sleep(Duration::from_millis(50)).await;

    ticker.stop();
    let seen = ticks.load(Ordering::Relaxed);
    assert!(seen >= 2, "expected at least two ticks, got {seen}");
}

#[tokio::test]
async fn test_ticker_coalesces_while_unacknowledged() {
    let system = ActorSystem::new();
    let ticks = Arc::new(AtomicU64::new(0));
    let addr = system.spawn(TickCounter {
        ticks: Arc::clone(&ticks),
        stall: Duration::ZERO,
        gate: None,
    });

    let ticker = Ticker::start(addr.clone(), Duration::from_millis(5), || Tick);
    // The counter never acknowledges, so exactly one tick can ever be
    // enqueued no matter how long the ticker runs.
    tokio::time::sleep(Duration::from_millis(100)).await;
    ticker.stop();

    assert_eq!(ticks.load(Ordering::Relaxed), 1);
}

#[tokio::test]
async fn test_ticker_resumes_after_acknowledge() {
    let system = ActorSystem::new();
    let ticks = Arc::new(AtomicU64::new(0));

    // Spawn first so we can hand the gate to the actor afterwards via a
    // second actor construction — instead, run the gate loop manually.
    let addr = system.spawn(TickCounter {
        ticks: Arc::clone(&ticks),
        stall: Duration::ZERO,
        gate: None,
    });
    let ticker = Ticker::start(addr.clone(), Duration::from_millis(10), || Tick);
    let gate = ticker.gate();

    // Acknowledge in a loop, simulating a well-behaved actor.
    for _ in 0..10 {
        tokio::time::sleep(Duration::from_millis(15)).await;
        gate.acknowledge();
    }
    ticker.stop();

    let seen = ticks.load(Ordering::Relaxed);
    assert!(seen >= 5, "expected a stream of ticks, got {seen}");
}
