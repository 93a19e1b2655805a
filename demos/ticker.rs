//! # Example: ticker
//!
//! Bridges a callback API that fires from its own OS thread into an async loop.
//!
//! Shows how to:
//! - Wrap a thread-driven callback source with [`SourceFn`]
//! - Iterate an [`EventSequence`](hookbridge::EventSequence) until cancellation
//! - Observe dropped events (ticks fired while the consumer is busy)
//!
//! ## Flow
//! ```text
//! main()
//!   ├─► EventBridge::start(token)
//!   │     └─► register: spawn "hook" thread, calls sink.fire(n) every 50ms
//!   ├─► for op in events
//!   │     ├─► op.await ─► print "." (slow every 4th tick ─► some ticks dropped)
//!   │     └─► Ctrl-C ─► token.cancel() ─► Outcome::Cancelled ─► break
//!   └─► sequence dropped ─► unregister: stop + join hook thread
//! ```
//!
//! ## Run
//! ```bash
//! RUST_LOG=hookbridge=debug cargo run --example ticker
//! ```

use std::io::Write;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use hookbridge::{BridgeConfig, EventBridge, EventSink, Outcome, SourceFn};
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;

/// Handle to the running hook thread.
struct Hook {
    stop: Arc<AtomicBool>,
    thread: JoinHandle<()>,
}

fn install(sink: EventSink<u64>, period: Duration) -> std::io::Result<Hook> {
    let stop = Arc::new(AtomicBool::new(false));
    let flag = Arc::clone(&stop);
    let thread = thread::Builder::new()
        .name("ticker-hook".into())
        .spawn(move || {
            let mut n = 0u64;
            while !flag.load(Ordering::Acquire) {
                thread::sleep(period);
                n += 1;
                sink.fire(n);
            }
        })?;
    Ok(Hook { stop, thread })
}

fn uninstall(hook: Hook) {
    hook.stop.store(true, Ordering::Release);
    if hook.thread.join().is_err() {
        tracing::warn!("ticker hook thread panicked");
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let source = SourceFn::new(
        "ticker",
        |sink: EventSink<u64>| install(sink, Duration::from_millis(50)),
        uninstall,
    );
    let bridge = EventBridge::with_config(source, BridgeConfig::named("ticker"));

    let token = CancellationToken::new();
    let on_signal = token.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            on_signal.cancel();
        }
    });

    let mut out = std::io::stdout();
    for op in bridge.start(token)? {
        match op.await? {
            Outcome::Event(n) => {
                print!(".");
                out.flush()?;
                if n % 4 == 0 {
                    tokio::time::sleep(Duration::from_millis(120)).await;
                }
            }
            Outcome::Cancelled => break,
        }
    }

    let stats = bridge.stats();
    println!(
        "\nexit: delivered={} dropped={}",
        stats.delivered, stats.dropped
    );
    Ok(())
}
