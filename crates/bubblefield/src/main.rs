//! Demo runner: two simulated devices sharing one bubble field.
//!
//! Spawns random taps on both devices and ticks them at roughly the cadence
//! a UI shell would, so the whole spawn → replicate → grow → pop → delete
//! loop can be watched in the logs. Build with `--features rodio` to hear
//! the pops on device A.

mod boot;

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use rand::Rng;
use tracing::info;

use audio::mock::MockBackend;
use audio::AudioBackend;
use engine::{BubbleField, FieldSettings};
use store::MemoryStore;

const FRAME: Duration = Duration::from_millis(33);

fn env_or(key: &str, fallback: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| fallback.to_string())
}

fn load_settings() -> Result<FieldSettings> {
    match std::env::var("BUBBLEFIELD_SETTINGS") {
        Ok(path) => Ok(FieldSettings::load(&PathBuf::from(path))?),
        Err(_) => Ok(FieldSettings::default()),
    }
}

#[cfg(not(feature = "rodio"))]
fn main() -> Result<()> {
    run(MockBackend::new())
}

#[cfg(feature = "rodio")]
fn main() -> Result<()> {
    let (stream, backend) = audio::RodioBackend::open_default()?;
    let result = run(backend);
    drop(stream);
    result
}

fn run<B: AudioBackend>(backend_a: B) -> Result<()> {
    let _log_guard = boot::init_logging()?;

    let settings = load_settings()?;
    let seconds: u64 = env_or("BUBBLEFIELD_SECONDS", "6").parse()?;
    info!(seconds, pool_size = settings.pool_size, "starting bubblefield demo");

    let store = MemoryStore::new();
    // A real deployment gets this from the hosted backend; here we just
    // pretend the server clock runs slightly ahead.
    store.set_server_clock_offset(150);

    let backend_b = MockBackend::new();
    let pops_b = backend_b.clone();

    let device_a = BubbleField::new(Arc::new(store.clone()), backend_a, settings.clone());
    let device_b = BubbleField::new(Arc::new(store.clone()), backend_b, settings);
    device_a.activate();
    device_b.activate();

    let mut rng = rand::thread_rng();
    let frames = seconds * 30;
    for frame in 0..frames {
        if rng.gen_bool(0.15) {
            let x = rng.gen_range(0.0..1080.0);
            let y = rng.gen_range(0.0..1920.0);
            if rng.gen_bool(0.5) {
                device_a.spawn(x, y);
            } else {
                device_b.spawn(x, y);
            }
        }

        device_a.tick();
        device_b.tick();

        if frame % 30 == 0 {
            info!(
                bubbles = device_a.len(),
                idle_players = device_a.pooled_players(),
                skew_ms = device_a.skew_ms(),
                "field status"
            );
        }
        std::thread::sleep(FRAME);
    }

    device_a.deactivate();
    device_b.deactivate();
    store.flush();
    info!(
        remaining = store.len(),
        device_b_pops = pops_b.starts(),
        "demo finished"
    );
    Ok(())
}
