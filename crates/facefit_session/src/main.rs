//! Headless glasses try-on demo
//!
//! Drives a synthetic face through the full session at a simulated 30 fps
//! and logs the resulting overlay placement and render stats.
//!
//! Run with: cargo run --bin facefit -- [frames] [keys]
//!
//! `keys` is a string of control keys applied before the first frame,
//! e.g. `ddw+g` moves right twice, up once, scales up and enables debug.

use facefit_render::HeadlessBackend;
use facefit_session::{key_binding, SessionConfig, SyntheticFaceSource, TryOnSession};

const FRAME_RATE: f64 = 30.0;
const DEFAULT_FRAMES: u64 = 90;

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let mut args = std::env::args().skip(1);
    let frames = args
        .next()
        .and_then(|arg| arg.parse().ok())
        .unwrap_or(DEFAULT_FRAMES);
    let keys = args.next().unwrap_or_default();

    if let Err(e) = run(frames, &keys) {
        log::error!("Try-on session failed: {}", e);
        std::process::exit(1);
    }
}

fn run(frames: u64, keys: &str) -> facefit_session::Result<()> {
    let config = SessionConfig::load();
    let source = SyntheticFaceSource::new().with_dropout(45);
    let mut session = TryOnSession::start(config, source, HeadlessBackend::default())?;

    for key in keys.chars() {
        match key_binding(key) {
            Some(command) => session.handle_command(command)?,
            None => log::warn!("Unbound key '{}'", key),
        }
    }

    let mut detected = 0;
    for frame in 0..frames {
        let report = session.tick(frame as f64 / FRAME_RATE)?;
        if report.face_detected {
            detected += 1;
        }
        if let Some(outcome) = report.auto_adjust {
            log::info!("Frame {}: auto-adjust {:?}", frame, outcome);
        }
    }

    let transform = session.transform();
    log::info!(
        "Overlay at ({:.3}, {:.3}, {:.3}), yaw {:.3} pitch {:.3} roll {:.3}, scale {:.3}",
        transform.position.x,
        transform.position.y,
        transform.position.z,
        transform.yaw(),
        transform.pitch(),
        transform.roll(),
        transform.scale
    );

    let stats = session.stats()?;
    log::info!(
        "{} frames, face in {}: {:.1} fps, {} triangles, {} draw calls ({} opaque, {} transparent)",
        frames,
        detected,
        stats.fps,
        stats.triangles,
        stats.draw_calls,
        stats.opaque_count,
        stats.transparent_count
    );

    session.shutdown();
    Ok(())
}
