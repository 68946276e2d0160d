//! Try-on session
//!
//! [`TryOnSession`] owns every piece of per-run state: landmark source,
//! pose estimator, smoother, measurement sampler, manual adjustment and the
//! layered renderer. [`TryOnSession::tick`] is the only place that state
//! changes in response to frames.
//!
//! # Frame Flow
//!
//! ```text
//! detect ──► estimate ──► smooth ──► set_transform ──► render
//!    │                                     ▲
//!    └──► measure ──► (interval) auto-adjust ──► adjustment
//! ```
//!
//! A frame whose pose cannot be estimated holds the current transform and
//! bypasses the smoother. Auto-adjust only runs in [`ScaleMode::Manual`];
//! automatic mode already sizes the overlay from the measured eye distance.

use std::time::{Duration, Instant};

use facefit_pose::{
    AutoAdjustOutcome, AutoAdjuster, FaceLandmarkSet, FaceMeasurement, ManualAdjustment, MeasurementSampler,
    OverlayTransform, PoseEstimator, ScaleMode, TransformSmoother,
};
use facefit_render::{LayeredRenderer, NodeKey, RenderBackend, RenderStats};

use crate::config::{view_projection, SessionConfig};
use crate::controls::Command;
use crate::error::Result;
use crate::overlay::OverlayModel;
use crate::source::LandmarkSource;
use crate::store::AdjustmentStore;

/// What happened during one tick
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TickReport {
    pub frame_index: u64,
    pub face_detected: bool,
    /// Transform applied to the overlay this frame
    pub transform: OverlayTransform,
    /// Measurement committed this frame, if the sampler fired
    pub measurement: Option<FaceMeasurement>,
    /// Auto-adjust result, if its interval elapsed this frame
    pub auto_adjust: Option<AutoAdjustOutcome>,
}

/// Frame loop context
pub struct TryOnSession<S: LandmarkSource, B: RenderBackend> {
    config: SessionConfig,
    source: S,
    renderer: LayeredRenderer<B>,
    overlay: NodeKey,
    estimator: PoseEstimator,
    smoother: TransformSmoother,
    sampler: MeasurementSampler,
    auto_adjuster: AutoAdjuster,
    adjustment: ManualAdjustment,
    store: AdjustmentStore,
    transform: OverlayTransform,
    frame_index: u64,
    next_auto_adjust: Option<f64>,
    epoch: Instant,
    debug: bool,
}

impl<S: LandmarkSource, B: RenderBackend> TryOnSession<S, B> {
    /// Start the detector, build the renderer and install the glasses
    pub fn start(config: SessionConfig, source: S, backend: B) -> Result<Self> {
        Self::start_with_model(config, source, backend, &OverlayModel::glasses())
    }

    /// Start with a specific overlay asset
    ///
    /// Detector initialization failure is returned as is and not retried.
    pub fn start_with_model(config: SessionConfig, mut source: S, backend: B, model: &OverlayModel) -> Result<Self> {
        source.initialize()?;

        let mut renderer = LayeredRenderer::new(backend, config.build_camera());
        let overlay = model.install(&mut renderer)?;

        let store = AdjustmentStore::new(config.adjustment_path.clone());
        let adjustment = store.load();

        log::info!(
            "Try-on session started: {}x{} frame, {:?} scale",
            config.frame.width,
            config.frame.height,
            config.calibration.scale_mode
        );

        Ok(Self {
            estimator: PoseEstimator::new(config.calibration.clone()),
            smoother: TransformSmoother::new(config.calibration.smoothing),
            sampler: MeasurementSampler::new(config.measurement_interval),
            auto_adjuster: AutoAdjuster::new(config.auto_adjust.clone()),
            config,
            source,
            renderer,
            overlay,
            adjustment,
            store,
            transform: OverlayTransform::IDENTITY,
            frame_index: 0,
            next_auto_adjust: None,
            epoch: Instant::now(),
            debug: false,
        })
    }

    /// Process one frame at `now` seconds on the caller's clock
    ///
    /// Detection errors are logged and the frame still renders with the
    /// held transform. Render errors are returned.
    pub fn tick(&mut self, now: f64) -> Result<TickReport> {
        let landmarks = match self.source.detect(self.frame_index) {
            Ok(landmarks) => landmarks,
            Err(e) => {
                log::warn!("Frame {}: detection failed: {}", self.frame_index, e);
                None
            }
        };

        let face_detected = landmarks.is_some();
        let measurement = match &landmarks {
            Some(landmarks) => self.track(landmarks, now),
            None => None,
        };

        let auto_adjust = self.auto_adjust_due(now);

        self.renderer.set_transform(self.overlay, self.transform.matrix())?;
        self.renderer.render_at(self.instant_at(now))?;

        if self.debug {
            let stats = self.renderer.stats()?;
            log::info!(
                "Frame {}: {:.1} fps, {} triangles, {} draw calls, {} opaque, {} transparent, yaw {:.3} pitch {:.3} roll {:.3} scale {:.3}",
                self.frame_index,
                stats.fps,
                stats.triangles,
                stats.draw_calls,
                stats.opaque_count,
                stats.transparent_count,
                self.transform.yaw(),
                self.transform.pitch(),
                self.transform.roll(),
                self.transform.scale
            );
        }

        let report = TickReport {
            frame_index: self.frame_index,
            face_detected,
            transform: self.transform,
            measurement,
            auto_adjust,
        };
        self.frame_index += 1;
        Ok(report)
    }

    fn track(&mut self, landmarks: &FaceLandmarkSet, now: f64) -> Option<FaceMeasurement> {
        let view = view_projection(self.renderer.camera());
        if let Some(raw) = self
            .estimator
            .try_estimate(landmarks, self.config.frame, &view, &self.adjustment)
        {
            self.transform = self.smoother.smooth(raw);
        }

        self.sampler.sample(landmarks, self.config.frame, now)
    }

    /// Run auto-adjust if its interval has elapsed
    ///
    /// Reads the averaged snapshot after this frame's sample is committed.
    fn auto_adjust_due(&mut self, now: f64) -> Option<AutoAdjustOutcome> {
        let interval = self.config.auto_adjust_interval;
        if interval <= 0.0 || self.config.calibration.scale_mode != ScaleMode::Manual {
            return None;
        }

        let due = *self.next_auto_adjust.get_or_insert(now + interval);
        if now < due {
            return None;
        }
        self.next_auto_adjust = Some(now + interval);

        let snapshot = self.sampler.average()?;
        let calibration = &self.config.calibration;
        let base_scale = calibration.clamp_scale(calibration.base_scale);
        let outcome = self.auto_adjuster.apply(&snapshot, base_scale, &mut self.adjustment);
        match outcome {
            AutoAdjustOutcome::Applied { multiplier, offset } => {
                log::debug!("Auto-adjust multiplier {:.3}, offset {:+.3}", multiplier, offset)
            }
            AutoAdjustOutcome::Rejected { confidence } => {
                log::debug!("Auto-adjust skipped, confidence {:.2}", confidence)
            }
        }
        Some(outcome)
    }

    fn instant_at(&self, now: f64) -> Instant {
        self.epoch + Duration::try_from_secs_f64(now.max(0.0)).unwrap_or_default()
    }

    /// Handle a user command
    pub fn handle_command(&mut self, command: Command) -> Result<()> {
        match command {
            Command::Save => self.store.save(&self.adjustment)?,
            Command::Load => self.adjustment = self.store.load(),
            Command::ToggleDebug => {
                self.debug = !self.debug;
                log::info!("Debug overlay {}", if self.debug { "on" } else { "off" });
            }
            other => {
                other.apply(&mut self.adjustment, &self.config.controls);
                log::debug!("{:?} -> {:?}", other, self.adjustment);
            }
        }
        Ok(())
    }

    /// Forget tracking history and restore the default adjustment
    pub fn reset(&mut self) {
        self.estimator.reset();
        self.smoother.reset();
        self.sampler.clear();
        self.adjustment.reset();
        self.transform = OverlayTransform::IDENTITY;
        self.next_auto_adjust = None;
        log::info!("Try-on session reset");
    }

    /// Resize the output surface
    pub fn resize(&mut self, width: u32, height: u32) -> Result<()> {
        self.renderer.resize(width, height)?;
        Ok(())
    }

    pub fn stats(&self) -> Result<RenderStats> {
        Ok(self.renderer.stats()?)
    }

    /// Release renderer resources; the session is unusable afterwards
    pub fn shutdown(&mut self) {
        self.renderer.dispose();
        log::info!("Try-on session stopped after {} frames", self.frame_index);
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    pub fn adjustment(&self) -> &ManualAdjustment {
        &self.adjustment
    }

    pub fn transform(&self) -> OverlayTransform {
        self.transform
    }

    pub fn overlay(&self) -> NodeKey {
        self.overlay
    }

    pub fn renderer(&self) -> &LayeredRenderer<B> {
        &self.renderer
    }

    pub fn sampler(&self) -> &MeasurementSampler {
        &self.sampler
    }

    pub fn frame_index(&self) -> u64 {
        self.frame_index
    }

    pub fn is_debug(&self) -> bool {
        self.debug
    }

    pub fn source(&self) -> &S {
        &self.source
    }
}
