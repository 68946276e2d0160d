//! # facefit_session - Glasses Try-On Frame Loop
//!
//! Wires a [`LandmarkSource`](source::LandmarkSource) to the pose estimator
//! and the layered renderer, one frame per [`TryOnSession::tick`].
//!
//! # Architecture
//!
//! ```text
//! ┌────────────────┐   ┌──────────────────────────────────────────┐
//! │ LandmarkSource │──►│ TryOnSession                             │
//! └────────────────┘   │  PoseEstimator ─ TransformSmoother       │
//!                      │  MeasurementSampler ─ AutoAdjuster       │
//! ┌────────────────┐   │  ManualAdjustment ◄── Command            │
//! │ SessionConfig  │──►│  LayeredRenderer<B> (glasses overlay)    │
//! └────────────────┘   └──────────────────────────────────────────┘
//!                                    │ save / load
//!                                    ▼
//!                             AdjustmentStore
//! ```
//!
//! # Example
//!
//! ```ignore
//! use facefit_session::prelude::*;
//! use facefit_render::HeadlessBackend;
//!
//! let mut session = TryOnSession::start(
//!     SessionConfig::load(),
//!     SyntheticFaceSource::new(),
//!     HeadlessBackend::default(),
//! )?;
//! for frame in 0..90 {
//!     session.tick(frame as f64 / 30.0)?;
//! }
//! session.shutdown();
//! ```

pub mod config;
pub mod controls;
pub mod error;
pub mod overlay;
pub mod session;
pub mod source;
pub mod store;

pub use config::{CameraConfig, SessionConfig};
pub use controls::{key_binding, Command, ControlSteps};
pub use error::{Result, SessionError};
pub use overlay::{material_intent, MaterialIntent, OverlayModel, OverlayPart};
pub use session::{TickReport, TryOnSession};
pub use source::{LandmarkSource, SyntheticFaceSource};
pub use store::AdjustmentStore;

pub mod prelude {
    pub use crate::config::SessionConfig;
    pub use crate::controls::{key_binding, Command};
    pub use crate::error::{Result, SessionError};
    pub use crate::overlay::OverlayModel;
    pub use crate::session::{TickReport, TryOnSession};
    pub use crate::source::{LandmarkSource, SyntheticFaceSource};
    pub use crate::store::AdjustmentStore;
}
