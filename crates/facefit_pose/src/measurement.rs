//! Face measurement sampling
//!
//! Samples landmark distances at a fixed rate into a short ring buffer so
//! auto-adjust can work from an average instead of one noisy frame.
//!
//! Every sample is proportional to the temple-to-temple face width. Other
//! distances fall back to fixed fractions of it when their landmarks are
//! missing; those landmarks still count against confidence.

use std::collections::VecDeque;

use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::landmarks::{index, FaceLandmarkSet, FrameSize};

/// Ring buffer capacity
pub const MEASUREMENT_HISTORY: usize = 10;

/// Default minimum spacing between samples in seconds
pub const DEFAULT_SAMPLE_INTERVAL: f64 = 1.0;

/// Landmarks a complete measurement resolves
pub const MEASUREMENT_LANDMARKS: [usize; 9] = [
    index::LEFT_TEMPLE,
    index::RIGHT_TEMPLE,
    index::LEFT_EYE_OUTER,
    index::RIGHT_EYE_OUTER,
    index::LEFT_EYE_INNER_MEASURE,
    index::RIGHT_EYE_INNER_MEASURE,
    index::NOSE_BRIDGE,
    index::FOREHEAD,
    index::CHIN,
];

/// Fallback ratios against face width
pub mod fallback {
    pub const EYE_DISTANCE: f32 = 0.46;
    pub const NOSE_WIDTH: f32 = 0.20;
    pub const FACE_HEIGHT: f32 = 1.3;
}

/// Nose width as a fraction of the inner eye span
pub const NOSE_FROM_INNER_EYES: f32 = 0.6;

/// One face measurement in pixels
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct FaceMeasurement {
    pub face_width: f32,
    pub eye_distance: f32,
    pub nose_width: f32,
    pub face_height: f32,
    /// Fraction of [`MEASUREMENT_LANDMARKS`] that were resolved
    pub confidence: f32,
    /// Seconds on the caller's clock
    pub timestamp: f64,
}

impl FaceMeasurement {
    /// Measure a single frame without rate limiting
    ///
    /// Returns `None` when either temple is missing.
    pub fn from_landmarks(landmarks: &FaceLandmarkSet, frame: FrameSize, timestamp: f64) -> Option<Self> {
        let px = |i: usize| landmarks.pixel(i, frame);
        let span = |a: Option<Vec2>, b: Option<Vec2>| a.zip(b).map(|(a, b)| a.distance(b));

        let face_width = span(px(index::LEFT_TEMPLE), px(index::RIGHT_TEMPLE))?;

        let eye_distance = span(px(index::LEFT_EYE_OUTER), px(index::RIGHT_EYE_OUTER))
            .unwrap_or(face_width * fallback::EYE_DISTANCE);
        let nose_width = span(
            px(index::LEFT_EYE_INNER_MEASURE),
            px(index::RIGHT_EYE_INNER_MEASURE),
        )
        .map(|d| d * NOSE_FROM_INNER_EYES)
        .unwrap_or(face_width * fallback::NOSE_WIDTH);
        let face_height = span(px(index::FOREHEAD), px(index::CHIN))
            .unwrap_or(face_width * fallback::FACE_HEIGHT);

        let resolved = landmarks.count_present(&MEASUREMENT_LANDMARKS);

        Some(Self {
            face_width,
            eye_distance,
            nose_width,
            face_height,
            confidence: resolved as f32 / MEASUREMENT_LANDMARKS.len() as f32,
            timestamp,
        })
    }
}

/// Rate-limited sampler with a bounded history
#[derive(Clone, Debug)]
pub struct MeasurementSampler {
    interval: f64,
    last_sample: Option<f64>,
    history: VecDeque<FaceMeasurement>,
}

impl MeasurementSampler {
    pub fn new(interval: f64) -> Self {
        Self {
            interval: interval.max(0.0),
            last_sample: None,
            history: VecDeque::with_capacity(MEASUREMENT_HISTORY),
        }
    }

    pub fn interval(&self) -> f64 {
        self.interval
    }

    /// Take a sample if the interval has elapsed
    ///
    /// Calls inside the interval, and frames without both temples, return
    /// `None` and leave the sampler untouched.
    pub fn sample(&mut self, landmarks: &FaceLandmarkSet, frame: FrameSize, now: f64) -> Option<FaceMeasurement> {
        if let Some(last) = self.last_sample {
            if now - last < self.interval {
                return None;
            }
        }

        let measurement = FaceMeasurement::from_landmarks(landmarks, frame, now)?;

        if self.history.len() == MEASUREMENT_HISTORY {
            self.history.pop_front();
        }
        self.history.push_back(measurement);
        self.last_sample = Some(now);

        log::debug!(
            "Face measurement: width {:.1}px, eyes {:.1}px, confidence {:.2}",
            measurement.face_width,
            measurement.eye_distance,
            measurement.confidence
        );

        Some(measurement)
    }

    /// Mean of all buffered samples, stamped with the newest timestamp
    pub fn average(&self) -> Option<FaceMeasurement> {
        let newest = self.history.back()?;
        let n = self.history.len() as f32;

        let mut sum = FaceMeasurement {
            face_width: 0.0,
            eye_distance: 0.0,
            nose_width: 0.0,
            face_height: 0.0,
            confidence: 0.0,
            timestamp: newest.timestamp,
        };
        for m in &self.history {
            sum.face_width += m.face_width;
            sum.eye_distance += m.eye_distance;
            sum.nose_width += m.nose_width;
            sum.face_height += m.face_height;
            sum.confidence += m.confidence;
        }

        sum.face_width /= n;
        sum.eye_distance /= n;
        sum.nose_width /= n;
        sum.face_height /= n;
        sum.confidence /= n;
        Some(sum)
    }

    pub fn latest(&self) -> Option<&FaceMeasurement> {
        self.history.back()
    }

    pub fn history(&self) -> impl Iterator<Item = &FaceMeasurement> {
        self.history.iter()
    }

    pub fn len(&self) -> usize {
        self.history.len()
    }

    pub fn is_empty(&self) -> bool {
        self.history.is_empty()
    }

    /// Drop all samples and reset the rate limiter
    pub fn clear(&mut self) {
        self.history.clear();
        self.last_sample = None;
    }
}

impl Default for MeasurementSampler {
    fn default() -> Self {
        Self::new(DEFAULT_SAMPLE_INTERVAL)
    }
}
