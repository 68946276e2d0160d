//! Blend state for the transparent pass
//!
//! Lenses are composited source-over onto the opaque backdrop. The opaque
//! pass runs with blending off.

use serde::{Deserialize, Serialize};

/// Material blend mode
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BlendMode {
    /// Source replaces destination
    #[default]
    Opaque,
    /// Source-over alpha blending
    Normal,
}

/// Factor a blend equation term is multiplied by
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BlendFactor {
    One,
    SrcAlpha,
    OneMinusSrcAlpha,
}

impl BlendFactor {
    fn weight(&self, src_alpha: f32) -> f32 {
        match self {
            BlendFactor::One => 1.0,
            BlendFactor::SrcAlpha => src_alpha,
            BlendFactor::OneMinusSrcAlpha => 1.0 - src_alpha,
        }
    }
}

/// Additive blend equation: `src * src_factor + dst * dst_factor`
///
/// Color and alpha channels carry separate factors.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BlendState {
    pub src_color: BlendFactor,
    pub dst_color: BlendFactor,
    pub src_alpha: BlendFactor,
    pub dst_alpha: BlendFactor,
}

impl BlendState {
    /// Straight-alpha source-over
    pub const SOURCE_OVER: Self = Self {
        src_color: BlendFactor::SrcAlpha,
        dst_color: BlendFactor::OneMinusSrcAlpha,
        src_alpha: BlendFactor::One,
        dst_alpha: BlendFactor::OneMinusSrcAlpha,
    };

    /// Composite one RGBA fragment over a destination pixel
    pub fn composite(&self, src: [f32; 4], dst: [f32; 4]) -> [f32; 4] {
        let a = src[3];
        let color = |i: usize| src[i] * self.src_color.weight(a) + dst[i] * self.dst_color.weight(a);
        [
            color(0),
            color(1),
            color(2),
            src[3] * self.src_alpha.weight(a) + dst[3] * self.dst_alpha.weight(a),
        ]
    }
}

impl BlendMode {
    /// Blend state to program, `None` when blending is off
    pub fn blend_state(&self) -> Option<BlendState> {
        match self {
            BlendMode::Opaque => None,
            BlendMode::Normal => Some(BlendState::SOURCE_OVER),
        }
    }

    pub fn is_blended(&self) -> bool {
        self.blend_state().is_some()
    }
}
