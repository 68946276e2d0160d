//! Keyed adjustment commands
//!
//! Discrete commands a UI can fire at any rate. Adjustment commands add one
//! step to the [`ManualAdjustment`]; the rest are handled by the session.

use facefit_pose::ManualAdjustment;
use glam::Vec3;
use serde::{Deserialize, Serialize};

/// Step size per command
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ControlSteps {
    /// Pixels per move
    pub position: f32,
    /// World units per depth move
    pub depth: f32,
    /// Radians per rotation
    pub rotation: f32,
    /// Scale multiplier change
    pub scale: f32,
}

impl Default for ControlSteps {
    fn default() -> Self {
        Self {
            position: 2.0,
            depth: 0.1,
            rotation: 0.02,
            scale: 0.05,
        }
    }
}

/// User command
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Command {
    MoveLeft,
    MoveRight,
    MoveUp,
    MoveDown,
    MoveCloser,
    MoveFarther,
    YawLeft,
    YawRight,
    PitchUp,
    PitchDown,
    RollLeft,
    RollRight,
    ScaleUp,
    ScaleDown,
    /// Restore default adjustment
    Reset,
    ToggleDebug,
    Save,
    Load,
}

impl Command {
    /// Apply an adjustment command
    ///
    /// Returns `false` for commands that do not touch the adjustment.
    pub fn apply(&self, adjustment: &mut ManualAdjustment, steps: &ControlSteps) -> bool {
        let p = steps.position;
        let r = steps.rotation;
        match self {
            // Image Y grows downwards
            Command::MoveLeft => adjustment.nudge_position(Vec3::new(-p, 0.0, 0.0)),
            Command::MoveRight => adjustment.nudge_position(Vec3::new(p, 0.0, 0.0)),
            Command::MoveUp => adjustment.nudge_position(Vec3::new(0.0, -p, 0.0)),
            Command::MoveDown => adjustment.nudge_position(Vec3::new(0.0, p, 0.0)),
            Command::MoveCloser => adjustment.nudge_position(Vec3::new(0.0, 0.0, steps.depth)),
            Command::MoveFarther => adjustment.nudge_position(Vec3::new(0.0, 0.0, -steps.depth)),
            Command::YawLeft => adjustment.nudge_rotation(Vec3::new(0.0, -r, 0.0)),
            Command::YawRight => adjustment.nudge_rotation(Vec3::new(0.0, r, 0.0)),
            Command::PitchUp => adjustment.nudge_rotation(Vec3::new(r, 0.0, 0.0)),
            Command::PitchDown => adjustment.nudge_rotation(Vec3::new(-r, 0.0, 0.0)),
            Command::RollLeft => adjustment.nudge_rotation(Vec3::new(0.0, 0.0, r)),
            Command::RollRight => adjustment.nudge_rotation(Vec3::new(0.0, 0.0, -r)),
            Command::ScaleUp => adjustment.nudge_scale(steps.scale),
            Command::ScaleDown => adjustment.nudge_scale(-steps.scale),
            Command::Reset => adjustment.reset(),
            Command::ToggleDebug | Command::Save | Command::Load => return false,
        }
        true
    }
}

/// Default keyboard layout, letters are case-insensitive
pub fn key_binding(key: char) -> Option<Command> {
    let command = match key.to_ascii_lowercase() {
        'a' => Command::MoveLeft,
        'd' => Command::MoveRight,
        'w' => Command::MoveUp,
        's' => Command::MoveDown,
        'z' => Command::MoveCloser,
        'x' => Command::MoveFarther,
        'j' => Command::YawLeft,
        'l' => Command::YawRight,
        'i' => Command::PitchUp,
        'k' => Command::PitchDown,
        'u' => Command::RollLeft,
        'o' => Command::RollRight,
        '+' | '=' => Command::ScaleUp,
        '-' | '_' => Command::ScaleDown,
        'r' => Command::Reset,
        'g' => Command::ToggleDebug,
        'p' => Command::Save,
        'y' => Command::Load,
        _ => return None,
    };
    Some(command)
}
