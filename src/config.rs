// src/config.rs
//
// This file is the control panel: the two mood configurations and every
// tuning constant the simulation reads. Change behavior here.

use crate::model::Rgb;

/// Fixed grid extent; the board is GRID_SIZE x GRID_SIZE cells.
pub(crate) const GRID_SIZE: usize = 40;
pub(crate) const CELL_COUNT: usize = GRID_SIZE * GRID_SIZE;

/// Logical pitch between cell pivots, in abstract render units.
pub(crate) const CELL_PITCH: f32 = 24.0;

/// Cells react to the pointer only within this many rows of the active row.
pub(crate) const VERTICAL_WINDOW: i32 = 2;

/// Exponent applied to combined intensity; sharpens falloff near the pointer.
pub(crate) const INTENSITY_SHARPEN: f32 = 0.9;

/// Seconds of trigger cooldown after a labil flip commits.
pub(crate) const LABIL_COOLDOWN: f32 = 0.6;

/// Seconds between shape/color reshuffles while a labil revert is pending.
pub(crate) const MORPH_INTERVAL: f32 = 0.4;

/// Mode-independent per-cell flutter base draws, made once at creation.
pub(crate) const BASE_FLUTTER_FREQ: (f32, f32) = (0.6, 1.6); // Hz
pub(crate) const BASE_FLUTTER_AMP: (f32, f32) = (2.0, 5.0); // degrees

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum Mode {
    Stable,
    Labil,
}

impl Mode {
    pub(crate) fn name(self) -> &'static str {
        match self {
            Mode::Stable => "stable",
            Mode::Labil => "labil",
        }
    }
}

/// Delay constants for the staggered revert batch armed on a mode switch.
/// delay = base + rank * per_rank + uniform jitter + squared-random tail.
#[derive(Clone, Copy, Debug)]
pub(crate) struct StaggerParams {
    pub(crate) base: f32,
    pub(crate) per_rank: f32,
    pub(crate) jitter: f32,
    pub(crate) tail: f32,
}

pub(crate) struct ModeConfig {
    /// Peak flip angle at the active column, degrees.
    pub(crate) start_angle: f32,
    /// Per-column multiplier of the attenuation recurrence.
    pub(crate) decay_factor: f32,
    /// Attenuation values below this floor are dropped from the profile.
    pub(crate) min_angle: f32,
    /// Flutter draws applied to a cell when a flip commits in this mode.
    pub(crate) flutter_freq: (f32, f32),
    pub(crate) flutter_amp: (f32, f32),
    /// Amplitude forced onto every colored cell while the mode is stable.
    pub(crate) forced_flutter_amp: f32,
    /// Colors a staged flip may pick from.
    pub(crate) palette: &'static [Rgb],
    /// Fixed trigger color in stable mode; also the promotion color on entry.
    pub(crate) accent: Rgb,
    /// Non-negative weights for square/circle/triangle, summing to 1.
    pub(crate) shape_weights: [f32; 3],
    /// Rate of the exponential approach of angle toward target, per second.
    pub(crate) responsiveness: f32,
    /// Exponential decay rate of the neighbor-reaction accumulator.
    pub(crate) reaction_decay: f32,
    /// Fraction of the profile peak a full-intensity trigger pushes onto
    /// its neighbors (divided by neighbor distance).
    pub(crate) reaction_spread: f32,
    /// Scale of the cosmetic depth offset derived from sin(angle).
    pub(crate) depth_factor: f32,
    /// Revert-timer draw for a flip committed in this mode (labil only):
    /// base + u * jitter + u2^2 * tail, biased short.
    pub(crate) revert_base: f32,
    pub(crate) revert_jitter: f32,
    pub(crate) revert_tail: f32,
    /// Stagger constants used when switching INTO this mode.
    pub(crate) stagger_in: StaggerParams,
    /// Integration slowdown applied to cells drifting back after a switch.
    pub(crate) revert_speed_mult: f32,
}

const STABLE_ACCENT: Rgb = Rgb::new(236, 94, 40);

static STABLE: ModeConfig = ModeConfig {
    start_angle: 180.0,
    decay_factor: 0.78,
    min_angle: 10.0,
    flutter_freq: (0.8, 1.8),
    flutter_amp: (3.0, 6.0),
    forced_flutter_amp: 6.0,
    palette: &[STABLE_ACCENT],
    accent: STABLE_ACCENT,
    shape_weights: [0.5, 0.3, 0.2],
    responsiveness: 6.0,
    reaction_decay: 2.5,
    reaction_spread: 0.25,
    depth_factor: 3.0,
    revert_base: 0.0,
    revert_jitter: 0.0,
    revert_tail: 0.0,
    // labil -> stable: quick, tight ripple
    stagger_in: StaggerParams {
        base: 0.15,
        per_rank: 0.03,
        jitter: 0.25,
        tail: 1.2,
    },
    revert_speed_mult: 0.4,
};

static LABIL: ModeConfig = ModeConfig {
    start_angle: 180.0,
    decay_factor: 0.55,
    min_angle: 12.0,
    flutter_freq: (0.0, 0.0),
    flutter_amp: (0.0, 0.0),
    forced_flutter_amp: 0.0,
    palette: &[
        Rgb::new(255, 59, 48),
        Rgb::new(255, 204, 0),
        Rgb::new(52, 199, 89),
        Rgb::new(0, 122, 255),
        Rgb::new(175, 82, 222),
        Rgb::new(255, 45, 85),
    ],
    accent: Rgb::new(255, 59, 48),
    shape_weights: [0.25, 0.35, 0.4],
    responsiveness: 3.0,
    reaction_decay: 4.0,
    reaction_spread: 0.12,
    depth_factor: 1.5,
    // short-lived flips: 0.8..2.0s typical, tail up to ~5s
    revert_base: 0.8,
    revert_jitter: 1.2,
    revert_tail: 3.0,
    // stable -> labil: slower, wider scatter
    stagger_in: StaggerParams {
        base: 0.3,
        per_rank: 0.05,
        jitter: 0.4,
        tail: 2.0,
    },
    revert_speed_mult: 0.3,
};

pub(crate) fn mode_config(mode: Mode) -> &'static ModeConfig {
    match mode {
        Mode::Stable => &STABLE,
        Mode::Labil => &LABIL,
    }
}
