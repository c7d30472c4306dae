use crate::config::{
    Mode, BASE_FLUTTER_AMP, BASE_FLUTTER_FREQ, CELL_COUNT, CELL_PITCH, GRID_SIZE,
};
use rand::rngs::StdRng;
use rand::Rng;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum Shape {
    Square,
    Circle,
    Triangle,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) struct Rgb {
    pub(crate) r: u8,
    pub(crate) g: u8,
    pub(crate) b: u8,
}

impl Rgb {
    pub(crate) const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }
}

/// The untouched cell color. A cell showing this as a white square, unflipped,
/// is in base state.
pub(crate) const BASE_COLOR: Rgb = Rgb::new(235, 235, 235);

/// One grid cell. Homogeneous data; all behavior lives in the tick engine.
#[derive(Clone, Debug, PartialEq)]
pub(crate) struct Cell {
    pub(crate) row: usize,
    pub(crate) col: usize,

    pub(crate) shape: Shape,
    pub(crate) color: Rgb,

    /// Current flip angle, degrees.
    pub(crate) angle: f32,
    pub(crate) target_angle: f32,

    /// Staged shape/color pair; committed when the angle crosses half the
    /// local max while rising. Present or absent together by construction.
    pub(crate) pending: Option<(Shape, Rgb)>,

    pub(crate) flipped: bool,
    /// Local max captured at flip time; the un-flip threshold is half of it.
    pub(crate) flipped_max_angle: f32,

    pub(crate) flutter_phase: f32,
    pub(crate) flutter_freq: f32,
    pub(crate) flutter_amp: f32,
    /// Mode-independent draws made once at creation.
    pub(crate) base_freq: f32,
    pub(crate) base_amp: f32,

    /// Decaying additive bump to the target angle from neighbor flips.
    pub(crate) reaction: f32,

    pub(crate) cooldown: f32,
    /// Countdown to a forced reset; None means not scheduled.
    pub(crate) revert_timer: Option<f32>,

    /// Which mode last committed a flip here; None means untouched.
    pub(crate) modified_by: Option<Mode>,

    /// Staggered-animation state armed by a mode switch.
    pub(crate) reverting: bool,
    pub(crate) revert_speed_mult: f32,

    /// Periodic reshuffle countdown while a labil revert is pending.
    pub(crate) morph_timer: f32,

    /// Two-hit debounce state (labil trigger path).
    pub(crate) labil_hits: u8,
    pub(crate) labil_last_seed: u64,
    /// General per-hover dedup.
    pub(crate) last_seed: u64,

    /// Cosmetic depth offset, export only.
    pub(crate) depth: f32,
}

impl Cell {
    pub(crate) fn new(row: usize, col: usize, rng: &mut StdRng) -> Self {
        Self {
            row,
            col,
            shape: Shape::Square,
            color: BASE_COLOR,
            angle: 0.0,
            target_angle: 0.0,
            pending: None,
            flipped: false,
            flipped_max_angle: 0.0,
            flutter_phase: rng.gen_range(0.0..std::f32::consts::TAU),
            flutter_freq: 0.0,
            flutter_amp: 0.0,
            base_freq: rng.gen_range(BASE_FLUTTER_FREQ.0..BASE_FLUTTER_FREQ.1),
            base_amp: rng.gen_range(BASE_FLUTTER_AMP.0..BASE_FLUTTER_AMP.1),
            reaction: 0.0,
            cooldown: 0.0,
            revert_timer: None,
            modified_by: None,
            reverting: false,
            revert_speed_mult: 1.0,
            morph_timer: 0.0,
            labil_hits: 0,
            labil_last_seed: 0,
            last_seed: 0,
            depth: 0.0,
        }
    }

    /// Restore every mutable field to its init value. Position and the
    /// creation-time flutter base draws are kept.
    pub(crate) fn reset_to_base(&mut self) {
        self.shape = Shape::Square;
        self.color = BASE_COLOR;
        self.angle = 0.0;
        self.target_angle = 0.0;
        self.pending = None;
        self.flipped = false;
        self.flipped_max_angle = 0.0;
        self.flutter_freq = 0.0;
        self.flutter_amp = 0.0;
        self.reaction = 0.0;
        self.cooldown = 0.0;
        self.revert_timer = None;
        self.modified_by = None;
        self.reverting = false;
        self.revert_speed_mult = 1.0;
        self.morph_timer = 0.0;
        self.labil_hits = 0;
        self.labil_last_seed = 0;
        self.last_seed = 0;
        self.depth = 0.0;
    }

    pub(crate) fn is_base(&self) -> bool {
        self.modified_by.is_none()
    }
}

/// What the render adapter consumes, once per frame per cell.
#[derive(Clone, Copy, Debug)]
pub(crate) struct RenderCell {
    pub(crate) shape: Shape,
    pub(crate) color: Rgb,
    /// Pivot in logical units: grid position times pitch, plus depth offset.
    pub(crate) pivot: (f32, f32),
    /// Integrated angle plus the flutter term, degrees.
    pub(crate) rotation: f32,
}

pub(crate) struct Grid {
    pub(crate) cells: Vec<Cell>,
}

impl Grid {
    pub(crate) fn new(rng: &mut StdRng) -> Self {
        let mut cells = Vec::with_capacity(CELL_COUNT);
        for row in 0..GRID_SIZE {
            for col in 0..GRID_SIZE {
                cells.push(Cell::new(row, col, rng));
            }
        }
        Self { cells }
    }

    #[inline]
    pub(crate) fn idx(row: usize, col: usize) -> usize {
        row * GRID_SIZE + col
    }

    pub(crate) fn cell(&self, row: usize, col: usize) -> &Cell {
        &self.cells[Self::idx(row, col)]
    }

    /// The 8 in-bounds neighbors of a cell, with their center distance.
    pub(crate) fn neighbors(idx: usize) -> Vec<(usize, f32)> {
        let row = (idx / GRID_SIZE) as i32;
        let col = (idx % GRID_SIZE) as i32;
        let mut out = Vec::with_capacity(8);
        for dr in -1i32..=1 {
            for dc in -1i32..=1 {
                if dr == 0 && dc == 0 {
                    continue;
                }
                let r = row + dr;
                let c = col + dc;
                if r < 0 || c < 0 || r >= GRID_SIZE as i32 || c >= GRID_SIZE as i32 {
                    continue;
                }
                let dist = if dr != 0 && dc != 0 {
                    std::f32::consts::SQRT_2
                } else {
                    1.0
                };
                out.push((r as usize * GRID_SIZE + c as usize, dist));
            }
        }
        out
    }

    /// Fill `out` with one renderable record per cell, row-major.
    pub(crate) fn snapshot(&self, out: &mut Vec<RenderCell>) {
        out.clear();
        out.reserve(self.cells.len());
        for cell in &self.cells {
            let flutter = cell.flutter_amp * cell.flutter_phase.sin();
            out.push(RenderCell {
                shape: cell.shape,
                color: cell.color,
                pivot: (
                    cell.col as f32 * CELL_PITCH + CELL_PITCH * 0.5 + cell.depth,
                    cell.row as f32 * CELL_PITCH + CELL_PITCH * 0.5,
                ),
                rotation: cell.angle + flutter,
            });
        }
    }
}
