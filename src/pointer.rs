use crate::config::GRID_SIZE;

/// Maps terminal coordinates onto the grid. Horizontal pitch scales with the
/// viewport width; vertical pitch is halved for character aspect and the
/// visible rows are clipped to what fits. Rebuilt on resize; pure math, safe
/// to recompute any time.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) struct GridLayout {
    pub(crate) origin_x: u16,
    pub(crate) origin_y: u16,
    pub(crate) cell_w: u16,
    pub(crate) cell_h: u16,
    pub(crate) rows_visible: usize,
}

impl GridLayout {
    pub(crate) fn new(cols: u16, rows: u16, hud_rows: u16) -> Self {
        let cell_w = ((cols as usize / GRID_SIZE).max(1)) as u16;
        let cell_h = (cell_w / 2).max(1);
        let grid_w = cell_w * GRID_SIZE as u16;
        let origin_x = if cols > grid_w { (cols - grid_w) / 2 } else { 0 };
        let rows_avail = rows.saturating_sub(hud_rows);
        let rows_visible = GRID_SIZE.min((rows_avail / cell_h) as usize);
        Self {
            origin_x,
            origin_y: hud_rows,
            cell_w,
            cell_h,
            rows_visible,
        }
    }

    /// Grid (column, row) under a terminal position, or None outside.
    pub(crate) fn cell_at(&self, x: u16, y: u16) -> Option<(usize, usize)> {
        if x < self.origin_x || y < self.origin_y {
            return None;
        }
        let col = ((x - self.origin_x) / self.cell_w) as usize;
        let row = ((y - self.origin_y) / self.cell_h) as usize;
        if col < GRID_SIZE && row < self.rows_visible {
            Some((col, row))
        } else {
            None
        }
    }

    /// Terminal position of a cell's top-left character.
    pub(crate) fn cell_origin(&self, col: usize, row: usize) -> (u16, u16) {
        (
            self.origin_x + col as u16 * self.cell_w,
            self.origin_y + row as u16 * self.cell_h,
        )
    }
}

/// Resolves the pointer into an active cell each frame and stamps hovers with
/// a monotonically increasing activation seed. The seed moves exactly once
/// per identity change, never on repeated frames of the same hover, so
/// downstream logic can deduplicate dwell time.
pub(crate) struct PointerTracker {
    active: Option<(usize, usize)>,
    prev_col: Option<usize>,
    prev_row: Option<usize>,
    seed: u64,
}

impl PointerTracker {
    pub(crate) fn new() -> Self {
        Self {
            active: None,
            prev_col: None,
            prev_row: None,
            seed: 0,
        }
    }

    /// Consume one pointer sample. While frozen the active cell is left
    /// untouched so unfreezing resumes exactly where it stopped.
    pub(crate) fn update(
        &mut self,
        sample: Option<(u16, u16)>,
        layout: &GridLayout,
        frozen: bool,
    ) {
        if frozen {
            return;
        }
        let resolved = sample.and_then(|(x, y)| layout.cell_at(x, y));
        let (col, row) = match resolved {
            Some((c, r)) => (Some(c), Some(r)),
            None => (None, None),
        };
        if col != self.prev_col || row != self.prev_row {
            self.seed += 1;
        }
        self.prev_col = col;
        self.prev_row = row;
        self.active = resolved;
    }

    /// The active (column, row), if the pointer resolves to a concrete cell.
    pub(crate) fn active(&self) -> Option<(usize, usize)> {
        self.active
    }

    pub(crate) fn seed(&self) -> u64 {
        self.seed
    }
}
