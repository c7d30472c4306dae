use crate::config::{CELL_PITCH, GRID_SIZE};
use crate::model::{RenderCell, Shape, BASE_COLOR};
use crate::pointer::GridLayout;
use crossterm::{
    cursor,
    event::{DisableMouseCapture, EnableMouseCapture},
    execute, queue,
    style::{Color, Print, ResetColor, SetForegroundColor},
    terminal::{
        self, BeginSynchronizedUpdate, Clear, ClearType, DisableLineWrap, EnableLineWrap,
        EndSynchronizedUpdate, EnterAlternateScreen, LeaveAlternateScreen,
    },
};
use std::io::{self, Write};

pub(crate) const HUD_ROWS: u16 = 2;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) struct ScreenCell {
    pub(crate) ch: char,
    pub(crate) fg: Color,
}

impl Default for ScreenCell {
    fn default() -> Self {
        Self {
            ch: ' ',
            fg: Color::White,
        }
    }
}

pub(crate) struct CellBuffer {
    pub(crate) w: u16,
    pub(crate) h: u16,
    pub(crate) cells: Vec<ScreenCell>,
}

impl CellBuffer {
    pub(crate) fn new(w: u16, h: u16) -> Self {
        Self {
            w,
            h,
            cells: vec![ScreenCell::default(); (w as usize) * (h as usize)],
        }
    }

    #[inline]
    pub(crate) fn idx(&self, x: u16, y: u16) -> usize {
        (y as usize) * (self.w as usize) + (x as usize)
    }

    pub(crate) fn set(&mut self, x: u16, y: u16, c: ScreenCell) {
        if x < self.w && y < self.h {
            let i = self.idx(x, y);
            self.cells[i] = c;
        }
    }

    pub(crate) fn clear(&mut self) {
        self.cells.fill(ScreenCell::default());
    }
}

/// Raw-mode alternate-screen terminal with mouse capture and a diffed
/// double buffer. Failing to begin here is fatal for the whole program:
/// there is no fallback surface to draw on.
pub(crate) struct Terminal {
    pub(crate) out: io::Stdout,
    pub(crate) cols: u16,
    pub(crate) rows: u16,
    prev: CellBuffer,
    pub(crate) cur: CellBuffer,
}

impl Terminal {
    pub(crate) fn begin() -> anyhow::Result<Self> {
        let mut out = io::stdout();
        execute!(
            out,
            EnterAlternateScreen,
            EnableMouseCapture,
            cursor::Hide,
            DisableLineWrap,
            terminal::Clear(ClearType::All)
        )?;
        terminal::enable_raw_mode()?;

        let (cols, rows) = terminal::size()?;
        Ok(Self {
            out,
            cols,
            rows,
            prev: CellBuffer::new(cols, rows),
            cur: CellBuffer::new(cols, rows),
        })
    }

    pub(crate) fn end(&mut self) -> anyhow::Result<()> {
        queue!(
            self.out,
            ResetColor,
            Clear(ClearType::All),
            cursor::Show,
            EnableLineWrap,
            DisableMouseCapture,
            LeaveAlternateScreen
        )?;
        self.out.flush()?;
        terminal::disable_raw_mode()?;
        Ok(())
    }

    pub(crate) fn resize_if_needed(&mut self) -> anyhow::Result<bool> {
        let (c, r) = terminal::size()?;
        if c == self.cols && r == self.rows {
            return Ok(false);
        }
        self.cols = c;
        self.rows = r;
        self.prev = CellBuffer::new(c, r);
        self.cur = CellBuffer::new(c, r);
        execute!(self.out, Clear(ClearType::All))?;
        Ok(true)
    }

    pub(crate) fn present(&mut self) -> anyhow::Result<()> {
        queue!(self.out, BeginSynchronizedUpdate)?;
        let mut last_fg = None;
        for y in 0..self.rows {
            for x in 0..self.cols {
                let i = self.cur.idx(x, y);
                let c = self.cur.cells[i];
                if c == self.prev.cells[i] {
                    continue;
                }
                queue!(self.out, cursor::MoveTo(x, y))?;
                if last_fg != Some(c.fg) {
                    queue!(self.out, SetForegroundColor(c.fg))?;
                    last_fg = Some(c.fg);
                }
                queue!(self.out, Print(c.ch))?;
            }
        }
        queue!(self.out, ResetColor, EndSynchronizedUpdate)?;
        self.out.flush()?;
        self.prev.cells.copy_from_slice(&self.cur.cells);
        Ok(())
    }
}

/// Pick a glyph for a shape under its current rotation. Squares tip over
/// into diamonds near a quarter turn; triangles step through the four
/// cardinal orientations; circles are rotation-invariant.
pub(crate) fn shape_glyph(shape: Shape, rotation: f32) -> char {
    match shape {
        Shape::Square => {
            let folded = rotation.rem_euclid(90.0);
            if (22.5..67.5).contains(&folded) {
                '◆'
            } else {
                '■'
            }
        }
        Shape::Circle => '●',
        Shape::Triangle => {
            let quadrant = (rotation / 90.0).round() as i32;
            match quadrant.rem_euclid(4) {
                0 => '▲',
                1 => '▶',
                2 => '▼',
                _ => '◀',
            }
        }
    }
}

fn shade(c: crate::model::Rgb, factor: f32) -> Color {
    let f = factor.clamp(0.0, 1.0);
    Color::Rgb {
        r: (c.r as f32 * f) as u8,
        g: (c.g as f32 * f) as u8,
        b: (c.b as f32 * f) as u8,
    }
}

/// Draw the row-major snapshot into the current buffer. The depth offset is
/// folded into brightness: a cell leaning away from the viewer dims a bit.
pub(crate) fn draw_grid(buf: &mut CellBuffer, cells: &[RenderCell], layout: &GridLayout) {
    for (i, rc) in cells.iter().enumerate() {
        let col = i % GRID_SIZE;
        let row = i / GRID_SIZE;
        if row >= layout.rows_visible {
            continue;
        }
        let (x, y) = layout.cell_origin(col, row);
        let rest_x = col as f32 * CELL_PITCH + CELL_PITCH * 0.5;
        let depth = rc.pivot.0 - rest_x;
        let factor = 1.0 - (depth.abs() / CELL_PITCH) * 2.0;

        let (ch, fg) = if rc.color == BASE_COLOR && rc.rotation.abs() < 4.0 {
            // resting white square: quiet dot so the grid reads as a field
            ('▫', shade(rc.color, 0.55))
        } else {
            (shape_glyph(rc.shape, rc.rotation), shade(rc.color, factor))
        };

        let cx = x + layout.cell_w / 2;
        let cy = y + layout.cell_h / 2;
        buf.set(cx, cy, ScreenCell { ch, fg });
    }
}

pub(crate) fn draw_text(buf: &mut CellBuffer, x: u16, y: u16, text: &str, fg: Color) {
    for (i, ch) in text.chars().enumerate() {
        let xx = x + i as u16;
        if xx >= buf.w {
            break;
        }
        buf.set(xx, y, ScreenCell { ch, fg });
    }
}
