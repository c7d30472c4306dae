use crate::attenuation::AttenuationProfile;
use crate::config::{mode_config, Mode, StaggerParams, CELL_COUNT};
use crate::model::BASE_COLOR;
use crate::sim::Sim;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::Rng;

/// Revert delay for one cell of the outgoing batch: a linear base plus
/// per-rank stagger, uniform jitter, and a squared-random long tail. The
/// rank term makes later shuffle positions drift back later on average.
fn revert_delay(rank: usize, st: &StaggerParams, rng: &mut StdRng) -> f32 {
    let u = rng.gen::<f32>();
    let u2 = rng.gen::<f32>();
    st.base + rank as f32 * st.per_rank + u * st.jitter + u2 * u2 * st.tail
}

impl Sim {
    /// Switch moods. Cells owned by the outgoing mode are shuffled and sent
    /// back to base on a staggered, jittered schedule; untouched cells are
    /// never mutated here. Entering stable also wakes flutter on every
    /// colored cell and promotes white-but-flagged cells to the accent.
    pub(crate) fn set_mode(&mut self, next: Mode) {
        if next == self.mode {
            return;
        }
        let outgoing = self.mode;
        self.mode = next;
        let cfg = mode_config(next);
        self.profile = AttenuationProfile::build(cfg);

        let mut batch: Vec<usize> = (0..CELL_COUNT)
            .filter(|&i| self.grid.cells[i].modified_by == Some(outgoing))
            .collect();
        batch.shuffle(&mut self.rng);
        for (rank, &i) in batch.iter().enumerate() {
            let delay = revert_delay(rank, &cfg.stagger_in, &mut self.rng);
            let cell = &mut self.grid.cells[i];
            cell.revert_timer = Some(delay);
            cell.reverting = true;
            cell.revert_speed_mult = cfg.revert_speed_mult;
        }

        if next == Mode::Stable {
            for cell in self.grid.cells.iter_mut() {
                if cell.modified_by.is_some() {
                    cell.flutter_amp = cfg.forced_flutter_amp;
                    cell.flutter_freq = cell.base_freq;
                    if cell.color == BASE_COLOR {
                        cell.color = cfg.accent;
                    }
                }
            }
        }

        log::info!(
            "mode -> {} ({} cells reverting)",
            next.name(),
            batch.len()
        );
    }

    pub(crate) fn toggle_freeze(&mut self) {
        self.clock.toggle();
        log::info!("freeze -> {}", self.clock.frozen());
    }

    pub(crate) fn force_freeze(&mut self) {
        self.clock.set_frozen(true);
    }

    /// Unconditionally restore every cell to base, whatever is pending.
    pub(crate) fn reset_grid(&mut self) {
        for cell in self.grid.cells.iter_mut() {
            cell.reset_to_base();
        }
        log::info!("grid reset");
    }
}
