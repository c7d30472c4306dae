use crate::config::{ModeConfig, GRID_SIZE};

/// Per-mode sequence of maximum flip angles indexed by horizontal distance
/// from the active column. Non-empty and non-increasing; its length minus one
/// is the mode's horizontal influence radius.
pub(crate) struct AttenuationProfile {
    values: Vec<f32>,
}

impl AttenuationProfile {
    /// Longest run starting at `start_angle` where each next value is
    /// round(prev * decay_factor), clamped at zero, stopping below
    /// `min_angle` or at the grid half-extent. Always keeps the head value,
    /// so a floor above the first product still yields a singleton.
    pub(crate) fn build(cfg: &ModeConfig) -> Self {
        let half_extent = GRID_SIZE / 2;
        let mut values = vec![cfg.start_angle];
        let mut prev = cfg.start_angle;
        while values.len() < half_extent {
            let next = (prev * cfg.decay_factor).round().max(0.0);
            if next < cfg.min_angle {
                break;
            }
            values.push(next);
            prev = next;
        }
        Self { values }
    }

    #[inline]
    pub(crate) fn radius(&self) -> usize {
        self.values.len() - 1
    }

    /// Max flip angle at a horizontal distance; zero beyond the radius.
    #[inline]
    pub(crate) fn value_at(&self, distance: usize) -> f32 {
        self.values.get(distance).copied().unwrap_or(0.0)
    }

    /// The distance-0 value.
    #[inline]
    pub(crate) fn peak(&self) -> f32 {
        self.values[0]
    }
}
