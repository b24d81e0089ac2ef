//! Helix / threading mask
//!
//! Real turning removes material in a helical ribbon proportional to feed
//! per revolution. The mask approximates that: each axial position is
//! engaged by the cutting edge only for a duty-cycle fraction of every
//! revolution, producing a plausible thread pattern without simulating
//! exact edge geometry. With no feed or no rotation there is no helix and
//! every column is eligible (facing and plunge cuts).

use lathetrainer_core::{FeedRate, HelixConfig};

/// Per-column cut eligibility for one tick.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum HelixMask {
    /// Continuous cut: every column is eligible.
    AllowAll,
    /// Threaded cut with a computed pitch.
    Pitched {
        /// Pitch in mm per revolution.
        pitch_mm: f32,
        /// Engaged fraction of one revolution.
        duty_cycle: f32,
        /// Current rotational phase of the stock, [0, 1).
        phase: f32,
    },
}

impl HelixMask {
    /// Compute the mask for the current feed, RPM and spindle phase.
    pub fn compute(cfg: &HelixConfig, feed: FeedRate, rpm: f32, phase: f32) -> Self {
        if !cfg.enabled || feed.is_zero() || rpm <= 1e-4 {
            return Self::AllowAll;
        }
        let pitch_mm = (feed.mm_per_min() / rpm).max(cfg.min_pitch_mm_per_rev);
        Self::Pitched {
            pitch_mm,
            duty_cycle: cfg.duty_cycle,
            phase: phase.rem_euclid(1.0),
        }
    }

    /// Whether a column at the given axial position may be cut this tick.
    pub fn allows(&self, x_mm: f32) -> bool {
        match *self {
            Self::AllowAll => true,
            Self::Pitched {
                pitch_mm,
                duty_cycle,
                phase,
            } => {
                let column_phase = (x_mm / pitch_mm + phase).rem_euclid(1.0);
                column_phase <= duty_cycle
            }
        }
    }

    /// The computed pitch, `None` for a continuous cut.
    pub fn pitch_mm(&self) -> Option<f32> {
        match *self {
            Self::AllowAll => None,
            Self::Pitched { pitch_mm, .. } => Some(pitch_mm),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zero_feed_allows_all() {
        let cfg = HelixConfig::default();
        let mask = HelixMask::compute(&cfg, FeedRate::from_mm_per_sec(0.0), 1200.0, 0.0);
        assert_eq!(mask, HelixMask::AllowAll);
        assert!(mask.allows(12.3));
    }

    #[test]
    fn test_zero_rpm_allows_all() {
        let cfg = HelixConfig::default();
        let mask = HelixMask::compute(&cfg, FeedRate::from_mm_per_sec(2.0), 0.0, 0.0);
        assert_eq!(mask, HelixMask::AllowAll);
    }

    #[test]
    fn test_disabled_allows_all() {
        let cfg = HelixConfig {
            enabled: false,
            ..Default::default()
        };
        let mask = HelixMask::compute(&cfg, FeedRate::from_mm_per_sec(2.0), 1200.0, 0.0);
        assert_eq!(mask, HelixMask::AllowAll);
    }

    #[test]
    fn test_pitch_from_feed_per_rev() {
        let cfg = HelixConfig::default();
        // 120 mm/min at 1200 rpm = 0.1 mm/rev
        let mask = HelixMask::compute(&cfg, FeedRate::from_mm_per_min(120.0), 1200.0, 0.0);
        let pitch = mask.pitch_mm().unwrap();
        assert!((pitch - 0.1).abs() < 1e-6);
    }

    #[test]
    fn test_pitch_floor_at_tiny_feed() {
        let cfg = HelixConfig::default();
        let mask = HelixMask::compute(&cfg, FeedRate::from_mm_per_min(0.001), 10_000.0, 0.0);
        assert_eq!(mask.pitch_mm(), Some(cfg.min_pitch_mm_per_rev));
    }

    #[test]
    fn test_duty_cycle_fraction() {
        // Sweep the phase over one full revolution at a fixed axial
        // position: the eligible fraction should track the duty cycle.
        let cfg = HelixConfig {
            duty_cycle: 0.2,
            ..Default::default()
        };
        let samples = 1000;
        let mut eligible = 0;
        for i in 0..samples {
            let phase = i as f32 / samples as f32;
            let mask = HelixMask::compute(&cfg, FeedRate::from_mm_per_min(120.0), 1200.0, phase);
            if mask.allows(5.0) {
                eligible += 1;
            }
        }
        let fraction = eligible as f32 / samples as f32;
        assert!(
            (fraction - 0.2).abs() < 0.01,
            "eligible fraction {} should approximate the duty cycle",
            fraction
        );
    }
}
