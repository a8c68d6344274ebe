//! Online normalized least-mean-squares learner.
//!
//! Two weights (price momentum, volume-normalized OBV slope) adapt once per
//! bar from the forecast error observed a full prediction horizon earlier.
//! The step size is normalized by the feature energy so a violent input
//! cannot blow the weights up, and both weights are floored so neither
//! signal can be silenced entirely.

pub const PREDICTION_HORIZON: usize = 15;
pub const LOOKBACK_WINDOW: usize = 30;
pub const FEATURE_STORE_CAPACITY: usize = 64;

const BASE_LEARNING_RATE: f64 = 0.1;
const NORMALIZATION_EPSILON: f64 = 1e-6;
const WEIGHT_FLOOR: f64 = 0.1;
const MOMENTUM_SEED_SCALE: f64 = 1.2;
const OBV_SEED: f64 = 0.2;

/// Feature snapshot captured at one bar, replayed when its horizon elapses.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct FeatureVector {
    /// Smoothed price slope per minute over the effective lookback.
    pub slope: f64,
    /// OBV change per minute, normalized by the volume moving average.
    pub obv_slope: f64,
}

/// The two adaptive weights of the forecast model.
#[derive(Debug, Clone)]
pub struct AdaptiveWeights {
    pub momentum: f64,
    pub obv: f64,
}

impl AdaptiveWeights {
    pub fn new(momentum_weight: f64) -> Self {
        Self {
            momentum: momentum_weight * MOMENTUM_SEED_SCALE,
            obv: OBV_SEED,
        }
    }

    /// Expected price change over the prediction horizon for these features.
    pub fn predict_delta(&self, features: &FeatureVector) -> f64 {
        self.momentum * features.slope * PREDICTION_HORIZON as f64
            + self.obv * features.obv_slope
    }

    /// One NLMS step against the realized change; returns the forecast error.
    pub fn update(&mut self, past: &FeatureVector, actual_change: f64) -> f64 {
        let error = actual_change - self.predict_delta(past);
        let energy = past.slope * past.slope + past.obv_slope * past.obv_slope;
        let step = BASE_LEARNING_RATE / (NORMALIZATION_EPSILON + energy);

        self.momentum += step * error * past.slope;
        self.obv += step * error * past.obv_slope;

        if self.momentum < WEIGHT_FLOOR {
            self.momentum = WEIGHT_FLOOR;
        }
        if self.obv < WEIGHT_FLOOR {
            self.obv = WEIGHT_FLOOR;
        }
        error
    }
}

/// Fixed-capacity ring of feature snapshots keyed by bar index.
///
/// Capacity comfortably exceeds the prediction horizon plus lookback, so a
/// snapshot is always still present when its delayed update comes due. A
/// lookup for an evicted or never-stored index returns `None`.
#[derive(Debug)]
pub struct FeatureStore {
    slots: Vec<Option<(usize, FeatureVector)>>,
}

impl Default for FeatureStore {
    fn default() -> Self {
        Self::new(FEATURE_STORE_CAPACITY)
    }
}

impl FeatureStore {
    pub fn new(capacity: usize) -> Self {
        Self {
            slots: vec![None; capacity],
        }
    }

    pub fn insert(&mut self, index: usize, features: FeatureVector) {
        let slot = index % self.slots.len();
        self.slots[slot] = Some((index, features));
    }

    pub fn get(&self, index: usize) -> Option<FeatureVector> {
        match self.slots[index % self.slots.len()] {
            Some((stored, features)) if stored == index => Some(features),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::SeededRandom;

    #[test]
    fn seeds_scale_momentum_and_fix_obv() {
        let w = AdaptiveWeights::new(1.5);
        assert!((w.momentum - 1.8).abs() < 1e-12);
        assert_eq!(w.obv, 0.2);
    }

    #[test]
    fn update_moves_prediction_toward_target() {
        let mut w = AdaptiveWeights::new(1.0);
        let f = FeatureVector {
            slope: 0.01,
            obv_slope: 0.5,
        };
        let before = (0.30 - w.predict_delta(&f)).abs();
        w.update(&f, 0.30);
        let after = (0.30 - w.predict_delta(&f)).abs();
        assert!(after < before);
    }

    #[test]
    fn weights_never_drop_below_floor() {
        let mut w = AdaptiveWeights::new(1.0);
        let mut rng = SeededRandom::new("floor-test");
        for _ in 0..2_000 {
            let f = FeatureVector {
                slope: rng.range(-0.05, 0.05),
                obv_slope: rng.range(-2.0, 2.0),
            };
            w.update(&f, rng.range(-1.0, 1.0));
            assert!(w.momentum >= 0.1);
            assert!(w.obv >= 0.1);
        }
    }

    #[test]
    fn zero_energy_features_are_harmless() {
        let mut w = AdaptiveWeights::new(1.0);
        let before = (w.momentum, w.obv);
        w.update(&FeatureVector::default(), 5.0);
        assert_eq!((w.momentum, w.obv), before);
    }

    #[test]
    fn store_returns_only_the_stored_index() {
        let mut store = FeatureStore::new(8);
        let f = FeatureVector {
            slope: 0.5,
            obv_slope: -0.1,
        };
        store.insert(3, f);
        assert_eq!(store.get(3), Some(f));
        assert_eq!(store.get(11), None);

        // Overwriting the slot evicts the old index.
        store.insert(11, FeatureVector::default());
        assert_eq!(store.get(3), None);
        assert_eq!(store.get(11), Some(FeatureVector::default()));
    }

    #[test]
    fn horizon_old_entries_survive_a_full_session() {
        let mut store = FeatureStore::default();
        for i in 0..391 {
            store.insert(
                i,
                FeatureVector {
                    slope: i as f64,
                    obv_slope: 0.0,
                },
            );
            if i >= PREDICTION_HORIZON {
                let past = store.get(i - PREDICTION_HORIZON).unwrap();
                assert_eq!(past.slope, (i - PREDICTION_HORIZON) as f64);
            }
        }
    }
}
