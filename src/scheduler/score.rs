//! Adherence metrics.
//!
//! Quality indicators for one medication's placed doses. The adherence
//! score rewards satisfying every constraint with the least displacement
//! from the prescribed times.
//!
//! # Metrics
//!
//! | Metric | Definition |
//! |--------|-----------|
//! | Unresolved ratio | Unresolved doses / total doses |
//! | Avg abs shift | Mean circular distance original → adjusted |
//! | Max abs shift | Largest single displacement |
//! | Score | `1 - (w_u * unresolved_ratio + w_s * min(avg_shift / N, 1))` |

use std::collections::BTreeMap;

use crate::config::ScoreWeights;
use crate::models::{AdaptationType, Minute, OptimizedDose};

/// Adherence indicators for a set of doses.
#[derive(Debug, Clone)]
pub struct AdherenceKpi {
    /// Number of doses.
    pub total_doses: usize,
    /// Doses left unresolved.
    pub unresolved_doses: usize,
    /// Fraction unresolved (0.0..1.0).
    pub unresolved_ratio: f64,
    /// Mean absolute displacement (minutes).
    pub avg_abs_shift_minutes: f64,
    /// Largest absolute displacement (minutes).
    pub max_abs_shift_minutes: Minute,
    /// Adaptations recorded per type.
    pub adaptations_by_type: BTreeMap<AdaptationType, usize>,
    /// Adherence score in `[0, 1]`.
    pub score: f64,
}

impl AdherenceKpi {
    /// Computes the indicators. No doses scores 1.0.
    pub fn calculate(doses: &[OptimizedDose], weights: &ScoreWeights) -> Self {
        let total = doses.len();
        let unresolved = doses.iter().filter(|d| d.unresolved).count();

        let mut shift_sum: i64 = 0;
        let mut max_shift: Minute = 0;
        let mut adaptations_by_type = BTreeMap::new();
        for dose in doses {
            let shift = dose.displacement();
            shift_sum += i64::from(shift);
            max_shift = max_shift.max(shift);
            for adaptation in &dose.adaptations {
                *adaptations_by_type
                    .entry(adaptation.adaptation_type)
                    .or_insert(0) += 1;
            }
        }

        let (unresolved_ratio, avg_shift) = if total == 0 {
            (0.0, 0.0)
        } else {
            (
                unresolved as f64 / total as f64,
                shift_sum as f64 / total as f64,
            )
        };

        let shift_term = (avg_shift / weights.shift_normalization_minutes).min(1.0);
        let penalty = weights.unresolved_weight * unresolved_ratio + weights.shift_weight * shift_term;
        let score = (1.0 - penalty).clamp(0.0, 1.0);

        Self {
            total_doses: total,
            unresolved_doses: unresolved,
            unresolved_ratio,
            avg_abs_shift_minutes: avg_shift,
            max_abs_shift_minutes: max_shift,
            adaptations_by_type,
            score,
        }
    }

    /// Whether the doses meet the given quality thresholds.
    pub fn meets_thresholds(&self, max_shift: Minute, min_score: f64) -> bool {
        self.unresolved_doses == 0 && self.max_abs_shift_minutes <= max_shift && self.score >= min_score
    }
}
