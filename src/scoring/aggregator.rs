use super::{MAX_SCORE, MIN_SCORE, ScoreCategory, ScoreVector};

/// Fixed-point scale in ten-thousandths. Catalog validation rejects deltas
/// with more than four decimals, so conversion is exact.
pub const DELTA_SCALE: i64 = 10_000;

/// Units of the fixed-point scale per tenth of a score point
const PER_TENTH: i64 = DELTA_SCALE / 10;

pub(crate) fn to_fixed(value: f64) -> i64 {
    (value * DELTA_SCALE as f64).round() as i64
}

/// Whether a delta is representable on the fixed-point scale without rounding.
pub fn is_exact_delta(value: f64) -> bool {
    value.is_finite() && ((value * DELTA_SCALE as f64) - to_fixed(value) as f64).abs() < 1e-6
}

/// Sums per-item score deltas onto a baseline.
///
/// Deltas are summed as exact fixed-point integers, so the summation order
/// never changes the result; each category then goes through the same single
/// clamp-to-[1,10] and round-to-one-decimal step.
pub struct DeltaAggregator;

impl DeltaAggregator {
    pub fn aggregate<'a, I>(baseline: &ScoreVector, deltas: I) -> ScoreVector
    where
        I: IntoIterator<Item = &'a ScoreVector>,
    {
        let mut totals = [0i64; ScoreCategory::ALL.len()];
        for delta in deltas {
            for (i, category) in ScoreCategory::ALL.iter().enumerate() {
                totals[i] += to_fixed(delta.get(*category));
            }
        }

        let mut result = ScoreVector::default();
        for (i, category) in ScoreCategory::ALL.iter().enumerate() {
            let raw = to_fixed(baseline.get(*category)) + totals[i];
            result.set(*category, Self::clamp_and_round(raw));
        }
        result
    }

    /// Clamp a fixed-point score into range and round half-up to one decimal.
    fn clamp_and_round(raw: i64) -> f64 {
        let clamped = raw.clamp(to_fixed(MIN_SCORE), to_fixed(MAX_SCORE));
        // clamped is positive, so integer division rounds toward the half-up result
        let tenths = (clamped + PER_TENTH / 2) / PER_TENTH;
        tenths as f64 / 10.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn delta(power: f64, grip: f64) -> ScoreVector {
        ScoreVector {
            power_accel: power,
            grip_cornering: grip,
            ..Default::default()
        }
    }

    #[test]
    fn test_no_deltas_is_identity() {
        let baseline = ScoreVector::uniform(6.0);
        let result = DeltaAggregator::aggregate(&baseline, std::iter::empty());
        assert_eq!(result, baseline);
    }

    #[test]
    fn test_deltas_sum_onto_baseline() {
        let baseline = ScoreVector::uniform(5.0);
        let deltas = [delta(1.5, 0.5), delta(0.25, -1.0)];
        let result = DeltaAggregator::aggregate(&baseline, deltas.iter());
        // 5 + 1.75 = 6.75 -> 6.8
        assert_eq!(result.power_accel, 6.8);
        assert_eq!(result.grip_cornering, 4.5);
        assert_eq!(result.braking, 5.0);
    }

    #[test]
    fn test_result_is_clamped() {
        let baseline = ScoreVector::uniform(9.0);
        let deltas = [delta(3.0, -2.0), delta(2.0, -9.0)];
        let result = DeltaAggregator::aggregate(&baseline, deltas.iter());
        assert_eq!(result.power_accel, 10.0);
        assert_eq!(result.grip_cornering, 1.0);
    }

    #[test]
    fn test_float_noise_does_not_leak() {
        let baseline = ScoreVector::uniform(5.0);
        let deltas = [delta(0.1, 0.0), delta(0.2, 0.0)];
        let result = DeltaAggregator::aggregate(&baseline, deltas.iter());
        assert_eq!(result.power_accel, 5.3);
    }

    #[test]
    fn test_sub_hundredth_deltas_are_not_truncated() {
        let baseline = ScoreVector::uniform(5.0);
        let deltas = [delta(0.0125, 0.0); 4];
        let result = DeltaAggregator::aggregate(&baseline, deltas.iter());
        // exactly 5.05, rounds half-up
        assert_eq!(result.power_accel, 5.1);
    }

    #[test]
    fn test_exact_delta_check() {
        assert!(is_exact_delta(0.25));
        assert!(is_exact_delta(-1.0125));
        assert!(!is_exact_delta(0.00001));
        assert!(!is_exact_delta(f64::NAN));
    }

    fn arb_delta() -> impl Strategy<Value = ScoreVector> {
        prop::array::uniform7(-200i32..=500).prop_map(|values| {
            let mut vector = ScoreVector::default();
            for (category, v) in ScoreCategory::ALL.iter().zip(values) {
                vector.set(*category, v as f64 / 100.0);
            }
            vector
        })
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(200))]

        #[test]
        fn prop_summation_order_does_not_matter(
            base in 1.0f64..=10.0,
            deltas in prop::collection::vec(arb_delta(), 0..12),
        ) {
            let baseline = ScoreVector::uniform((base * 10.0).round() / 10.0);
            let forward = DeltaAggregator::aggregate(&baseline, deltas.iter());
            let backward = DeltaAggregator::aggregate(&baseline, deltas.iter().rev());
            prop_assert_eq!(forward, backward);
        }

        #[test]
        fn prop_scores_stay_in_bounds(
            base in 1.0f64..=10.0,
            deltas in prop::collection::vec(arb_delta(), 0..12),
        ) {
            let baseline = ScoreVector::uniform(base);
            let result = DeltaAggregator::aggregate(&baseline, deltas.iter());
            for (_, score) in result.iter() {
                prop_assert!((MIN_SCORE..=MAX_SCORE).contains(&score));
            }
        }
    }
}
