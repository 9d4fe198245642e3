/// Computes the arithmetic mean of a slice of values. Returns 0.0 for empty input.
pub fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

/// Mean of the present values only, `None` when no value is present.
/// A missing value never shifts the mean toward zero.
pub fn mean_defined(values: impl Iterator<Item = Option<f64>>) -> Option<f64> {
    let present: Vec<f64> = values.flatten().collect();
    if present.is_empty() {
        None
    } else {
        Some(mean(&present))
    }
}

/// Rounds to one decimal place, half away from zero.
pub fn round1(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mean_empty() {
        assert_eq!(mean(&[]), 0.0);
    }

    #[test]
    fn test_mean_defined_skips_missing_values() {
        let values = [Some(10.0), None, Some(20.0)];
        assert_eq!(mean_defined(values.into_iter()), Some(15.0));
    }

    #[test]
    fn test_mean_defined_all_missing() {
        let values = [None, None];
        assert_eq!(mean_defined(values.into_iter()), None);
    }

    #[test]
    fn test_mean_exclusion_delta() {
        // Dropping one present value changes the mean by the expected
        // delta for N-1 values, not by a shift toward zero.
        let with = mean_defined([Some(12.0), Some(18.0), Some(30.0)].into_iter()).unwrap();
        let without = mean_defined([Some(12.0), Some(18.0)].into_iter()).unwrap();
        assert_eq!(with, 20.0);
        assert_eq!(without, 15.0);
    }

    #[test]
    fn test_round1() {
        assert_eq!(round1(17.249), 17.2);
        assert_eq!(round1(17.25), 17.3);
        assert_eq!(round1(-2.35), -2.4);
    }
}
