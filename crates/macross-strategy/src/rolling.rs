/// Simple trailing mean over `window` values.
///
/// The first `window - 1` entries are `None` (insufficient history). A zero
/// window or a series shorter than the window yields all `None`.
///
/// The running sum is compensated so it does not drift over long series, and
/// a window holding one repeated value returns that value exactly.
pub fn rolling_mean(values: &[f64], window: usize) -> Vec<Option<f64>> {
    let n = values.len();
    let mut out = vec![None; n];
    if window == 0 || window > n {
        return out;
    }

    let mut sum = CompensatedSum::default();
    let mut run = 0usize;
    for i in 0..n {
        sum.add(values[i]);
        if i >= window {
            sum.add(-values[i - window]);
        }
        run = if i > 0 && values[i] == values[i - 1] { run + 1 } else { 1 };

        if i + 1 >= window {
            let mean = if run >= window {
                values[i]
            } else {
                sum.value() / window as f64
            };
            out[i] = Some(mean);
        }
    }
    out
}

/// Neumaier summation: carries the low-order bits lost by each addition.
#[derive(Debug, Default, Clone, Copy)]
struct CompensatedSum {
    sum: f64,
    comp: f64,
}

impl CompensatedSum {
    fn add(&mut self, x: f64) {
        let t = self.sum + x;
        if self.sum.abs() >= x.abs() {
            self.comp += (self.sum - t) + x;
        } else {
            self.comp += (x - t) + self.sum;
        }
        self.sum = t;
    }

    fn value(&self) -> f64 {
        self.sum + self.comp
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_warmup_is_undefined() {
        let out = rolling_mean(&[1.0, 2.0, 3.0, 4.0], 3);
        assert_eq!(out, vec![None, None, Some(2.0), Some(3.0)]);
    }

    #[test]
    fn test_window_one_is_identity() {
        let values = [5.0, 6.5, 7.0];
        let out = rolling_mean(&values, 1);
        assert_eq!(out, vec![Some(5.0), Some(6.5), Some(7.0)]);
    }

    #[test]
    fn test_short_series_all_undefined() {
        assert_eq!(rolling_mean(&[1.0, 2.0], 3), vec![None, None]);
        assert!(rolling_mean(&[], 3).is_empty());
        assert_eq!(rolling_mean(&[1.0], 0), vec![None]);
    }

    #[test]
    fn test_matches_direct_mean() {
        let values: Vec<f64> = (0..50).map(|i| 100.0 + (i as f64 * 0.7).sin() * 3.0).collect();
        let out = rolling_mean(&values, 7);
        for i in 6..values.len() {
            let direct = values[i - 6..=i].iter().sum::<f64>() / 7.0;
            assert!((out[i].unwrap() - direct).abs() < 1e-9);
        }
    }

    #[test]
    fn test_flat_series_is_exact() {
        for &value in &[0.1, 33.33, 100.1] {
            let values = vec![value; 400];
            for &window in &[2, 10, 50, 100, 150, 200] {
                let out = rolling_mean(&values, window);
                assert!(out[..window - 1].iter().all(Option::is_none));
                assert!(
                    out[window - 1..].iter().all(|m| *m == Some(value)),
                    "window {window} drifted on flat {value}"
                );
            }
        }
    }

    #[test]
    fn test_flat_run_after_movement_is_exact() {
        let mut values: Vec<f64> = (0..30).map(|i| 10.0 + i as f64 * 0.37).collect();
        values.extend(std::iter::repeat(33.33).take(40));
        let out = rolling_mean(&values, 20);
        assert!(out[49..].iter().all(|m| *m == Some(33.33)));
        assert_ne!(out[48], Some(33.33));
    }

    #[test]
    fn test_long_series_does_not_drift() {
        let values: Vec<f64> = (0..5000).map(|i| 1e6 + (i % 7) as f64 * 0.1).collect();
        let out = rolling_mean(&values, 30);
        let i = values.len() - 1;
        let direct = values[i - 29..=i].iter().sum::<f64>() / 30.0;
        assert!((out[i].unwrap() - direct).abs() < 1e-7);
    }
}
