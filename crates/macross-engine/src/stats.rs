//! Sample statistics over columns with undefined entries.
//!
//! Undefined (`None`) entries are skipped. Variance, standard deviation and
//! covariance use the sample convention (divide by n - 1) and are undefined
//! below two observations.

/// Defined entries of a column, in order.
pub fn defined(values: &[Option<f64>]) -> Vec<f64> {
    values.iter().flatten().copied().collect()
}

pub fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    Some(values.iter().sum::<f64>() / values.len() as f64)
}

pub fn sample_variance(values: &[f64]) -> Option<f64> {
    if values.len() < 2 {
        return None;
    }
    let m = mean(values)?;
    let ss = values.iter().map(|v| (v - m).powi(2)).sum::<f64>();
    Some(ss / (values.len() - 1) as f64)
}

pub fn sample_std(values: &[f64]) -> Option<f64> {
    sample_variance(values).map(f64::sqrt)
}

/// Sample covariance over the rows where both columns are defined.
pub fn sample_covariance(a: &[Option<f64>], b: &[Option<f64>]) -> Option<f64> {
    let (xs, ys): (Vec<f64>, Vec<f64>) = a
        .iter()
        .zip(b)
        .filter_map(|(x, y)| Some(((*x)?, (*y)?)))
        .unzip();
    if xs.len() < 2 {
        return None;
    }
    let mx = mean(&xs)?;
    let my = mean(&ys)?;
    let sum = xs
        .iter()
        .zip(&ys)
        .map(|(x, y)| (x - mx) * (y - my))
        .sum::<f64>();
    Some(sum / (xs.len() - 1) as f64)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mean_skips_undefined() {
        let col = [None, Some(1.0), Some(3.0), None];
        assert_eq!(mean(&defined(&col)), Some(2.0));
        assert_eq!(mean(&[]), None);
    }

    #[test]
    fn test_sample_not_population() {
        let values = [2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0];
        // Population variance is 4.0; sample variance is 32/7.
        assert!((sample_variance(&values).unwrap() - 32.0 / 7.0).abs() < 1e-12);
        assert!((sample_std(&values).unwrap() - (32.0f64 / 7.0).sqrt()).abs() < 1e-12);
    }

    #[test]
    fn test_too_few_observations() {
        assert_eq!(sample_variance(&[1.0]), None);
        assert_eq!(sample_std(&[]), None);
        assert_eq!(sample_covariance(&[Some(1.0), None], &[Some(2.0), Some(3.0)]), None);
    }

    #[test]
    fn test_covariance_uses_pairwise_rows() {
        let a = [None, Some(1.0), Some(2.0), Some(3.0)];
        let b = [Some(9.0), None, Some(4.0), Some(6.0)];
        // Pairs: (2, 4), (3, 6) -> cov = (-0.5 * -1 + 0.5 * 1) / 1 = 1.0
        assert!((sample_covariance(&a, &b).unwrap() - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_covariance_with_itself_is_variance() {
        let values = [0.01, -0.02, 0.015, 0.003, -0.007];
        let col: Vec<Option<f64>> = values.iter().copied().map(Some).collect();
        let cov = sample_covariance(&col, &col).unwrap();
        assert!((cov - sample_variance(&values).unwrap()).abs() < 1e-15);
    }
}
