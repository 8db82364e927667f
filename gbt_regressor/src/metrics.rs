//! Regression error metrics.

use crate::error::GbtError;

fn check_lengths(y_true: &[f64], y_pred: &[f64]) -> Result<(), GbtError> {
    if y_true.len() != y_pred.len() {
        return Err(GbtError::MetricLengthMismatch {
            y_true: y_true.len(),
            y_pred: y_pred.len(),
        });
    }
    if y_true.is_empty() {
        return Err(GbtError::EmptyMetricInput);
    }
    Ok(())
}

/// Root mean squared error between actual and predicted values.
pub fn rmse(y_true: &[f64], y_pred: &[f64]) -> Result<f64, GbtError> {
    check_lengths(y_true, y_pred)?;
    Ok(root_mean_squared(y_true, y_pred))
}

/// Mean absolute error between actual and predicted values.
pub fn mae(y_true: &[f64], y_pred: &[f64]) -> Result<f64, GbtError> {
    check_lengths(y_true, y_pred)?;
    let total: f64 = y_true
        .iter()
        .zip(y_pred)
        .map(|(t, p)| (t - p).abs())
        .sum();
    Ok(total / y_true.len() as f64)
}

/// Caller guarantees equal, non-zero lengths.
pub(crate) fn root_mean_squared(y_true: &[f64], y_pred: &[f64]) -> f64 {
    let sum_sq: f64 = y_true
        .iter()
        .zip(y_pred)
        .map(|(t, p)| (t - p) * (t - p))
        .sum();
    (sum_sq / y_true.len() as f64).sqrt()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rmse_known_values() {
        let score = rmse(&[10.0, 20.0, 30.0], &[12.0, 18.0, 33.0]).unwrap();
        // squared errors 4 + 4 + 9 over three samples
        assert!((score - (17.0f64 / 3.0).sqrt()).abs() < 1e-12);
        assert!((score - 2.3805).abs() < 1e-4);
    }

    #[test]
    fn test_rmse_perfect_prediction_is_zero() {
        let y = [1.5, -2.0, 7.25];
        assert_eq!(rmse(&y, &y).unwrap(), 0.0);
    }

    #[test]
    fn test_mae_known_values() {
        let score = mae(&[10.0, 20.0, 30.0], &[12.0, 18.0, 33.0]).unwrap();
        assert!((score - 7.0 / 3.0).abs() < 1e-12);
    }

    #[test]
    fn test_length_mismatch() {
        let err = rmse(&[1.0, 2.0], &[1.0]).unwrap_err();
        assert!(matches!(
            err,
            GbtError::MetricLengthMismatch { y_true: 2, y_pred: 1 }
        ));
    }

    #[test]
    fn test_empty_input() {
        assert!(matches!(
            mae(&[], &[]).unwrap_err(),
            GbtError::EmptyMetricInput
        ));
    }
}
