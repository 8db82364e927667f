//! Chronological train/test partitioning.

use polars::prelude::DataFrame;

use crate::error::ForecastError;

/// Number of leading rows that go to training: floor(n * fraction).
pub fn split_index(n: usize, fraction: f64) -> usize {
    ((n as f64) * fraction).floor() as usize
}

/// Chronological split. Rows are never shuffled; the training frame is the
/// leading prefix and the test frame is everything after it.
pub fn train_test_split(
    df: &DataFrame,
    fraction: f64,
) -> Result<(DataFrame, DataFrame), ForecastError> {
    if !(0.0..=1.0).contains(&fraction) {
        return Err(ForecastError::InvalidTrainFraction { fraction });
    }
    let n = df.height();
    let cut = split_index(n, fraction).min(n);
    let train = df.slice(0, cut);
    let test = df.slice(cut as i64, n - cut);
    Ok((train, test))
}

#[cfg(test)]
mod tests {
    use super::*;
    use polars::prelude::*;

    fn indexed(n: usize) -> DataFrame {
        let idx: Vec<i64> = (0..n as i64).collect();
        DataFrame::new(vec![Series::new("idx".into(), idx)]).unwrap()
    }

    fn indices(df: &DataFrame) -> Vec<i64> {
        df.column("idx")
            .unwrap()
            .i64()
            .unwrap()
            .into_iter()
            .map(|v| v.unwrap())
            .collect()
    }

    #[test]
    fn test_hundred_rows() {
        let (train, test) = train_test_split(&indexed(100), 0.8).unwrap();
        assert_eq!(indices(&train), (0..80).collect::<Vec<_>>());
        assert_eq!(indices(&test), (80..100).collect::<Vec<_>>());
    }

    #[test]
    fn test_partition_covers_table_in_order() {
        for n in [0usize, 1, 2, 3, 7, 10, 49, 101, 1000] {
            let (train, test) = train_test_split(&indexed(n), 0.8).unwrap();
            assert_eq!(train.height(), split_index(n, 0.8));
            assert_eq!(train.height() + test.height(), n);

            let mut all = indices(&train);
            all.extend(indices(&test));
            assert_eq!(all, (0..n as i64).collect::<Vec<_>>());
        }
    }

    #[test]
    fn test_extreme_fractions() {
        let (train, test) = train_test_split(&indexed(10), 0.0).unwrap();
        assert_eq!((train.height(), test.height()), (0, 10));
        let (train, test) = train_test_split(&indexed(10), 1.0).unwrap();
        assert_eq!((train.height(), test.height()), (10, 0));
    }

    #[test]
    fn test_rejects_bad_fraction() {
        for f in [-0.1, 1.5, f64::NAN] {
            assert!(matches!(
                train_test_split(&indexed(10), f),
                Err(ForecastError::InvalidTrainFraction { .. })
            ));
        }
    }
}
