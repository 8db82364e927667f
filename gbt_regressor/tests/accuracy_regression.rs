//! Accuracy checks guarding the boosting loop against regressions.

use gbt_regressor::{rmse, BoosterConfig, EvalSet};

/// Deterministic smooth target over two informative features and one noise column.
fn make_regression(n: usize) -> (Vec<Vec<f64>>, Vec<f64>, Vec<String>) {
    let mut features = Vec::with_capacity(n);
    let mut targets = Vec::with_capacity(n);
    for i in 0..n {
        let a = (i % 97) as f64 / 97.0;
        let b = (i % 13) as f64;
        let noise = ((i * 7919) % 101) as f64 / 101.0;
        features.push(vec![a, b, noise]);
        targets.push(50.0 * a * a + 3.0 * b);
    }
    let names = vec!["a".to_string(), "b".to_string(), "noise".to_string()];
    (features, targets, names)
}

#[test]
fn holdout_rmse_beats_mean_baseline() {
    let (x, y, names) = make_regression(2000);
    let (x_train, x_test) = x.split_at(1600);
    let (y_train, y_test) = y.split_at(1600);

    let result = BoosterConfig::new(400)
        .with_max_depth(4)
        .with_learning_rate(0.1)
        .with_verbose_every(0)
        .fit(
            x_train,
            y_train,
            &names,
            &[EvalSet::new("test", x_test, y_test)],
        )
        .unwrap();

    let pred = result.model.predict_batch(x_test).unwrap();
    let model_rmse = rmse(y_test, &pred).unwrap();

    let mean = y_train.iter().sum::<f64>() / y_train.len() as f64;
    let baseline = rmse(y_test, &vec![mean; y_test.len()]).unwrap();

    assert!(
        model_rmse < baseline * 0.2,
        "model rmse {model_rmse} not well below baseline {baseline}"
    );
}

#[test]
fn noise_feature_ranks_last() {
    let (x, y, names) = make_regression(1000);
    let result = BoosterConfig::new(200)
        .with_learning_rate(0.2)
        .with_early_stopping_rounds(None)
        .with_verbose_every(0)
        .fit(&x, &y, &names, &[])
        .unwrap();

    let ranked = result.importances();
    assert_eq!(ranked.len(), 3);
    assert_eq!(ranked[2].name, "noise");
    let total: f64 = ranked.iter().map(|f| f.importance).sum();
    assert!((total - 1.0).abs() < 1e-9);
}
