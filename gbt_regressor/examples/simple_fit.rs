use gbt_regressor::{rmse, BoosterConfig, EvalSet};

fn main() {
    // One synthetic week of half-hourly demand: a daily cycle on a 25 GW base.
    let mut features = vec![];
    let mut targets = vec![];
    for i in 0..(48 * 7) {
        let hour = (i % 48) as f64 / 2.0;
        let angle = 2.0 * std::f64::consts::PI * hour / 24.0;
        features.push(vec![angle.sin(), angle.cos()]);
        targets.push(25000.0 - 5000.0 * angle.cos());
    }
    let names = vec!["hour_sin".to_string(), "hour_cos".to_string()];

    let split = features.len() * 8 / 10;
    let (x_train, x_test) = features.split_at(split);
    let (y_train, y_test) = targets.split_at(split);

    let result = BoosterConfig::new(500)
        .with_learning_rate(0.1)
        .with_early_stopping_rounds(Some(20))
        .fit(
            x_train,
            y_train,
            &names,
            &[
                EvalSet::new("train", x_train, y_train),
                EvalSet::new("test", x_test, y_test),
            ],
        )
        .expect("training failed");

    let predictions = result.model.predict_batch(x_test).expect("prediction failed");
    let score = rmse(y_test, &predictions).expect("rmse failed");

    println!("Gradient Boosting Example");
    println!("=========================");
    println!("Rounds trained: {}", result.rounds_trained);
    println!("Best iteration: {:?}", result.best_iteration);
    println!("Trees kept: {}", result.model.n_trees());
    println!("RMSE on the test set: {:.2}", score);
    println!();
    println!("Feature importance:");
    for feature in result.importances() {
        println!("  {}. {}: {:.3}", feature.rank, feature.name, feature.importance);
    }
}
