use super::*;

#[test]
fn rmsprop_defaults() {
    let rmsprop = RMSprop::default();
    assert_relative_eq!(rmsprop.learning_rate(), 0.001);
    assert_relative_eq!(rmsprop.rho(), 0.9);
    assert_relative_eq!(rmsprop.epsilon(), 1e-7);
    assert_eq!(rmsprop.identifier(), "rmsprop");
}

#[test]
fn rmsprop_rejects_invalid_hyperparameters() {
    assert!(RMSprop::new(0.0, 0.9, 1e-7).is_err());
    assert!(RMSprop::new(0.001, 1.0, 1e-7).is_err());
    assert!(RMSprop::new(0.001, -0.1, 1e-7).is_err());
    assert!(RMSprop::new(0.001, 0.9, 0.0).is_err());
    assert!(RMSprop::new(f32::NAN, 0.9, 1e-7).is_err());
    assert!(RMSprop::new(0.01, 0.0, 1e-8).is_ok());
}

#[test]
fn rmsprop_single_step() {
    let mut param = array![[1.0, -1.0]];
    let grad = array![[0.1, -0.2]];
    let mut cache = Array2::zeros((1, 2));

    RMSpropCache::update_param(&mut param, &grad, &mut cache, 0.9, 0.001, 1e-7);

    // v = 0.1 * g^2, step = lr * g / sqrt(v) = lr * sign(g) / sqrt(0.1)
    assert_relative_eq!(cache[[0, 0]], 0.001, epsilon = 1e-9);
    assert_relative_eq!(cache[[0, 1]], 0.004, epsilon = 1e-9);
    assert_relative_eq!(param[[0, 0]], 1.0 - 0.0031622776, epsilon = 1e-6);
    assert_relative_eq!(param[[0, 1]], -1.0 + 0.0031622776, epsilon = 1e-6);
}

#[test]
fn rmsprop_parallel_and_sequential_paths_agree() {
    let grad = Array2::from_shape_fn((64, 32), |(i, j)| ((i * 32 + j) as f32).sin());
    let mut large = Array2::<f32>::ones((64, 32));
    let mut large_cache = Array2::zeros((64, 32));
    RMSpropCache::update_param(&mut large, &grad, &mut large_cache, 0.9, 0.01, 1e-7);

    // row by row stays below the parallel threshold
    for (i, row) in grad.rows().into_iter().enumerate() {
        let mut param = Array2::<f32>::ones((1, 32));
        let mut cache = Array2::zeros((1, 32));
        let row_grad = row.to_owned().insert_axis(Axis(0));
        RMSpropCache::update_param(&mut param, &row_grad, &mut cache, 0.9, 0.01, 1e-7);
        for j in 0..32 {
            assert_relative_eq!(param[[0, j]], large[[i, j]]);
        }
    }
}

#[test]
fn sgd_validation_and_identifier() {
    assert!(SGD::new(-0.1).is_err());
    let sgd = SGD::new(0.05).unwrap();
    assert_relative_eq!(sgd.learning_rate(), 0.05);
    assert_eq!(sgd.identifier(), "sgd");
    assert_relative_eq!(SGD::default().learning_rate(), 0.01);
}

#[test]
fn optimizer_identifiers() {
    assert_eq!(
        optimizer_from_identifier("RMSprop").unwrap().identifier(),
        "rmsprop"
    );
    assert_eq!(optimizer_from_identifier("sgd").unwrap().identifier(), "sgd");
    assert!(matches!(
        optimizer_from_identifier("adamw"),
        Err(ModelError::InputValidationError(_))
    ));
}

#[test]
fn optimizer_config_rebuilds_optimizer() {
    let rmsprop = RMSprop::new(0.02, 0.95, 1e-6).unwrap();
    let rebuilt = rmsprop.config().build().unwrap();
    assert_eq!(rebuilt.identifier(), "rmsprop");
    assert_eq!(rebuilt.config(), rmsprop.config());

    assert_eq!(
        SGD::default().config(),
        OptimizerConfig::SGD {
            learning_rate: 0.01
        }
    );
    assert!(
        OptimizerConfig::SGD {
            learning_rate: 0.0
        }
        .build()
        .is_err()
    );
}
