use super::*;

#[test]
fn add_generates_unique_names() {
    let mut ctx = ExecutionContext::with_seed(1);
    let mut model = Sequential::new();
    model
        .add(Dense::new(4, 3, Activation::ReLU, ctx.rng()).unwrap())
        .add(Dense::new(3, 2, Activation::ReLU, ctx.rng()).unwrap())
        .add(Dense::new(2, 1, Activation::Sigmoid, ctx.rng()).unwrap());

    let names: Vec<&str> = model.layers().iter().map(|l| l.name()).collect();
    assert_eq!(names, ["dense", "dense_1", "dense_2"]);
    assert!(model.validate_architecture().is_ok());
}

#[test]
fn validate_architecture_rejects_width_mismatch_and_duplicates() {
    let mut ctx = ExecutionContext::with_seed(1);

    let mut mismatched = Sequential::new();
    mismatched
        .add(Dense::new(4, 3, Activation::ReLU, ctx.rng()).unwrap())
        .add(Dense::new(5, 1, Activation::Sigmoid, ctx.rng()).unwrap());
    assert!(matches!(
        mismatched.validate_architecture(),
        Err(ModelError::InputValidationError(_))
    ));

    let mut duplicated = Sequential::new();
    duplicated
        .add(Dense::new(4, 3, Activation::ReLU, ctx.rng()).unwrap().with_name("a"))
        .add(Dense::new(3, 1, Activation::Sigmoid, ctx.rng()).unwrap().with_name("a"));
    assert!(duplicated.validate_architecture().is_err());

    assert!(Sequential::new().validate_architecture().is_err());
}

#[test]
fn build_reference_model() {
    let mut ctx = ExecutionContext::with_seed(42);
    let model = Sequential::build(&ModelSpec::reference(), &mut ctx).unwrap();

    assert_eq!(model.input_dim(), 100);
    assert_eq!(model.output_dim(), 1);
    assert_eq!(model.count_params(), 3265);
    assert_eq!(model.spec(), ModelSpec::reference());
    assert!(model.training_config().is_none());
    assert_eq!(model.iterations(), 0);

    let summary = model.summary();
    assert!(summary.contains("main_input (Dense)"));
    assert!(summary.contains("dense_1 (Dense)"));
    assert!(summary.contains("Total params: 3265"));
}

#[test]
fn build_rejects_invalid_specs() {
    let mut ctx = ExecutionContext::with_seed(42);
    assert!(Sequential::build(&ModelSpec::new(10, vec![]), &mut ctx).is_err());
    assert!(
        Sequential::build(
            &ModelSpec::new(0, vec![LayerSpec::new(2, Activation::ReLU)]),
            &mut ctx
        )
        .is_err()
    );
    assert!(
        Sequential::build(
            &ModelSpec::new(
                4,
                vec![
                    LayerSpec::named(2, Activation::ReLU, "x"),
                    LayerSpec::named(1, Activation::Sigmoid, "x"),
                ]
            ),
            &mut ctx
        )
        .is_err()
    );
}

#[test]
fn compile_rejects_unknown_identifiers() {
    let mut model = fixed_model();
    let bad_optimizer = TrainingConfig {
        optimizer: "adamax".to_string(),
        ..TrainingConfig::default()
    };
    assert!(model.compile(&bad_optimizer).is_err());

    let bad_metric = TrainingConfig {
        metrics: vec!["auc".to_string()],
        ..TrainingConfig::default()
    };
    assert!(model.compile(&bad_metric).is_err());

    let zero_batch = TrainingConfig {
        batch_size: 0,
        ..TrainingConfig::default()
    };
    assert!(model.compile(&zero_batch).is_err());
    assert!(model.training_config().is_none());
}

#[test]
fn fit_requires_compile() {
    let mut model = fixed_model();
    let (x, y) = toy_data(4);
    let mut ctx = ExecutionContext::with_seed(0);
    assert_eq!(
        model.fit_with_batches(&x, &y, &mut ctx),
        Err(ModelError::NotFitted)
    );
}

#[test]
fn fit_validates_data_shapes() {
    let mut model = fixed_model();
    model.compile(&TrainingConfig::default()).unwrap();
    let mut ctx = ExecutionContext::with_seed(0);

    let (x, _) = toy_data(4);
    let (_, y) = toy_data(5);
    assert!(model.fit_with_batches(&x, &y, &mut ctx).is_err());

    let (x, y) = toy_data(4);
    let wide_y = Array::zeros((4, 2)).into_dyn();
    assert!(model.fit_with_batches(&x, &wide_y, &mut ctx).is_err());

    let narrow_x = Array::zeros((4, 3)).into_dyn();
    assert!(model.fit_with_batches(&narrow_x, &y, &mut ctx).is_err());
}

#[test]
fn fit_runs_one_step_per_batch() {
    let mut model = fixed_model();
    model
        .compile(&TrainingConfig {
            epochs: 2,
            batch_size: 4,
            ..TrainingConfig::default()
        })
        .unwrap();

    // 10 samples in batches of 4: 4 + 4 + 2
    let (x, y) = toy_data(10);
    let mut ctx = ExecutionContext::with_seed(0);
    let history = model.fit_with_batches(&x, &y, &mut ctx).unwrap();

    assert_eq!(history.len(), 2);
    assert_eq!(model.iterations(), 6);
    for (i, record) in history.epochs.iter().enumerate() {
        assert_eq!(record.epoch, i as u32 + 1);
        assert!(record.loss.is_finite() && record.loss >= 0.0);
        let accuracy = record.accuracy.unwrap();
        assert!((0.0..=1.0).contains(&accuracy));
    }
}

#[test]
fn oversized_batch_is_clamped() {
    let mut model = fixed_model();
    model
        .compile(&TrainingConfig {
            epochs: 3,
            batch_size: 64,
            ..TrainingConfig::default()
        })
        .unwrap();

    let (x, y) = toy_data(5);
    let mut ctx = ExecutionContext::with_seed(0);
    let history = model.fit_with_batches(&x, &y, &mut ctx).unwrap();
    assert_eq!(history.len(), 3);
    assert_eq!(model.iterations(), 3);
}

#[test]
fn accuracy_not_tracked_without_metric() {
    let mut model = fixed_model();
    model
        .compile(&TrainingConfig {
            metrics: vec![],
            epochs: 1,
            ..TrainingConfig::default()
        })
        .unwrap();

    let (x, y) = toy_data(6);
    let mut ctx = ExecutionContext::with_seed(0);
    let history = model.fit_with_batches(&x, &y, &mut ctx).unwrap();
    assert!(history.epochs.iter().all(|record| record.accuracy.is_none()));
    assert_eq!(model.evaluate(&x, &y).unwrap().accuracy, None);
}

#[test]
fn predict_matches_hand_computation() {
    let mut model = fixed_model();
    let x = array![[1.0, 2.0]].into_dyn();
    let out = model.predict(&x).unwrap();

    // hidden = relu([1.1, 1.0]); output = sigmoid(1.1 - 0.5 + 0.2)
    assert_eq!(out.shape(), &[1, 1]);
    assert_relative_eq!(out[[0, 0]], 0.68997448, epsilon = 1e-6);
    assert!(model.predict(&Array::zeros((0, 2)).into_dyn()).is_err());
}

#[test]
fn evaluate_does_not_update_weights() {
    let mut model = fixed_model();
    model.compile(&TrainingConfig::default()).unwrap();
    let (x, y) = toy_data(8);

    let before = model.predict(&x).unwrap();
    let evaluation = model.evaluate(&x, &y).unwrap();
    let after = model.predict(&x).unwrap();

    assert_eq!(before, after);
    assert!(evaluation.loss.is_finite());
    assert!((0.0..=1.0).contains(&evaluation.accuracy.unwrap()));
    assert_eq!(model.iterations(), 0);
}

#[test]
fn trace_reference_model() {
    let mut ctx = ExecutionContext::with_seed(42);
    let model = Sequential::build(&ModelSpec::reference(), &mut ctx).unwrap();
    let graph = model.trace().unwrap();

    assert_eq!(graph.op_count(), 10);
    assert_eq!(graph.variables.len(), 4);
    assert_eq!(graph.input_name, "main_input_input");
    assert_eq!(graph.input_dim, 100);
    assert_eq!(graph.output_name, "dense_1/Sigmoid:0");
    assert_eq!(graph.output_dim, 1);
    assert!(Sequential::new().trace().is_err());
}
