use approx::assert_relative_eq;
use densex::prelude::*;
use ndarray::Array;

#[test]
fn reference_scenario_trains_for_ten_epochs() {
    let mut ctx = ExecutionContext::with_seed(42);
    let data = SyntheticDataset::generate(1000, 100, &mut ctx).unwrap();
    let (x, y) = data.to_tensors();

    let mut model = Sequential::build(&ModelSpec::reference(), &mut ctx).unwrap();
    model.compile(&TrainingConfig::default()).unwrap();
    let history = model.fit_with_batches(&x, &y, &mut ctx).unwrap();

    assert_eq!(history.len(), 10);
    // 1000 samples in batches of 32: 31 full batches and one of 8
    assert_eq!(model.iterations(), 10 * 32);
    for record in &history.epochs {
        assert!(record.loss.is_finite() && record.loss >= 0.0);
        let accuracy = record.accuracy.unwrap();
        assert!((0.0..=1.0).contains(&accuracy));
    }

    assert!(history.last().unwrap().accuracy.unwrap() > 0.5);
    let evaluation = model.evaluate(&x, &y).unwrap();
    assert!(evaluation.accuracy.unwrap() > 0.5);
}

#[test]
fn same_seed_reproduces_training() {
    let run = |seed: u64| {
        let mut ctx = ExecutionContext::with_seed(seed);
        let data = SyntheticDataset::generate(200, 100, &mut ctx).unwrap();
        let (x, y) = data.to_tensors();
        let mut model = Sequential::build(&ModelSpec::reference(), &mut ctx).unwrap();
        model
            .compile(&TrainingConfig {
                epochs: 3,
                ..TrainingConfig::default()
            })
            .unwrap();
        model.fit_with_batches(&x, &y, &mut ctx).unwrap()
    };

    let a = run(123);
    let b = run(123);
    for (ra, rb) in a.epochs.iter().zip(&b.epochs) {
        assert_relative_eq!(ra.loss, rb.loss);
        assert_eq!(ra.accuracy, rb.accuracy);
    }
}

#[test]
fn output_width_follows_last_layer() {
    let specs = [
        ModelSpec::reference(),
        ModelSpec::new(
            8,
            vec![
                LayerSpec::new(16, Activation::Tanh),
                LayerSpec::new(4, Activation::Softmax),
            ],
        ),
        ModelSpec::new(3, vec![LayerSpec::new(5, Activation::Linear)]),
    ];

    let mut ctx = ExecutionContext::with_seed(0);
    for spec in &specs {
        let mut model = Sequential::build(spec, &mut ctx).unwrap();
        let x = Array::ones((7, spec.input_dim)).into_dyn();
        let out = model.predict(&x).unwrap();
        assert_eq!(out.shape(), &[7, spec.output_dim().unwrap()]);
        assert_eq!(model.output_dim(), spec.output_dim().unwrap());
    }
}

#[test]
fn training_reduces_loss_on_learnable_data() {
    let x = Array::from_shape_fn((200, 2), |(i, j)| {
        (((i * 37 + j * 11) % 100) as f32) / 100.0
    });
    let y = Array::from_shape_fn((200, 1), |(i, _)| {
        if x[[i, 0]] > x[[i, 1]] { 1.0 } else { 0.0 }
    });

    let spec = ModelSpec::new(
        2,
        vec![
            LayerSpec::new(8, Activation::ReLU),
            LayerSpec::new(1, Activation::Sigmoid),
        ],
    );
    let mut ctx = ExecutionContext::with_seed(5);
    let mut model = Sequential::build(&spec, &mut ctx).unwrap();
    model
        .compile(&TrainingConfig {
            epochs: 30,
            batch_size: 16,
            ..TrainingConfig::default()
        })
        .unwrap();

    let history = model
        .fit_with_batches(&x.into_dyn(), &y.into_dyn(), &mut ctx)
        .unwrap();
    let losses = history.losses();
    assert!(losses.last().unwrap() < losses.first().unwrap());
}

#[test]
fn sgd_and_mse_are_supported() {
    let mut ctx = ExecutionContext::with_seed(8);
    let data = SyntheticDataset::generate(64, 10, &mut ctx).unwrap();
    let (x, y) = data.to_tensors();

    let spec = ModelSpec::new(10, vec![LayerSpec::new(1, Activation::Sigmoid)]);
    let mut model = Sequential::build(&spec, &mut ctx).unwrap();
    model
        .compile(&TrainingConfig {
            optimizer: "sgd".to_string(),
            loss: "mean_squared_error".to_string(),
            epochs: 2,
            shuffle: false,
            ..TrainingConfig::default()
        })
        .unwrap();

    let history = model.fit_with_batches(&x, &y, &mut ctx).unwrap();
    assert_eq!(history.len(), 2);
    assert_eq!(model.optimizer_identifier(), Some("sgd"));
}

#[test]
fn width_mismatch_fails_at_compile() {
    let mut ctx = ExecutionContext::with_seed(0);
    let mut model = Sequential::new();
    model
        .add(Dense::new(100, 32, Activation::ReLU, ctx.rng()).unwrap())
        .add(Dense::new(16, 1, Activation::Sigmoid, ctx.rng()).unwrap());

    assert!(matches!(
        model.compile(&TrainingConfig::default()),
        Err(ModelError::InputValidationError(_))
    ));
    assert!(model.training_config().is_none());
    let x = Array::ones((4, 100)).into_dyn();
    let y = Array::ones((4, 1)).into_dyn();
    assert!(matches!(
        model.fit_with_batches(&x, &y, &mut ctx),
        Err(ModelError::NotFitted)
    ));
}

#[test]
fn compile_with_custom_rmsprop_trains() {
    let mut ctx = ExecutionContext::with_seed(21);
    let data = SyntheticDataset::generate(128, 100, &mut ctx).unwrap();
    let (x, y) = data.to_tensors();

    let mut model = Sequential::build(&ModelSpec::reference(), &mut ctx).unwrap();
    model
        .compile_with(
            RMSprop::new(0.01, 0.9, 1e-7).unwrap(),
            BinaryCrossEntropy::new(),
            &TrainingConfig {
                epochs: 3,
                ..TrainingConfig::default()
            },
        )
        .unwrap();

    let history = model.fit_with_batches(&x, &y, &mut ctx).unwrap();
    assert_eq!(history.len(), 3);
    assert_eq!(model.iterations(), 3 * 4);
    assert_eq!(
        model.optimizer_config(),
        Some(OptimizerConfig::RMSprop {
            learning_rate: 0.01,
            rho: 0.9,
            epsilon: 1e-7
        })
    );
    let config = model.training_config().unwrap();
    assert_eq!(config.optimizer, "rmsprop");
    assert_eq!(config.loss, "binary_crossentropy");
}

#[test]
fn compile_with_sgd_and_mse() {
    let mut ctx = ExecutionContext::with_seed(3);
    let data = SyntheticDataset::generate(40, 10, &mut ctx).unwrap();
    let (x, y) = data.to_tensors();

    let spec = ModelSpec::new(10, vec![LayerSpec::new(1, Activation::Sigmoid)]);
    let mut model = Sequential::build(&spec, &mut ctx).unwrap();
    model
        .compile_with(
            SGD::new(0.1).unwrap(),
            MeanSquaredError::new(),
            &TrainingConfig {
                optimizer: "ignored".to_string(),
                epochs: 1,
                ..TrainingConfig::default()
            },
        )
        .unwrap();

    model.fit_with_batches(&x, &y, &mut ctx).unwrap();
    assert_eq!(model.training_config().unwrap().optimizer, "sgd");
    assert_eq!(model.training_config().unwrap().loss, "mean_squared_error");
}
