use super::*;
use crate::neural_network::layer::LayerWeight;

fn dense_weights(layer: &Dense) -> (Array2<f32>, Array2<f32>) {
    match layer.get_weights() {
        LayerWeight::Dense(w) => (w.weight.clone(), w.bias.clone()),
    }
}

#[test]
fn test_dense_forward_pass_dimensions() {
    let mut ctx = ExecutionContext::with_seed(3);
    let mut dense = Dense::new(4, 3, Activation::ReLU, ctx.rng()).unwrap();
    let input = Array::ones((2, 4)).into_dyn();

    let output = dense.forward(&input).unwrap();
    assert_eq!(output.shape(), &[2, 3]);
    assert_eq!(dense.output_shape(), "(None, 3)");
}

#[test]
fn test_dense_glorot_initialization() {
    let mut ctx = ExecutionContext::with_seed(11);
    let dense = Dense::new(100, 32, Activation::ReLU, ctx.rng()).unwrap();
    let (weights, bias) = dense_weights(&dense);

    let limit = (6.0f32 / 132.0).sqrt();
    assert!(weights.iter().all(|w| w.abs() <= limit));
    assert!(bias.iter().all(|&b| b == 0.0));
    assert_eq!(dense.param_count(), TrainingParameters::Trainable(3232));
}

#[test]
fn test_dense_same_seed_same_weights() {
    let a = Dense::new(5, 4, Activation::Tanh, ExecutionContext::with_seed(9).rng()).unwrap();
    let b = Dense::new(5, 4, Activation::Tanh, ExecutionContext::with_seed(9).rng()).unwrap();
    assert_eq!(dense_weights(&a), dense_weights(&b));
}

#[test]
fn test_dense_rejects_zero_units_and_wrong_width() {
    let mut ctx = ExecutionContext::with_seed(0);
    assert!(matches!(
        Dense::new(4, 0, Activation::ReLU, ctx.rng()),
        Err(ModelError::InputValidationError(_))
    ));

    let mut dense = Dense::new(4, 2, Activation::ReLU, ctx.rng()).unwrap();
    let result = dense.forward(&Array::ones((2, 5)).into_dyn());
    assert!(matches!(result, Err(ModelError::InputValidationError(_))));

    let result = dense.forward(&Array::ones((2, 4, 1)).into_dyn());
    assert!(matches!(result, Err(ModelError::InputValidationError(_))));
}

#[test]
fn test_dense_backward_requires_forward() {
    let mut ctx = ExecutionContext::with_seed(0);
    let mut dense = Dense::new(2, 2, Activation::Linear, ctx.rng()).unwrap();
    let result = dense.backward(&Array::ones((1, 2)).into_dyn());
    assert!(matches!(result, Err(ModelError::ProcessingError(_))));
}

#[test]
fn test_dense_gradients_and_sgd_step() {
    let mut ctx = ExecutionContext::with_seed(0);
    let mut dense = Dense::new(2, 1, Activation::Linear, ctx.rng()).unwrap();
    dense
        .set_weights(array![[1.0], [2.0]], array![[0.5]])
        .unwrap();

    let input = array![[1.0, 1.0], [2.0, 0.0]].into_dyn();
    let output = dense.forward(&input).unwrap();
    assert_eq!(output, array![[3.5], [2.5]].into_dyn());

    let grad_input = dense.backward(&Array::ones((2, 1)).into_dyn()).unwrap();
    assert_eq!(grad_input, array![[1.0, 2.0], [1.0, 2.0]].into_dyn());

    // grad_w = [[3], [1]], grad_b = [[2]]
    dense.update_parameters_sgd(0.1);
    let (weights, bias) = dense_weights(&dense);
    assert_relative_eq!(weights[[0, 0]], 0.7, epsilon = 1e-6);
    assert_relative_eq!(weights[[1, 0]], 1.9, epsilon = 1e-6);
    assert_relative_eq!(bias[[0, 0]], 0.3, epsilon = 1e-6);
}

#[test]
fn test_dense_set_weights_checks_shapes() {
    let mut ctx = ExecutionContext::with_seed(0);
    let mut dense = Dense::new(3, 2, Activation::Sigmoid, ctx.rng()).unwrap();
    assert!(dense.set_weights(Array2::zeros((2, 3)), Array2::zeros((1, 2))).is_err());
    assert!(dense.set_weights(Array2::zeros((3, 2)), Array2::zeros((2, 1))).is_err());
    assert!(dense.set_weights(Array2::zeros((3, 2)), Array2::zeros((1, 2))).is_ok());
}

#[test]
fn test_dense_rmsprop_cache_created_on_first_step() {
    let mut ctx = ExecutionContext::with_seed(5);
    let mut dense = Dense::new(3, 2, Activation::Sigmoid, ctx.rng()).unwrap();
    match dense.get_weights() {
        LayerWeight::Dense(w) => assert!(w.rmsprop_cache.is_none()),
    }

    dense.forward(&Array::ones((4, 3)).into_dyn()).unwrap();
    dense.backward(&Array::ones((4, 2)).into_dyn()).unwrap();
    dense.update_parameters_rmsprop(0.001, 0.9, 1e-7);

    match dense.get_weights() {
        LayerWeight::Dense(w) => {
            let cache = w.rmsprop_cache.expect("cache after an RMSprop step");
            assert_eq!(cache.cache.dim(), (3, 2));
            assert_eq!(cache.bias.dim(), (1, 2));
            assert!(cache.cache.iter().all(|&v| v > 0.0));
        }
    }
}

#[test]
fn test_dense_trace_emits_five_ops() {
    let mut ctx = ExecutionContext::with_seed(0);
    let dense = Dense::new(3, 2, Activation::Linear, ctx.rng())
        .unwrap()
        .with_name("proj");

    let mut graph = NativeGraph::new("proj_input", 3);
    let output = dense.trace("proj_input", &mut graph);
    graph.set_output(output.clone(), 2);

    let op_types: Vec<&str> = graph.ops.iter().map(|op| op.kind.op_type()).collect();
    assert_eq!(
        op_types,
        ["ReadVariableOp", "MatMul", "ReadVariableOp", "BiasAdd", "Identity"]
    );
    assert_eq!(output, "proj/Identity:0");
    assert_eq!(graph.variables[0].name, "proj/kernel");
    assert_eq!(graph.variables[0].dims, vec![3, 2]);
    assert_eq!(graph.variables[1].dims, vec![2]);
    assert_eq!(graph.ops[1].inputs[0], "proj_input");
}
