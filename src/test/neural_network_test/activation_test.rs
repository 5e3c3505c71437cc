use super::*;

#[test]
fn relu_clamps_negative_values() {
    let z = array![[-2.0, -1.0, 0.0], [1.0, 2.0, 3.0]];
    let out = Activation::apply_activation(&z, &Activation::ReLU);
    assert_eq!(out, array![[0.0, 0.0, 0.0], [1.0, 2.0, 3.0]]);

    let derivative = Activation::activation_derivative(&out, &Activation::ReLU);
    assert_eq!(derivative, array![[0.0, 0.0, 0.0], [1.0, 1.0, 1.0]]);
}

#[test]
fn sigmoid_and_tanh_values() {
    let z = array![[0.0, 2.0]];
    let sigmoid = Activation::apply_activation(&z, &Activation::Sigmoid);
    assert_relative_eq!(sigmoid[[0, 0]], 0.5);
    assert_relative_eq!(sigmoid[[0, 1]], 0.880797, epsilon = 1e-6);

    let tanh = Activation::apply_activation(&z, &Activation::Tanh);
    assert_relative_eq!(tanh[[0, 0]], 0.0);
    assert_relative_eq!(tanh[[0, 1]], 0.964028, epsilon = 1e-6);
}

#[test]
fn linear_is_identity() {
    let z = array![[-3.5, 0.0, 7.25]];
    assert_eq!(Activation::apply_activation(&z, &Activation::Linear), z);
}

#[test]
fn softmax_rows_sum_to_one_for_large_inputs() {
    let z = array![[1000.0, 1001.0, 1002.0], [-5.0, 0.0, 5.0]];
    let out = Activation::apply_activation(&z, &Activation::Softmax);

    for row in out.rows() {
        assert!(row.iter().all(|v| v.is_finite()));
        assert_relative_eq!(row.sum(), 1.0, epsilon = 1e-6);
    }
    // shifting a row by a constant does not change the result
    assert_relative_eq!(out[[0, 2]], 0.66524094, epsilon = 1e-6);
}

#[test]
fn softmax_backward_of_uniform_gradient_is_zero() {
    let z = array![[0.1, 0.2, 0.7]];
    let a = Activation::apply_activation(&z, &Activation::Softmax);
    let grad = Activation::softmax_backward(&a, &Array2::ones((1, 3)));
    for &g in grad.iter() {
        assert_relative_eq!(g, 0.0, epsilon = 1e-6);
    }
}

#[test]
fn activation_identifiers() {
    for activation in [
        Activation::Linear,
        Activation::ReLU,
        Activation::Tanh,
        Activation::Sigmoid,
        Activation::Softmax,
    ] {
        assert_eq!(
            Activation::from_identifier(activation.identifier()).unwrap(),
            activation
        );
    }
    assert_eq!(
        Activation::from_identifier("ReLU").unwrap(),
        Activation::ReLU
    );
    assert!(Activation::from_identifier("gelu").is_err());
}
