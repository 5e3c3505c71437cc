use super::*;

#[test]
fn bce_matches_reference_value() {
    let y_true = array![[1.0], [0.0]].into_dyn();
    let y_pred = array![[0.9], [0.1]].into_dyn();
    let loss = BinaryCrossEntropy::new().compute_loss(&y_true, &y_pred);
    assert_relative_eq!(loss, 0.1053605, epsilon = 1e-6);
}

#[test]
fn bce_clips_saturated_predictions() {
    let y_true = array![[1.0]].into_dyn();
    let y_pred = array![[0.0]].into_dyn();
    let bce = BinaryCrossEntropy::new();

    let loss = bce.compute_loss(&y_true, &y_pred);
    assert!(loss.is_finite());
    assert_relative_eq!(loss, 16.118095, epsilon = 1e-3);

    let grad = bce.compute_grad(&y_true, &y_pred);
    assert!(grad.iter().all(|g| g.is_finite()));
}

#[test]
fn bce_gradient_is_averaged() {
    let y_true = array![[1.0], [0.0]].into_dyn();
    let y_pred = array![[0.5], [0.5]].into_dyn();
    let grad = BinaryCrossEntropy::new().compute_grad(&y_true, &y_pred);
    // (p - y) / (p (1 - p) n)
    assert_relative_eq!(grad[[0, 0]], -1.0, epsilon = 1e-5);
    assert_relative_eq!(grad[[1, 0]], 1.0, epsilon = 1e-5);
}

#[test]
fn mse_value_and_gradient() {
    let y_true = array![[1.0], [2.0]].into_dyn();
    let y_pred = array![[2.0], [4.0]].into_dyn();
    let mse = MeanSquaredError::new();

    assert_relative_eq!(mse.compute_loss(&y_true, &y_pred), 2.5);
    let grad = mse.compute_grad(&y_true, &y_pred);
    assert_relative_eq!(grad[[0, 0]], 1.0);
    assert_relative_eq!(grad[[1, 0]], 2.0);
}

#[test]
fn loss_identifiers() {
    assert!(loss_from_identifier("binary_crossentropy").is_ok());
    assert!(loss_from_identifier("Binary-CrossEntropy").is_ok());
    assert!(loss_from_identifier("mse").is_ok());
    assert!(matches!(
        loss_from_identifier("hinge"),
        Err(ModelError::InputValidationError(_))
    ));
}
