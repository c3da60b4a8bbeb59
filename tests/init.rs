use pvnet::{rng, Layer, LayerType};

#[test]
fn xavier_spread() {
    let (n, nprevious) = (200, 300);
    let mut layer = Layer::new(LayerType::Linear, n, nprevious).unwrap();
    layer.xavier_init(&mut rng::seeded(42)).unwrap();

    let (weights, biases) = layer.parameters().unwrap();
    let vals = weights.vals();
    let count = vals.len() as f64;

    let mean = vals.iter().sum::<f64>() / count;
    let stdev = (vals.iter().map(|w| (w - mean) * (w - mean)).sum::<f64>() / count).sqrt();
    let expected = rng::xavier_stdev(n, nprevious);

    assert!(mean.abs() < 0.01 * expected.max(1.0));
    assert!((stdev / expected - 1.0).abs() < 0.05, "{stdev} vs {expected}");
    assert!(biases.iter().all(|&b| b == 0.0));
}

#[test]
fn dual_head_heads_have_their_own_spread() {
    let mut layer = Layer::new(LayerType::PolicyValue, 401, 300).unwrap();
    layer.xavier_init(&mut rng::seeded(8)).unwrap();

    let Layer::PolicyValue(head) = &layer else { panic!("expected a dual head") };
    let policy = head.policy().lin().weights().vals();
    let stdev = (policy.iter().map(|w| w * w).sum::<f64>() / policy.len() as f64).sqrt();

    assert!((stdev / rng::xavier_stdev(400, 300) - 1.0).abs() < 0.05);
    assert_eq!(head.value().lin().weights().shape(), (1, 300));
}
