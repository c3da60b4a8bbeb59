use pvnet::{
    dataset::array_split,
    rng::{self, Rand},
    trainer::batch_plan,
    BuildOptions, Dataset, LayerType, NetworkError, NeuralNet, Solver, Target, TrainingParams,
};
use rand::Rng;

fn clusters(per_class: usize, rng: &mut Rand) -> Dataset {
    let centres = [(-1.0, -1.0), (1.0, -1.0), (0.0, 1.2)];
    let mut inputs = Vec::new();
    let mut labels = Vec::new();

    for (label, &(x, y)) in centres.iter().enumerate() {
        for _ in 0..per_class {
            inputs.push(vec![x + rng.gen_range(-0.4..0.4), y + rng.gen_range(-0.4..0.4)]);
            labels.push(label);
        }
    }

    Dataset::from_labels(inputs, labels, 3).unwrap()
}

fn classifier(rng: &mut Rand) -> NeuralNet {
    let mut net = NeuralNet::new();
    net.add_layer(LayerType::Input, 2, rng).unwrap();
    net.add_layer(LayerType::Tanh, 4, rng).unwrap();
    net.add_layer(LayerType::Tanh, 4, rng).unwrap();
    net.add_layer(LayerType::Softmax, 3, rng).unwrap();
    net
}

fn self_play(n: usize, rng: &mut Rand) -> Dataset {
    let mut inputs = Vec::new();
    let mut policies = Vec::new();
    let mut values = Vec::new();

    for _ in 0..n {
        let (x, y): (f64, f64) = (rng.gen_range(-1.0..1.0), rng.gen_range(-1.0..1.0));
        let best = if x > 0.0 { 0 } else if y > 0.0 { 1 } else { 2 };

        let mut policy = vec![0.1; 3];
        policy[best] = 0.8;

        inputs.push(vec![x, y]);
        policies.push(policy);
        values.push((x + y) / 2.0);
    }

    Dataset::policy_value(inputs, policies, values).unwrap()
}

#[test]
fn separates_three_clusters() {
    let mut rng = rng::seeded(2024);
    let data = clusters(50, &mut rng);
    let mut net = classifier(&mut rng);

    net.set_training_params(TrainingParams {
        learning_rate: 0.05,
        momentum: 0.5,
        batch_size: 10,
        training_rounds: 200,
        ..Default::default()
    })
    .unwrap();

    net.train_on_dataset(&data, &mut rng).unwrap();

    assert!(net.validate(&data).unwrap() > 0.9);
    let classes = net.classify_dataset(data.inputs()).unwrap();
    assert_eq!(classes.len(), 150);
}

#[test]
fn dual_head_learns() {
    let mut rng = rng::seeded(7);
    let data = self_play(120, &mut rng);

    let mut net = NeuralNet::new();
    net.build_network(&[2, 4, 4, 4], &BuildOptions { verbose: false, ..Default::default() }, &mut rng).unwrap();
    net.set_training_params(TrainingParams {
        solver: Solver::Adam,
        learning_rate: 0.01,
        batch_size: 8,
        training_rounds: 60,
        return_error: true,
        ..Default::default()
    })
    .unwrap();

    let before = net.loss(&data).unwrap();
    let history = net.train_on_dataset(&data, &mut rng).unwrap().unwrap();
    let after = net.loss(&data).unwrap();

    assert_eq!(history.len(), 60 * 15);
    assert!(after < before, "{after} >= {before}");

    let (policies, values) = net.activate_dataset(&data.inputs()[..5]).unwrap();
    for policy in &policies {
        assert!((policy.iter().sum::<f64>() - 1.0).abs() < 1e-9);
    }
    assert!(values.iter().all(|v| v.abs() < 1.0));

    // merged view is current after training
    let Some(head) = net.output_layer().and_then(|layer| layer.as_policy_value()) else {
        panic!("expected a dual head");
    };
    assert_eq!(head.weights(), &head.policy().lin().weights().stack(head.value().lin().weights()));
}

#[test]
fn fixed_seed_is_deterministic() {
    let run = || {
        let mut rng = rng::seeded(99);
        let data = clusters(20, &mut rng);
        let mut net = classifier(&mut rng);
        net.set_training_params(TrainingParams {
            momentum: 0.9,
            batch_size: 4,
            training_rounds: 5,
            return_error: true,
            ..Default::default()
        })
        .unwrap();

        let history = net.train_on_dataset(&data, &mut rng).unwrap();
        (history, net)
    };

    let (history_a, net_a) = run();
    let (history_b, net_b) = run();

    assert_eq!(history_a, history_b);
    assert_eq!(net_a.layers(), net_b.layers());
}

#[test]
fn oversized_batch_uses_whole_dataset() {
    let mut rng = rng::seeded(1);
    let data = clusters(3, &mut rng);

    let (batch_size, batches) = batch_plan(data.len(), 500);
    assert_eq!((batch_size, batches), (9, 1));

    let order = rng::permutation(data.len(), &mut rng);
    let split = array_split(&order, batches);
    assert_eq!(split, vec![&order[..]]);

    let mut net = classifier(&mut rng);
    net.set_training_params(TrainingParams {
        batch_size: 500,
        training_rounds: 3,
        return_error: true,
        ..Default::default()
    })
    .unwrap();

    let history = net.train_on_dataset(&data, &mut rng).unwrap().unwrap();
    assert_eq!(history.len(), 3);
}

#[test]
fn train_and_validate_scores_both_parts() {
    let mut rng = rng::seeded(12);
    let data = clusters(30, &mut rng);
    let mut net = classifier(&mut rng);
    net.set_training_params(TrainingParams {
        learning_rate: 0.05,
        momentum: 0.5,
        batch_size: 5,
        training_rounds: 100,
        ..Default::default()
    })
    .unwrap();

    let report = net.train_and_validate(&data, 0.8, &mut rng).unwrap();
    assert!(report.loss_history.is_none());
    assert!(report.training_score > 0.85);
    assert!(report.validation_score > 0.8);

    let score = net.cross_validation(&data, 3, &mut rng).unwrap();
    assert!((0.0..=1.0).contains(&score));
}

#[test]
fn regression_rmse() {
    let mut rng = rng::seeded(3);
    let inputs: Vec<Vec<f64>> = (0..30).map(|i| vec![i as f64 / 30.0]).collect();
    let targets = inputs.iter().map(|x| Target::Vector(vec![0.5 * x[0] - 0.25])).collect();
    let data = Dataset::new(inputs, targets).unwrap();

    let mut net = NeuralNet::new();
    let options = BuildOptions {
        hidden_type: LayerType::ReLU,
        out_type: LayerType::Linear,
        verbose: false,
        ..Default::default()
    };
    net.build_network(&[1, 6, 1], &options, &mut rng).unwrap();
    net.set_training_params(TrainingParams { training_rounds: 200, ..Default::default() }).unwrap();

    let before = net.rmse(&data).unwrap();
    net.train_on_dataset(&data, &mut rng).unwrap();
    let after = net.rmse(&data).unwrap();

    assert!(after < before);
    assert!((after * after - net.loss(&data).unwrap()).abs() < 1e-12);
    assert!(matches!(net.validate(&data), Err(NetworkError::MissingLabels)));
}

#[test]
fn invalid_configuration_is_rejected() {
    let mut net = NeuralNet::new();
    let params = TrainingParams { batch_size: 0, ..Default::default() };
    assert!(matches!(net.set_training_params(params), Err(NetworkError::InvalidOption { .. })));

    assert!(matches!(TrainingParams::from_toml("solver = \"lbfgs\""), Err(NetworkError::UnknownSolver(_))));
    assert!(matches!(TrainingParams::from_toml("batchsize = -1"), Err(NetworkError::InvalidOption { .. })));
    assert!(matches!(TrainingParams::from_toml("not toml at all"), Err(NetworkError::Config(_))));

    let params = TrainingParams::from_toml("solver = \"adam\"\nreturn_error = true\ntraining_rounds = 4").unwrap();
    assert_eq!(params.solver, Solver::Adam);
    assert!(params.return_error);
    assert_eq!(params.training_rounds, 4);
    assert_eq!(params.learning_rate, TrainingParams::default().learning_rate);
}
