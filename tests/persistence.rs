use pvnet::{rng, BuildOptions, Layer, LayerType, NeuralNet, Scope};

fn network(out_type: LayerType, hidden_type: LayerType) -> NeuralNet {
    let mut net = NeuralNet::new();
    let options = BuildOptions { hidden_type, out_type, verbose: false, ..Default::default() };
    net.build_network(&[4, 6, 5, 3], &options, &mut rng::seeded(31)).unwrap();
    net
}

fn assert_same(a: &NeuralNet, b: &NeuralNet) {
    assert_eq!(a.to_string(), b.to_string());
    for (x, y) in a.layers().iter().zip(b.layers()) {
        assert_eq!(x.parameters(), y.parameters());
    }
}

#[test]
fn rich_round_trip_is_bit_identical() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("net.txt");

    for hidden_type in [LayerType::Tanh, LayerType::Sigmoid, LayerType::ReLU, LayerType::SoftSign, LayerType::Linear] {
        let mut net = network(LayerType::Softmax, hidden_type);
        net.set_scope(Scope::Regression);
        net.save(&path).unwrap();

        let mut loaded = NeuralNet::load(&path).unwrap();
        assert_same(&net, &loaded);
        assert_eq!(loaded.scope(), Scope::Regression);

        let input = [0.1, -0.3, 0.7, 0.2];
        assert_eq!(net.predict(&input).unwrap(), loaded.predict(&input).unwrap());
    }
}

#[test]
fn compact_round_trip_matches_rich() {
    let dir = tempfile::tempdir().unwrap();
    let rich = dir.path().join("net.txt");
    let compact = dir.path().join("net.compact");

    let mut net = network(LayerType::PolicyValue, LayerType::SoftSign);
    net.save(&rich).unwrap();
    net.save_compact(&compact).unwrap();

    let from_rich = NeuralNet::load(&rich).unwrap();
    let mut from_compact = NeuralNet::load_compact(&compact).unwrap();
    assert_same(&from_rich, &from_compact);
    assert_same(&net, &from_compact);

    let input = [0.5, 0.5, -0.5, 0.0];
    assert_eq!(net.activate(&input).unwrap(), from_compact.activate(&input).unwrap());

    let Some(Layer::PolicyValue(head)) = from_compact.output_layer() else { panic!("expected a dual head") };
    assert_eq!(head.p().len(), 2);
}

#[test]
fn missing_file_is_an_io_error() {
    let dir = tempfile::tempdir().unwrap();
    assert!(matches!(NeuralNet::load(dir.path().join("absent.txt")), Err(pvnet::NetworkError::Io(_))));
}

#[test]
fn loss_log_lines() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("train_error.dat");

    let mut rng = rng::seeded(5);
    let mut net = network(LayerType::Softmax, LayerType::Tanh);
    let inputs = vec![vec![0.0, 1.0, 0.0, 1.0], vec![1.0, 0.0, 1.0, 0.0]];
    let data = pvnet::Dataset::from_labels(inputs, vec![0, 2], 3).unwrap();
    net.set_training_params(pvnet::TrainingParams { training_rounds: 2, ..Default::default() }).unwrap();
    net.train_on_dataset(&data, &mut rng).unwrap();
    net.write_loss_log(&path).unwrap();

    let text = std::fs::read_to_string(&path).unwrap();
    let lines: Vec<&str> = text.lines().collect();
    assert_eq!(lines.len(), 4);

    for (i, line) in lines.iter().enumerate() {
        let (index, loss) = line.split_once(' ').unwrap();
        assert_eq!(index.parse::<usize>().unwrap(), i + 1);
        assert_eq!(loss.parse::<f64>().unwrap(), net.loss_history()[i]);
    }
}
