use std::io::Write;

use approx::assert_abs_diff_eq;
use perceptron::{
    evaluate, load_patterns, patterns, Activator, Error, Logging, Network, PatternOrder, Seed,
    Trainer, TrainingConfig, TrainingPattern, TrainingState,
};
use tempfile::NamedTempFile;

fn xor() -> Vec<TrainingPattern> {
    let examples: [([f32; 2], [f32; 1]); 4] = [
        ([0.0, 0.0], [0.0]),
        ([0.0, 1.0], [1.0]),
        ([1.0, 0.0], [1.0]),
        ([1.0, 1.0], [0.0]),
    ];
    patterns(&examples[..]).unwrap()
}

fn line() -> Vec<([f32; 1], [f32; 1])> {
    [0.0, 0.25, 0.5, 0.75, 1.0]
        .iter()
        .map(|&x| ([x], [0.5 * x - 0.3]))
        .collect()
}

#[test]
fn xor_reaches_a_terminal_state() {
    let examples = xor();
    let mut network = Network::new(2, &[2, 1], Activator::Sigmoid, Seed::Fixed(3)).unwrap();
    let report = Trainer::new()
        .learning_rate(0.5)
        .desired_error(0.01)
        .max_epochs(1000)
        .logging(Logging::Silent)
        .record_history(true)
        .train(&mut network, &examples)
        .unwrap();

    let history = report.history.unwrap();
    assert_eq!(history.epochs.len(), report.epochs);
    assert!(history.last().unwrap().mse <= history.epochs[0].mse);

    match report.state {
        TrainingState::Converged { mse, .. } => {
            assert!(mse <= 0.01);
            let cases = [([0.0, 0.0], 0.0), ([0.0, 1.0], 1.0), ([1.0, 0.0], 1.0), ([1.0, 1.0], 0.0)];
            for (input, target) in cases {
                let output = network.run(&input).unwrap();
                assert_abs_diff_eq!(output[0], target, epsilon = 0.2);
            }
        }
        TrainingState::EpochLimitReached { epoch, .. } => assert_eq!(epoch, 1000),
        TrainingState::Running { .. } => panic!("training returned while running"),
    }
}

#[test]
fn linear_regression_converges() {
    let examples = patterns(&line()).unwrap();
    let mut network = Network::new(1, &[1], Activator::Identity, Seed::Fixed(11)).unwrap();
    let report = Trainer::new()
        .learning_rate(0.2)
        .desired_error(1e-6)
        .max_epochs(1000)
        .logging(Logging::Silent)
        .train(&mut network, &examples)
        .unwrap();

    assert!(matches!(report.state, TrainingState::Converged { .. }));
    assert!(report.mse <= 1e-6);
    let layer = &network.layers()[0];
    assert_abs_diff_eq!(layer.weights()[0], 0.5, epsilon = 0.02);
    assert_abs_diff_eq!(layer.bias()[0], -0.3, epsilon = 0.02);
    assert!(evaluate(&mut network, &examples).unwrap() < 1e-4);
}

#[test]
fn same_seed_trains_identically() {
    let train = || {
        let mut network = Network::new(2, &[3, 1], Activator::TanH, Seed::Fixed(21)).unwrap();
        let report = Trainer::new()
            .max_epochs(20)
            .desired_error(0.0)
            .logging(Logging::Silent)
            .train(&mut network, &xor())
            .unwrap();
        (network.layers()[1].weights(), report.mse)
    };
    assert_eq!(train(), train());
}

#[test]
fn shuffling_is_opt_in() {
    let fixed = |trainer: Trainer| {
        let mut network = Network::new(2, &[2, 1], Activator::Sigmoid, Seed::Fixed(8)).unwrap();
        trainer
            .max_epochs(10)
            .desired_error(0.0)
            .logging(Logging::Silent)
            .train(&mut network, &xor())
            .unwrap();
        network.layers()[0].weights()
    };
    assert_eq!(
        fixed(Trainer::new()),
        fixed(Trainer::new().pattern_order(PatternOrder::Fixed))
    );
    let shuffled = PatternOrder::Shuffled { seed: 99 };
    assert_eq!(
        fixed(Trainer::new().pattern_order(shuffled)),
        fixed(Trainer::new().pattern_order(shuffled))
    );
}

#[test]
fn session_stops_at_terminal_state() {
    let examples = xor();
    let mut network = Network::new(2, &[2, 1], Activator::Sigmoid, Seed::Fixed(1)).unwrap();
    let trainer = Trainer::new().desired_error(0.0).max_epochs(3);
    let mut session = trainer.session(&mut network, &examples).unwrap();

    let mut epochs = Vec::new();
    while !session.state().is_terminal() {
        epochs.push(session.run_epoch().unwrap().epoch);
    }
    assert_eq!(epochs, vec![1, 2, 3]);
    assert!(matches!(
        session.state(),
        TrainingState::EpochLimitReached { epoch: 3, .. }
    ));
    assert!(matches!(session.run_epoch(), Err(Error::TrainingFinished)));
}

#[test]
fn trains_from_files_and_config() {
    let mut samples = NamedTempFile::new().unwrap();
    let mut targets = NamedTempFile::new().unwrap();
    for (input, target) in line() {
        // raw samples in [0, 100], normalized back onto [0, 1] by the loader
        writeln!(samples, "{}", input[0] * 100.0).unwrap();
        writeln!(targets, "{}", target[0]).unwrap();
    }

    let config = TrainingConfig::from_toml(
        r#"
        input = 1
        learning_rate = 0.2
        desired_error = 1e-6
        seed = 11
        layers = [{ neurons = 1, activator = "Identity" }]

        [data]
        min = 0.0
        max = 100.0
        "#,
    )
    .unwrap();
    let examples = load_patterns(samples.path(), targets.path(), &config.load_options()).unwrap();
    assert_eq!(examples.len(), 5);

    let mut network = config.build_network().unwrap();
    let report = config
        .trainer()
        .logging(Logging::Silent)
        .train(&mut network, &examples)
        .unwrap();
    assert!(matches!(report.state, TrainingState::Converged { .. }));
    let output = network.run(&[0.5]).unwrap();
    assert_abs_diff_eq!(output[0], -0.05, epsilon = 0.02);
}

#[test]
fn missing_pattern_file_never_trains() {
    let samples = NamedTempFile::new().unwrap();
    let missing = samples.path().with_extension("absent");
    let config = TrainingConfig::from_toml(
        "input = 1\nlayers = [{ neurons = 1, activator = \"Sigmoid\" }]",
    )
    .unwrap();
    assert!(matches!(
        load_patterns(samples.path(), &missing, &config.load_options()),
        Err(Error::CannotOpen { .. })
    ));
}
