use perceptron::{patterns, Activator, Logging, Network, Result, Seed, Trainer};
use rand::distributions::{Distribution, Uniform};

type Input = [f32; 2];
type Output = [f32; 1];

/// Noisy points near the corners of the unit square, labelled with the XOR of
/// their rounded coordinates.
fn generate_data(num_samples: usize) -> Vec<(Input, Output)> {
    let mut rng = rand::thread_rng();
    let corner = Uniform::new_inclusive(0u8, 1);
    let noise = Uniform::new_inclusive(-0.1f32, 0.1);

    let mut data = Vec::new();
    for _ in 0..num_samples {
        let (x, y) = (corner.sample(&mut rng), corner.sample(&mut rng));
        let point = [
            x as f32 + noise.sample(&mut rng),
            y as f32 + noise.sample(&mut rng),
        ];
        data.push((point, [(x ^ y) as f32]));
    }
    data
}

fn score(set_name: &str, network: &mut Network, test_data: &[(Input, Output)]) -> Result<()> {
    let mut num_correct = 0;
    for (input, expected) in test_data {
        let output = network.run(input)?;
        let class = if output[0] > 0.5 { 1.0 } else { 0.0 };
        if expected[0] == class {
            num_correct += 1;
        }
    }
    println!(
        "{} set results: {} of {} correct",
        set_name,
        num_correct,
        test_data.len()
    );
    Ok(())
}

fn main() -> Result<()> {
    tracing_subscriber::fmt().init();

    let training_data = generate_data(200);
    let mut network = Network::builder(2)
        .layer(2, Activator::Sigmoid)
        .layer(1, Activator::Sigmoid)
        .seed(Seed::Fixed(7))
        .build()?;
    let report = Trainer::new()
        .learning_rate(0.5)
        .desired_error(0.01)
        .max_epochs(1000)
        .logging(Logging::Iterations(50))
        .train(&mut network, &patterns(&training_data)?)?;

    println!();
    println!("{}", report.state);
    score("Training", &mut network, &training_data)?;
    score("Test", &mut network, &generate_data(100))?;
    Ok(())
}
