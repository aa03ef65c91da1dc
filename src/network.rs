//! A layered, fully connected
//! [feedforward neural network](https://en.wikipedia.org/wiki/Feedforward_neural_network).
//!
//! # Example
//!
//! ```
//! # use perceptron::network::*;
//! let mut network = Network::builder(2)
//!     .layer(3, Activator::TanH)
//!     .layer(1, Activator::Sigmoid)
//!     .seed(Seed::Fixed(42))
//!     .build()
//!     .unwrap();
//!
//! assert_eq!(network.topology(), "2-3-1");
//! let output = network.run(&[0.5, -0.5]).unwrap();
//! assert_eq!(output.len(), 1);
//! ```

use std::time::{SystemTime, UNIX_EPOCH};

use rand::distributions::Uniform;
use rand::rngs::StdRng;
use rand::SeedableRng;

use crate::device::DeviceBuffer;
use crate::error::{Error, Result};
use crate::forward;
use crate::layer::Layer;
use crate::utils::Back;

pub use crate::activator::Activator;

/// Lower bound of the default initial weight interval.
pub const WEIGHT_MIN: f32 = -1.0;
/// Upper bound of the default initial weight interval.
pub const WEIGHT_MAX: f32 = 1.0;
/// Default initial bias of every neuron.
pub const INITIAL_BIAS: f32 = 1.0;

/// Seed for the generator that draws the initial weights.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Default)]
pub enum Seed {
    /// Reproducible weights.
    Fixed(u64),
    /// Seeds from the wall clock at build time.
    #[default]
    Clock,
}

impl Seed {
    fn resolve(self) -> u64 {
        match self {
            Seed::Fixed(seed) => seed,
            Seed::Clock => SystemTime::now()
                .duration_since(UNIX_EPOCH)
                .map(|elapsed| elapsed.as_nanos() as u64)
                .unwrap_or_default(),
        }
    }
}

/// A feedforward neural network
#[derive(Debug)]
pub struct Network {
    input_len: usize,
    layers: Vec<Layer>,
}

impl Network {
    /// Starts describing a network that takes `input_len` inputs.
    pub fn builder(input_len: usize) -> NetworkBuilder {
        NetworkBuilder {
            input_len,
            layers: Vec::new(),
            weight_range: (WEIGHT_MIN, WEIGHT_MAX),
            initial_bias: INITIAL_BIAS,
            seed: Seed::default(),
        }
    }

    /// Creates a new, untrained neural network.
    ///
    /// Arguments:
    ///  * `input_len` - the number of network inputs.
    ///  * `layer_sizes` - the number of neurons in each processing layer; the
    ///                    last entry is the output layer.
    ///  * `activator` - the activation function to use for each neuron.
    ///  * `seed` - seed for the initial weights.
    pub fn new(
        input_len: usize,
        layer_sizes: &[usize],
        activator: Activator,
        seed: Seed,
    ) -> Result<Self> {
        layer_sizes
            .iter()
            .fold(Network::builder(input_len), |builder, &neurons| {
                builder.layer(neurons, activator)
            })
            .seed(seed)
            .build()
    }

    /// Returns the size of the input to the network.
    pub fn input_len(&self) -> usize {
        self.input_len
    }

    /// Returns the size of the output layer from the network.
    pub fn output_len(&self) -> usize {
        self.layers.back().output_len()
    }

    pub fn layers(&self) -> &[Layer] {
        &self.layers
    }

    pub(crate) fn layers_mut(&mut self) -> &mut [Layer] {
        &mut self.layers
    }

    /// Uploads new row-major weights for layer `index`.
    pub fn set_layer_weights(&mut self, index: usize, weights: &[f32]) -> Result<()> {
        self.layer_mut(index)?.set_weights(weights)
    }

    /// Uploads new biases for layer `index`.
    pub fn set_layer_bias(&mut self, index: usize, bias: &[f32]) -> Result<()> {
        self.layer_mut(index)?.set_bias(bias)
    }

    fn layer_mut(&mut self, index: usize) -> Result<&mut Layer> {
        let count = self.layers.len();
        self.layers.get_mut(index).ok_or_else(|| {
            Error::parameter("layer", format!("index {} out of {} layers", index, count))
        })
    }

    /// Describes the topology as `input-hidden...-output`, e.g. `2-2-1`.
    pub fn topology(&self) -> String {
        let mut sizes = vec![self.input_len.to_string()];
        sizes.extend(self.layers.iter().map(|l| l.output_len().to_string()));
        sizes.join("-")
    }

    /// Feeds the provided `input` through the network, returning the output
    /// layer.
    pub fn run(&mut self, input: &[f32]) -> Result<Vec<f32>> {
        if input.len() != self.input_len {
            return Err(Error::shape("network input", self.input_len, input.len()));
        }
        let sample = DeviceBuffer::from_host(input)?;
        forward::feedforward(self, &sample)?;
        Ok(self.layers.back().activations())
    }
}

/// Builds a `Network`, layer by layer.
#[derive(Clone, Debug)]
pub struct NetworkBuilder {
    input_len: usize,
    layers: Vec<(usize, Activator)>,
    weight_range: (f32, f32),
    initial_bias: f32,
    seed: Seed,
}

impl NetworkBuilder {
    /// Appends a layer of `neurons` neurons using `activator`.
    pub fn layer(mut self, neurons: usize, activator: Activator) -> Self {
        self.layers.push((neurons, activator));
        self
    }

    /// Sets the closed interval initial weights are drawn from. Defaults to
    /// `[-1, 1]`.
    pub fn weight_range(mut self, min: f32, max: f32) -> Self {
        self.weight_range = (min, max);
        self
    }

    /// Sets the bias every neuron starts with. Defaults to `1`.
    pub fn initial_bias(mut self, bias: f32) -> Self {
        self.initial_bias = bias;
        self
    }

    pub fn seed(mut self, seed: Seed) -> Self {
        self.seed = seed;
        self
    }

    /// Allocates every layer and draws its weights.
    ///
    /// Layers draw from one generator in order, so a fixed seed reproduces
    /// the whole network.
    pub fn build(self) -> Result<Network> {
        self.validate()?;
        let (min, max) = self.weight_range;
        let weights = Uniform::new_inclusive(min, max);
        let mut rng = StdRng::seed_from_u64(self.seed.resolve());

        let mut layers = Vec::with_capacity(self.layers.len());
        let mut inputs = self.input_len;
        for &(neurons, activator) in &self.layers {
            layers.push(Layer::new(
                activator,
                inputs,
                neurons,
                &weights,
                self.initial_bias,
                &mut rng,
            )?);
            inputs = neurons;
        }
        Ok(Network {
            input_len: self.input_len,
            layers,
        })
    }

    fn validate(&self) -> Result<()> {
        if self.input_len == 0 {
            return Err(Error::InvalidTopology("the network needs at least one input".into()));
        }
        if self.layers.is_empty() {
            return Err(Error::InvalidTopology("the network needs at least one layer".into()));
        }
        if let Some(i) = self.layers.iter().position(|&(neurons, _)| neurons == 0) {
            return Err(Error::InvalidTopology(format!("layer {} has no neurons", i)));
        }
        let (min, max) = self.weight_range;
        let span = max - min;
        if !(min.is_finite() && max.is_finite() && min < max)
            || !(span / (1.0 - f32::EPSILON)).is_finite()
        {
            return Err(Error::parameter(
                "weight_range",
                format!("[{}, {}] is not a finite, non-empty interval", min, max),
            ));
        }
        if !self.initial_bias.is_finite() {
            return Err(Error::parameter("initial_bias", "must be finite"));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn too_few_layers() {
        assert!(Network::new(2, &[], Activator::Sigmoid, Seed::Fixed(0)).is_err());
    }

    #[test]
    fn empty_layer() {
        assert!(Network::new(1, &[2, 0, 1], Activator::Sigmoid, Seed::Fixed(0)).is_err());
    }

    #[test]
    fn empty_input() {
        assert!(Network::new(0, &[1], Activator::Sigmoid, Seed::Fixed(0)).is_err());
    }

    #[test]
    fn bad_weight_range() {
        let result = Network::builder(1)
            .layer(1, Activator::Identity)
            .weight_range(1.0, -1.0)
            .build();
        assert!(result.is_err());
    }

    #[test]
    fn overflowing_weight_range() {
        let result = Network::builder(1)
            .layer(1, Activator::Identity)
            .weight_range(-f32::MAX, f32::MAX)
            .build();
        assert!(matches!(
            result,
            Err(Error::InvalidParameter {
                name: "weight_range",
                ..
            })
        ));
    }

    #[test]
    fn set_layer_parameters() {
        let mut network = Network::new(2, &[2, 1], Activator::TanH, Seed::Fixed(4)).unwrap();
        network.set_layer_weights(1, &[0.5, -0.5]).unwrap();
        network.set_layer_bias(0, &[0.0, 0.25]).unwrap();
        assert_eq!(network.layers()[1].weights(), vec![0.5, -0.5]);
        assert_eq!(network.layers()[0].bias(), vec![0.0, 0.25]);

        assert!(network.set_layer_weights(1, &[1.0]).is_err());
        assert!(matches!(
            network.set_layer_bias(2, &[0.0]),
            Err(Error::InvalidParameter { name: "layer", .. })
        ));
        assert_eq!(network.topology(), "2-2-1");
    }

    #[test]
    fn weight_shapes_chain() {
        let network = Network::new(4, &[3, 2, 5], Activator::TanH, Seed::Fixed(3)).unwrap();
        let mut inputs = network.input_len();
        for layer in network.layers() {
            assert_eq!(layer.input_len(), inputs);
            assert_eq!(layer.weights().len(), layer.output_len() * inputs);
            inputs = layer.output_len();
        }
        assert_eq!(network.output_len(), 5);
        assert_eq!(network.topology(), "4-3-2-5");
    }

    #[test]
    fn initial_parameters() {
        let network = Network::builder(3)
            .layer(4, Activator::Sigmoid)
            .weight_range(-0.5, 0.5)
            .initial_bias(0.25)
            .seed(Seed::Fixed(11))
            .build()
            .unwrap();
        let layer = &network.layers()[0];
        assert!(layer.weights().iter().all(|w| (-0.5..=0.5).contains(w)));
        assert_eq!(layer.bias(), vec![0.25; 4]);
    }

    #[test]
    fn fixed_seed_reproduces_weights() {
        let a = Network::new(2, &[3, 1], Activator::Sigmoid, Seed::Fixed(99)).unwrap();
        let b = Network::new(2, &[3, 1], Activator::Sigmoid, Seed::Fixed(99)).unwrap();
        let c = Network::new(2, &[3, 1], Activator::Sigmoid, Seed::Fixed(100)).unwrap();
        for (x, y) in a.layers().iter().zip(b.layers()) {
            assert_eq!(x.weights(), y.weights());
        }
        assert_ne!(a.layers()[0].weights(), c.layers()[0].weights());
    }

    #[test]
    fn per_layer_activators() {
        let network = Network::builder(2)
            .layer(2, Activator::Step)
            .layer(1, Activator::Identity)
            .build()
            .unwrap();
        assert_eq!(network.layers()[0].activator(), Activator::Step);
        assert_eq!(network.layers()[1].activator(), Activator::Identity);
    }

    #[test]
    fn run_checks_input_len() {
        let mut network = Network::new(2, &[1], Activator::Sigmoid, Seed::Fixed(0)).unwrap();
        assert!(network.run(&[1.0]).is_err());
        assert_eq!(network.run(&[1.0, 0.0]).unwrap().len(), 1);
    }
}
