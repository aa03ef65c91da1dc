use crate::activator::{Activator, Kernel};
use crate::device::DeviceBuffer;
use crate::error::{Error, Result};
use crate::matrix::Mat;

use rand::distributions::Uniform;
use rand::Rng;

/// A single fully connected layer of the neural network.
///
/// Each neuron's weights are stored as one row of a row-major matrix, so
/// neuron `n` reads `weights[n * input_len .. (n + 1) * input_len]`. All
/// vectors are device buffers owned by the layer and are overwritten in place
/// on every pass.
#[derive(Debug)]
pub struct Layer {
    /// The activation function to be used for every neuron in the layer.
    kernel: Kernel,
    /// The network weights, `output_len` rows by `input_len` columns.
    pub(crate) weights: Mat,
    pub(crate) bias: DeviceBuffer,
    /// Output of the last forward pass.
    pub(crate) activation: DeviceBuffer,
    /// Activation derivative at the last forward pass' output.
    pub(crate) derivative: DeviceBuffer,
    /// Backpropagated error, only meaningful after a backward pass.
    pub(crate) error: DeviceBuffer,
}

impl Layer {
    /// Initializes a new, untrained layer.
    ///
    /// Arguments:
    ///
    ///  * `activator` - the activation function to be used for this layer's
    ///                  output.
    ///  * `inputs` - the number of inputs to this layer.
    ///  * `outputs` - the number of neurons in this layer.
    ///  * `weights` - the distribution initial weights are drawn from.
    ///  * `bias` - the initial bias of every neuron.
    pub(crate) fn new<R: Rng>(
        activator: Activator,
        inputs: usize,
        outputs: usize,
        weights: &Uniform<f32>,
        bias: f32,
        rng: &mut R,
    ) -> Result<Self> {
        Ok(Layer {
            kernel: activator.kernel(),
            weights: Mat::random(weights, rng, outputs, inputs)?,
            bias: DeviceBuffer::filled(outputs, bias)?,
            activation: DeviceBuffer::zeros(outputs)?,
            derivative: DeviceBuffer::zeros(outputs)?,
            error: DeviceBuffer::zeros(outputs)?,
        })
    }

    pub fn activator(&self) -> Activator {
        self.kernel.activator()
    }

    pub(crate) fn kernel(&self) -> Kernel {
        self.kernel
    }

    /// Returns the number of inputs to this layer.
    pub fn input_len(&self) -> usize {
        self.weights.cols()
    }

    /// Returns the number of neurons, and so outputs, of this layer.
    pub fn output_len(&self) -> usize {
        self.weights.rows()
    }

    /// Downloads the row-major weight matrix.
    pub fn weights(&self) -> Vec<f32> {
        self.weights.to_host()
    }

    /// Uploads a row-major weight matrix of `output_len * input_len` values.
    pub fn set_weights(&mut self, weights: &[f32]) -> Result<()> {
        let expected = self.output_len() * self.input_len();
        if weights.len() != expected {
            return Err(Error::shape("layer weights", expected, weights.len()));
        }
        self.weights.copy_from_host(weights)
    }

    pub fn bias(&self) -> Vec<f32> {
        self.bias.to_host()
    }

    pub fn set_bias(&mut self, bias: &[f32]) -> Result<()> {
        if bias.len() != self.output_len() {
            return Err(Error::shape("layer bias", self.output_len(), bias.len()));
        }
        self.bias.copy_from_host(bias)
    }

    pub fn activations(&self) -> Vec<f32> {
        self.activation.to_host()
    }

    pub fn derivatives(&self) -> Vec<f32> {
        self.derivative.to_host()
    }

    pub fn errors(&self) -> Vec<f32> {
        self.error.to_host()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn layer(inputs: usize, outputs: usize) -> Layer {
        let mut rng = StdRng::seed_from_u64(1);
        let weights = Uniform::new_inclusive(-1.0, 1.0);
        Layer::new(Activator::TanH, inputs, outputs, &weights, 1.0, &mut rng).unwrap()
    }

    #[test]
    fn new_layer_shape() {
        let layer = layer(3, 2);
        assert_eq!(layer.input_len(), 3);
        assert_eq!(layer.output_len(), 2);
        assert_eq!(layer.weights().len(), 6);
        assert_eq!(layer.bias(), vec![1.0, 1.0]);
        assert_eq!(layer.activations(), vec![0.0, 0.0]);
        assert_eq!(layer.derivatives().len(), 2);
        assert_eq!(layer.errors().len(), 2);
        assert_eq!(layer.activator(), Activator::TanH);
    }

    #[test]
    fn set_weights_checks_shape() {
        let mut layer = layer(2, 2);
        layer.set_weights(&[0.1, 0.2, 0.3, 0.4]).unwrap();
        assert_eq!(layer.weights(), vec![0.1, 0.2, 0.3, 0.4]);
        assert!(layer.set_weights(&[0.1, 0.2, 0.3]).is_err());
        assert!(layer.set_bias(&[0.0; 3]).is_err());
        layer.set_bias(&[-0.5, 0.5]).unwrap();
        assert_eq!(layer.bias(), vec![-0.5, 0.5]);
    }
}
