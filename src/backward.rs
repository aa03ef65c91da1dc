//! Error backpropagation.
//!
//! The output layer's error comes straight from the target; every other
//! layer's error is computed from the finished error of the layer after it,
//! walking from the last hidden layer back to the first.

use itertools::multizip;
use rayon::prelude::*;

use crate::device::{DeviceBuffer, DeviceScalar};
use crate::error::{Error, Result};
use crate::layer::Layer;
use crate::network::Network;
use crate::utils::{write_read, Back};

/// Computes the error of the output layer against `target` and stores the
/// pattern's squared error, `0.5 * sum((activation - target)^2)`, in
/// `pattern_error`.
///
/// Neurons are visited sequentially so the pattern error is always summed in
/// the same order.
pub fn compute_output_error(
    last_layer: &mut Layer,
    target: &DeviceBuffer,
    pattern_error: &mut DeviceScalar,
) -> Result<()> {
    if target.len() != last_layer.output_len() {
        return Err(Error::shape("target", last_layer.output_len(), target.len()));
    }
    let Layer {
        activation,
        derivative,
        error,
        ..
    } = last_layer;

    let mut sum = 0.0f32;
    for (e, &a, &d, &t) in multizip((
        error.device_slice_mut().iter_mut(),
        activation.device_slice().iter(),
        derivative.device_slice().iter(),
        target.device_slice().iter(),
    )) {
        let delta = a - t;
        *e = delta * d;
        sum += 0.5 * delta * delta;
    }
    pattern_error.store(sum);
    Ok(())
}

/// Computes the error of a hidden `layer` from the error of `next_layer`.
///
/// Neuron `n` collects column `n` of the next layer's weight matrix, weighted
/// by each next neuron's error.
pub fn compute_hidden_error(layer: &mut Layer, next_layer: &Layer) -> Result<()> {
    if next_layer.input_len() != layer.output_len() {
        return Err(Error::shape(
            "next layer input",
            next_layer.input_len(),
            layer.output_len(),
        ));
    }
    let cols = next_layer.input_len();
    let next_weights = next_layer.weights.device_slice();
    let next_error = next_layer.error.device_slice();
    let Layer {
        derivative, error, ..
    } = layer;

    error
        .device_slice_mut()
        .par_iter_mut()
        .zip(derivative.device_slice().par_iter())
        .enumerate()
        .for_each(|(n, (e, &d))| {
            let sum = next_error
                .iter()
                .enumerate()
                .fold(0.0f32, |sum, (k, &err)| sum + next_weights[k * cols + n] * err);
            *e = d * sum;
        });
    Ok(())
}

/// Runs the whole backward pass for `target`, assuming `network` holds the
/// activations of the matching forward pass.
pub fn backpropagate(
    network: &mut Network,
    target: &DeviceBuffer,
    pattern_error: &mut DeviceScalar,
) -> Result<()> {
    let layers = network.layers_mut();
    compute_output_error(layers.mut_back(), target, pattern_error)?;
    for c in (0..layers.len() - 1).rev() {
        let (layer, next_layer) = write_read(layers, c);
        compute_hidden_error(layer, next_layer)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::forward::feedforward;
    use crate::network::{Activator, Seed};
    use approx::assert_relative_eq;

    /// 2 inputs, 2 identity hidden neurons, 1 identity output.
    fn linear_network() -> Network {
        let mut network = Network::new(2, &[2, 1], Activator::Identity, Seed::Fixed(0)).unwrap();
        let layers = network.layers_mut();
        layers[0].set_weights(&[1.0, 0.0, 0.0, 1.0]).unwrap();
        layers[0].set_bias(&[0.0, 0.0]).unwrap();
        layers[1].set_weights(&[2.0, -3.0]).unwrap();
        layers[1].set_bias(&[0.5]).unwrap();
        network
    }

    #[test]
    fn output_error_and_pattern_error() {
        let mut network = linear_network();
        let sample = DeviceBuffer::from_host(&[1.0, 1.0]).unwrap();
        let target = DeviceBuffer::from_host(&[1.0]).unwrap();
        let mut pattern_error = DeviceScalar::new().unwrap();

        feedforward(&mut network, &sample).unwrap();
        // output = 2 - 3 + 0.5 = -0.5, delta = -1.5
        compute_output_error(network.layers_mut().mut_back(), &target, &mut pattern_error)
            .unwrap();
        assert_relative_eq!(network.layers()[1].errors()[0], -1.5);
        assert_relative_eq!(pattern_error.read(), 0.5 * 1.5 * 1.5);
    }

    #[test]
    fn hidden_error_uses_transposed_weights() {
        let mut network = linear_network();
        let sample = DeviceBuffer::from_host(&[1.0, 1.0]).unwrap();
        let target = DeviceBuffer::from_host(&[1.0]).unwrap();
        let mut pattern_error = DeviceScalar::new().unwrap();

        feedforward(&mut network, &sample).unwrap();
        backpropagate(&mut network, &target, &mut pattern_error).unwrap();
        let hidden = network.layers()[0].errors();
        assert_relative_eq!(hidden[0], 2.0 * -1.5);
        assert_relative_eq!(hidden[1], -3.0 * -1.5);
    }

    #[test]
    fn hidden_error_scales_by_derivative() {
        let mut network = Network::builder(1)
            .layer(3, Activator::Sigmoid)
            .layer(2, Activator::Sigmoid)
            .seed(Seed::Fixed(4))
            .build()
            .unwrap();
        let sample = DeviceBuffer::from_host(&[0.7]).unwrap();
        let target = DeviceBuffer::from_host(&[0.0, 1.0]).unwrap();
        let mut pattern_error = DeviceScalar::new().unwrap();

        feedforward(&mut network, &sample).unwrap();
        backpropagate(&mut network, &target, &mut pattern_error).unwrap();

        let next = &network.layers()[1];
        let (next_weights, next_error) = (next.weights(), next.errors());
        let hidden = &network.layers()[0];
        for (n, (&e, &d)) in hidden.errors().iter().zip(&hidden.derivatives()).enumerate() {
            let sum = next_weights[n] * next_error[0] + next_weights[3 + n] * next_error[1];
            assert_relative_eq!(e, d * sum);
        }
    }

    #[test]
    fn target_len_is_checked() {
        let mut network = linear_network();
        let target = DeviceBuffer::from_host(&[1.0, 2.0]).unwrap();
        let mut pattern_error = DeviceScalar::new().unwrap();
        assert!(backpropagate(&mut network, &target, &mut pattern_error).is_err());
    }
}
