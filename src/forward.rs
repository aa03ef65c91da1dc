//! Forward activation.
//!
//! One launch per layer. Neurons run in parallel; each neuron sums its
//! weighted inputs sequentially, in input order, so repeated passes produce
//! bit-identical activations.

use rayon::prelude::*;

use crate::activator::Kernel;
use crate::device::DeviceBuffer;
use crate::error::{Error, Result};
use crate::layer::Layer;
use crate::network::Network;
use crate::utils::{read_write, Front};

/// Computes the activations of the first layer from a raw `input` sample.
pub fn compute_first_layer(layer: &mut Layer, input: &DeviceBuffer) -> Result<()> {
    if input.len() != layer.input_len() {
        return Err(Error::shape("first layer input", layer.input_len(), input.len()));
    }
    activate(layer, input.device_slice());
    Ok(())
}

/// Computes the activations of `layer` from the activations of the layer
/// before it.
pub fn compute_layer(prev_layer: &Layer, layer: &mut Layer) -> Result<()> {
    if prev_layer.output_len() != layer.input_len() {
        return Err(Error::shape(
            "layer input",
            layer.input_len(),
            prev_layer.output_len(),
        ));
    }
    activate(layer, prev_layer.activation.device_slice());
    Ok(())
}

/// Feeds `sample` through every layer of `network`, in order.
pub fn feedforward(network: &mut Network, sample: &DeviceBuffer) -> Result<()> {
    let layers = network.layers_mut();
    compute_first_layer(layers.mut_front(), sample)?;
    for i in 1..layers.len() {
        let (prev_layer, layer) = read_write(layers, i - 1);
        compute_layer(prev_layer, layer)?;
    }
    Ok(())
}

fn activate(layer: &mut Layer, input: &[f32]) {
    let kernel: Kernel = layer.kernel();
    let Layer {
        weights,
        bias,
        activation,
        derivative,
        ..
    } = layer;
    let cols = weights.cols();

    weights
        .device_slice()
        .par_chunks(cols)
        .zip(bias.device_slice().par_iter())
        .zip(
            activation
                .device_slice_mut()
                .par_iter_mut()
                .zip(derivative.device_slice_mut().par_iter_mut()),
        )
        .for_each(|((w, &b), (a, d))| {
            let integration = w
                .iter()
                .zip(input)
                .fold(0.0f32, |sum, (&w, &x)| sum + w * x);
            let (value, slope) = kernel.activate(integration + b);
            *a = value;
            *d = slope;
        });
}
