//! Gradient descent weight updates.
//!
//! Runs after the complete forward and backward pass of a pattern, first
//! layer to last, so every layer reads the activations and errors that
//! pattern produced.

use rayon::prelude::*;

use crate::device::DeviceBuffer;
use crate::error::{Error, Result};
use crate::layer::Layer;
use crate::network::Network;
use crate::utils::{read_write, Front};

/// Updates the first layer's weights and biases from the raw `input` sample.
pub fn update_first_layer(layer: &mut Layer, input: &DeviceBuffer, rate: f32) -> Result<()> {
    if input.len() != layer.input_len() {
        return Err(Error::shape("first layer input", layer.input_len(), input.len()));
    }
    descend(layer, input.device_slice(), rate);
    Ok(())
}

/// Updates `layer`'s weights and biases using the previous layer's
/// activations as input.
pub fn update_layer(prev_layer: &Layer, layer: &mut Layer, rate: f32) -> Result<()> {
    if prev_layer.output_len() != layer.input_len() {
        return Err(Error::shape(
            "layer input",
            layer.input_len(),
            prev_layer.output_len(),
        ));
    }
    descend(layer, prev_layer.activation.device_slice(), rate);
    Ok(())
}

/// Applies one gradient descent step to every layer of `network`.
pub fn update(network: &mut Network, sample: &DeviceBuffer, rate: f32) -> Result<()> {
    let layers = network.layers_mut();
    update_first_layer(layers.mut_front(), sample, rate)?;
    for i in 1..layers.len() {
        let (prev_layer, layer) = read_write(layers, i - 1);
        update_layer(prev_layer, layer, rate)?;
    }
    Ok(())
}

fn descend(layer: &mut Layer, input: &[f32], rate: f32) {
    let Layer {
        weights,
        bias,
        error,
        ..
    } = layer;
    let cols = weights.cols();

    weights
        .device_slice_mut()
        .par_chunks_mut(cols)
        .zip(bias.device_slice_mut().par_iter_mut())
        .zip(error.device_slice().par_iter())
        .for_each(|((w, b), &e)| {
            for (w, &x) in w.iter_mut().zip(input) {
                *w += -rate * x * e;
            }
            *b += -rate * e;
        });
}
