//! Training configuration loaded from TOML.
//!
//! ```toml
//! input = 2
//! learning_rate = 0.5
//! desired_error = 0.01
//! max_epochs = 1000
//! seed = 7
//!
//! [[layers]]
//! neurons = 2
//! activator = "Sigmoid"
//!
//! [[layers]]
//! neurons = 1
//! activator = "Sigmoid"
//!
//! [data]
//! min = 0.0
//! max = 1.0
//! ```

use std::fs;
use std::path::Path;

use serde_derive::Deserialize;

use crate::error::Result;
use crate::network::{Activator, Network, Seed, INITIAL_BIAS, WEIGHT_MAX, WEIGHT_MIN};
use crate::pattern::LoadOptions;
use crate::trainer::{PatternOrder, Trainer, MAX_EPOCHS};

/// One processing layer of the configured network.
#[derive(Copy, Clone, Debug, PartialEq, Deserialize)]
pub struct LayerConfig {
    pub neurons: usize,
    pub activator: Activator,
}

/// Raw value bounds of the sample files.
#[derive(Copy, Clone, Debug, PartialEq, Deserialize)]
#[serde(default)]
pub struct DataConfig {
    pub min: f32,
    pub max: f32,
}

impl Default for DataConfig {
    fn default() -> Self {
        DataConfig { min: 0.0, max: 1.0 }
    }
}

/// Everything needed to build a network and train it.
#[derive(Clone, Debug, PartialEq, Deserialize)]
pub struct TrainingConfig {
    /// Network input width.
    pub input: usize,
    pub layers: Vec<LayerConfig>,
    #[serde(default = "default_learning_rate")]
    pub learning_rate: f32,
    #[serde(default = "default_desired_error")]
    pub desired_error: f32,
    #[serde(default = "default_max_epochs")]
    pub max_epochs: usize,
    /// Weight seed; the clock is used when absent.
    pub seed: Option<u64>,
    pub weight_range: Option<(f32, f32)>,
    pub initial_bias: Option<f32>,
    /// Seed for shuffling patterns every epoch; patterns keep their file
    /// order when absent.
    pub shuffle: Option<u64>,
    #[serde(default)]
    pub data: DataConfig,
}

fn default_learning_rate() -> f32 {
    0.1
}

fn default_desired_error() -> f32 {
    0.01
}

fn default_max_epochs() -> usize {
    MAX_EPOCHS
}

impl TrainingConfig {
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let contents = fs::read_to_string(path)?;
        Self::from_toml(&contents)
    }

    pub fn from_toml(contents: &str) -> Result<Self> {
        Ok(toml::from_str(contents)?)
    }

    /// Builds a freshly initialized network with the configured topology.
    pub fn build_network(&self) -> Result<Network> {
        let (min, max) = self.weight_range.unwrap_or((WEIGHT_MIN, WEIGHT_MAX));
        let seed = self.seed.map_or(Seed::Clock, Seed::Fixed);
        self.layers
            .iter()
            .fold(Network::builder(self.input), |builder, layer| {
                builder.layer(layer.neurons, layer.activator)
            })
            .weight_range(min, max)
            .initial_bias(self.initial_bias.unwrap_or(INITIAL_BIAS))
            .seed(seed)
            .build()
    }

    /// A trainer with the configured parameters.
    pub fn trainer(&self) -> Trainer {
        let order = match self.shuffle {
            Some(seed) => PatternOrder::Shuffled { seed },
            None => PatternOrder::Fixed,
        };
        Trainer::new()
            .learning_rate(self.learning_rate)
            .desired_error(self.desired_error)
            .max_epochs(self.max_epochs)
            .pattern_order(order)
    }

    /// Loader options matching the network's input and output widths.
    pub fn load_options(&self) -> LoadOptions {
        let outputs = self.layers.last().map_or(0, |layer| layer.neurons);
        LoadOptions::new(self.input, outputs).range(self.data.min, self.data.max)
    }
}
