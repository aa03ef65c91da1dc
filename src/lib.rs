//! Multi-layer perceptrons trained with online backpropagation.
//!
//! Every layer keeps its weights, biases and per-pattern state in device
//! buffers. Training presents one pattern at a time: a forward pass, a
//! backward pass, then a gradient descent update of every layer.
//!
//! # Example
//!
//! ```
//! use perceptron::{patterns, Activator, Logging, Network, Seed, Trainer};
//!
//! let xor: [([f32; 2], [f32; 1]); 4] = [([0.0, 0.0], [0.0]),
//!                                       ([0.0, 1.0], [1.0]),
//!                                       ([1.0, 0.0], [1.0]),
//!                                       ([1.0, 1.0], [0.0])];
//! let xor = patterns(&xor[..]).unwrap();
//!
//! let mut network = Network::builder(2)
//!     .layer(2, Activator::Sigmoid)
//!     .layer(1, Activator::Sigmoid)
//!     .seed(Seed::Fixed(1))
//!     .build()
//!     .unwrap();
//! let report = Trainer::new()
//!     .learning_rate(0.5)
//!     .logging(Logging::Silent)
//!     .train(&mut network, &xor)
//!     .unwrap();
//! println!("{}", report.state);
//!
//! let output = network.run(&[1.0, 0.0]).unwrap();
//! assert_eq!(output.len(), 1);
//! ```

pub mod activator;
pub mod backward;
pub mod config;
pub mod device;
pub mod error;
pub mod forward;
pub mod history;
pub mod layer;
pub mod network;
pub mod pattern;
pub mod trainer;
pub mod update;

mod matrix;
mod utils;

pub use crate::activator::Activator;
pub use crate::config::TrainingConfig;
pub use crate::device::{DeviceBuffer, DeviceScalar};
pub use crate::error::{Error, Result};
pub use crate::history::{EpochRecord, History, HistoryRecorder};
pub use crate::layer::Layer;
pub use crate::network::{Network, NetworkBuilder, Seed};
pub use crate::pattern::{load_patterns, patterns, LoadOptions, TrainingPattern};
pub use crate::trainer::{
    evaluate, AnomalyCheck, Logging, PatternOrder, Session, Trainer, TrainingReport,
    TrainingState,
};
