//! Online backpropagation training.
//!
//! # Example
//!
//! Let's train a simple neural network to compute the XOR function:
//!
//! ```
//! # use perceptron::network::*;
//! # use perceptron::pattern::patterns;
//! # use perceptron::trainer::*;
//! // Create examples of the XOR function
//! let examples: [([f32; 2], [f32; 1]); 4] = [([0.0, 0.0], [0.0]),
//!                                            ([0.0, 1.0], [1.0]),
//!                                            ([1.0, 0.0], [1.0]),
//!                                            ([1.0, 1.0], [0.0])];
//! let examples = patterns(&examples[..]).unwrap();
//!
//! let mut network = Network::new(2, &[2, 1], Activator::Sigmoid, Seed::Fixed(7)).unwrap();
//! let report = Trainer::new()
//!     .learning_rate(0.5)
//!     .desired_error(0.01)
//!     .max_epochs(1000)
//!     .logging(Logging::Silent)
//!     .train(&mut network, &examples)
//!     .unwrap();
//!
//! assert!(report.state.is_terminal());
//! ```

use std::fmt;
use std::time::{Duration, Instant};

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use tracing::{info, warn};

use crate::backward::{backpropagate, compute_output_error};
use crate::device::DeviceScalar;
use crate::error::{Error, Result};
use crate::forward::feedforward;
use crate::history::{EpochRecord, History, HistoryRecorder};
use crate::network::Network;
use crate::pattern::TrainingPattern;
use crate::update::update;
use crate::utils::Back;

/// Default cap on the number of epochs.
pub const MAX_EPOCHS: usize = 1000;

/// Where a training run stands.
#[derive(Copy, Clone, Debug, PartialEq)]
pub enum TrainingState {
    /// `epoch` epochs have completed and training continues.
    Running { epoch: usize },
    /// The epoch MSE dropped to the desired error.
    Converged { epoch: usize, mse: f32 },
    /// The epoch cap was hit before converging.
    EpochLimitReached { epoch: usize, mse: f32 },
}

impl TrainingState {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, TrainingState::Running { .. })
    }

    /// Number of completed epochs.
    pub fn epoch(&self) -> usize {
        match *self {
            TrainingState::Running { epoch }
            | TrainingState::Converged { epoch, .. }
            | TrainingState::EpochLimitReached { epoch, .. } => epoch,
        }
    }

    /// The final MSE of a terminal state.
    pub fn mse(&self) -> Option<f32> {
        match *self {
            TrainingState::Running { .. } => None,
            TrainingState::Converged { mse, .. } | TrainingState::EpochLimitReached { mse, .. } => {
                Some(mse)
            }
        }
    }
}

impl fmt::Display for TrainingState {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match *self {
            TrainingState::Running { epoch } => write!(f, "running, {} epochs done", epoch),
            TrainingState::Converged { epoch, mse } => {
                write!(f, "converged after {} epochs (MSE {})", epoch, mse)
            }
            TrainingState::EpochLimitReached { epoch, mse } => {
                write!(f, "stopped at the {} epoch limit (MSE {})", epoch, mse)
            }
        }
    }
}

/// Logging frequency to use during training
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Logging {
    /// No logs will be emitted
    Silent,
    /// A summary will be logged at completion
    Completion,
    /// A summary will be logged after every `n` epochs
    Iterations(usize),
}

impl Logging {
    /// Performs logging after an epoch.
    fn epoch(&self, record: &EpochRecord) {
        if let Logging::Iterations(freq) = *self {
            if freq > 0 && record.epoch % freq == 0 {
                info!(
                    epoch = record.epoch,
                    mse = record.mse,
                    seconds = record.duration.as_secs_f32(),
                    "epoch finished"
                );
            }
        }
    }

    /// Performs logging at the end of training.
    fn completion(&self, state: &TrainingState, duration: Duration) {
        if let Logging::Silent = *self {
            return;
        }
        info!(
            seconds = duration.as_secs_f32(),
            "training {}", state
        );
    }
}

/// The order patterns are presented in each epoch.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Default)]
pub enum PatternOrder {
    /// The order of the pattern slice, every epoch.
    #[default]
    Fixed,
    /// A fresh Fisher-Yates permutation before every epoch, drawn from a
    /// generator seeded with `seed`.
    Shuffled { seed: u64 },
}

/// What to do when a pattern's error is not finite.
///
/// The check only reads the per-pattern error the host already copies back,
/// so it never changes the numbers training produces.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Default)]
pub enum AnomalyCheck {
    /// Let NaN and infinity propagate silently.
    #[default]
    Off,
    /// Log a warning for every epoch that saw a non-finite error.
    Warn,
    /// Stop training with `Error::NumericalAnomaly`.
    Abort,
}

/// The outcome of a finished training run.
#[derive(Clone, Debug)]
pub struct TrainingReport {
    /// Always a terminal state.
    pub state: TrainingState,
    pub epochs: usize,
    pub mse: f32,
    pub duration: Duration,
    /// Present when history recording was requested through
    /// `Trainer::record_history`.
    pub history: Option<History>,
}

/// Trains `Network`s using online gradient descent.
#[derive(Clone, Debug)]
pub struct Trainer {
    learning_rate: f32,
    desired_error: f32,
    max_epochs: usize,
    logging: Logging,
    record_history: bool,
    pattern_order: PatternOrder,
    anomaly_check: AnomalyCheck,
}

impl Default for Trainer {
    fn default() -> Self {
        Trainer::new()
    }
}

impl Trainer {
    /// Creates a new Trainer instance.
    ///
    /// The trainer is initialized with some default values. These defaults are:
    ///
    /// * A learning rate of 0.1.
    /// * Stops once the epoch MSE is at most 0.01, or after 1000 epochs.
    /// * Logs on training completion.
    /// * Records no history.
    /// * Presents patterns in their given order.
    /// * Does not check for numerical anomalies.
    pub fn new() -> Self {
        Trainer {
            learning_rate: 0.1,
            desired_error: 0.01,
            max_epochs: MAX_EPOCHS,
            logging: Logging::Completion,
            record_history: false,
            pattern_order: PatternOrder::Fixed,
            anomaly_check: AnomalyCheck::Off,
        }
    }

    /// Sets the learning rate to use during gradient descent.
    pub fn learning_rate(mut self, rate: f32) -> Self {
        self.learning_rate = rate;
        self
    }

    /// Sets the epoch MSE at or below which training has converged.
    pub fn desired_error(mut self, error: f32) -> Self {
        self.desired_error = error;
        self
    }

    /// Sets the maximum number of epochs to run.
    pub fn max_epochs(mut self, epochs: usize) -> Self {
        self.max_epochs = epochs;
        self
    }

    /// Sets the type of logging to be emitted during training.
    pub fn logging(mut self, logging: Logging) -> Self {
        self.logging = logging;
        self
    }

    /// Keeps an `EpochRecord` for every epoch in the training report.
    pub fn record_history(mut self, record: bool) -> Self {
        self.record_history = record;
        self
    }

    pub fn pattern_order(mut self, order: PatternOrder) -> Self {
        self.pattern_order = order;
        self
    }

    pub fn anomaly_check(mut self, check: AnomalyCheck) -> Self {
        self.anomaly_check = check;
        self
    }

    /// Starts a training session that advances one epoch at a time.
    ///
    /// Returns an error if the training parameters are invalid or a pattern
    /// does not fit the network.
    pub fn session<'a>(
        &'a self,
        network: &'a mut Network,
        patterns: &'a [TrainingPattern],
    ) -> Result<Session<'a>> {
        self.validate(network, patterns)?;
        let shuffle = match self.pattern_order {
            PatternOrder::Fixed => None,
            PatternOrder::Shuffled { seed } => Some(StdRng::seed_from_u64(seed)),
        };
        Ok(Session {
            trainer: self,
            network,
            patterns,
            state: TrainingState::Running { epoch: 0 },
            pattern_error: DeviceScalar::new()?,
            order: (0..patterns.len()).collect(),
            shuffle,
        })
    }

    /// Trains `network` on `patterns` until it converges or the epoch limit
    /// is reached.
    pub fn train(
        &self,
        network: &mut Network,
        patterns: &[TrainingPattern],
    ) -> Result<TrainingReport> {
        let mut history = if self.record_history {
            Some(History::new(
                network.topology(),
                self.learning_rate,
                self.desired_error,
            ))
        } else {
            None
        };
        let (state, duration) = self.run(
            network,
            patterns,
            history.as_mut().map(|h| h as &mut dyn HistoryRecorder),
        )?;
        Ok(report(state, duration, history))
    }

    /// Like `train`, but hands every epoch record to `recorder` instead of
    /// keeping a history in the report.
    pub fn train_with(
        &self,
        network: &mut Network,
        patterns: &[TrainingPattern],
        recorder: &mut dyn HistoryRecorder,
    ) -> Result<TrainingReport> {
        let (state, duration) = self.run(network, patterns, Some(recorder))?;
        Ok(report(state, duration, None))
    }

    fn run(
        &self,
        network: &mut Network,
        patterns: &[TrainingPattern],
        mut recorder: Option<&mut dyn HistoryRecorder>,
    ) -> Result<(TrainingState, Duration)> {
        let topology = network.topology();
        let mut session = self.session(network, patterns)?;
        info!(
            topology = %topology,
            patterns = patterns.len(),
            learning_rate = self.learning_rate,
            desired_error = self.desired_error,
            "starting training"
        );

        let mut duration = Duration::default();
        while !session.state().is_terminal() {
            let record = session.run_epoch()?;
            duration += record.duration;
            if let Some(recorder) = recorder.as_mut() {
                recorder.record(record);
            }
        }
        let state = session.state();
        self.logging.completion(&state, duration);
        Ok((state, duration))
    }

    /// Verifies that all provided inputs to the `Trainer` are valid, returning
    /// an error if something is wrong.
    fn validate(&self, network: &Network, patterns: &[TrainingPattern]) -> Result<()> {
        if !(self.learning_rate.is_finite() && self.learning_rate > 0.0) {
            return Err(Error::parameter("learning_rate", "must be finite and positive"));
        }
        if !(self.desired_error.is_finite() && self.desired_error >= 0.0) {
            return Err(Error::parameter("desired_error", "must be finite and not negative"));
        }
        if self.max_epochs == 0 {
            return Err(Error::parameter("max_epochs", "must be at least 1"));
        }
        check_patterns(network, patterns)
    }
}

fn report(state: TrainingState, duration: Duration, history: Option<History>) -> TrainingReport {
    TrainingReport {
        state,
        epochs: state.epoch(),
        mse: state.mse().unwrap_or(f32::NAN),
        duration,
        history,
    }
}

fn check_patterns(network: &Network, patterns: &[TrainingPattern]) -> Result<()> {
    if patterns.is_empty() {
        return Err(Error::EmptyPatternSet);
    }
    for pattern in patterns {
        if pattern.input().len() != network.input_len() {
            return Err(Error::shape(
                "pattern input",
                network.input_len(),
                pattern.input().len(),
            ));
        }
        if pattern.target().len() != network.output_len() {
            return Err(Error::shape(
                "pattern target",
                network.output_len(),
                pattern.target().len(),
            ));
        }
    }
    Ok(())
}

/// One training run, advanced an epoch at a time.
///
/// The session owns the device scalar each pattern's error is reduced into;
/// it is released when the session is dropped.
pub struct Session<'a> {
    trainer: &'a Trainer,
    network: &'a mut Network,
    patterns: &'a [TrainingPattern],
    state: TrainingState,
    pattern_error: DeviceScalar,
    order: Vec<usize>,
    shuffle: Option<StdRng>,
}

impl<'a> Session<'a> {
    pub fn state(&self) -> TrainingState {
        self.state
    }

    pub fn network(&self) -> &Network {
        &*self.network
    }

    /// Presents every pattern once, forward, backward and update in turn,
    /// then applies the stopping rule.
    pub fn run_epoch(&mut self) -> Result<EpochRecord> {
        let epoch = match self.state {
            TrainingState::Running { epoch } => epoch + 1,
            _ => return Err(Error::TrainingFinished),
        };
        if let Some(rng) = self.shuffle.as_mut() {
            self.order.shuffle(rng);
        }

        let rate = self.trainer.learning_rate;
        let start = Instant::now();
        let mut sum = 0.0f32;
        let mut anomalies = 0;
        for &i in &self.order {
            let pattern = &self.patterns[i];
            feedforward(self.network, pattern.input())?;
            backpropagate(self.network, pattern.target(), &mut self.pattern_error)?;
            let error = self.pattern_error.read();
            if !error.is_finite() {
                if self.trainer.anomaly_check == AnomalyCheck::Abort {
                    return Err(Error::NumericalAnomaly { epoch, pattern: i });
                }
                anomalies += 1;
            }
            sum += error;
            update(self.network, pattern.input(), rate)?;
        }
        let duration = start.elapsed();
        let mse = sum / self.patterns.len() as f32;

        if anomalies > 0 && self.trainer.anomaly_check == AnomalyCheck::Warn {
            warn!(epoch, anomalies, "non-finite pattern errors");
        }
        self.state = if mse <= self.trainer.desired_error {
            TrainingState::Converged { epoch, mse }
        } else if epoch >= self.trainer.max_epochs {
            TrainingState::EpochLimitReached { epoch, mse }
        } else {
            TrainingState::Running { epoch }
        };

        let record = EpochRecord {
            epoch,
            duration,
            mse,
        };
        self.trainer.logging.epoch(&record);
        Ok(record)
    }
}

/// Computes the mean pattern error of `network` over `patterns` without
/// training.
pub fn evaluate(network: &mut Network, patterns: &[TrainingPattern]) -> Result<f32> {
    check_patterns(network, patterns)?;
    let mut pattern_error = DeviceScalar::new()?;
    let mut sum = 0.0f32;
    for pattern in patterns {
        feedforward(network, pattern.input())?;
        compute_output_error(
            network.layers_mut().mut_back(),
            pattern.target(),
            &mut pattern_error,
        )?;
        sum += pattern_error.read();
    }
    Ok(sum / patterns.len() as f32)
}
