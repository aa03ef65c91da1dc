//! Per-epoch training history.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;
use std::time::Duration;

use serde_derive::{Deserialize, Serialize};

use crate::error::Result;

/// What one epoch of training took and achieved.
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct EpochRecord {
    /// 1-based epoch number.
    pub epoch: usize,
    /// Wall time spent presenting every pattern.
    pub duration: Duration,
    /// Mean pattern error at the end of the epoch.
    pub mse: f32,
}

/// Receives one record per finished epoch.
pub trait HistoryRecorder {
    fn record(&mut self, record: EpochRecord);
}

impl<F: FnMut(EpochRecord)> HistoryRecorder for F {
    fn record(&mut self, record: EpochRecord) {
        self(record)
    }
}

/// The history of one training run, along with the settings it ran with.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct History {
    /// Network layout, see `Network::topology`.
    pub topology: String,
    pub learning_rate: f32,
    pub desired_error: f32,
    pub epochs: Vec<EpochRecord>,
}

impl History {
    pub fn new<S: Into<String>>(topology: S, learning_rate: f32, desired_error: f32) -> Self {
        History {
            topology: topology.into(),
            learning_rate,
            desired_error,
            epochs: Vec::new(),
        }
    }

    /// Total wall time over all recorded epochs.
    pub fn duration(&self) -> Duration {
        self.epochs.iter().map(|e| e.duration).sum()
    }

    pub fn last(&self) -> Option<&EpochRecord> {
        self.epochs.last()
    }

    /// Writes the history to `path` as pretty printed JSON.
    pub fn write_json<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let mut writer = BufWriter::new(File::create(path)?);
        serde_json::to_writer_pretty(&mut writer, self)?;
        writer.write_all(b"\n")?;
        writer.flush()?;
        Ok(())
    }

    pub fn read_json<P: AsRef<Path>>(path: P) -> Result<Self> {
        let file = File::open(path)?;
        Ok(serde_json::from_reader(file)?)
    }
}

impl HistoryRecorder for History {
    fn record(&mut self, record: EpochRecord) {
        self.epochs.push(record);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn record(epoch: usize, millis: u64, mse: f32) -> EpochRecord {
        EpochRecord {
            epoch,
            duration: Duration::from_millis(millis),
            mse,
        }
    }

    #[test]
    fn records_in_order() {
        let mut history = History::new("2-2-1", 0.5, 0.01);
        history.record(record(1, 10, 0.3));
        history.record(record(2, 15, 0.2));
        assert_eq!(history.epochs.len(), 2);
        assert_eq!(history.last().unwrap().epoch, 2);
        assert_eq!(history.duration(), Duration::from_millis(25));
    }

    #[test]
    fn closures_are_recorders() {
        let mut seen = Vec::new();
        {
            let mut recorder = |r: EpochRecord| seen.push(r.mse);
            recorder.record(record(1, 1, 0.5));
            recorder.record(record(2, 1, 0.25));
        }
        assert_eq!(seen, vec![0.5, 0.25]);
    }

    #[test]
    fn json_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("history.json");
        let mut history = History::new("3-1", 0.1, 0.001);
        history.record(record(1, 3, 0.125));
        history.write_json(&path).unwrap();
        assert_eq!(History::read_json(&path).unwrap(), history);
    }
}
