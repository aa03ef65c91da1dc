//! Training patterns and the text file loader.
//!
//! Pattern files hold one pattern per line with fields separated by `;`:
//!
//! ```text
//! 0;0
//! 0;255
//! ```
//!
//! Samples and targets live in two files whose lines are matched up in
//! order. Sample values are min-max normalized on load; targets are taken
//! as they are.

use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};

use crate::device::DeviceBuffer;
use crate::error::{Error, Result};

/// An `(input, target)` pair, uploaded to the device once on construction.
#[derive(Debug)]
pub struct TrainingPattern {
    input: DeviceBuffer,
    target: DeviceBuffer,
}

impl TrainingPattern {
    pub fn new(input: &[f32], target: &[f32]) -> Result<Self> {
        Ok(TrainingPattern {
            input: DeviceBuffer::from_host(input)?,
            target: DeviceBuffer::from_host(target)?,
        })
    }

    pub fn input(&self) -> &DeviceBuffer {
        &self.input
    }

    pub fn target(&self) -> &DeviceBuffer {
        &self.target
    }
}

/// Uploads a list of host `(input, target)` pairs, keeping their order.
pub fn patterns<I, O>(examples: &[(I, O)]) -> Result<Vec<TrainingPattern>>
where
    I: AsRef<[f32]>,
    O: AsRef<[f32]>,
{
    examples
        .iter()
        .map(|(input, target)| TrainingPattern::new(input.as_ref(), target.as_ref()))
        .collect()
}

/// Maps every value from `[min, max]` onto `[0, 1]`.
///
/// `min` and `max` are the bounds of the raw data, not of the output.
pub fn normalize_min_max(values: &mut [f32], min: f32, max: f32) {
    let range = max - min;
    for v in values {
        *v = (*v - min) / range;
    }
}

/// Describes the layout of a pair of pattern files.
#[derive(Clone, Debug, PartialEq)]
pub struct LoadOptions {
    /// Fields per sample line.
    pub input_len: usize,
    /// Fields per target line.
    pub target_len: usize,
    /// Smallest raw sample value, used for normalization.
    pub min: f32,
    /// Largest raw sample value, used for normalization.
    pub max: f32,
    /// Reads only the first `limit` lines of each file when set.
    pub limit: Option<usize>,
}

impl LoadOptions {
    pub fn new(input_len: usize, target_len: usize) -> Self {
        LoadOptions {
            input_len,
            target_len,
            min: 0.0,
            max: 1.0,
            limit: None,
        }
    }

    /// Sets the bounds of the raw sample values.
    pub fn range(mut self, min: f32, max: f32) -> Self {
        self.min = min;
        self.max = max;
        self
    }

    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }
}

/// Loads patterns from a sample file and a target file.
///
/// Both files are opened before anything is parsed; if either cannot be
/// opened, `Error::CannotOpen` is returned and nothing is loaded.
pub fn load_patterns<P, Q>(samples: P, targets: Q, options: &LoadOptions) -> Result<Vec<TrainingPattern>>
where
    P: AsRef<Path>,
    Q: AsRef<Path>,
{
    if !(options.min.is_finite() && options.max.is_finite() && options.min < options.max) {
        return Err(Error::parameter(
            "range",
            format!("[{}, {}] is not a finite, non-empty interval", options.min, options.max),
        ));
    }
    let samples = samples.as_ref();
    let targets = targets.as_ref();
    let sample_file = open(samples)?;
    let target_file = open(targets)?;

    let mut inputs = read_rows(sample_file, samples, options.input_len, options.limit)?;
    let outputs = read_rows(target_file, targets, options.target_len, options.limit)?;
    if inputs.len() != outputs.len() {
        let shorter = if inputs.len() < outputs.len() { samples } else { targets };
        return Err(Error::Parse {
            path: shorter.to_path_buf(),
            line: inputs.len().min(outputs.len()) + 1,
            message: format!(
                "{} sample lines but {} target lines",
                inputs.len(),
                outputs.len()
            ),
        });
    }

    for input in &mut inputs {
        normalize_min_max(input, options.min, options.max);
    }
    inputs
        .iter()
        .zip(&outputs)
        .map(|(input, target)| TrainingPattern::new(input, target))
        .collect()
}

fn open(path: &Path) -> Result<File> {
    File::open(path).map_err(|source| Error::CannotOpen {
        path: path.to_path_buf(),
        source,
    })
}

/// Parses `;` separated lines of exactly `fields` numbers each.
fn read_rows<R: Read>(
    source: R,
    path: &Path,
    fields: usize,
    limit: Option<usize>,
) -> Result<Vec<Vec<f32>>> {
    let parse_error = |line: usize, message: String| Error::Parse {
        path: PathBuf::from(path),
        line,
        message,
    };
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(b';')
        .has_headers(false)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(source);

    let mut rows = Vec::new();
    for (i, record) in reader.records().enumerate() {
        if limit.map_or(false, |limit| rows.len() >= limit) {
            break;
        }
        let record = record.map_err(|err| {
            let line = err.position().map_or(i + 1, |p| p.line() as usize);
            parse_error(line, err.to_string())
        })?;
        let line = record.position().map_or(i + 1, |p| p.line() as usize);

        let row = record
            .iter()
            .filter(|field| !field.is_empty())
            .map(|field| {
                field
                    .parse::<f32>()
                    .map_err(|_| parse_error(line, format!("`{}` is not a number", field)))
            })
            .collect::<Result<Vec<f32>>>()?;
        if row.len() != fields {
            return Err(parse_error(
                line,
                format!("expected {} fields, found {}", fields, row.len()),
            ));
        }
        rows.push(row);
    }
    Ok(rows)
}
