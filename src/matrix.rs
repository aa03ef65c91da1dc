use crate::device::DeviceBuffer;
use crate::error::{Error, Result};

use rand::distributions::Distribution;
use rand::Rng;

/// A dense, row-major matrix stored in a device buffer.
#[derive(Debug)]
pub struct Mat {
    rows: usize,
    cols: usize,
    data: DeviceBuffer, // row-major array
}

impl Mat {
    /// Allocates the matrix, then fills every element from `distribution` in
    /// row-major order.
    pub fn random<D, R>(distribution: &D, rng: &mut R, rows: usize, cols: usize) -> Result<Self>
    where
        D: Distribution<f32>,
        R: Rng,
    {
        let mut data = DeviceBuffer::zeros(element_count(rows, cols)?)?;
        for (w, sample) in data
            .device_slice_mut()
            .iter_mut()
            .zip(distribution.sample_iter(rng))
        {
            *w = sample;
        }
        Ok(Mat { rows, cols, data })
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    /// Replaces the contents with a row-major host array.
    pub fn copy_from_host(&mut self, host: &[f32]) -> Result<()> {
        self.data.copy_from_host(host)
    }

    /// Downloads the matrix as a row-major host array.
    pub fn to_host(&self) -> Vec<f32> {
        self.data.to_host()
    }

    pub(crate) fn device_slice(&self) -> &[f32] {
        self.data.device_slice()
    }

    pub(crate) fn device_slice_mut(&mut self) -> &mut [f32] {
        self.data.device_slice_mut()
    }
}

fn element_count(rows: usize, cols: usize) -> Result<usize> {
    rows.checked_mul(cols).ok_or(Error::ResourceExhausted { bytes: usize::MAX })
}
