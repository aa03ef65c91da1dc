//! Accelerator-resident buffers.
//!
//! Every vector the engines read or write lives in a `DeviceBuffer`. A buffer
//! is owned by exactly one value, cannot be cloned, and only moves data
//! to or from the host through the explicit transfer methods below. Kernels
//! get at the storage through the crate-private `device_slice` accessors and
//! run their per-neuron bodies on the rayon pool; a launch returns only once
//! every neuron has finished.

use std::fmt;

use crate::error::{Error, Result};

/// An exclusively owned device array of `f32` values.
pub struct DeviceBuffer {
    data: Vec<f32>,
}

impl DeviceBuffer {
    /// Allocates a buffer of `len` zeros.
    pub fn zeros(len: usize) -> Result<Self> {
        DeviceBuffer::filled(len, 0.0)
    }

    /// Allocates a buffer of `len` copies of `value`.
    pub fn filled(len: usize, value: f32) -> Result<Self> {
        let mut data = allocate(len)?;
        data.resize(len, value);
        Ok(DeviceBuffer { data })
    }

    /// Allocates a buffer and uploads `host` into it.
    pub fn from_host(host: &[f32]) -> Result<Self> {
        let mut data = allocate(host.len())?;
        data.extend_from_slice(host);
        Ok(DeviceBuffer { data })
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Overwrites the buffer with `host`, which must have the same length.
    pub fn copy_from_host(&mut self, host: &[f32]) -> Result<()> {
        if host.len() != self.len() {
            return Err(Error::shape("host to device copy", self.len(), host.len()));
        }
        self.data.copy_from_slice(host);
        Ok(())
    }

    /// Copies the buffer into `host`, which must have the same length.
    pub fn copy_to_host(&self, host: &mut [f32]) -> Result<()> {
        if host.len() != self.len() {
            return Err(Error::shape("device to host copy", self.len(), host.len()));
        }
        host.copy_from_slice(&self.data);
        Ok(())
    }

    /// Downloads the whole buffer into a fresh host vector.
    pub fn to_host(&self) -> Vec<f32> {
        self.data.clone()
    }

    pub(crate) fn device_slice(&self) -> &[f32] {
        &self.data
    }

    pub(crate) fn device_slice_mut(&mut self) -> &mut [f32] {
        &mut self.data
    }
}

impl fmt::Debug for DeviceBuffer {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("DeviceBuffer").field("len", &self.len()).finish()
    }
}

/// A single device-resident value, used for per-pattern reductions that the
/// host reads back once per pattern.
#[derive(Debug)]
pub struct DeviceScalar {
    buffer: DeviceBuffer,
}

impl DeviceScalar {
    pub fn new() -> Result<Self> {
        Ok(DeviceScalar {
            buffer: DeviceBuffer::zeros(1)?,
        })
    }

    /// Blocking device to host copy of the value.
    pub fn read(&self) -> f32 {
        self.buffer.device_slice()[0]
    }

    pub(crate) fn store(&mut self, value: f32) {
        self.buffer.device_slice_mut()[0] = value;
    }
}

/// Reserves exactly `len` elements, reporting failure instead of aborting.
fn allocate(len: usize) -> Result<Vec<f32>> {
    let mut data = Vec::new();
    data.try_reserve_exact(len).map_err(|_| Error::ResourceExhausted {
        bytes: len.saturating_mul(std::mem::size_of::<f32>()),
    })?;
    Ok(data)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn upload_and_download() {
        let mut buffer = DeviceBuffer::from_host(&[1.0, 2.0, 3.0]).unwrap();
        assert_eq!(buffer.to_host(), vec![1.0, 2.0, 3.0]);

        buffer.copy_from_host(&[4.0, 5.0, 6.0]).unwrap();
        let mut host = [0.0; 3];
        buffer.copy_to_host(&mut host).unwrap();
        assert_eq!(host, [4.0, 5.0, 6.0]);
    }

    #[test]
    fn transfers_check_length() {
        let mut buffer = DeviceBuffer::zeros(2).unwrap();
        assert!(buffer.copy_from_host(&[1.0]).is_err());
        assert!(buffer.copy_to_host(&mut [0.0; 3]).is_err());
    }

    #[test]
    fn oversized_allocation_is_an_error() {
        match DeviceBuffer::zeros(usize::MAX / 2) {
            Err(Error::ResourceExhausted { .. }) => {}
            other => panic!("expected ResourceExhausted, got {:?}", other),
        }
    }

    #[test]
    fn oversized_network_is_an_error() {
        use crate::network::{Activator, Network, Seed};
        match Network::new(1 << 31, &[1 << 31], Activator::Identity, Seed::Fixed(0)) {
            Err(Error::ResourceExhausted { .. }) => {}
            other => panic!("expected ResourceExhausted, got {:?}", other),
        }
    }

    #[test]
    fn scalar_round_trip() {
        let mut scalar = DeviceScalar::new().unwrap();
        assert_eq!(scalar.read(), 0.0);
        scalar.store(0.25);
        assert_eq!(scalar.read(), 0.25);
    }
}
