//! Working-memory arena for the inference interpreter.
//!
//! The interpreter performs all intermediate computation inside one
//! pre-sized scratch region. The region is allocated exactly once at
//! startup and lives for the rest of the process: its size is a
//! build-time constant derived from the model, so an allocation failure
//! means the device does not have enough memory and nothing at runtime
//! can change that.

use parking_lot::Mutex;
use tracing::{debug, info};

use mudra_core::{Error, Result};

/// Single fixed-size scratch region handed to the inference interpreter
pub struct TensorArena {
    region: Mutex<Option<Box<[u8]>>>,
}

impl TensorArena {
    /// Default sizing for the 96x96 gesture model: input image copy plus
    /// interpreter scratch space
    pub const DEFAULT_BYTES: usize = 96 * 96 * 4 + 330_000;

    pub fn new() -> Self {
        Self {
            region: Mutex::new(None),
        }
    }

    /// Allocate the region if it has not been allocated yet.
    ///
    /// Idempotent: repeated calls are no-ops and the first allocation
    /// wins, whatever size later calls request. Allocation failure is
    /// fatal for the caller; there is no fallback pool and no retry.
    pub fn ensure_allocated(&self, size: usize) -> Result<()> {
        if size == 0 {
            return Err(Error::Config("arena size must be non-zero".into()));
        }

        let mut slot = self.region.lock();
        if let Some(region) = slot.as_ref() {
            debug!("tensor arena already allocated ({} bytes)", region.len());
            return Ok(());
        }

        let mut buf: Vec<u8> = Vec::new();
        buf.try_reserve_exact(size)
            .map_err(|_| Error::ArenaAllocation { requested: size })?;
        buf.resize(size, 0);
        *slot = Some(buf.into_boxed_slice());

        info!("tensor arena allocated: {} bytes", size);
        Ok(())
    }

    pub fn is_allocated(&self) -> bool {
        self.region.lock().is_some()
    }

    /// Allocated capacity in bytes, 0 before allocation
    pub fn capacity(&self) -> usize {
        self.region.lock().as_ref().map_or(0, |r| r.len())
    }

    /// Run `f` with mutable access to the scratch region.
    ///
    /// This is how the interpreter borrows the arena for the duration of
    /// one invocation; the pipeline itself never reads the region.
    pub fn with_region<T>(&self, f: impl FnOnce(&mut [u8]) -> T) -> Result<T> {
        let mut slot = self.region.lock();
        match slot.as_mut() {
            Some(region) => Ok(f(region)),
            None => Err(Error::InvalidInput("tensor arena not allocated".into())),
        }
    }
}

impl Default for TensorArena {
    fn default() -> Self {
        Self::new()
    }
}
