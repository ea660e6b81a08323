use std::collections::HashSet;

use parking_lot::Mutex;

use super::kernel_key::KernelKey;
use crate::backends::common::Backend;

/// Kernels whose dynamic shared memory ceiling was already raised, per device.
///
/// The attribute is process wide and idempotent. The lock is held across the
/// driver call so each kernel is configured exactly once even when several
/// threads launch it for the first time concurrently.
#[derive(Debug, Default)]
pub struct SharedMemoryOptIns {
    configured: Mutex<HashSet<(i32, KernelKey)>>,
}

impl SharedMemoryOptIns {
    pub fn new() -> Self {
        Self::default()
    }

    /// Raises the ceiling of `function` to `bytes` unless already done.
    /// Returns whether the backend was called.
    pub fn ensure<B: Backend>(
        &self,
        backend: &B,
        device: i32,
        key: &KernelKey,
        function: &B::Function,
        bytes: usize,
    ) -> Result<bool, B::Error> {
        let mut configured = self.configured.lock();
        if configured.contains(&(device, *key)) {
            return Ok(false);
        }
        backend.set_max_dynamic_shared_memory(function, bytes)?;
        configured.insert((device, *key));
        log::debug!("raised dynamic shared memory of {key} on device {device} to {bytes} bytes");
        Ok(true)
    }

    pub fn is_configured(
        &self,
        device: i32,
        key: &KernelKey,
    ) -> bool {
        self.configured.lock().contains(&(device, *key))
    }
}
