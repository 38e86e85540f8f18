//! Exclusive leases on sandboxes
//!
//! A provisioning run holds the lease on its sandbox for its whole duration,
//! so no second operation can target the same sandbox concurrently.

use std::collections::HashSet;
use std::sync::{Arc, Mutex, MutexGuard};

use tracing::debug;

use crate::errors::SandboxError;

/// Registry of sandboxes currently leased in this process
#[derive(Debug, Clone, Default)]
pub struct LeaseRegistry {
    held: Arc<Mutex<HashSet<String>>>,
}

impl LeaseRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Take the lease on `id`, failing if it is already held
    pub fn acquire(&self, id: &str) -> Result<Lease, SandboxError> {
        if !lock(&self.held).insert(id.to_string()) {
            return Err(SandboxError::Leased(id.to_string()));
        }

        debug!("Lease acquired on sandbox {}", id);
        Ok(Lease {
            id: id.to_string(),
            held: self.held.clone(),
        })
    }

    pub fn is_leased(&self, id: &str) -> bool {
        lock(&self.held).contains(id)
    }
}

/// Held lease; released on drop
#[derive(Debug)]
pub struct Lease {
    id: String,
    held: Arc<Mutex<HashSet<String>>>,
}

impl Lease {
    pub fn id(&self) -> &str {
        &self.id
    }
}

impl Drop for Lease {
    fn drop(&mut self) {
        lock(&self.held).remove(&self.id);
        debug!("Lease released on sandbox {}", self.id);
    }
}

fn lock(held: &Mutex<HashSet<String>>) -> MutexGuard<'_, HashSet<String>> {
    // The set stays consistent even if a holder panicked
    held.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}
