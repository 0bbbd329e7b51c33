//! Identifier generation for freshly created config nodes.
//!
//! Every node created by the mutator, a reducer, a default-config factory or a
//! compatibility processor takes its `id` from an [`IdGenerator`]. Production
//! code uses random UUIDs; tests swap in [`SequentialGenerator`] to get stable,
//! predictable identifiers.

use std::sync::atomic::{AtomicU64, Ordering};
use uuid::Uuid;

/// Source of opaque, unique node identifiers.
pub trait IdGenerator: Send + Sync {
    fn next_id(&self) -> String;
}

/// Random v4 UUIDs, the format the editor writes into documents.
#[derive(Debug, Default, Clone, Copy)]
pub struct UuidGenerator;

impl IdGenerator for UuidGenerator {
    fn next_id(&self) -> String {
        Uuid::new_v4().to_string()
    }
}

/// Deterministic `<prefix>-<n>` identifiers.
#[derive(Debug)]
pub struct SequentialGenerator {
    prefix: String,
    next: AtomicU64,
}

impl SequentialGenerator {
    pub fn new(prefix: &str) -> Self {
        Self {
            prefix: prefix.to_string(),
            next: AtomicU64::new(0),
        }
    }
}

impl Default for SequentialGenerator {
    fn default() -> Self {
        Self::new("id")
    }
}

impl IdGenerator for SequentialGenerator {
    fn next_id(&self) -> String {
        let n = self.next.fetch_add(1, Ordering::Relaxed);
        format!("{}-{}", self.prefix, n)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sequential_ids_are_distinct_and_ordered() {
        let ids = SequentialGenerator::new("n");
        assert_eq!(ids.next_id(), "n-0");
        assert_eq!(ids.next_id(), "n-1");
    }

    #[test]
    fn uuid_ids_are_unique() {
        let ids = UuidGenerator;
        assert_ne!(ids.next_id(), ids.next_id());
    }
}
