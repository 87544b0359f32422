//! Instance directory - live instances bucketed by component name.
//!
//! Ordinals are handed out per name before construction and never reused,
//! so a node that fails to initialize still consumes its ordinal.

use std::collections::HashMap;

#[derive(Debug)]
pub struct InstanceDirectory<T> {
    buckets: HashMap<String, Vec<T>>,
    ordinals: HashMap<String, usize>,
}

impl<T> Default for InstanceDirectory<T> {
    fn default() -> Self {
        Self {
            buckets: HashMap::new(),
            ordinals: HashMap::new(),
        }
    }
}

impl<T> InstanceDirectory<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reserve the next ordinal for `name`.
    pub fn next_ordinal(&mut self, name: &str) -> usize {
        let next = self.ordinals.entry(name.to_string()).or_insert(0);
        let ordinal = *next;
        *next += 1;
        ordinal
    }

    /// Add an instance to the end of its name bucket.
    pub fn insert(&mut self, name: &str, instance: T) {
        self.buckets.entry(name.to_string()).or_default().push(instance);
    }

    /// Instances of `name` in creation order.
    pub fn get(&self, name: &str) -> &[T] {
        self.buckets.get(name).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Total number of instances.
    pub fn len(&self) -> usize {
        self.buckets.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
