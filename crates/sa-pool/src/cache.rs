//! Bounded cache of ready-to-use clients
//!
//! Building a client from a service account file costs an OAuth round-trip, so
//! clients are built ahead of time and reused round-robin: `take` hands out the
//! front pair and moves it to the back rather than consuming it.

use std::collections::VecDeque;

use crate::error::{Error, Result};

/// A network client paired with the typed service handle built on top of it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Preloaded<C, S> {
    pub client: C,
    pub service: S,
}

impl<C, S> Preloaded<C, S> {
    pub fn new(client: C, service: S) -> Self {
        Self { client, service }
    }
}

/// Fixed-capacity deque of preloaded pairs; the front is the freshest.
#[derive(Debug)]
pub struct PreloadedCache<C, S> {
    entries: VecDeque<Preloaded<C, S>>,
    max: usize,
}

impl<C: Clone, S: Clone> PreloadedCache<C, S> {
    pub fn new(max: usize) -> Self {
        Self {
            entries: VecDeque::with_capacity(max),
            max,
        }
    }

    /// Push to the front, dropping whatever falls past `max` at the back.
    pub fn offer(&mut self, pair: Preloaded<C, S>) {
        self.entries.push_front(pair);
        self.entries.truncate(self.max);
    }

    /// Prepend a batch, keeping its order, ahead of the existing pairs.
    pub fn prepend(&mut self, batch: Vec<Preloaded<C, S>>) {
        for pair in batch.into_iter().rev() {
            self.entries.push_front(pair);
        }
        self.entries.truncate(self.max);
    }

    /// Hand out the front pair and rotate it to the back.
    pub fn take(&mut self) -> Result<Preloaded<C, S>> {
        let pair = self.entries.pop_front().ok_or(Error::EmptyCache)?;
        self.entries.push_back(pair.clone());
        Ok(pair)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.max
    }

    pub fn iter(&self) -> impl Iterator<Item = &Preloaded<C, S>> {
        self.entries.iter()
    }
}
