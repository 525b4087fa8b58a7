//! Per-coordinate measurement lists.

use crate::measurement::MeasurementId;

/// The ordered measurements filed at one (timestep, slice).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MeasurementList {
    timestep: usize,
    slice: usize,
    entries: Vec<MeasurementId>,
}

impl MeasurementList {
    pub fn new(timestep: usize, slice: usize) -> Self {
        Self {
            timestep,
            slice,
            entries: Vec::new(),
        }
    }

    /// `(timestep, slice)` this list belongs to.
    #[inline]
    pub fn coordinate(&self) -> (usize, usize) {
        (self.timestep, self.slice)
    }

    #[inline]
    pub fn entries(&self) -> &[MeasurementId] {
        &self.entries
    }

    pub fn contains(&self, id: MeasurementId) -> bool {
        self.entries.contains(&id)
    }

    pub(crate) fn push(&mut self, id: MeasurementId) {
        self.entries.push(id);
    }

    /// Removes `id`, keeping the order of the rest. Returns false if absent.
    pub(crate) fn remove(&mut self, id: MeasurementId) -> bool {
        match self.entries.iter().position(|e| *e == id) {
            Some(i) => {
                self.entries.remove(i);
                true
            }
            None => false,
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
