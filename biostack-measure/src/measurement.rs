//! Measurements and their backing store.

#![allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]

use std::collections::BTreeMap;

use biostack_core::{distance_scaled, typed_id, IdAllocator, Point};

use crate::binding::BindingRef;
use crate::error::{MeasureError, Result};
use crate::group::GroupId;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

typed_id! {
    /// Identifies a measurement within a [`MeasurementStore`].
    pub struct MeasurementId;
}

typed_id! {
    /// Tag shared by the copies of one standard measurement.
    pub struct StandardId;
}

/// An RGB display color.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    pub const WHITE: Self = Self::new(255, 255, 255);
    pub const YELLOW: Self = Self::new(255, 255, 0);

    #[inline]
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }
}

impl Default for Rgb {
    fn default() -> Self {
        Self::WHITE
    }
}

/// Geometric kind, derived from the number of values.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum MeasurementKind {
    Point,
    Line,
    Polygon,
}

/// A user-authored point, line or polygon annotation.
///
/// Values are stored in stack coordinates, so `z` is the slice the value
/// sits on. Bindings displaying the measurement register themselves as
/// observers; the measurement never owns them.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Measurement {
    values: Vec<Point>,
    color: Rgb,
    group: GroupId,
    standard: Option<StandardId>,
    killed: bool,
    #[cfg_attr(feature = "serde", serde(skip))]
    observers: Vec<BindingRef>,
}

impl Measurement {
    /// Creates a measurement from one or more values.
    pub fn new(values: Vec<Point>, color: Rgb, group: GroupId) -> Result<Self> {
        if values.is_empty() {
            return Err(MeasureError::EmptyValues);
        }
        Ok(Self {
            values,
            color,
            group,
            standard: None,
            killed: false,
            observers: Vec::new(),
        })
    }

    /// A single-point measurement.
    pub fn point(at: Point, color: Rgb, group: GroupId) -> Self {
        Self {
            values: vec![at],
            color,
            group,
            standard: None,
            killed: false,
            observers: Vec::new(),
        }
    }

    /// A two-point line measurement.
    pub fn line(a: Point, b: Point, color: Rgb, group: GroupId) -> Self {
        Self {
            values: vec![a, b],
            ..Self::point(a, color, group)
        }
    }

    #[inline]
    pub fn values(&self) -> &[Point] {
        &self.values
    }

    pub fn kind(&self) -> MeasurementKind {
        match self.values.len() {
            1 => MeasurementKind::Point,
            2 => MeasurementKind::Line,
            _ => MeasurementKind::Polygon,
        }
    }

    #[inline]
    pub fn color(&self) -> Rgb {
        self.color
    }

    #[inline]
    pub fn group(&self) -> GroupId {
        self.group
    }

    #[inline]
    pub fn standard_id(&self) -> Option<StandardId> {
        self.standard
    }

    #[inline]
    pub fn is_killed(&self) -> bool {
        self.killed
    }

    /// Bindings currently displaying this measurement.
    #[inline]
    pub fn observers(&self) -> &[BindingRef] {
        &self.observers
    }

    /// Replaces the values.
    ///
    /// Returns the observers that must be refreshed: every observer except
    /// `origin`, the binding the change came from.
    pub fn set_values(
        &mut self,
        values: Vec<Point>,
        origin: Option<BindingRef>,
    ) -> Result<Vec<BindingRef>> {
        if values.len() != self.values.len() {
            return Err(MeasureError::ValueCount {
                expected: self.values.len(),
                found: values.len(),
            });
        }
        self.values = values;
        Ok(self
            .observers
            .iter()
            .copied()
            .filter(|r| Some(*r) != origin)
            .collect())
    }

    pub fn set_color(&mut self, color: Rgb) {
        self.color = color;
    }

    pub fn set_group(&mut self, group: GroupId) {
        self.group = group;
    }

    pub(crate) fn set_standard(&mut self, standard: Option<StandardId>) {
        self.standard = standard;
    }

    /// Marks the measurement dead.
    ///
    /// Returns the observers, each of which must be refreshed so that it
    /// releases its lease.
    pub fn kill(&mut self) -> Vec<BindingRef> {
        self.killed = true;
        self.observers.clone()
    }

    /// The slice every value sits on, if they all agree.
    pub fn common_slice(&self) -> Option<usize> {
        let first = self.values.first()?.z.round();
        if !first.is_finite() || first < 0.0 {
            return None;
        }
        self.values
            .iter()
            .all(|p| p.z.round() == first)
            .then_some(first as usize)
    }

    /// Physical length of a line, or perimeter of a polygon.
    ///
    /// `scale` converts pixel and slice units per axis. Points have no
    /// length.
    pub fn length(&self, scale: [f64; 3]) -> Option<f64> {
        match self.kind() {
            MeasurementKind::Point => None,
            MeasurementKind::Line => Some(distance_scaled(self.values[0], self.values[1], scale)),
            MeasurementKind::Polygon => {
                let n = self.values.len();
                Some(
                    (0..n)
                        .map(|i| distance_scaled(self.values[i], self.values[(i + 1) % n], scale))
                        .sum(),
                )
            }
        }
    }

    /// A fresh copy moved onto `slice`, keeping color, group and standard
    /// tag but none of the observers.
    pub fn clone_to_slice(&self, slice: usize) -> Self {
        #[allow(clippy::cast_precision_loss)]
        let z = slice as f64;
        Self {
            values: self.values.iter().map(|p| p.with_z(z)).collect(),
            color: self.color,
            group: self.group,
            standard: self.standard,
            killed: false,
            observers: Vec::new(),
        }
    }

    pub(crate) fn observe(&mut self, binding: BindingRef) {
        if !self.observers.contains(&binding) {
            self.observers.push(binding);
        }
    }

    pub(crate) fn unobserve(&mut self, binding: BindingRef) {
        self.observers.retain(|r| *r != binding);
    }
}

/// Owns every measurement, keyed by id.
#[derive(Debug, Default)]
pub struct MeasurementStore {
    items: BTreeMap<MeasurementId, Measurement>,
    ids: IdAllocator,
}

impl MeasurementStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a measurement and returns its new id.
    pub fn insert(&mut self, measurement: Measurement) -> MeasurementId {
        let id = MeasurementId(self.ids.allocate());
        self.items.insert(id, measurement);
        id
    }

    #[inline]
    pub fn get(&self, id: MeasurementId) -> Option<&Measurement> {
        self.items.get(&id)
    }

    #[inline]
    pub fn get_mut(&mut self, id: MeasurementId) -> Option<&mut Measurement> {
        self.items.get_mut(&id)
    }

    pub fn remove(&mut self, id: MeasurementId) -> Option<Measurement> {
        self.items.remove(&id)
    }

    pub fn contains(&self, id: MeasurementId) -> bool {
        self.items.contains_key(&id)
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Drops every measurement. Ids are not reused.
    pub fn clear(&mut self) {
        self.items.clear();
    }

    pub fn iter(&self) -> impl Iterator<Item = (MeasurementId, &Measurement)> {
        self.items.iter().map(|(id, m)| (*id, m))
    }

    /// Ids of every measurement carrying `standard`.
    pub fn with_standard(&self, standard: StandardId) -> Vec<MeasurementId> {
        self.iter()
            .filter(|(_, m)| m.standard_id() == Some(standard))
            .map(|(id, _)| id)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::binding::BindingId;
    use crate::pool::Dimension;
    use approx::assert_relative_eq;

    fn line() -> Measurement {
        Measurement::line(
            Point::new(0.0, 0.0, 2.0),
            Point::new(3.0, 4.0, 2.0),
            Rgb::YELLOW,
            GroupId::NONE,
        )
    }

    #[test]
    fn test_kind_from_value_count() {
        assert!(matches!(
            Measurement::new(vec![], Rgb::WHITE, GroupId::NONE),
            Err(MeasureError::EmptyValues)
        ));
        assert_eq!(line().kind(), MeasurementKind::Line);
        let tri = Measurement::new(vec![Point::ORIGIN; 3], Rgb::WHITE, GroupId::NONE).unwrap();
        assert_eq!(tri.kind(), MeasurementKind::Polygon);
    }

    #[test]
    fn test_set_values_skips_origin() {
        let mut m = line();
        let a = BindingRef::new(Dimension::Two, BindingId(1));
        let b = BindingRef::new(Dimension::Three, BindingId(1));
        m.observe(a);
        m.observe(b);
        m.observe(a);
        assert_eq!(m.observers().len(), 2);

        let siblings = m.set_values(line().values().to_vec(), Some(a)).unwrap();
        assert_eq!(siblings, vec![b]);

        let all = m.set_values(line().values().to_vec(), None).unwrap();
        assert_eq!(all.len(), 2);

        assert!(m.set_values(vec![Point::ORIGIN], None).is_err());
    }

    #[test]
    fn test_kill_returns_observers() {
        let mut m = line();
        let a = BindingRef::new(Dimension::Two, BindingId(7));
        m.observe(a);
        assert_eq!(m.kill(), vec![a]);
        assert!(m.is_killed());
    }

    #[test]
    fn test_length_and_common_slice() {
        let m = line();
        assert_relative_eq!(m.length([1.0, 1.0, 1.0]).unwrap(), 5.0);
        assert_relative_eq!(m.length([2.0, 2.0, 1.0]).unwrap(), 10.0);
        assert_eq!(m.common_slice(), Some(2));

        let mut tilted = line();
        tilted
            .set_values(vec![Point::new(0.0, 0.0, 1.0), Point::new(1.0, 1.0, 3.0)], None)
            .unwrap();
        assert_eq!(tilted.common_slice(), None);
    }

    #[test]
    fn test_clone_to_slice_is_detached() {
        let mut m = line();
        m.observe(BindingRef::new(Dimension::Two, BindingId(0)));
        m.set_standard(Some(StandardId(3)));
        let c = m.clone_to_slice(4);
        assert!(c.observers().is_empty());
        assert_eq!(c.standard_id(), Some(StandardId(3)));
        assert!(c.values().iter().all(|p| p.z == 4.0));
        assert_eq!(c.color(), Rgb::YELLOW);
    }

    #[test]
    fn test_store_ids_not_reused() {
        let mut store = MeasurementStore::new();
        let a = store.insert(line());
        store.clear();
        let b = store.insert(line());
        assert_ne!(a, b);
        assert_eq!(store.len(), 1);
    }
}
