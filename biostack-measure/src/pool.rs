//! Endpoint pools.
//!
//! A pool owns every endpoint shown on one display surface. Endpoints are
//! allocated in blocks, leased to bindings while their measurement is
//! displayed, and returned to a free list afterwards; they are never
//! destroyed. The pool also builds the aggregate line geometry of its
//! bindings and resolves pointer picks against them.

#![allow(
    clippy::cast_possible_truncation,
    clippy::cast_precision_loss,
    clippy::cast_sign_loss
)]

use std::collections::BTreeMap;
use std::fmt;
use std::ops::Range;

use biostack_core::{distance_to_segment, segment_intersects_rect, IdAllocator, LeaseError, Point, Rect};
use log::{debug, trace, warn};

use crate::binding::{Binding, BindingId, BindingRef};
use crate::endpoint::{Endpoint, EndpointId};
use crate::error::{MeasureError, Result};
use crate::measurement::{MeasurementId, MeasurementStore, Rgb};
use crate::projection::ScreenProjection;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Half-width of the off-slice marker glyph when no size has been set.
const DEFAULT_MARKER_SIZE: f64 = 1.0;

/// A release within this many pixels of its press is a click.
const CLICK_SLOP_PX: f64 = 3.0;

/// Which display surface a pool serves.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum Dimension {
    /// Single-slice image view.
    Two,
    /// Volume view showing every slice of a timestep.
    Three,
}

impl fmt::Display for Dimension {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Two => write!(f, "2-D"),
            Self::Three => write!(f, "3-D"),
        }
    }
}

/// Configuration for endpoint pools.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct PoolConfig {
    /// Endpoints are allocated in multiples of this many.
    pub block_size: usize,
    /// Pick radius in screen pixels.
    pub pick_threshold_px: f64,
    /// Half-width of the off-slice marker glyph in domain units.
    pub marker_size: Option<f64>,
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            block_size: 15,
            pick_threshold_px: 10.0,
            marker_size: None,
        }
    }
}

impl PoolConfig {
    #[must_use]
    pub fn with_block_size(mut self, size: usize) -> Self {
        self.block_size = size;
        self
    }

    #[must_use]
    pub fn with_pick_threshold(mut self, pixels: f64) -> Self {
        self.pick_threshold_px = pixels;
        self
    }

    #[must_use]
    pub fn with_marker_size(mut self, size: f64) -> Self {
        self.marker_size = Some(size);
        self
    }
}

/// A connected run of points, closed if the last point repeats the first.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Polyline {
    pub points: Vec<Point>,
    pub color: Rgb,
    pub selected: bool,
}

/// A point measurement.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Marker {
    pub position: Point,
    pub color: Rgb,
    pub selected: bool,
}

/// Everything a pool asks the renderer to draw besides the handles.
#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct LineSet {
    /// Line segments and closed polygon loops.
    pub lines: Vec<Polyline>,
    /// Point measurements.
    pub points: Vec<Marker>,
    /// "X" glyph strokes marking values that lie on another slice.
    pub crosses: Vec<Polyline>,
}

impl LineSet {
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty() && self.points.is_empty() && self.crosses.is_empty()
    }
}

/// Outcome of an endpoint drag that changed a measurement.
#[derive(Debug, Clone, PartialEq)]
pub struct ValueChange {
    /// Binding whose endpoint was dragged.
    pub binding: BindingId,
    pub measurement: MeasurementId,
    /// Other bindings of the measurement, which must now be refreshed.
    pub siblings: Vec<BindingRef>,
}

#[derive(Debug, Clone, Copy)]
struct Press {
    x: f64,
    y: f64,
    extend: bool,
    dragged: bool,
}

/// Recycling manager of endpoints for one display surface.
#[derive(Debug)]
pub struct Pool {
    dim: Dimension,
    config: PoolConfig,
    /// Every endpoint ever allocated, indexed by [`EndpointId`].
    endpoint_pool: Vec<Endpoint>,
    /// Unleased endpoints; the last entry is handed out first.
    free_endpoints: Vec<EndpointId>,
    leases: BTreeMap<BindingId, Vec<EndpointId>>,
    bindings: BTreeMap<BindingId, Binding>,
    binding_ids: IdAllocator,
    current_slice: usize,
    slice_count: usize,
    selection: Vec<BindingId>,
    /// Endpoint ranges allocated since the surface last collected them.
    pending_registration: Vec<Range<usize>>,
    press: Option<Press>,
}

impl Pool {
    /// Creates a pool with one block of endpoints pre-allocated.
    pub fn new(dim: Dimension, config: PoolConfig) -> Self {
        let mut pool = Self {
            dim,
            config,
            endpoint_pool: Vec::new(),
            free_endpoints: Vec::new(),
            leases: BTreeMap::new(),
            bindings: BTreeMap::new(),
            binding_ids: IdAllocator::new(),
            current_slice: 0,
            slice_count: 1,
            selection: Vec::new(),
            pending_registration: Vec::new(),
            press: None,
        };
        pool.grow(1);
        pool
    }

    #[inline]
    pub fn dimension(&self) -> Dimension {
        self.dim
    }

    #[inline]
    pub fn config(&self) -> &PoolConfig {
        &self.config
    }

    pub fn set_marker_size(&mut self, size: f64) {
        self.config.marker_size = Some(size);
    }

    #[inline]
    pub fn current_slice(&self) -> usize {
        self.current_slice
    }

    #[inline]
    pub fn slice_count(&self) -> usize {
        self.slice_count
    }

    pub fn set_slice_count(&mut self, slices: usize) {
        self.slice_count = slices.max(1);
    }

    /// Number of endpoints ever allocated.
    #[inline]
    pub fn total_endpoints(&self) -> usize {
        self.endpoint_pool.len()
    }

    #[inline]
    pub fn free_count(&self) -> usize {
        self.free_endpoints.len()
    }

    /// Number of endpoints currently leased to bindings.
    pub fn leased_count(&self) -> usize {
        self.leases.values().map(Vec::len).sum()
    }

    pub fn endpoint(&self, id: EndpointId) -> Option<&Endpoint> {
        self.endpoint_pool.get(id.index())
    }

    /// Endpoints leased to `binding`, in measurement value order.
    pub fn lease_of(&self, binding: BindingId) -> Option<&[EndpointId]> {
        self.leases.get(&binding).map(Vec::as_slice)
    }

    pub fn binding(&self, id: BindingId) -> Option<&Binding> {
        self.bindings.get(&id)
    }

    pub fn bindings(&self) -> impl Iterator<Item = &Binding> {
        self.bindings.values()
    }

    /// Bindings in this pool that display `measurement`.
    pub fn bindings_for(&self, measurement: MeasurementId) -> Vec<BindingId> {
        self.bindings
            .values()
            .filter(|b| b.measurement() == measurement)
            .map(Binding::id)
            .collect()
    }

    /// Endpoint ranges allocated since the last call.
    ///
    /// The display surface registers each range as one batch.
    pub fn take_registrations(&mut self) -> Vec<Range<usize>> {
        std::mem::take(&mut self.pending_registration)
    }

    /// Allocates at least `deficit` endpoints, rounded up to whole blocks.
    fn grow(&mut self, deficit: usize) {
        let block = self.config.block_size.max(1);
        let count = deficit.div_ceil(block) * block;
        let start = self.endpoint_pool.len();
        self.endpoint_pool.resize_with(start + count, Endpoint::default);
        // Reversed so the lowest new id leaves the free stack first.
        self.free_endpoints
            .extend((start..start + count).rev().map(|i| EndpointId(i as u64)));
        self.pending_registration.push(start..start + count);
        debug!(
            "{} pool grew by {count} endpoints ({} total)",
            self.dim,
            self.endpoint_pool.len()
        );
    }

    /// Takes `need` endpoints off the free list for `binding`.
    pub fn lease(&mut self, binding: BindingId, need: usize) -> std::result::Result<Vec<EndpointId>, LeaseError> {
        if self.leases.contains_key(&binding) {
            warn!("{} pool: binding {binding} leased twice", self.dim);
            return Err(LeaseError::AlreadyLeased(binding.raw()));
        }
        if self.free_endpoints.len() < need {
            self.grow(need - self.free_endpoints.len());
        }
        let taken: Vec<EndpointId> = (0..need)
            .filter_map(|_| self.free_endpoints.pop())
            .collect();
        for id in &taken {
            let endpoint = &mut self.endpoint_pool[id.index()];
            endpoint.owner = Some(binding);
            endpoint.position = None;
        }
        self.leases.insert(binding, taken.clone());
        Ok(taken)
    }

    /// Returns all of `binding`'s endpoints to the free list, hidden.
    pub fn release(&mut self, binding: BindingId) -> std::result::Result<(), LeaseError> {
        let ids = self
            .leases
            .remove(&binding)
            .ok_or(LeaseError::NotLeased(binding.raw()))?;
        for id in ids.into_iter().rev() {
            self.endpoint_pool[id.index()].reset();
            self.free_endpoints.push(id);
        }
        self.selection.retain(|b| *b != binding);
        Ok(())
    }

    /// Creates a binding for `measurement` and writes its values into a
    /// fresh lease.
    pub fn bind(&mut self, measurement: MeasurementId, store: &mut MeasurementStore) -> Result<BindingId> {
        let m = store
            .get_mut(measurement)
            .ok_or(MeasureError::UnknownMeasurement(measurement))?;
        let id = BindingId(self.binding_ids.allocate());
        self.lease(id, m.values().len())?;
        m.observe(BindingRef::new(self.dim, id));
        self.bindings.insert(id, Binding::new(id, measurement));
        self.write_endpoints(id, m.values());
        trace!("{} pool: bound measurement {measurement} as {id}", self.dim);
        Ok(id)
    }

    /// Disconnects a binding from its measurement without releasing its
    /// lease.
    pub fn destroy(&mut self, binding: BindingId, store: &mut MeasurementStore) -> Option<Binding> {
        let b = self.bindings.remove(&binding)?;
        if let Some(m) = store.get_mut(b.measurement()) {
            m.unobserve(BindingRef::new(self.dim, binding));
        }
        Some(b)
    }

    /// Destroys a binding and releases its lease.
    pub fn unbind(&mut self, binding: BindingId, store: &mut MeasurementStore) -> std::result::Result<(), LeaseError> {
        self.destroy(binding, store);
        self.release(binding)
    }

    /// Unbinds everything.
    pub fn unbind_all(&mut self, store: &mut MeasurementStore) -> std::result::Result<(), LeaseError> {
        let ids: Vec<BindingId> = self.bindings.keys().copied().collect();
        for id in ids {
            self.unbind(id, store)?;
        }
        Ok(())
    }

    /// Replaces every lease with one binding per measurement.
    pub fn set_active_set(&mut self, measurements: &[MeasurementId], store: &mut MeasurementStore) -> Result<()> {
        self.unbind_all(store)?;
        self.selection.clear();
        for &id in measurements {
            self.bind(id, store)?;
        }
        debug!(
            "{} pool: active set of {} measurement(s), {} endpoints leased",
            self.dim,
            measurements.len(),
            self.leased_count()
        );
        Ok(())
    }

    /// Binds one more measurement without touching the others.
    pub fn add(&mut self, measurement: MeasurementId, store: &mut MeasurementStore) -> Result<BindingId> {
        self.bind(measurement, store)
    }

    /// Unbinds every binding of `measurement`. Returns how many there were.
    pub fn remove(&mut self, measurement: MeasurementId, store: &mut MeasurementStore) -> Result<usize> {
        let ids = self.bindings_for(measurement);
        for id in &ids {
            self.unbind(*id, store)?;
        }
        Ok(ids.len())
    }

    /// Pushes the measurement's values back into `binding`'s endpoints.
    ///
    /// A killed or vanished measurement releases the binding instead.
    pub fn refresh(&mut self, binding: BindingId, store: &mut MeasurementStore) -> Result<()> {
        let measurement = self
            .bindings
            .get(&binding)
            .map(Binding::measurement)
            .ok_or(LeaseError::NotLeased(binding.raw()))?;
        match store.get(measurement) {
            Some(m) if !m.is_killed() => {
                let values = m.values().to_vec();
                self.write_endpoints(binding, &values);
            }
            _ => {
                trace!("{} pool: {binding} lost its measurement, releasing", self.dim);
                self.unbind(binding, store)?;
            }
        }
        Ok(())
    }

    /// Writes `values` into the lease with the binding's cell disabled and
    /// the resulting echo suppressed.
    fn write_endpoints(&mut self, binding: BindingId, values: &[Point]) {
        let (Some(ids), Some(b)) = (self.leases.get(&binding), self.bindings.get_mut(&binding)) else {
            return;
        };
        let dim = self.dim;
        let slice = self.current_slice;

        b.cell.disable();
        for (id, value) in ids.iter().zip(values) {
            let endpoint = &mut self.endpoint_pool[id.index()];
            endpoint.position = Some(*value);
            endpoint.visible = dim == Dimension::Three || on_slice(*value, slice);
            let _ = b.cell.notify();
        }
        b.cell.ignore_next();
        let echoed = b.cell.enable();
        debug_assert!(!echoed, "refresh echoed into its own binding");
    }

    /// Moves an endpoint as a user drag would.
    ///
    /// In a 2-D pool only `x` and `y` move; the endpoint keeps its slice.
    /// Returns the resulting change when the owning binding's cell fired and
    /// the measurement was updated.
    pub fn drag_endpoint(
        &mut self,
        endpoint: EndpointId,
        position: Point,
        store: &mut MeasurementStore,
    ) -> Option<ValueChange> {
        let dim = self.dim;
        let slice = self.current_slice as f64;
        let e = self.endpoint_pool.get_mut(endpoint.index())?;
        let owner = e.owner?;
        let position = match dim {
            Dimension::Two => position.with_z(e.position.map_or(slice, |p| p.z)),
            Dimension::Three => position,
        };
        e.position = Some(position);
        if let Some(press) = self.press.as_mut() {
            press.dragged = true;
        }

        let binding = self.bindings.get_mut(&owner)?;
        if !binding.cell.notify() {
            return None;
        }
        let positions: Vec<Point> = self
            .leases
            .get(&owner)?
            .iter()
            .map(|id| self.endpoint_pool[id.index()].position)
            .collect::<Option<_>>()?;
        let measurement = binding.measurement();
        let m = store.get_mut(measurement)?;
        let values = binding.derive_values(&positions, m, dim, self.slice_count);
        let siblings = m
            .set_values(values, Some(BindingRef::new(dim, owner)))
            .ok()?;
        Some(ValueChange {
            binding: owner,
            measurement,
            siblings,
        })
    }

    /// Updates the displayed slice. A 2-D pool hides off-slice endpoints but
    /// keeps their leases.
    pub fn set_slice(&mut self, slice: usize) {
        self.current_slice = slice;
        self.selection.clear();
        if self.dim == Dimension::Three {
            return;
        }
        for ids in self.leases.values() {
            for id in ids {
                let endpoint = &mut self.endpoint_pool[id.index()];
                endpoint.visible = endpoint.position.is_some_and(|p| on_slice(p, slice));
            }
        }
    }

    /// Current positions of a binding's endpoints, if all are set.
    pub fn live_positions(&self, binding: BindingId) -> Option<Vec<Point>> {
        self.leases
            .get(&binding)?
            .iter()
            .map(|id| self.endpoint_pool[id.index()].position.filter(|p| p.is_finite()))
            .collect()
    }

    /// Builds the line geometry of every binding from live endpoint
    /// positions.
    ///
    /// Returns `None` while any endpoint is still unset; the caller retries
    /// on the next change.
    pub fn rebuild_lines(&self, store: &MeasurementStore) -> Option<LineSet> {
        let mut set = LineSet::default();
        let half = self.config.marker_size.unwrap_or(DEFAULT_MARKER_SIZE);

        for (id, binding) in &self.bindings {
            let Some(m) = store.get(binding.measurement()) else {
                continue;
            };
            let Some(points) = self.live_positions(*id) else {
                trace!("{} pool: {id} incomplete, skipping line rebuild", self.dim);
                return None;
            };
            let color = m.color();
            let selected = self.selection.contains(id);

            if self.dim == Dimension::Two {
                let slice = self.current_slice;
                let mut any_on_slice = false;
                for p in &points {
                    if on_slice(*p, slice) {
                        any_on_slice = true;
                    } else {
                        set.crosses.extend(cross_glyph(*p, slice as f64, half, color));
                    }
                }
                if !any_on_slice {
                    continue;
                }
            }
            push_shape(&mut set, points, color, selected);
        }
        Some(set)
    }

    /// Finds the binding nearest to a screen position.
    ///
    /// Only a 2-D pool picks. The winner must lie within the configured
    /// pixel threshold, measured in domain units.
    pub fn pick(&self, screen: (f64, f64), projection: &dyn ScreenProjection) -> Option<BindingId> {
        if self.dim == Dimension::Three {
            return None;
        }
        let (vx, vy) = projection.screen_to_domain(screen.0, screen.1);
        let threshold = projection.pixel_span(self.config.pick_threshold_px);
        let slice = self.current_slice;

        let (shapes, points): (Vec<_>, Vec<_>) = self
            .bindings
            .keys()
            .filter_map(|id| {
                let pts = self.live_positions(*id)?;
                pts.iter().any(|p| on_slice(*p, slice)).then_some((*id, pts))
            })
            .partition(|(_, pts)| pts.len() > 1);

        // Shapes first: a point must be strictly closer to win.
        let mut best: Option<(BindingId, f64)> = None;
        for (id, pts) in shapes.into_iter().chain(points) {
            let d = planar_distance(&pts, vx, vy);
            if best.is_none_or(|(_, b)| d < b) {
                best = Some((id, d));
            }
        }
        trace!("{} pool: pick at ({vx:.2}, {vy:.2}) best {best:?} threshold {threshold:.3}", self.dim);
        best.filter(|&(_, d)| d <= threshold).map(|(id, _)| id)
    }

    #[inline]
    pub fn selection(&self) -> &[BindingId] {
        &self.selection
    }

    /// The selected binding when exactly one is selected.
    pub fn single_selection(&self) -> Option<BindingId> {
        match self.selection.as_slice() {
            [only] => Some(*only),
            _ => None,
        }
    }

    /// Makes `binding` the only selection.
    pub fn select(&mut self, binding: BindingId) {
        self.selection.clear();
        if self.bindings.contains_key(&binding) {
            self.selection.push(binding);
        }
    }

    /// Adds `binding` to the selection or removes it if already selected.
    pub fn toggle(&mut self, binding: BindingId) {
        if let Some(i) = self.selection.iter().position(|b| *b == binding) {
            self.selection.remove(i);
        } else if self.bindings.contains_key(&binding) {
            self.selection.push(binding);
        }
    }

    pub fn deselect_all(&mut self) {
        self.selection.clear();
    }

    /// Selects every on-slice binding touching `rect` (domain units).
    ///
    /// With `extend` the previous selection is kept. Returns true if the
    /// selection changed.
    pub fn select_in_rect(&mut self, rect: &Rect, extend: bool) -> bool {
        let before = self.selection.clone();
        if !extend {
            self.selection.clear();
        }
        let slice = self.current_slice;
        let hits: Vec<BindingId> = self
            .bindings
            .keys()
            .copied()
            .filter(|id| {
                self.live_positions(*id).is_some_and(|pts| {
                    let on = self.dim == Dimension::Three || pts.iter().any(|p| on_slice(*p, slice));
                    on && touches_rect(&pts, rect)
                })
            })
            .collect();
        for id in hits {
            if !self.selection.contains(&id) {
                self.selection.push(id);
            }
        }
        self.selection != before
    }

    /// Records a pointer press. `extend` is the shift modifier.
    pub fn pointer_down(&mut self, screen: (f64, f64), extend: bool) {
        self.press = Some(Press {
            x: screen.0,
            y: screen.1,
            extend,
            dragged: false,
        });
    }

    /// Completes a press.
    ///
    /// A click in place picks; shift toggles the picked binding. A press
    /// that moved without dragging an endpoint selects by rubber band.
    /// Returns true if the selection changed.
    pub fn pointer_up(&mut self, screen: (f64, f64), projection: &dyn ScreenProjection) -> bool {
        let Some(press) = self.press.take() else {
            return false;
        };
        if press.dragged {
            return false;
        }
        let before = self.selection.clone();
        if (screen.0 - press.x).hypot(screen.1 - press.y) <= CLICK_SLOP_PX {
            match (self.pick(screen, projection), press.extend) {
                (Some(hit), true) => self.toggle(hit),
                (Some(hit), false) => self.select(hit),
                (None, true) => {}
                (None, false) => self.deselect_all(),
            }
        } else {
            let a = projection.screen_to_domain(press.x, press.y);
            let b = projection.screen_to_domain(screen.0, screen.1);
            self.select_in_rect(&Rect::from_corners(a, b), press.extend);
        }
        self.selection != before
    }
}

/// True if `p` rounds to `slice`.
#[inline]
fn on_slice(p: Point, slice: usize) -> bool {
    p.z.round() == slice as f64
}

fn push_shape(set: &mut LineSet, mut points: Vec<Point>, color: Rgb, selected: bool) {
    match points.len() {
        0 => {}
        1 => set.points.push(Marker {
            position: points[0],
            color,
            selected,
        }),
        2 => set.lines.push(Polyline {
            points,
            color,
            selected,
        }),
        _ => {
            points.push(points[0]);
            set.lines.push(Polyline {
                points,
                color,
                selected,
            });
        }
    }
}

/// The two strokes of an "X" centered on `p`, drawn at depth `z`.
fn cross_glyph(p: Point, z: f64, half: f64, color: Rgb) -> [Polyline; 2] {
    let stroke = |dy: f64| Polyline {
        points: vec![
            Point::new(p.x - half, p.y - dy, z),
            Point::new(p.x + half, p.y + dy, z),
        ],
        color,
        selected: false,
    };
    [stroke(half), stroke(-half)]
}

/// Planar distance from `(vx, vy)` to a point, segment or closed polygon.
fn planar_distance(points: &[Point], vx: f64, vy: f64) -> f64 {
    let v = [vx, vy];
    match points {
        [] => f64::INFINITY,
        [p] => (p.x - vx).hypot(p.y - vy),
        [a, b] => distance_to_segment(&v, &[a.x, a.y], &[b.x, b.y]),
        _ => (0..points.len())
            .map(|i| {
                let a = points[i];
                let b = points[(i + 1) % points.len()];
                distance_to_segment(&v, &[a.x, a.y], &[b.x, b.y])
            })
            .fold(f64::INFINITY, f64::min),
    }
}

fn touches_rect(points: &[Point], rect: &Rect) -> bool {
    match points {
        [] => false,
        [p] => rect.contains(p.x, p.y),
        [a, b] => segment_intersects_rect(*a, *b, rect),
        _ => (0..points.len())
            .any(|i| segment_intersects_rect(points[i], points[(i + 1) % points.len()], rect)),
    }
}
