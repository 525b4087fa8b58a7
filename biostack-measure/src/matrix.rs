//! The timestep x slice measurement matrix.
//!
//! [`MeasurementMatrix`] is the top-level controller. It files every
//! measurement under one (timestep, slice) coordinate and keeps each pool's
//! active set mirroring the displayed coordinate: the 2-D pool shows the
//! active list, the optional 3-D pool shows every list of the active
//! timestep.

#![allow(clippy::cast_precision_loss)]

use std::collections::HashMap;
use std::sync::mpsc::Sender;

use biostack_core::{IdAllocator, Point, StackDomain, Volume};
use log::{debug, info, warn};

use crate::binding::BindingRef;
use crate::endpoint::EndpointId;
use crate::error::{MeasureError, Result};
use crate::event::MeasureEvent;
use crate::group::{GroupId, GroupRegistry};
use crate::list::MeasurementList;
use crate::measurement::{Measurement, MeasurementId, MeasurementStore, Rgb, StandardId};
use crate::pool::{Dimension, LineSet, Pool, PoolConfig};
use crate::projection::ScreenProjection;
use crate::selection::{SelectionBox, SelectionConfig};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Fraction of the smaller image side used as the off-slice marker size.
const MARKER_FRACTION: f64 = 0.05;

/// Configuration for a [`MeasurementMatrix`].
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct MatrixConfig {
    pub pool: PoolConfig,
    pub selection: SelectionConfig,
    /// Attach a 3-D pool alongside the 2-D one.
    pub volume_view: bool,
}

impl Default for MatrixConfig {
    fn default() -> Self {
        Self {
            pool: PoolConfig::default(),
            selection: SelectionConfig::default(),
            volume_view: true,
        }
    }
}

impl MatrixConfig {
    #[must_use]
    pub fn with_pool(mut self, pool: PoolConfig) -> Self {
        self.pool = pool;
        self
    }

    #[must_use]
    pub fn with_selection(mut self, selection: SelectionConfig) -> Self {
        self.selection = selection;
        self
    }

    #[must_use]
    pub fn with_volume_view(mut self, enabled: bool) -> Self {
        self.volume_view = enabled;
        self
    }
}

#[derive(Debug)]
struct Grid {
    domain: StackDomain,
    lists: Vec<Vec<MeasurementList>>,
    locations: HashMap<MeasurementId, (usize, usize)>,
    active: (usize, usize),
}

impl Grid {
    fn new(domain: StackDomain) -> Self {
        let lists = (0..domain.timesteps)
            .map(|t| (0..domain.slices).map(|s| MeasurementList::new(t, s)).collect())
            .collect();
        Self {
            domain,
            lists,
            locations: HashMap::new(),
            active: (0, 0),
        }
    }

    fn check(&self, timestep: usize, slice: usize) -> Result<()> {
        if timestep < self.domain.timesteps && slice < self.domain.slices {
            Ok(())
        } else {
            Err(MeasureError::OutOfRange {
                timestep,
                slice,
                timesteps: self.domain.timesteps,
                slices: self.domain.slices,
            })
        }
    }

    /// Every measurement filed under `timestep`, slice by slice.
    fn timestep_entries(&self, timestep: usize) -> Vec<MeasurementId> {
        self.lists[timestep]
            .iter()
            .flat_map(|l| l.entries().iter().copied())
            .collect()
    }
}

/// Grid of measurement lists with the pools that display them.
#[derive(Debug)]
pub struct MeasurementMatrix {
    grid: Option<Grid>,
    store: MeasurementStore,
    groups: GroupRegistry,
    standard_ids: IdAllocator,
    pool2: Pool,
    pool3: Option<Pool>,
    selection: SelectionBox,
    events: Option<Sender<MeasureEvent>>,
}

impl Default for MeasurementMatrix {
    fn default() -> Self {
        Self::new(MatrixConfig::default())
    }
}

impl MeasurementMatrix {
    /// Creates an uninitialized matrix.
    pub fn new(config: MatrixConfig) -> Self {
        let pool3 = config
            .volume_view
            .then(|| Pool::new(Dimension::Three, config.pool.clone()));
        Self {
            grid: None,
            store: MeasurementStore::new(),
            groups: GroupRegistry::new(),
            standard_ids: IdAllocator::starting_at(1),
            pool2: Pool::new(Dimension::Two, config.pool),
            pool3,
            selection: SelectionBox::new(config.selection),
            events: None,
        }
    }

    /// Sends change notifications to `events`.
    #[must_use]
    pub fn with_events(mut self, events: Sender<MeasureEvent>) -> Self {
        self.events = Some(events);
        self
    }

    /// Allocates an empty grid for a `[time, slice, y, x]` stack.
    ///
    /// Any previous grid and its measurements are discarded, but only once
    /// the new shape has been validated.
    pub fn init(&mut self, shape: &[usize]) -> Result<()> {
        let domain = StackDomain::from_shape(shape)?;
        self.init_domain(domain)
    }

    /// Allocates an empty grid matching `volume`.
    pub fn init_volume(&mut self, volume: &Volume) -> Result<()> {
        self.init_domain(volume.domain())
    }

    fn init_domain(&mut self, domain: StackDomain) -> Result<()> {
        self.pool2.unbind_all(&mut self.store)?;
        if let Some(pool3) = self.pool3.as_mut() {
            pool3.unbind_all(&mut self.store)?;
        }
        self.store.clear();
        self.selection.bind(None, None);

        let marker = MARKER_FRACTION * domain.width.min(domain.height) as f64;
        for pool in std::iter::once(&mut self.pool2).chain(self.pool3.as_mut()) {
            pool.set_slice_count(domain.slices);
            pool.set_marker_size(marker);
            pool.set_slice(0);
        }
        self.grid = Some(Grid::new(domain));
        info!(
            "measurement matrix initialized: {} timestep(s) x {} slice(s)",
            domain.timesteps, domain.slices
        );
        Ok(())
    }

    #[inline]
    pub fn is_initialized(&self) -> bool {
        self.grid.is_some()
    }

    pub fn domain(&self) -> Option<StackDomain> {
        self.grid.as_ref().map(|g| g.domain)
    }

    /// The displayed `(timestep, slice)`.
    pub fn active(&self) -> Option<(usize, usize)> {
        self.grid.as_ref().map(|g| g.active)
    }

    pub fn list(&self, timestep: usize, slice: usize) -> Option<&MeasurementList> {
        self.grid.as_ref()?.lists.get(timestep)?.get(slice)
    }

    /// Where `id` is filed.
    pub fn locate(&self, id: MeasurementId) -> Option<(usize, usize)> {
        self.grid.as_ref()?.locations.get(&id).copied()
    }

    pub fn measurement(&self, id: MeasurementId) -> Option<&Measurement> {
        self.store.get(id)
    }

    #[inline]
    pub fn store(&self) -> &MeasurementStore {
        &self.store
    }

    #[inline]
    pub fn groups(&self) -> &GroupRegistry {
        &self.groups
    }

    #[inline]
    pub fn groups_mut(&mut self) -> &mut GroupRegistry {
        &mut self.groups
    }

    pub fn pool(&self, dim: Dimension) -> Option<&Pool> {
        match dim {
            Dimension::Two => Some(&self.pool2),
            Dimension::Three => self.pool3.as_ref(),
        }
    }

    fn pool_mut(&mut self, dim: Dimension) -> Result<&mut Pool> {
        match dim {
            Dimension::Two => Ok(&mut self.pool2),
            Dimension::Three => self.pool3.as_mut().ok_or(MeasureError::NoSurface(dim)),
        }
    }

    #[inline]
    pub fn selection(&self) -> &SelectionBox {
        &self.selection
    }

    /// The measurement behind the selection outline.
    pub fn selected_measurement(&self) -> Option<MeasurementId> {
        let target = self.selection.target()?;
        Some(self.pool(target.dim)?.binding(target.binding)?.measurement())
    }

    /// Line geometry for one display surface.
    pub fn lines(&self, dim: Dimension) -> Option<LineSet> {
        self.pool(dim)?.rebuild_lines(&self.store)
    }

    /// Switches the displayed coordinate.
    ///
    /// A timestep change rebuilds the 3-D pool from every list of the new
    /// timestep. The 2-D pool always mirrors the active list.
    pub fn set_coordinate(&mut self, timestep: usize, slice: usize) -> Result<()> {
        let grid = self.grid.as_mut().ok_or(MeasureError::NotInitialized)?;
        grid.check(timestep, slice)?;
        let timestep_changed = grid.active.0 != timestep;
        grid.active = (timestep, slice);

        if timestep_changed {
            if let Some(pool3) = self.pool3.as_mut() {
                let ids = grid.timestep_entries(timestep);
                pool3.set_active_set(&ids, &mut self.store)?;
            }
        }
        let ids = grid.lists[timestep][slice].entries().to_vec();
        self.pool2.set_active_set(&ids, &mut self.store)?;
        self.pool2.set_slice(slice);
        if let Some(pool3) = self.pool3.as_mut() {
            pool3.set_slice(slice);
        }

        debug!("coordinate set to t={timestep} z={slice}");
        self.sync_selection();
        self.emit(MeasureEvent::CoordinateChanged { timestep, slice });
        Ok(())
    }

    /// Files `measurement` under `(timestep, slice)`.
    ///
    /// Pools showing that coordinate gain one binding; nothing else is
    /// rebuilt.
    pub fn add_measurement(
        &mut self,
        timestep: usize,
        slice: usize,
        measurement: Measurement,
    ) -> Result<MeasurementId> {
        let grid = self.grid.as_mut().ok_or(MeasureError::NotInitialized)?;
        grid.check(timestep, slice)?;
        if !self.groups.contains(measurement.group()) {
            return Err(MeasureError::UnknownGroup(measurement.group().raw()));
        }
        if let Some(standard) = measurement.standard_id() {
            self.standard_ids.reserve(standard.raw());
        }

        let id = self.store.insert(measurement);
        grid.lists[timestep][slice].push(id);
        grid.locations.insert(id, (timestep, slice));

        let active = grid.active;
        if active == (timestep, slice) {
            self.pool2.add(id, &mut self.store)?;
        }
        if active.0 == timestep {
            if let Some(pool3) = self.pool3.as_mut() {
                pool3.add(id, &mut self.store)?;
            }
        }
        Ok(id)
    }

    /// Adds a point at `(x, y)` on the given slice, colored by its group.
    pub fn add_point(&mut self, timestep: usize, slice: usize, x: f64, y: f64, group: GroupId) -> Result<MeasurementId> {
        let color = self.group_color(group);
        let at = Point::new(x, y, slice as f64);
        self.add_measurement(timestep, slice, Measurement::point(at, color, group))
    }

    /// Adds a line on the given slice, colored by its group.
    pub fn add_line(
        &mut self,
        timestep: usize,
        slice: usize,
        from: (f64, f64),
        to: (f64, f64),
        group: GroupId,
    ) -> Result<MeasurementId> {
        let color = self.group_color(group);
        let z = slice as f64;
        let m = Measurement::line(Point::new(from.0, from.1, z), Point::new(to.0, to.1, z), color, group);
        self.add_measurement(timestep, slice, m)
    }

    fn group_color(&self, group: GroupId) -> Rgb {
        self.groups.get(group).map_or(Rgb::WHITE, |g| g.default_color)
    }

    /// Removes `id` from the list at `(timestep, slice)` and kills it.
    pub fn remove(&mut self, timestep: usize, slice: usize, id: MeasurementId) -> Result<()> {
        let grid = self.grid.as_mut().ok_or(MeasureError::NotInitialized)?;
        grid.check(timestep, slice)?;
        if !grid.lists[timestep][slice].remove(id) {
            return Err(MeasureError::UnknownMeasurement(id));
        }
        grid.locations.remove(&id);
        self.discard(id);
        Ok(())
    }

    /// Removes `id` from wherever it is filed.
    pub fn remove_measurement(&mut self, id: MeasurementId) -> Result<()> {
        let (t, s) = self.locate(id).ok_or(MeasureError::UnknownMeasurement(id))?;
        self.remove(t, s, id)
    }

    fn discard(&mut self, id: MeasurementId) {
        let Some(m) = self.store.get_mut(id) else {
            return;
        };
        let observers = m.kill();
        self.propagate(&observers);
        self.store.remove(id);
        self.sync_selection();
        self.emit(MeasureEvent::Removed(id));
    }

    /// Replaces a measurement's values and refreshes every binding.
    ///
    /// A measurement whose values all move to another slice is re-filed
    /// there.
    pub fn set_values(&mut self, id: MeasurementId, values: Vec<Point>) -> Result<()> {
        let m = self.store.get_mut(id).ok_or(MeasureError::UnknownMeasurement(id))?;
        let observers = m.set_values(values, None)?;
        self.propagate(&observers);
        self.refile(id)
    }

    pub fn set_color(&mut self, id: MeasurementId, color: Rgb) -> Result<()> {
        self.store
            .get_mut(id)
            .ok_or(MeasureError::UnknownMeasurement(id))?
            .set_color(color);
        Ok(())
    }

    pub fn set_group(&mut self, id: MeasurementId, group: GroupId) -> Result<()> {
        if !self.groups.contains(group) {
            return Err(MeasureError::UnknownGroup(group.raw()));
        }
        self.store
            .get_mut(id)
            .ok_or(MeasureError::UnknownMeasurement(id))?
            .set_group(group);
        Ok(())
    }

    /// Tags `id` as a standard and copies it onto every other slice of every
    /// timestep.
    pub fn promote_to_standard(&mut self, id: MeasurementId) -> Result<StandardId> {
        let grid = self.grid.as_ref().ok_or(MeasureError::NotInitialized)?;
        let origin = *grid
            .locations
            .get(&id)
            .ok_or(MeasureError::UnknownMeasurement(id))?;
        let domain = grid.domain;
        let m = self.store.get_mut(id).ok_or(MeasureError::UnknownMeasurement(id))?;
        if m.standard_id().is_some() {
            return Err(MeasureError::AlreadyStandard(id));
        }

        let standard = StandardId(self.standard_ids.allocate());
        m.set_standard(Some(standard));
        let template = m.clone_to_slice(0);

        let mut clones = 0;
        for t in 0..domain.timesteps {
            for s in 0..domain.slices {
                if (t, s) == origin || self.list_has_standard(t, s, standard) {
                    continue;
                }
                self.add_measurement(t, s, template.clone_to_slice(s))?;
                clones += 1;
            }
        }
        info!("measurement {id} promoted to standard {standard} with {clones} copies");
        self.emit(MeasureEvent::StandardChanged {
            measurement: id,
            standard: Some(standard),
        });
        Ok(standard)
    }

    /// Removes every copy of `id`'s standard, `id` included. Returns how
    /// many measurements were removed.
    pub fn demote(&mut self, id: MeasurementId) -> Result<usize> {
        let standard = self.standard_of(id)?;
        let members = self.store.with_standard(standard);
        for member in &members {
            self.remove_measurement(*member)?;
        }
        info!("standard {standard} demoted, {} measurement(s) removed", members.len());
        Ok(members.len())
    }

    /// Removes the other copies of `id`'s standard and clears its tag,
    /// leaving `id` as an ordinary measurement.
    pub fn unset_standard(&mut self, id: MeasurementId) -> Result<usize> {
        let standard = self.standard_of(id)?;
        let others: Vec<MeasurementId> = self
            .store
            .with_standard(standard)
            .into_iter()
            .filter(|m| *m != id)
            .collect();
        for other in &others {
            self.remove_measurement(*other)?;
        }
        if let Some(m) = self.store.get_mut(id) {
            m.set_standard(None);
        }
        self.emit(MeasureEvent::StandardChanged {
            measurement: id,
            standard: None,
        });
        Ok(others.len())
    }

    fn standard_of(&self, id: MeasurementId) -> Result<StandardId> {
        self.store
            .get(id)
            .ok_or(MeasureError::UnknownMeasurement(id))?
            .standard_id()
            .ok_or(MeasureError::NotStandard(id))
    }

    fn list_has_standard(&self, timestep: usize, slice: usize, standard: StandardId) -> bool {
        self.list(timestep, slice).is_some_and(|list| {
            list.entries()
                .iter()
                .any(|id| self.store.get(*id).and_then(Measurement::standard_id) == Some(standard))
        })
    }

    /// Applies a user drag of one endpoint.
    ///
    /// Returns true if the owning measurement changed.
    pub fn drag_endpoint(&mut self, dim: Dimension, endpoint: EndpointId, position: Point) -> Result<bool> {
        if self.grid.is_none() {
            return Err(MeasureError::NotInitialized);
        }
        let pool = match dim {
            Dimension::Two => &mut self.pool2,
            Dimension::Three => self.pool3.as_mut().ok_or(MeasureError::NoSurface(dim))?,
        };
        let Some(change) = pool.drag_endpoint(endpoint, position, &mut self.store) else {
            return Ok(false);
        };
        self.notify_selection(BindingRef::new(dim, change.binding));
        self.propagate(&change.siblings);
        self.refile(change.measurement)?;
        Ok(true)
    }

    pub fn pointer_down(&mut self, dim: Dimension, screen: (f64, f64), extend: bool) -> Result<()> {
        self.pool_mut(dim)?.pointer_down(screen, extend);
        Ok(())
    }

    /// Completes a click or rubber band on one surface.
    ///
    /// Returns true if the selection changed.
    pub fn pointer_up(
        &mut self,
        dim: Dimension,
        screen: (f64, f64),
        projection: &dyn ScreenProjection,
    ) -> Result<bool> {
        let changed = self.pool_mut(dim)?.pointer_up(screen, projection);
        if changed {
            self.sync_selection();
        }
        Ok(changed)
    }

    /// Selects `id` in the 2-D view, if it is displayed there.
    pub fn select(&mut self, id: MeasurementId) -> bool {
        let Some(binding) = self.pool2.bindings_for(id).first().copied() else {
            return false;
        };
        self.pool2.select(binding);
        self.sync_selection();
        true
    }

    pub fn deselect_all(&mut self) {
        self.pool2.deselect_all();
        if let Some(pool3) = self.pool3.as_mut() {
            pool3.deselect_all();
        }
        self.sync_selection();
    }

    /// Endpoint ranges a surface must register since it last asked.
    pub fn take_registrations(&mut self, dim: Dimension) -> Result<Vec<std::ops::Range<usize>>> {
        Ok(self.pool_mut(dim)?.take_registrations())
    }

    /// Refreshes each binding from its measurement, redrawing the
    /// selection outline at most once.
    fn propagate(&mut self, refs: &[BindingRef]) {
        if refs.is_empty() {
            return;
        }
        self.selection.suspend();
        for r in refs {
            let Self {
                pool2,
                pool3,
                store,
                selection,
                ..
            } = self;
            let pool = match r.dim {
                Dimension::Two => pool2,
                Dimension::Three => match pool3.as_mut() {
                    Some(pool) => pool,
                    None => continue,
                },
            };
            if let Err(e) = pool.refresh(r.binding, store) {
                warn!("refresh of {} binding {} failed: {e}", r.dim, r.binding);
            }
            selection.endpoints_changed(*r, pool);
        }
        let Self {
            pool2,
            pool3,
            selection,
            ..
        } = self;
        let pool = target_pool(selection.target(), pool2, pool3.as_ref());
        selection.resume(pool);
    }

    fn notify_selection(&mut self, changed: BindingRef) {
        let Self {
            pool2,
            pool3,
            selection,
            ..
        } = self;
        if let Some(pool) = target_pool(Some(changed), pool2, pool3.as_ref()) {
            selection.endpoints_changed(changed, pool);
        }
    }

    /// Moves `id` to the list of the slice its values now share.
    fn refile(&mut self, id: MeasurementId) -> Result<()> {
        let Some(grid) = self.grid.as_mut() else {
            return Ok(());
        };
        let Some(&(t, old)) = grid.locations.get(&id) else {
            return Ok(());
        };
        let Some(depth) = self.store.get(id).and_then(Measurement::common_slice) else {
            return Ok(());
        };
        if depth == old || depth >= grid.domain.slices {
            return Ok(());
        }

        grid.lists[t][old].remove(id);
        grid.lists[t][depth].push(id);
        grid.locations.insert(id, (t, depth));
        debug!("measurement {id} moved from slice {old} to {depth}");

        let active = grid.active;
        if active == (t, old) {
            self.pool2.remove(id, &mut self.store)?;
            self.sync_selection();
        }
        if active == (t, depth) {
            self.pool2.add(id, &mut self.store)?;
        }
        Ok(())
    }

    /// Points the selection outline at the single selected binding.
    fn sync_selection(&mut self) {
        let desired = self
            .pool2
            .single_selection()
            .map(|b| BindingRef::new(Dimension::Two, b))
            .or_else(|| {
                self.pool3
                    .as_ref()
                    .and_then(Pool::single_selection)
                    .map(|b| BindingRef::new(Dimension::Three, b))
            });
        if desired == self.selection.target() {
            return;
        }
        let Self {
            pool2,
            pool3,
            selection,
            ..
        } = self;
        selection.bind(desired, target_pool(desired, pool2, pool3.as_ref()));
        let measurement = self.selected_measurement();
        debug!("selection changed to {measurement:?}");
        self.emit(MeasureEvent::SelectionChanged { measurement });
    }

    fn emit(&self, event: MeasureEvent) {
        if let Some(tx) = &self.events {
            if tx.send(event).is_err() {
                debug!("measurement event receiver dropped");
            }
        }
    }
}

fn target_pool<'a>(target: Option<BindingRef>, pool2: &'a Pool, pool3: Option<&'a Pool>) -> Option<&'a Pool> {
    match target?.dim {
        Dimension::Two => Some(pool2),
        Dimension::Three => pool3,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::mpsc;

    fn matrix(timesteps: usize, slices: usize) -> MeasurementMatrix {
        let mut m = MeasurementMatrix::default();
        m.init(&[timesteps, slices, 64, 64]).unwrap();
        m
    }

    #[test]
    fn test_uninitialized_rejects_operations() {
        let mut m = MeasurementMatrix::default();
        assert!(!m.is_initialized());
        assert_eq!(m.set_coordinate(0, 0), Err(MeasureError::NotInitialized));
        assert!(m.add_point(0, 0, 1.0, 1.0, GroupId::NONE).is_err());
    }

    #[test]
    fn test_init_failure_keeps_previous_state() {
        let mut m = matrix(2, 3);
        let id = m.add_point(0, 0, 1.0, 1.0, GroupId::NONE).unwrap();
        assert!(matches!(m.init(&[2, 0, 4, 4]), Err(MeasureError::Shape(_))));
        assert!(m.measurement(id).is_some());
        assert_eq!(m.domain().unwrap().slices, 3);
    }

    #[test]
    fn test_init_sets_marker_size() {
        let mut m = MeasurementMatrix::default();
        m.init(&[1, 2, 40, 100]).unwrap();
        assert_eq!(m.pool(Dimension::Two).unwrap().config().marker_size, Some(2.0));
        assert_eq!(m.active(), Some((0, 0)));
    }

    #[test]
    fn test_out_of_range_coordinate() {
        let mut m = matrix(2, 3);
        assert!(matches!(
            m.set_coordinate(2, 0),
            Err(MeasureError::OutOfRange { timestep: 2, .. })
        ));
    }

    #[test]
    fn test_pools_mirror_active_coordinate() {
        let mut m = matrix(2, 3);
        m.add_point(0, 0, 1.0, 1.0, GroupId::NONE).unwrap();
        m.add_point(0, 1, 2.0, 2.0, GroupId::NONE).unwrap();
        m.add_point(1, 1, 3.0, 3.0, GroupId::NONE).unwrap();

        assert_eq!(m.pool(Dimension::Two).unwrap().bindings().count(), 1);
        assert_eq!(m.pool(Dimension::Three).unwrap().bindings().count(), 2);

        m.set_coordinate(0, 1).unwrap();
        assert_eq!(m.pool(Dimension::Two).unwrap().bindings().count(), 1);
        assert_eq!(m.pool(Dimension::Three).unwrap().bindings().count(), 2);

        m.set_coordinate(1, 2).unwrap();
        assert_eq!(m.pool(Dimension::Two).unwrap().bindings().count(), 0);
        assert_eq!(m.pool(Dimension::Three).unwrap().bindings().count(), 1);
    }

    #[test]
    fn test_remove_releases_leases() {
        let mut m = matrix(1, 2);
        let id = m.add_line(0, 0, (0.0, 0.0), (5.0, 5.0), GroupId::NONE).unwrap();
        assert_eq!(m.pool(Dimension::Two).unwrap().leased_count(), 2);
        m.remove(0, 0, id).unwrap();
        assert_eq!(m.pool(Dimension::Two).unwrap().leased_count(), 0);
        assert_eq!(m.pool(Dimension::Three).unwrap().leased_count(), 0);
        assert!(m.measurement(id).is_none());
        assert!(m.list(0, 0).unwrap().is_empty());
        assert_eq!(m.remove(0, 0, id), Err(MeasureError::UnknownMeasurement(id)));
    }

    #[test]
    fn test_set_values_refreshes_all_bindings() {
        let mut m = matrix(1, 3);
        let id = m.add_point(0, 0, 1.0, 1.0, GroupId::NONE).unwrap();
        m.set_values(id, vec![Point::new(4.0, 5.0, 0.0)]).unwrap();
        for dim in [Dimension::Two, Dimension::Three] {
            let pool = m.pool(dim).unwrap();
            let b = pool.bindings_for(id)[0];
            let e = pool.lease_of(b).unwrap()[0];
            assert_eq!(pool.endpoint(e).unwrap().position(), Some(Point::new(4.0, 5.0, 0.0)));
        }
    }

    #[test]
    fn test_set_values_refiles_across_slices() {
        let mut m = matrix(1, 3);
        let id = m.add_point(0, 0, 1.0, 1.0, GroupId::NONE).unwrap();
        m.set_values(id, vec![Point::new(1.0, 1.0, 2.0)]).unwrap();
        assert_eq!(m.locate(id), Some((0, 2)));
        assert!(m.pool(Dimension::Two).unwrap().bindings_for(id).is_empty());
        assert_eq!(m.pool(Dimension::Three).unwrap().bindings_for(id).len(), 1);
    }

    #[test]
    fn test_unknown_group_rejected() {
        let mut m = matrix(1, 1);
        let id = m.add_point(0, 0, 0.0, 0.0, GroupId::NONE).unwrap();
        assert_eq!(m.set_group(id, GroupId(42)), Err(MeasureError::UnknownGroup(42)));
        let g = m.groups_mut().create("spindle", Rgb::YELLOW);
        m.set_group(id, g).unwrap();
        assert_eq!(m.measurement(id).unwrap().group(), g);
        let p = m.add_point(0, 0, 3.0, 3.0, g).unwrap();
        assert_eq!(m.measurement(p).unwrap().color(), Rgb::YELLOW);
    }

    #[test]
    fn test_selection_events() {
        let (tx, rx) = mpsc::channel();
        let mut m = MeasurementMatrix::default().with_events(tx);
        m.init(&[1, 1, 32, 32]).unwrap();
        let id = m.add_point(0, 0, 4.0, 4.0, GroupId::NONE).unwrap();

        assert!(m.select(id));
        assert_eq!(m.selected_measurement(), Some(id));
        assert!(m.selection().outline().is_some());
        m.deselect_all();
        assert!(m.selection().outline().is_none());

        let events: Vec<_> = rx.try_iter().collect();
        assert_eq!(
            events,
            vec![
                MeasureEvent::SelectionChanged { measurement: Some(id) },
                MeasureEvent::SelectionChanged { measurement: None },
            ]
        );
    }
}
