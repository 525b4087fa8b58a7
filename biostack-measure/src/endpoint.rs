//! Manipulable endpoint handles.

use biostack_core::{typed_id, Point};

use crate::binding::BindingId;

typed_id! {
    /// Index of an endpoint within its pool.
    pub struct EndpointId;
}

impl EndpointId {
    #[inline]
    #[allow(clippy::cast_possible_truncation)]
    pub(crate) fn index(self) -> usize {
        self.0 as usize
    }
}

/// One on-screen handle owned by a [`Pool`](crate::Pool).
///
/// Endpoints are never destroyed. Released endpoints go back to the pool's
/// free list with their position cleared.
#[derive(Debug, Clone, Default)]
pub struct Endpoint {
    pub(crate) position: Option<Point>,
    pub(crate) visible: bool,
    pub(crate) owner: Option<BindingId>,
}

impl Endpoint {
    /// Current position, or `None` until the owning binding has written it.
    #[inline]
    pub fn position(&self) -> Option<Point> {
        self.position
    }

    #[inline]
    pub fn is_visible(&self) -> bool {
        self.visible
    }

    /// The binding holding this endpoint, if leased.
    #[inline]
    pub fn owner(&self) -> Option<BindingId> {
        self.owner
    }

    #[inline]
    pub fn is_leased(&self) -> bool {
        self.owner.is_some()
    }

    pub(crate) fn reset(&mut self) {
        self.position = None;
        self.visible = false;
        self.owner = None;
    }
}
