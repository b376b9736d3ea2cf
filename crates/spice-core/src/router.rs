//! Frame router: window id → stream / allocation / reader registry.
//!
//! Like [`crate::stream::Stream`], this is a pure state machine: `handle`
//! takes an event, mutates the three maps, and returns the actions a driver
//! should deliver. The actual byte-level read happens out of band via
//! [`FrameRouter::read_next_frame`], triggered by a `DeliverFrameReady`
//! action.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use spice_proto::payloads::guest::WindowBufferAllocated;
use spice_shm::{ReadFrame, RegionView, ShmError, ShmReader, ShmRegion};

use crate::ids::WindowId;

/// Inputs to [`FrameRouter::handle`].
#[derive(Debug, Clone)]
pub enum RouterEvent {
    RegisterStream { window_id: WindowId },
    UnregisterStream { window_id: WindowId },
    HandleBufferAllocation { allocation: WindowBufferAllocated },
    SetSharedMemoryRegion { region: Arc<ShmRegion> },
    ClearSharedMemoryRegion,
    RouteFrameReady { window_id: WindowId, frame_number: u64 },
}

/// Outputs of [`FrameRouter::handle`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RouterAction {
    ReaderAttached { window_id: WindowId },
    ReaderDetached { window_id: WindowId },
    DeliverFrameReady { window_id: WindowId, frame_number: u64 },
}

/// Registry matching window identifiers to their streams, buffer
/// allocations, and shared-memory readers.
#[derive(Default)]
pub struct FrameRouter {
    streams: HashSet<WindowId>,
    allocation_info: HashMap<WindowId, WindowBufferAllocated>,
    readers: HashMap<WindowId, ShmReader>,
    shared_region: Option<Arc<ShmRegion>>,
}

impl FrameRouter {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn handle(&mut self, event: RouterEvent) -> Vec<RouterAction> {
        match event {
            RouterEvent::RegisterStream { window_id } => self.on_register_stream(window_id),
            RouterEvent::UnregisterStream { window_id } => self.on_unregister_stream(window_id),
            RouterEvent::HandleBufferAllocation { allocation } => self.on_handle_buffer_allocation(allocation),
            RouterEvent::SetSharedMemoryRegion { region } => self.on_set_shared_memory_region(region),
            RouterEvent::ClearSharedMemoryRegion => self.on_clear_shared_memory_region(),
            RouterEvent::RouteFrameReady { window_id, frame_number } => {
                self.on_route_frame_ready(window_id, frame_number)
            },
        }
    }

    #[must_use]
    pub fn has_reader(&self, window_id: WindowId) -> bool {
        self.readers.contains_key(&window_id)
    }

    /// Read the next available frame for `window_id`'s reader, if attached.
    pub fn read_next_frame(&mut self, window_id: WindowId) -> Result<Option<ReadFrame>, ShmError> {
        match self.readers.get_mut(&window_id) {
            Some(reader) => reader.read_next_frame(),
            None => Ok(None),
        }
    }

    pub fn set_host_active(&self, window_id: WindowId, active: bool) {
        if let Some(reader) = self.readers.get(&window_id) {
            reader.set_host_active(active);
        }
    }

    fn on_register_stream(&mut self, window_id: WindowId) -> Vec<RouterAction> {
        self.streams.insert(window_id);
        if self.readers.contains_key(&window_id) {
            return vec![RouterAction::ReaderAttached { window_id }];
        }
        self.try_create_reader(window_id).into_iter().collect()
    }

    fn on_unregister_stream(&mut self, window_id: WindowId) -> Vec<RouterAction> {
        self.streams.remove(&window_id);
        self.allocation_info.remove(&window_id);
        if self.readers.remove(&window_id).is_some() {
            vec![RouterAction::ReaderDetached { window_id }]
        } else {
            Vec::new()
        }
    }

    fn on_handle_buffer_allocation(&mut self, allocation: WindowBufferAllocated) -> Vec<RouterAction> {
        let window_id = WindowId(allocation.window_id);
        self.allocation_info.insert(window_id, allocation);
        self.try_create_reader(window_id).into_iter().collect()
    }

    fn on_set_shared_memory_region(&mut self, region: Arc<ShmRegion>) -> Vec<RouterAction> {
        self.shared_region = Some(region);
        let window_ids: Vec<WindowId> = self.allocation_info.keys().copied().collect();
        window_ids.into_iter().filter_map(|window_id| self.try_create_reader(window_id)).collect()
    }

    fn on_clear_shared_memory_region(&mut self) -> Vec<RouterAction> {
        self.shared_region = None;
        Vec::new()
    }

    fn on_route_frame_ready(&mut self, window_id: WindowId, frame_number: u64) -> Vec<RouterAction> {
        if self.streams.contains(&window_id) {
            vec![RouterAction::DeliverFrameReady { window_id, frame_number }]
        } else {
            tracing::debug!(window_id = window_id.0, frame_number, "frameReady for unregistered window, dropped");
            Vec::new()
        }
    }

    /// Creates and attaches a reader for `window_id` if an allocation and a
    /// shared region are both present, the allocation wants shared memory,
    /// no reader exists yet, and the allocation's offset/size fit the
    /// region.
    fn try_create_reader(&mut self, window_id: WindowId) -> Option<RouterAction> {
        if self.readers.contains_key(&window_id) {
            return None;
        }
        let allocation = self.allocation_info.get(&window_id)?;
        if !allocation.uses_shared_memory {
            return None;
        }
        let region = self.shared_region.clone()?;
        let view =
            match RegionView::sub_view(region, allocation.buffer_offset as usize, allocation.buffer_size as usize) {
                Ok(view) => view,
                Err(error) => {
                    tracing::warn!(window_id = window_id.0, %error, "buffer allocation out of bounds, reader not created");
                    return None;
                },
            };
        let mut reader = ShmReader::new(view);
        if let Err(error) = reader.validate() {
            tracing::warn!(window_id = window_id.0, %error, "reader failed header validation, not attaching");
            return None;
        }
        self.readers.insert(window_id, reader);
        Some(RouterAction::ReaderAttached { window_id })
    }
}
