//! Heap objects: a map pointer plus a slot vector.
//!
//! The slot vector's length always equals the map's slot count; the two move
//! in lockstep through [`Object::write`]. Slots are stored inline for the
//! first [`INLINE_SLOTS`] entries and spill to the heap beyond that.

use crate::map::{Map, MapId, MapRegistry, SlotDescriptor, SlotId, SlotType};
use basalt_core::Value;
use smallvec::SmallVec;
use std::sync::Arc;

/// Slots stored inline before spilling.
pub const INLINE_SLOTS: usize = 8;

/// A script-level object.
#[derive(Debug)]
pub struct Object {
    /// Current layout. Replaced (never mutated) on transition.
    map: Arc<Map>,
    /// Slot storage; `slots.len() == map.slot_count()` always.
    slots: SmallVec<[Value; INLINE_SLOTS]>,
}

impl Object {
    /// Create an object wearing the given map, with every slot `undefined`.
    pub fn new(map: Arc<Map>) -> Object {
        let count = map.slot_count() as usize;
        let mut slots = SmallVec::new();
        slots.resize(count, Value::UNDEFINED);
        Object { map, slots }
    }

    /// Create an empty object from a registry's empty map.
    pub fn empty(registry: &MapRegistry) -> Object {
        Object::new(registry.empty_map())
    }

    /// The current map.
    #[inline]
    pub fn map(&self) -> &Arc<Map> {
        &self.map
    }

    /// The current map's id, for call-site caches.
    #[inline]
    pub fn map_id(&self) -> MapId {
        self.map.id()
    }

    /// Number of slots.
    #[inline]
    pub fn slot_count(&self) -> usize {
        self.slots.len()
    }

    /// The raw slot storage, for root tracing.
    #[inline]
    pub fn slots(&self) -> &[Value] {
        &self.slots
    }

    /// Resolve a slot id against the current map.
    #[inline]
    pub fn lookup(&self, slot_id: SlotId) -> Option<SlotDescriptor> {
        self.map.lookup(slot_id)
    }

    /// Read through a resolved descriptor.
    #[inline]
    pub fn get(&self, descriptor: SlotDescriptor) -> Value {
        self.slots[descriptor.offset as usize]
    }

    /// Write through a resolved descriptor.
    #[inline]
    pub fn set(&mut self, descriptor: SlotDescriptor, value: Value) {
        self.slots[descriptor.offset as usize] = value;
    }

    /// Read through a cached slot offset (call-site cache fast path).
    #[inline]
    pub fn get_cached(&self, offset: u16) -> Value {
        self.slots[offset as usize]
    }

    /// Write through a cached slot offset (call-site cache fast path).
    #[inline]
    pub fn set_cached(&mut self, offset: u16, value: Value) {
        self.slots[offset as usize] = value;
    }

    /// Read a slot by id. `None` when the object has no such slot.
    pub fn read(&self, slot_id: SlotId) -> Option<Value> {
        self.lookup(slot_id).map(|d| self.get(d))
    }

    /// Write a slot by id, transitioning the map when the slot is new.
    ///
    /// Returns the descriptor and whether a transition happened; the caller
    /// is responsible for the write barrier.
    pub fn write(
        &mut self,
        slot_id: SlotId,
        value: Value,
        registry: &MapRegistry,
    ) -> (SlotDescriptor, bool) {
        if let Some(descriptor) = self.lookup(slot_id) {
            self.set(descriptor, value);
            return (descriptor, false);
        }

        let new_map = registry.transition(&self.map, slot_id, SlotType::Value);
        // The added slot is the child map's own descriptor.
        let descriptor = new_map
            .own_slot()
            .expect("transitioned map must carry a slot");
        self.map = new_map;
        self.slots.push(value);
        debug_assert_eq!(self.slots.len(), self.map.slot_count() as usize);
        (descriptor, true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_object() {
        let registry = MapRegistry::new();
        let obj = Object::empty(&registry);
        assert_eq!(obj.slot_count(), 0);
        assert_eq!(obj.map_id(), MapId::EMPTY);
        assert_eq!(obj.read(SlotId(0)), None);
    }

    #[test]
    fn test_write_then_read() {
        let registry = MapRegistry::new();
        let mut obj = Object::empty(&registry);

        let (descriptor, transitioned) = obj.write(SlotId(3), Value::integer(42), &registry);
        assert!(transitioned);
        assert_eq!(descriptor.offset, 0);
        assert_eq!(obj.read(SlotId(3)), Some(Value::integer(42)));
        assert_eq!(obj.slot_count(), 1);
    }

    #[test]
    fn test_overwrite_existing_slot() {
        let registry = MapRegistry::new();
        let mut obj = Object::empty(&registry);

        obj.write(SlotId(0), Value::integer(1), &registry);
        let map_before = obj.map_id();
        let (_, transitioned) = obj.write(SlotId(0), Value::integer(2), &registry);

        assert!(!transitioned);
        assert_eq!(obj.map_id(), map_before);
        assert_eq!(obj.read(SlotId(0)), Some(Value::integer(2)));
        assert_eq!(obj.slot_count(), 1);
    }

    #[test]
    fn test_slot_count_tracks_map_depth() {
        let registry = MapRegistry::new();
        let mut obj = Object::empty(&registry);
        for id in 0..12u32 {
            obj.write(SlotId(id), Value::integer(id as i64), &registry);
            assert_eq!(obj.slot_count(), obj.map().slot_count() as usize);
        }
        // Past the inline capacity the values must survive the spill.
        for id in 0..12u32 {
            assert_eq!(obj.read(SlotId(id)), Some(Value::integer(id as i64)));
        }
    }

    #[test]
    fn test_objects_share_maps() {
        let registry = MapRegistry::new();
        let mut a = Object::empty(&registry);
        let mut b = Object::empty(&registry);

        for id in [10u32, 20, 30] {
            a.write(SlotId(id), Value::integer(1), &registry);
            b.write(SlotId(id), Value::integer(2), &registry);
        }

        assert!(Arc::ptr_eq(a.map(), b.map()));
        // Shared layout, distinct storage.
        assert_eq!(a.read(SlotId(20)), Some(Value::integer(1)));
        assert_eq!(b.read(SlotId(20)), Some(Value::integer(2)));
    }

    #[test]
    fn test_new_from_deep_map_zero_fills() {
        let registry = MapRegistry::new();
        let mut donor = Object::empty(&registry);
        donor.write(SlotId(0), Value::integer(5), &registry);
        donor.write(SlotId(1), Value::integer(6), &registry);

        let fresh = Object::new(Arc::clone(donor.map()));
        assert_eq!(fresh.slot_count(), 2);
        assert_eq!(fresh.read(SlotId(0)), Some(Value::UNDEFINED));
    }
}
