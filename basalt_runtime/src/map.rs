//! Object maps: shared slot-layout descriptions.
//!
//! Objects with the same sequence of slot additions share a [`Map`]. Each
//! map describes the layout of every object wearing it, enabling offset
//! lookups without per-object dictionaries.
//!
//! # Transitions
//!
//! Adding a slot to an object does not mutate its map. Instead the object
//! *transitions* to a child map that records the added slot. Maps form a
//! transition tree rooted at the empty map:
//!
//! ```text
//!     EmptyMap
//!         |
//!     +---+---+
//!     |       |
//!   slot 0  slot 1
//!     |       |
//!   Map A   Map B
//!     |
//!   slot 1
//!     |
//!   Map C (has slots 0 and 1)
//! ```
//!
//! Transitions are memoized on the parent, keyed by `(slot id, slot type)`:
//! two independent objects performing the same transition end up wearing the
//! *same* child map. This shape identity is what call-site slot caches key
//! on, so it is a correctness requirement, not an optimization.
//!
//! Walking the parent chain from any map enumerates the slots of any object
//! wearing it, in reverse insertion order.

use parking_lot::RwLock;
use rustc_hash::FxHashMap;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;

// =============================================================================
// Slot identity
// =============================================================================

/// Dense integer identifying a slot; carried in object-opcode immediates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(transparent)]
pub struct SlotId(pub u32);

/// Type tag recorded with each slot.
///
/// The dialect currently stores untyped values in every slot, but the tag is
/// part of the transition key so typed layouts stay representable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[repr(u8)]
pub enum SlotType {
    /// An untyped tagged value.
    #[default]
    Value = 0,
}

/// Resolved location of a slot inside an object.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SlotDescriptor {
    /// The slot's identity.
    pub id: SlotId,
    /// The slot's recorded type.
    pub ty: SlotType,
    /// Index into the object's slot vector.
    pub offset: u16,
}

// =============================================================================
// Map id
// =============================================================================

/// Unique identifier for a map, used by call-site slot caches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(transparent)]
pub struct MapId(pub u32);

impl MapId {
    /// The empty map's id.
    pub const EMPTY: MapId = MapId(0);

    #[inline]
    pub const fn raw(self) -> u32 {
        self.0
    }
}

// =============================================================================
// Map
// =============================================================================

/// One node of the transition tree.
///
/// Immutable once created, except for the lazily populated transition table.
#[derive(Debug)]
pub struct Map {
    /// Unique id for cache keying.
    id: MapId,

    /// Parent map; `None` only for the empty map.
    parent: Option<Arc<Map>>,

    /// The slot this map added relative to its parent; `None` only for the
    /// empty map.
    slot: Option<SlotDescriptor>,

    /// Number of slots an object wearing this map carries.
    slot_count: u16,

    /// Memoized transitions to child maps.
    transitions: RwLock<FxHashMap<(SlotId, SlotType), Arc<Map>>>,
}

impl Map {
    fn empty() -> Arc<Map> {
        Arc::new(Map {
            id: MapId::EMPTY,
            parent: None,
            slot: None,
            slot_count: 0,
            transitions: RwLock::new(FxHashMap::default()),
        })
    }

    fn with_slot(parent: Arc<Map>, id: MapId, slot_id: SlotId, ty: SlotType) -> Arc<Map> {
        let offset = parent.slot_count;
        let slot_count = parent.slot_count + 1;
        Arc::new(Map {
            id,
            parent: Some(parent),
            slot: Some(SlotDescriptor { id: slot_id, ty, offset }),
            slot_count,
            transitions: RwLock::new(FxHashMap::default()),
        })
    }

    /// This map's unique id.
    #[inline]
    pub fn id(&self) -> MapId {
        self.id
    }

    /// The parent map, if any.
    #[inline]
    pub fn parent(&self) -> Option<&Arc<Map>> {
        self.parent.as_ref()
    }

    /// The slot this map added relative to its parent.
    #[inline]
    pub fn own_slot(&self) -> Option<SlotDescriptor> {
        self.slot
    }

    /// Number of slots an object wearing this map carries.
    #[inline]
    pub fn slot_count(&self) -> u16 {
        self.slot_count
    }

    /// Whether this is the empty map.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.slot_count == 0
    }

    /// Resolve a slot id by walking the chain toward the root.
    ///
    /// The first node whose recorded id matches wins. O(n) in the slot
    /// count; call sites cache the result keyed by [`MapId`].
    pub fn lookup(&self, slot_id: SlotId) -> Option<SlotDescriptor> {
        let mut current = self;
        loop {
            if let Some(slot) = current.slot {
                if slot.id == slot_id {
                    return Some(slot);
                }
            }
            match &current.parent {
                Some(parent) => current = parent.as_ref(),
                None => return None,
            }
        }
    }

    /// All slot descriptors in insertion order.
    pub fn descriptors(&self) -> Vec<SlotDescriptor> {
        let mut slots = Vec::with_capacity(self.slot_count as usize);
        self.collect_descriptors(&mut slots);
        slots
    }

    fn collect_descriptors(&self, slots: &mut Vec<SlotDescriptor>) {
        if let Some(parent) = &self.parent {
            parent.collect_descriptors(slots);
        }
        if let Some(slot) = self.slot {
            slots.push(slot);
        }
    }

    /// An existing memoized transition, if any.
    pub fn get_transition(&self, slot_id: SlotId, ty: SlotType) -> Option<Arc<Map>> {
        self.transitions.read().get(&(slot_id, ty)).cloned()
    }

    fn add_transition(&self, slot_id: SlotId, ty: SlotType, child: Arc<Map>) {
        self.transitions.write().insert((slot_id, ty), child);
    }
}

// =============================================================================
// Registry
// =============================================================================

/// Owner of the empty map and the id counter.
///
/// One registry per heap; maps from different registries must never mix,
/// since cache keys would collide.
pub struct MapRegistry {
    next_id: AtomicU32,
    empty_map: Arc<Map>,
}

impl MapRegistry {
    pub fn new() -> MapRegistry {
        MapRegistry {
            // Id 0 is reserved for the empty map.
            next_id: AtomicU32::new(1),
            empty_map: Map::empty(),
        }
    }

    /// The shared empty map.
    #[inline]
    pub fn empty_map(&self) -> Arc<Map> {
        Arc::clone(&self.empty_map)
    }

    /// Transition `from` by adding `(slot_id, ty)`.
    ///
    /// Returns the memoized child when the parent has seen this transition
    /// before; otherwise creates the child and installs it in the parent's
    /// transition table.
    pub fn transition(&self, from: &Arc<Map>, slot_id: SlotId, ty: SlotType) -> Arc<Map> {
        if let Some(existing) = from.get_transition(slot_id, ty) {
            return existing;
        }

        let id = MapId(self.next_id.fetch_add(1, Ordering::Relaxed));
        let child = Map::with_slot(Arc::clone(from), id, slot_id, ty);
        from.add_transition(slot_id, ty, Arc::clone(&child));
        child
    }

    /// Number of maps created so far, the empty map included.
    pub fn map_count(&self) -> u32 {
        self.next_id.load(Ordering::Relaxed)
    }
}

impl Default for MapRegistry {
    fn default() -> MapRegistry {
        MapRegistry::new()
    }
}

// =============================================================================
// Tests
// =============================================================================
