//! Non-moving mark-sweep heap.
//!
//! The heap owns every script-visible allocation: objects and boxed
//! doubles. `Value`s carry raw cell addresses; ownership never leaves the
//! heap, and unreachable cells are reclaimed by [`Heap::collect`].
//!
//! Collection is root-driven: the caller supplies a [`RootProvider`] (the
//! execution context enumerates its live operand-stack region), marking
//! proceeds transitively through object slots, and the sweep frees every
//! unmarked cell. Cells never move, so addresses held in `Value`s stay
//! valid across collections.
//!
//! # Safety
//!
//! Cells are `Box`-allocated and tracked in [`Heap::cells`]; a cell pointer
//! is dereferenced only while the heap is alive, and freed exactly once
//! (either during a sweep or in `Drop`). Values that escape the reachable
//! graph become dangling after a collection - keeping every live value
//! visible to the `RootProvider` is the VM's side of the contract.

use crate::config::GcConfig;
use crate::map::MapRegistry;
use crate::object::Object;
use crate::roots::RootProvider;
use crate::stats::GcStats;
use basalt_core::Value;
use std::cell::{Cell, RefCell};
use std::ptr::NonNull;

// =============================================================================
// Cells
// =============================================================================

/// Payload of a heap cell.
#[derive(Debug)]
pub enum HeapData {
    /// A script object behind interior mutability; the interpreter holds
    /// borrows only for the duration of a single slot access.
    Object(RefCell<Object>),
    /// A boxed double.
    Double(f64),
}

/// One heap allocation: mark bit plus payload.
///
/// Aligned to 8 bytes so cell addresses fit the value tagging scheme.
#[derive(Debug)]
#[repr(align(8))]
pub struct GcCell {
    marked: Cell<bool>,
    /// The allocation's payload.
    pub data: HeapData,
}

// =============================================================================
// Object references
// =============================================================================

/// A non-owning, copyable handle to an object cell.
///
/// Obtained from an object-tagged [`Value`]; valid while the owning heap is
/// alive and the cell reachable.
#[derive(Debug, Clone, Copy)]
pub struct ObjectRef(NonNull<GcCell>);

impl ObjectRef {
    /// Decode an object reference from a value. `None` unless the value is
    /// object-tagged.
    #[inline]
    pub fn from_value(value: Value) -> Option<ObjectRef> {
        let addr = value.as_object_addr()?;
        NonNull::new(addr as *mut GcCell).map(ObjectRef)
    }

    /// Re-encode as a value.
    #[inline]
    pub fn value(self) -> Value {
        Value::from_object_addr(self.0.as_ptr() as usize)
    }

    /// Run `f` with a shared borrow of the object.
    #[inline]
    pub fn with<R>(self, f: impl FnOnce(&Object) -> R) -> R {
        let cell = unsafe { self.0.as_ref() };
        match &cell.data {
            HeapData::Object(object) => f(&object.borrow()),
            // Object-tagged values are only ever minted for object cells.
            HeapData::Double(_) => unreachable!("object reference to a double cell"),
        }
    }

    /// Run `f` with an exclusive borrow of the object.
    #[inline]
    pub fn with_mut<R>(self, f: impl FnOnce(&mut Object) -> R) -> R {
        let cell = unsafe { self.0.as_ref() };
        match &cell.data {
            HeapData::Object(object) => f(&mut object.borrow_mut()),
            HeapData::Double(_) => unreachable!("object reference to a double cell"),
        }
    }
}

// =============================================================================
// Heap
// =============================================================================

/// Result of one collection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CollectionResult {
    /// Cells that survived.
    pub live: usize,
    /// Cells freed.
    pub freed: usize,
}

/// The mark-sweep heap.
pub struct Heap {
    /// Every live cell. Entries are removed only by `collect` and `Drop`.
    cells: Vec<NonNull<GcCell>>,
    /// Map registry for objects allocated from this heap.
    maps: MapRegistry,
    /// Live-cell count that makes `should_collect` true.
    threshold: usize,
    config: GcConfig,
    stats: GcStats,
}

impl Heap {
    pub fn new(config: GcConfig) -> Heap {
        Heap {
            cells: Vec::new(),
            maps: MapRegistry::new(),
            threshold: config.collect_threshold,
            config,
            stats: GcStats::default(),
        }
    }

    pub fn with_defaults() -> Heap {
        Heap::new(GcConfig::default())
    }

    /// The map registry tied to this heap.
    #[inline]
    pub fn maps(&self) -> &MapRegistry {
        &self.maps
    }

    /// Allocate an empty object and return its tagged reference.
    pub fn alloc_object(&mut self) -> Value {
        let object = Object::empty(&self.maps);
        let cell = self.alloc_cell(HeapData::Object(RefCell::new(object)));
        Value::from_object_addr(cell.as_ptr() as usize)
    }

    /// Allocate a boxed double and return its tagged reference.
    pub fn alloc_double(&mut self, value: f64) -> Value {
        let cell = self.alloc_cell(HeapData::Double(value));
        Value::from_double_addr(cell.as_ptr() as usize)
    }

    fn alloc_cell(&mut self, data: HeapData) -> NonNull<GcCell> {
        let cell = Box::new(GcCell { marked: Cell::new(false), data });
        let ptr = NonNull::from(Box::leak(cell));
        self.cells.push(ptr);
        self.stats.cells_allocated += 1;
        ptr
    }

    /// Read a boxed double back out of a double-tagged value.
    pub fn read_double(&self, value: Value) -> Option<f64> {
        let addr = value.as_double_addr()?;
        let ptr = NonNull::new(addr as *mut GcCell)?;
        let cell = unsafe { ptr.as_ref() };
        match cell.data {
            HeapData::Double(d) => Some(d),
            HeapData::Object(_) => None,
        }
    }

    /// GC cooperation point after a slot store.
    ///
    /// The heap is single-generation and non-moving, so the barrier only
    /// keeps accounting; a generational collector would record the mutated
    /// cell here.
    #[inline]
    pub fn write_barrier(&mut self, _target: Value) {
        self.stats.barrier_writes += 1;
    }

    /// Whether the caller should run a collection before allocating more.
    #[inline]
    pub fn should_collect(&self) -> bool {
        self.config.stress || self.cells.len() >= self.threshold
    }

    /// Mark from the given roots and sweep everything unreachable.
    pub fn collect<R: RootProvider + ?Sized>(&mut self, roots: &R) -> CollectionResult {
        let before = self.cells.len();

        // Mark phase: roots first, then transitively through object slots.
        let mut worklist: Vec<NonNull<GcCell>> = Vec::new();
        roots.visit_roots(|value| {
            if let Some(ptr) = cell_of(value) {
                let cell = unsafe { ptr.as_ref() };
                if !cell.marked.replace(true) {
                    worklist.push(ptr);
                }
            }
        });

        while let Some(ptr) = worklist.pop() {
            let cell = unsafe { ptr.as_ref() };
            if let HeapData::Object(object) = &cell.data {
                for &slot in object.borrow().slots() {
                    if let Some(child) = cell_of(slot) {
                        let child_cell = unsafe { child.as_ref() };
                        if !child_cell.marked.replace(true) {
                            worklist.push(child);
                        }
                    }
                }
            }
        }

        // Sweep phase: free unmarked cells, clear marks on survivors.
        self.cells.retain(|&ptr| {
            let marked = unsafe { ptr.as_ref() }.marked.replace(false);
            if !marked {
                drop(unsafe { Box::from_raw(ptr.as_ptr()) });
            }
            marked
        });

        let live = self.cells.len();
        let freed = before - live;
        self.stats.collections += 1;
        self.stats.cells_freed += freed as u64;
        self.threshold = self
            .config
            .collect_threshold
            .max((live as f64 * self.config.growth_factor) as usize);

        CollectionResult { live, freed }
    }

    /// Number of cells currently allocated.
    #[inline]
    pub fn live_cells(&self) -> usize {
        self.cells.len()
    }

    #[inline]
    pub fn stats(&self) -> &GcStats {
        &self.stats
    }

    #[inline]
    pub fn config(&self) -> &GcConfig {
        &self.config
    }
}

/// The tracked cell behind a value, if the value is a heap reference.
#[inline]
fn cell_of(value: Value) -> Option<NonNull<GcCell>> {
    value
        .as_heap_addr()
        .and_then(|addr| NonNull::new(addr as *mut GcCell))
}

impl Drop for Heap {
    fn drop(&mut self) {
        for &ptr in &self.cells {
            drop(unsafe { Box::from_raw(ptr.as_ptr()) });
        }
        self.cells.clear();
    }
}

// =============================================================================
// Tests
// =============================================================================
