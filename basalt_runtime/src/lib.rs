//! Heap-managed object model for the Basalt VM.
//!
//! This crate owns everything that lives on the script heap:
//!
//! - [`Map`] - persistent object-layout descriptions (hidden classes) with
//!   memoized transitions; objects built by identical slot histories share a
//!   map, which is what makes inline caching sound
//! - [`Object`] - a map pointer plus a slot vector whose length always
//!   equals the map's depth
//! - [`Heap`] - a non-moving mark-sweep collector facade: allocation, root
//!   enumeration via [`RootProvider`], write barriers, explicit collection
//!
//! The VM, execution contexts, and `Value`s hold non-owning references into
//! the heap; the heap owns every cell and frees the unreachable ones during
//! collection.

#![deny(unsafe_op_in_unsafe_fn)]

pub mod config;
pub mod heap;
pub mod map;
pub mod object;
pub mod roots;
pub mod stats;

pub use config::GcConfig;
pub use heap::{CollectionResult, GcCell, Heap, HeapData, ObjectRef};
pub use map::{Map, MapId, MapRegistry, SlotDescriptor, SlotId, SlotType};
pub use object::{Object, INLINE_SLOTS};
pub use roots::{NoRoots, RootProvider};
pub use stats::GcStats;
