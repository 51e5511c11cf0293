//! Object model: a persistent, hash-consed shape transition graph, an
//! object heap whose instances point into it, and the bulk flag rewrites
//! behind freeze, seal and unfreeze.

pub mod error;
pub mod heap;
pub mod mutator;
pub mod shape;

pub use error::{ObjectError, Result};
pub use heap::{AccessorPair, HeapObject, HeapValue, ObjectFlags, ObjectHeap, ObjectInstance, ObjectRef, Slot};
pub use mutator::make_all_writable;
pub use shape::{
    PropertyDescriptor, PropertyFlags, PropertyKey, PropertyMap, Shape, ShapeId, ShapeRegistry,
    ShapeSummary, Transition,
};
