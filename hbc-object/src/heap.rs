//! Object heap.
//!
//! Objects live in an append-only arena and are addressed by [`ObjectRef`].
//! A concrete object pairs a shape with its slot values; a forwarding
//! object stands in for another object and delegates every operation to
//! it.

use std::fmt;
use std::rc::Rc;

use bitflags::bitflags;

use crate::error::{ObjectError, Result};
use crate::mutator;
use crate::shape::{
    PropertyDescriptor, PropertyFlags, PropertyKey, ShapeId, ShapeRegistry, ShapeSummary,
};

/// Handle to an object in an [`ObjectHeap`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ObjectRef(pub u32);

impl fmt::Display for ObjectRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "@{}", self.0)
    }
}

/// A value stored in an object slot.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum HeapValue {
    #[default]
    Undefined,
    Null,
    Bool(bool),
    Number(f64),
    String(Rc<str>),
    Object(ObjectRef),
}

impl From<&str> for HeapValue {
    fn from(s: &str) -> Self {
        Self::String(Rc::from(s))
    }
}

impl From<f64> for HeapValue {
    fn from(n: f64) -> Self {
        Self::Number(n)
    }
}

impl From<bool> for HeapValue {
    fn from(b: bool) -> Self {
        Self::Bool(b)
    }
}

impl From<ObjectRef> for HeapValue {
    fn from(obj: ObjectRef) -> Self {
        Self::Object(obj)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct AccessorPair {
    pub getter: Option<ObjectRef>,
    pub setter: Option<ObjectRef>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Slot {
    Data(HeapValue),
    Accessor(AccessorPair),
}

bitflags! {
    /// Per-instance state that may run ahead of the shape summary.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct ObjectFlags: u8 {
        const NO_EXTEND = 1 << 0;
        /// Known frozen without consulting the shape.
        const FROZEN = 1 << 1;
        /// Known sealed without consulting the shape.
        const SEALED = 1 << 2;
    }
}

#[derive(Debug, Clone)]
pub struct ObjectInstance {
    shape: ShapeId,
    slots: Vec<Slot>,
    flags: ObjectFlags,
}

impl ObjectInstance {
    fn new() -> Self {
        Self {
            shape: ShapeId::EMPTY,
            slots: Vec::new(),
            flags: ObjectFlags::empty(),
        }
    }

    pub fn shape(&self) -> ShapeId {
        self.shape
    }

    pub fn slots(&self) -> &[Slot] {
        &self.slots
    }

    pub fn flags(&self) -> ObjectFlags {
        self.flags
    }
}

#[derive(Debug, Clone)]
pub enum HeapObject {
    Concrete(ObjectInstance),
    /// Delegates to the target object, proxy style.
    Forwarding(ObjectRef),
}

/// Arena of objects sharing one [`ShapeRegistry`].
#[derive(Debug, Default)]
pub struct ObjectHeap {
    shapes: ShapeRegistry,
    objects: Vec<HeapObject>,
}

impl ObjectHeap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn shapes(&self) -> &ShapeRegistry {
        &self.shapes
    }

    pub fn object_count(&self) -> usize {
        self.objects.len()
    }

    /// Allocate an empty, extensible object.
    pub fn alloc_object(&mut self) -> ObjectRef {
        self.push(HeapObject::Concrete(ObjectInstance::new()))
    }

    /// Allocate an object forwarding to `target`.
    ///
    /// Targets always precede their forwarders in the arena, so forwarding
    /// chains are finite.
    pub fn alloc_forwarding(&mut self, target: ObjectRef) -> Result<ObjectRef> {
        self.get(target)?;
        Ok(self.push(HeapObject::Forwarding(target)))
    }

    fn push(&mut self, object: HeapObject) -> ObjectRef {
        let obj = ObjectRef(self.objects.len() as u32);
        self.objects.push(object);
        obj
    }

    pub fn get(&self, obj: ObjectRef) -> Result<&HeapObject> {
        self.objects
            .get(obj.0 as usize)
            .ok_or(ObjectError::ObjectNotFound(obj))
    }

    /// Follow forwarding links to the concrete object behind `obj`.
    pub fn resolve(&self, obj: ObjectRef) -> Result<ObjectRef> {
        let mut cur = obj;
        loop {
            match self.get(cur)? {
                HeapObject::Concrete(_) => return Ok(cur),
                HeapObject::Forwarding(target) => cur = *target,
            }
        }
    }

    /// The concrete instance behind `obj`.
    pub fn instance(&self, obj: ObjectRef) -> Result<&ObjectInstance> {
        let target = self.resolve(obj)?;
        match self.get(target)? {
            HeapObject::Concrete(inst) => Ok(inst),
            HeapObject::Forwarding(_) => Err(ObjectError::ObjectNotFound(target)),
        }
    }

    fn instance_mut(&mut self, obj: ObjectRef) -> Result<&mut ObjectInstance> {
        let target = self.resolve(obj)?;
        match self.objects.get_mut(target.0 as usize) {
            Some(HeapObject::Concrete(inst)) => Ok(inst),
            _ => Err(ObjectError::ObjectNotFound(target)),
        }
    }

    pub fn shape_of(&self, obj: ObjectRef) -> Result<ShapeId> {
        Ok(self.instance(obj)?.shape)
    }

    pub fn get_own_property(
        &self,
        obj: ObjectRef,
        key: &str,
    ) -> Result<Option<PropertyDescriptor>> {
        let shape = self.shape_of(obj)?;
        Ok(self.shapes.find(shape, key))
    }

    pub fn property_slot(&self, obj: ObjectRef, key: &str) -> Result<Option<&Slot>> {
        let inst = self.instance(obj)?;
        Ok(self
            .shapes
            .find(inst.shape, key)
            .and_then(|desc| inst.slots.get(desc.slot as usize)))
    }

    /// Data value of property `key`, if it is a data property.
    pub fn property_value(&self, obj: ObjectRef, key: &str) -> Result<Option<&HeapValue>> {
        Ok(match self.property_slot(obj, key)? {
            Some(Slot::Data(value)) => Some(value),
            _ => None,
        })
    }

    pub fn define_data_property(
        &mut self,
        obj: ObjectRef,
        key: &str,
        value: impl Into<HeapValue>,
        flags: PropertyFlags,
    ) -> Result<()> {
        self.define(
            obj,
            key,
            Slot::Data(value.into()),
            flags - PropertyFlags::ACCESSOR,
        )
    }

    pub fn define_accessor_property(
        &mut self,
        obj: ObjectRef,
        key: &str,
        pair: AccessorPair,
        flags: PropertyFlags,
    ) -> Result<()> {
        self.define(
            obj,
            key,
            Slot::Accessor(pair),
            (flags | PropertyFlags::ACCESSOR) - PropertyFlags::WRITABLE,
        )
    }

    /// Create or redefine property `key`.
    ///
    /// A non-configurable property may only have its value replaced, and
    /// only while it stays a writable data property with the same flags.
    fn define(&mut self, obj: ObjectRef, key: &str, slot: Slot, flags: PropertyFlags) -> Result<()> {
        let inst = self.instance(obj)?;
        let (shape, no_extend) = (inst.shape, inst.flags.contains(ObjectFlags::NO_EXTEND));

        match self.shapes.find(shape, key) {
            Some(desc) => {
                if !desc.flags.is_configurable()
                    && (desc.flags != flags || !desc.flags.is_writable())
                {
                    return Err(ObjectError::NonConfigurable(desc.key));
                }
                let next = self.shapes.update_property(shape, key, flags)?;
                let inst = self.instance_mut(obj)?;
                inst.shape = next;
                inst.slots[desc.slot as usize] = slot;
            }
            None => {
                if no_extend {
                    return Err(ObjectError::NotExtensible(PropertyKey::from(key)));
                }
                let next = self.shapes.add_property(shape, key, flags)?;
                let inst = self.instance_mut(obj)?;
                inst.shape = next;
                inst.slots.push(slot);
            }
        }
        Ok(())
    }

    pub fn prevent_extensions(&mut self, obj: ObjectRef) -> Result<()> {
        let shape = self.shape_of(obj)?;
        let next = self.shapes.prevent_extensions(shape);
        let inst = self.instance_mut(obj)?;
        inst.shape = next;
        inst.flags |= ObjectFlags::NO_EXTEND;
        Ok(())
    }

    /// Make every property non-configurable and prevent extensions.
    pub fn seal(&mut self, obj: ObjectRef) -> Result<()> {
        let shape = self.shape_of(obj)?;
        let sealed = mutator::make_all_non_configurable(&mut self.shapes, shape)?;
        let next = self.shapes.prevent_extensions(sealed);
        let inst = self.instance_mut(obj)?;
        inst.shape = next;
        inst.flags |= ObjectFlags::NO_EXTEND | ObjectFlags::SEALED;
        Ok(())
    }

    /// Make every property read-only and prevent extensions.
    pub fn freeze(&mut self, obj: ObjectRef) -> Result<()> {
        let shape = self.shape_of(obj)?;
        let frozen = mutator::make_all_read_only(&mut self.shapes, shape)?;
        let next = self.shapes.prevent_extensions(frozen);
        let inst = self.instance_mut(obj)?;
        inst.shape = next;
        inst.flags |= ObjectFlags::NO_EXTEND | ObjectFlags::SEALED | ObjectFlags::FROZEN;
        Ok(())
    }

    pub fn is_extensible(&self, obj: ObjectRef) -> Result<bool> {
        Ok(!self.instance(obj)?.flags.contains(ObjectFlags::NO_EXTEND))
    }

    pub fn is_sealed(&self, obj: ObjectRef) -> Result<bool> {
        self.check_summary(obj, ObjectFlags::SEALED, ShapeSummary::ALL_NON_CONFIGURABLE)
    }

    pub fn is_frozen(&self, obj: ObjectRef) -> Result<bool> {
        self.check_summary(obj, ObjectFlags::FROZEN, ShapeSummary::ALL_READ_ONLY)
    }

    fn check_summary(&self, obj: ObjectRef, known: ObjectFlags, all: ShapeSummary) -> Result<bool> {
        let inst = self.instance(obj)?;
        if inst.flags.contains(known) {
            return Ok(true);
        }
        if !inst.flags.contains(ObjectFlags::NO_EXTEND) {
            return Ok(false);
        }
        let shape = self.shapes.get(inst.shape);
        Ok(shape.property_count() == 0 || shape.summary().contains(all))
    }

    /// Make `obj` fully mutable again: every data property writable and
    /// configurable, every accessor configurable, the object extensible.
    ///
    /// A forwarding object is unfrozen through its target. Objects sharing
    /// the old shape keep it. Returns `obj`.
    pub fn unfreeze(&mut self, obj: ObjectRef) -> Result<ObjectRef> {
        let forwarded = match self.get(obj)? {
            HeapObject::Forwarding(target) => Some(*target),
            HeapObject::Concrete(_) => None,
        };
        if let Some(target) = forwarded {
            log::debug!("unfreeze {obj}: forwarding to {target}");
            self.unfreeze(target)?;
            return Ok(obj);
        }

        let old = self.shape_of(obj)?;
        let writable = mutator::make_all_writable(&mut self.shapes, old)?;
        let next = self.shapes.allow_extensions(writable);

        let inst = self.instance_mut(obj)?;
        inst.shape = next;
        inst.flags -= ObjectFlags::NO_EXTEND | ObjectFlags::FROZEN | ObjectFlags::SEALED;
        log::debug!("unfreeze {obj}: shape {old} -> {next}");
        Ok(obj)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn forwarding_chain_resolves() {
        let mut heap = ObjectHeap::new();
        let a = heap.alloc_object();
        let b = heap.alloc_forwarding(a).unwrap();
        let c = heap.alloc_forwarding(b).unwrap();
        assert_eq!(heap.object_count(), 3);
        assert_eq!(heap.resolve(c).unwrap(), a);
        assert!(matches!(
            heap.alloc_forwarding(ObjectRef(99)),
            Err(ObjectError::ObjectNotFound(ObjectRef(99)))
        ));
        assert_eq!(heap.object_count(), 3);
    }

    #[test]
    fn slots_follow_descriptors() {
        let mut heap = ObjectHeap::new();
        let o = heap.alloc_object();
        heap.define_data_property(o, "a", 1.0, PropertyFlags::data()).unwrap();
        heap.define_data_property(o, "b", "two", PropertyFlags::data()).unwrap();
        heap.define_data_property(o, "a", 3.0, PropertyFlags::data()).unwrap();
        assert_eq!(heap.instance(o).unwrap().slots().len(), 2);
        assert_eq!(heap.property_value(o, "a").unwrap(), Some(&HeapValue::Number(3.0)));
        assert_eq!(heap.property_value(o, "b").unwrap(), Some(&HeapValue::from("two")));
    }
}
