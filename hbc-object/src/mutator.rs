//! Bulk property-flag rewrites over a shape.
//!
//! Each rewrite folds an [`ShapeRegistry::update_property`] transition over
//! every property of the source shape in enumeration order. Properties the
//! rule leaves unchanged add no transition, so rewriting an already
//! rewritten shape returns it unchanged.

use crate::error::Result;
use crate::shape::{PropertyFlags, ShapeId, ShapeRegistry, ShapeSummary};

/// Flags after unfreezing: data properties become writable and
/// configurable, accessors become configurable. Enumerability is kept.
pub fn unfrozen_flags(flags: PropertyFlags) -> PropertyFlags {
    if flags.is_accessor() {
        flags | PropertyFlags::CONFIGURABLE
    } else {
        flags | PropertyFlags::WRITABLE | PropertyFlags::CONFIGURABLE
    }
}

pub fn frozen_flags(flags: PropertyFlags) -> PropertyFlags {
    if flags.is_accessor() {
        flags - PropertyFlags::CONFIGURABLE
    } else {
        flags - PropertyFlags::WRITABLE - PropertyFlags::CONFIGURABLE
    }
}

pub fn sealed_flags(flags: PropertyFlags) -> PropertyFlags {
    flags - PropertyFlags::CONFIGURABLE
}

/// Derive a shape in which every property is writable (data) and
/// configurable. The source shape is left untouched.
pub fn make_all_writable(shapes: &mut ShapeRegistry, shape: ShapeId) -> Result<ShapeId> {
    let result = rewrite_all(shapes, shape, unfrozen_flags)?;
    debug_assert!(
        !shapes
            .get(result)
            .summary()
            .intersects(ShapeSummary::ALL_NON_CONFIGURABLE | ShapeSummary::ALL_READ_ONLY),
        "unfrozen shape {result} still reports read-only properties"
    );
    Ok(result)
}

/// Derive a shape in which every property is read-only.
pub fn make_all_read_only(shapes: &mut ShapeRegistry, shape: ShapeId) -> Result<ShapeId> {
    rewrite_all(shapes, shape, frozen_flags)
}

/// Derive a shape in which every property is non-configurable.
pub fn make_all_non_configurable(shapes: &mut ShapeRegistry, shape: ShapeId) -> Result<ShapeId> {
    rewrite_all(shapes, shape, sealed_flags)
}

fn rewrite_all(
    shapes: &mut ShapeRegistry,
    shape: ShapeId,
    rule: impl Fn(PropertyFlags) -> PropertyFlags,
) -> Result<ShapeId> {
    let map = shapes.property_map(shape);
    let mut current = shape;
    let mut rewritten = 0usize;
    for desc in map.iter() {
        let flags = rule(desc.flags);
        if flags == desc.flags {
            continue;
        }
        current = shapes.update_property(current, desc.key.as_str(), flags)?;
        rewritten += 1;
    }
    log::trace!(
        "rewrote {rewritten} of {} properties: shape {shape} -> {current}",
        map.len()
    );
    Ok(current)
}
