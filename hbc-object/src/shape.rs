//! Shapes: immutable, shared descriptions of an object's property layout.
//!
//! Shapes form a transition graph rooted at the empty shape. Every change
//! to a property set is a transition from a parent node to a child node;
//! nodes are never modified once published. Transitions are hash-consed on
//! `(parent, transition)`, so applying the same transitions in the same
//! order from the same parent always lands on the same node and shape
//! identity can stand in for structural equality.
//!
//! ```text
//!          [empty]
//!             |
//!          add x
//!             |
//!           [#1] ---- add y ----> [#2]
//!             |
//!     update x (read-only)
//!             |
//!           [#3]
//! ```

use std::borrow::Borrow;
use std::cell::OnceCell;
use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;

use bitflags::bitflags;

use crate::error::{ObjectError, Result};

/// Property name.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PropertyKey(Rc<str>);

impl PropertyKey {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for PropertyKey {
    fn from(s: &str) -> Self {
        Self(Rc::from(s))
    }
}

impl From<String> for PropertyKey {
    fn from(s: String) -> Self {
        Self(Rc::from(s))
    }
}

impl Borrow<str> for PropertyKey {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PropertyKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

bitflags! {
    /// Per-property attribute flags.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct PropertyFlags: u8 {
        const WRITABLE = 1 << 0;
        const CONFIGURABLE = 1 << 1;
        const ENUMERABLE = 1 << 2;
        /// Getter/setter pair rather than a data value. Accessors ignore
        /// `WRITABLE`.
        const ACCESSOR = 1 << 3;
    }
}

impl Default for PropertyFlags {
    /// A plain data property: writable, enumerable, configurable.
    fn default() -> Self {
        Self::data()
    }
}

impl PropertyFlags {
    pub const fn data() -> Self {
        Self::WRITABLE.union(Self::ENUMERABLE).union(Self::CONFIGURABLE)
    }

    pub const fn accessor() -> Self {
        Self::ACCESSOR.union(Self::ENUMERABLE).union(Self::CONFIGURABLE)
    }

    #[inline]
    pub fn is_accessor(self) -> bool {
        self.contains(Self::ACCESSOR)
    }

    #[inline]
    pub fn is_configurable(self) -> bool {
        self.contains(Self::CONFIGURABLE)
    }

    #[inline]
    pub fn is_writable(self) -> bool {
        self.contains(Self::WRITABLE)
    }

    #[inline]
    pub fn is_enumerable(self) -> bool {
        self.contains(Self::ENUMERABLE)
    }

    /// Neither reconfigurable nor, for data properties, writable.
    pub fn is_read_only(self) -> bool {
        !self.is_configurable() && (self.is_accessor() || !self.is_writable())
    }
}

/// One property of a shape.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PropertyDescriptor {
    pub key: PropertyKey,
    pub flags: PropertyFlags,
    /// Index into the owning object's slot array.
    pub slot: u32,
}

/// Ordered key → descriptor mapping. Iteration follows insertion order.
#[derive(Debug, Clone, Default)]
pub struct PropertyMap {
    entries: Vec<PropertyDescriptor>,
    index: HashMap<PropertyKey, usize>,
}

impl PropertyMap {
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, PropertyDescriptor> {
        self.entries.iter()
    }

    pub fn find(&self, key: &str) -> Option<&PropertyDescriptor> {
        self.index.get(key).map(|&i| &self.entries[i])
    }

    fn apply(&mut self, transition: &Transition) {
        match transition {
            Transition::Add { key, flags } => {
                let slot = self.entries.len();
                self.index.insert(key.clone(), slot);
                self.entries.push(PropertyDescriptor {
                    key: key.clone(),
                    flags: *flags,
                    slot: slot as u32,
                });
            }
            Transition::Update { key, flags } => {
                if let Some(&i) = self.index.get(key.as_str()) {
                    self.entries[i].flags = *flags;
                }
            }
            Transition::PreventExtensions | Transition::AllowExtensions => {}
        }
    }

    /// Property-derived summary bits. Both are clear for an empty map.
    fn summary(&self) -> ShapeSummary {
        let mut summary = ShapeSummary::empty();
        if self.is_empty() {
            return summary;
        }
        if self.entries.iter().all(|d| !d.flags.is_configurable()) {
            summary |= ShapeSummary::ALL_NON_CONFIGURABLE;
        }
        if self.entries.iter().all(|d| d.flags.is_read_only()) {
            summary |= ShapeSummary::ALL_READ_ONLY;
        }
        summary
    }
}

bitflags! {
    /// Cached facts about a shape, recomputed on every transition.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct ShapeSummary: u8 {
        /// Every property is non-configurable; clear when there are none.
        const ALL_NON_CONFIGURABLE = 1 << 0;
        /// Every property is read-only; clear when there are none.
        const ALL_READ_ONLY = 1 << 1;
        const NON_EXTENSIBLE = 1 << 2;
    }
}

/// An edge of the transition graph.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Transition {
    Add { key: PropertyKey, flags: PropertyFlags },
    Update { key: PropertyKey, flags: PropertyFlags },
    PreventExtensions,
    AllowExtensions,
}

/// Unique identifier of a shape within its registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(transparent)]
pub struct ShapeId(pub u32);

impl ShapeId {
    /// The root shape, with no properties.
    pub const EMPTY: Self = Self(0);

    #[inline]
    fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for ShapeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// A node of the transition graph.
#[derive(Debug)]
pub struct Shape {
    id: ShapeId,
    parent: Option<ShapeId>,
    transition: Option<Transition>,
    property_count: u32,
    summary: ShapeSummary,
    /// Lazily materialized property map. Filling it in does not change the
    /// shape's logical contents.
    map: OnceCell<Rc<PropertyMap>>,
}

impl Shape {
    pub fn id(&self) -> ShapeId {
        self.id
    }

    /// Parent node; `None` only for the root.
    pub fn parent(&self) -> Option<ShapeId> {
        self.parent
    }

    /// The transition that produced this node from its parent.
    pub fn transition(&self) -> Option<&Transition> {
        self.transition.as_ref()
    }

    pub fn property_count(&self) -> u32 {
        self.property_count
    }

    pub fn summary(&self) -> ShapeSummary {
        self.summary
    }

    pub fn is_non_extensible(&self) -> bool {
        self.summary.contains(ShapeSummary::NON_EXTENSIBLE)
    }

    pub fn has_property_map(&self) -> bool {
        self.map.get().is_some()
    }
}

/// Arena of shapes plus the hash-consing transition table.
///
/// The arena is append-only: every shape ever produced stays reachable for
/// the registry's lifetime.
#[derive(Debug)]
pub struct ShapeRegistry {
    shapes: Vec<Shape>,
    transitions: HashMap<(ShapeId, Transition), ShapeId>,
}

impl Default for ShapeRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl ShapeRegistry {
    pub fn new() -> Self {
        let root = Shape {
            id: ShapeId::EMPTY,
            parent: None,
            transition: None,
            property_count: 0,
            summary: ShapeSummary::empty(),
            map: OnceCell::from(Rc::new(PropertyMap::default())),
        };
        Self {
            shapes: vec![root],
            transitions: HashMap::new(),
        }
    }

    /// Number of shapes allocated so far, the root included.
    pub fn shape_count(&self) -> usize {
        self.shapes.len()
    }

    /// # Panics
    ///
    /// Panics if `id` was not produced by this registry.
    pub fn get(&self, id: ShapeId) -> &Shape {
        &self.shapes[id.index()]
    }

    /// The full property map of `id`, materializing it if needed by
    /// replaying transitions from the nearest materialized ancestor.
    pub fn property_map(&self, id: ShapeId) -> Rc<PropertyMap> {
        let shape = self.get(id);
        if let Some(map) = shape.map.get() {
            return Rc::clone(map);
        }

        let mut pending = Vec::new();
        let mut cur = shape;
        let base = loop {
            if let Some(map) = cur.map.get() {
                break Rc::clone(map);
            }
            pending.push(cur);
            match cur.parent {
                Some(parent) => cur = self.get(parent),
                None => break Rc::new(PropertyMap::default()),
            }
        };

        let mut map = (*base).clone();
        for node in pending.iter().rev() {
            if let Some(t) = &node.transition {
                map.apply(t);
            }
        }
        log::trace!("materialized property map of shape {id} ({} replayed)", pending.len());

        let map = Rc::new(map);
        let _ = shape.map.set(Rc::clone(&map));
        map
    }

    /// Find property `key` of shape `id` without materializing its map.
    pub fn find(&self, id: ShapeId, key: &str) -> Option<PropertyDescriptor> {
        let mut updated = None;
        let mut cur = Some(id);
        while let Some(sid) = cur {
            let shape = self.get(sid);
            if let Some(map) = shape.map.get() {
                return map.find(key).map(|d| PropertyDescriptor {
                    flags: updated.unwrap_or(d.flags),
                    ..d.clone()
                });
            }
            match &shape.transition {
                Some(Transition::Update { key: k, flags }) if k.as_str() == key => {
                    updated.get_or_insert(*flags);
                }
                Some(Transition::Add { key: k, flags }) if k.as_str() == key => {
                    return Some(PropertyDescriptor {
                        key: k.clone(),
                        flags: updated.unwrap_or(*flags),
                        slot: shape.property_count - 1,
                    });
                }
                _ => {}
            }
            cur = shape.parent;
        }
        None
    }

    /// Transition to a shape with `key` appended.
    pub fn add_property(
        &mut self,
        parent: ShapeId,
        key: impl Into<PropertyKey>,
        flags: PropertyFlags,
    ) -> Result<ShapeId> {
        let key = key.into();
        if self.find(parent, key.as_str()).is_some() {
            return Err(ObjectError::PropertyExists(key));
        }
        Ok(self.transition(parent, Transition::Add { key, flags }))
    }

    /// Transition to a shape where `key` has `flags`. Returns `parent`
    /// itself when the flags are unchanged.
    pub fn update_property(
        &mut self,
        parent: ShapeId,
        key: &str,
        flags: PropertyFlags,
    ) -> Result<ShapeId> {
        let desc = self
            .find(parent, key)
            .ok_or_else(|| ObjectError::PropertyNotFound(key.into()))?;
        if desc.flags == flags {
            return Ok(parent);
        }
        Ok(self.transition(
            parent,
            Transition::Update {
                key: desc.key,
                flags,
            },
        ))
    }

    pub fn prevent_extensions(&mut self, parent: ShapeId) -> ShapeId {
        if self.get(parent).is_non_extensible() {
            return parent;
        }
        self.transition(parent, Transition::PreventExtensions)
    }

    pub fn allow_extensions(&mut self, parent: ShapeId) -> ShapeId {
        if !self.get(parent).is_non_extensible() {
            return parent;
        }
        self.transition(parent, Transition::AllowExtensions)
    }

    /// Follow or create the `transition` edge out of `parent`.
    ///
    /// # Panics
    ///
    /// Panics when the shape id space is exhausted.
    fn transition(&mut self, parent: ShapeId, transition: Transition) -> ShapeId {
        let edge = (parent, transition);
        if let Some(&id) = self.transitions.get(&edge) {
            log::trace!("shape {parent}: reusing {id} for {:?}", edge.1);
            return id;
        }
        let (parent, transition) = edge;

        let base = self.get(parent);
        let extensibility = base.summary & ShapeSummary::NON_EXTENSIBLE;
        let (property_count, summary, map) = match &transition {
            Transition::Add { flags, .. } => {
                let first = base.property_count == 0;
                let mut summary = extensibility;
                if !flags.is_configurable()
                    && (first || base.summary.contains(ShapeSummary::ALL_NON_CONFIGURABLE))
                {
                    summary |= ShapeSummary::ALL_NON_CONFIGURABLE;
                }
                if flags.is_read_only()
                    && (first || base.summary.contains(ShapeSummary::ALL_READ_ONLY))
                {
                    summary |= ShapeSummary::ALL_READ_ONLY;
                }
                (base.property_count + 1, summary, OnceCell::new())
            }
            Transition::Update { .. } => {
                let count = base.property_count;
                let mut map = (*self.property_map(parent)).clone();
                map.apply(&transition);
                let summary = map.summary() | extensibility;
                (count, summary, OnceCell::from(Rc::new(map)))
            }
            Transition::PreventExtensions | Transition::AllowExtensions => {
                let mut summary = base.summary;
                summary.set(
                    ShapeSummary::NON_EXTENSIBLE,
                    transition == Transition::PreventExtensions,
                );
                let map = match base.map.get() {
                    Some(map) => OnceCell::from(Rc::clone(map)),
                    None => OnceCell::new(),
                };
                (base.property_count, summary, map)
            }
        };

        let id = match u32::try_from(self.shapes.len()) {
            Ok(raw) => ShapeId(raw),
            Err(_) => panic!("shape registry exhausted"),
        };
        log::trace!("shape {parent} -> {id} via {transition:?}");
        self.shapes.push(Shape {
            id,
            parent: Some(parent),
            transition: Some(transition.clone()),
            property_count,
            summary,
            map,
        });
        self.transitions.insert((parent, transition), id);
        id
    }
}
