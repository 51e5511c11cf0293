use hbc_object::{
    AccessorPair, HeapValue, ObjectError, ObjectHeap, ObjectRef, PropertyFlags, ShapeId,
    ShapeRegistry, ShapeSummary, Slot, make_all_writable,
};

fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// `{ x: 1, get/set y }` with both properties frozen.
fn frozen_point(heap: &mut ObjectHeap) -> (ObjectRef, AccessorPair) {
    let getter = heap.alloc_object();
    let setter = heap.alloc_object();
    let pair = AccessorPair {
        getter: Some(getter),
        setter: Some(setter),
    };
    let obj = heap.alloc_object();
    heap.define_data_property(obj, "x", 1.0, PropertyFlags::data())
        .unwrap();
    heap.define_accessor_property(obj, "y", pair, PropertyFlags::accessor())
        .unwrap();
    heap.freeze(obj).unwrap();
    (obj, pair)
}

#[test]
fn frozen_point_becomes_mutable() {
    init_logging();
    let mut heap = ObjectHeap::new();
    let (obj, pair) = frozen_point(&mut heap);

    let x = heap.get_own_property(obj, "x").unwrap().unwrap();
    assert!(!x.flags.is_writable() && !x.flags.is_configurable());
    let y = heap.get_own_property(obj, "y").unwrap().unwrap();
    assert!(!y.flags.is_configurable());
    assert!(heap.is_frozen(obj).unwrap());
    assert!(!heap.is_extensible(obj).unwrap());

    assert_eq!(heap.unfreeze(obj).unwrap(), obj);

    let x = heap.get_own_property(obj, "x").unwrap().unwrap();
    assert!(x.flags.is_writable());
    assert!(x.flags.is_configurable());
    assert!(x.flags.is_enumerable());

    let y = heap.get_own_property(obj, "y").unwrap().unwrap();
    assert!(y.flags.is_accessor());
    assert!(y.flags.is_configurable());
    assert!(!y.flags.is_writable());
    assert_eq!(heap.property_slot(obj, "y").unwrap(), Some(&Slot::Accessor(pair)));
    assert_eq!(heap.property_value(obj, "x").unwrap(), Some(&HeapValue::Number(1.0)));

    assert!(heap.is_extensible(obj).unwrap());
    assert!(!heap.is_frozen(obj).unwrap());
    assert!(!heap.is_sealed(obj).unwrap());

    let summary = heap.shapes().get(heap.shape_of(obj).unwrap()).summary();
    assert!(!summary.intersects(ShapeSummary::ALL_NON_CONFIGURABLE | ShapeSummary::ALL_READ_ONLY));
    assert!(!summary.contains(ShapeSummary::NON_EXTENSIBLE));

    heap.define_data_property(obj, "z", 2.0, PropertyFlags::data())
        .unwrap();
    heap.define_data_property(obj, "x", 5.0, PropertyFlags::data())
        .unwrap();
}

#[test]
fn unfreeze_is_idempotent() {
    let mut heap = ObjectHeap::new();
    let (obj, _) = frozen_point(&mut heap);
    heap.unfreeze(obj).unwrap();
    let once = heap.shape_of(obj).unwrap();
    let count = heap.shapes().shape_count();
    heap.unfreeze(obj).unwrap();
    assert_eq!(heap.shape_of(obj).unwrap(), once);
    assert_eq!(heap.shapes().shape_count(), count);
}

#[test]
fn shared_shape_is_preserved() {
    let mut heap = ObjectHeap::new();
    let (a, _) = frozen_point(&mut heap);
    let b = heap.alloc_object();
    heap.define_data_property(b, "x", 9.0, PropertyFlags::data())
        .unwrap();
    let pair = AccessorPair::default();
    heap.define_accessor_property(b, "y", pair, PropertyFlags::accessor())
        .unwrap();
    heap.freeze(b).unwrap();

    let shared = heap.shape_of(a).unwrap();
    assert_eq!(heap.shape_of(b).unwrap(), shared);

    heap.unfreeze(a).unwrap();
    assert_ne!(heap.shape_of(a).unwrap(), shared);
    assert_eq!(heap.shape_of(b).unwrap(), shared);
    assert!(heap.is_frozen(b).unwrap());
    assert!(!heap.is_extensible(b).unwrap());
    let x = heap.get_own_property(b, "x").unwrap().unwrap();
    assert!(!x.flags.is_writable());
    assert_eq!(
        heap.define_data_property(b, "w", 0.0, PropertyFlags::data()),
        Err(ObjectError::NotExtensible("w".into()))
    );
}

#[test]
fn unfreezing_equal_shapes_converges() {
    let mut heap = ObjectHeap::new();
    let (a, _) = frozen_point(&mut heap);
    let (b, _) = frozen_point(&mut heap);
    heap.unfreeze(a).unwrap();
    heap.unfreeze(b).unwrap();
    assert_eq!(heap.shape_of(a).unwrap(), heap.shape_of(b).unwrap());
}

#[test]
fn forwarding_unfreezes_target() {
    init_logging();
    let mut heap = ObjectHeap::new();
    let (target, _) = frozen_point(&mut heap);
    let inner = heap.alloc_forwarding(target).unwrap();
    let outer = heap.alloc_forwarding(inner).unwrap();

    assert_eq!(heap.unfreeze(outer).unwrap(), outer);
    assert!(heap.is_extensible(target).unwrap());
    let x = heap.get_own_property(target, "x").unwrap().unwrap();
    assert!(x.flags.is_writable() && x.flags.is_configurable());
    assert_eq!(heap.get_own_property(outer, "x").unwrap(), Some(x));
}

#[test]
fn sealed_object_unfreezes() {
    let mut heap = ObjectHeap::new();
    let obj = heap.alloc_object();
    heap.define_data_property(obj, "a", true, PropertyFlags::data())
        .unwrap();
    heap.seal(obj).unwrap();
    assert!(heap.is_sealed(obj).unwrap());
    assert!(!heap.is_frozen(obj).unwrap());
    assert_eq!(
        heap.define_data_property(obj, "a", false, PropertyFlags::ENUMERABLE),
        Err(ObjectError::NonConfigurable("a".into()))
    );

    heap.unfreeze(obj).unwrap();
    assert!(!heap.is_sealed(obj).unwrap());
    heap.define_data_property(obj, "a", false, PropertyFlags::ENUMERABLE)
        .unwrap();
}

#[test]
fn empty_frozen_object() {
    let mut heap = ObjectHeap::new();
    let obj = heap.alloc_object();
    heap.freeze(obj).unwrap();
    assert!(heap.is_frozen(obj).unwrap());
    assert!(!heap.is_extensible(obj).unwrap());

    heap.unfreeze(obj).unwrap();
    assert!(heap.is_extensible(obj).unwrap());
    assert!(!heap.is_frozen(obj).unwrap());
    let shape = heap.shapes().get(heap.shape_of(obj).unwrap());
    assert_eq!(shape.property_count(), 0);
    assert_eq!(shape.summary(), ShapeSummary::empty());
}

#[test]
fn hidden_accessor_stays_hidden() {
    let mut heap = ObjectHeap::new();
    let obj = heap.alloc_object();
    heap.define_accessor_property(obj, "h", AccessorPair::default(), PropertyFlags::empty())
        .unwrap();
    heap.unfreeze(obj).unwrap();
    let h = heap.get_own_property(obj, "h").unwrap().unwrap();
    assert!(h.flags.is_configurable());
    assert!(!h.flags.is_enumerable());
}

#[test]
fn mutator_leaves_source_shape_alone() {
    let mut heap = ObjectHeap::new();
    let (obj, _) = frozen_point(&mut heap);
    let frozen = heap.shape_of(obj).unwrap();
    let before = heap.shapes().get(frozen).summary();

    let mut shapes = ShapeRegistry::new();
    let s = shapes
        .add_property(ShapeId::EMPTY, "x", PropertyFlags::ENUMERABLE)
        .unwrap();
    let t = make_all_writable(&mut shapes, s).unwrap();
    assert_ne!(s, t);
    assert_eq!(shapes.find(s, "x").unwrap().flags, PropertyFlags::ENUMERABLE);
    assert_eq!(make_all_writable(&mut shapes, t).unwrap(), t);

    heap.unfreeze(obj).unwrap();
    assert_eq!(heap.shapes().get(frozen).summary(), before);
}

#[test]
fn missing_object() {
    let mut heap = ObjectHeap::new();
    assert_eq!(
        heap.unfreeze(ObjectRef(3)),
        Err(ObjectError::ObjectNotFound(ObjectRef(3)))
    );
}
