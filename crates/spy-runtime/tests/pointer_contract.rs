//! Managed pointer behaviour as seen by generated code.

use proptest::prelude::*;
use serial_test::serial;
use spy_runtime::{CheckedPtr, GcHeap, ManagedPtr, Ptr, RuntimeError, UncheckedPtr, gc_heap};

#[test]
#[serial]
fn three_int32_elements_on_the_process_heap() {
    let p = CheckedPtr::<i32>::gc_alloc(3);
    p.store(0, 10);
    p.store(1, 20);
    p.store(2, 30);

    assert_eq!(p.load(0), 10);
    assert_eq!(p.load(1), 20);
    assert_eq!(p.load(2), 30);
    assert_eq!(gc_heap().block_size(p.gc_ref()), Some(12));
}

#[test]
#[serial]
#[should_panic(expected = "ptr_load out of bounds: index 3, length 3")]
fn load_past_the_end_terminates() {
    let p = CheckedPtr::<i32>::gc_alloc(3);
    p.load(3);
}

#[test]
#[cfg(not(feature = "unchecked-ptr"))]
fn default_build_uses_checked_pointers() {
    assert_eq!(
        std::any::TypeId::of::<Ptr<u8>>(),
        std::any::TypeId::of::<CheckedPtr<u8>>()
    );

    let heap = GcHeap::new();
    let p = Ptr::<u8>::alloc_in(&heap, 1);
    assert_eq!(p.len(), 1);
    assert!(matches!(
        p.try_load_in(&heap, 1),
        Err(RuntimeError::PtrOutOfBounds { .. })
    ));
}

#[test]
fn pointers_of_different_element_types_coexist() {
    let heap = GcHeap::new();
    let bytes = CheckedPtr::<u8>::alloc_in(&heap, 4);
    let floats = UncheckedPtr::<f32>::alloc_in(&heap, 4);

    bytes.store_in(&heap, 3, 0xAB);
    floats.store_in(&heap, 3, 2.5);

    assert_eq!(bytes.load_in(&heap, 3), 0xAB);
    assert_eq!(floats.load_in(&heap, 3), 2.5);
    assert_eq!(heap.block_size(bytes.gc_ref()), Some(4));
    assert_eq!(heap.block_size(floats.gc_ref()), Some(16));
}

#[test]
#[cfg(feature = "unchecked-ptr")]
fn unchecked_build_uses_unchecked_pointers() {
    assert_eq!(
        std::any::TypeId::of::<Ptr<i32>>(),
        std::any::TypeId::of::<UncheckedPtr<i32>>()
    );

    let heap = GcHeap::new();
    let p = Ptr::<i32>::alloc_in(&heap, 2);
    p.store_in(&heap, 1, 7);
    assert_eq!(p.load_in(&heap, 1), 7);
    assert!(matches!(
        p.try_load_in(&heap, 2),
        Err(RuntimeError::BlockFault { .. })
    ));
}

proptest! {
    #[test]
    fn checked_access_succeeds_exactly_inside_bounds(
        n in 0usize..64,
        probe in 0usize..128,
        value in any::<i64>(),
    ) {
        let heap = GcHeap::new();
        let p = CheckedPtr::<i64>::alloc_in(&heap, n);

        for i in 0..n {
            prop_assert!(p.try_store_in(&heap, i, value).is_ok());
            prop_assert_eq!(p.try_load_in(&heap, i), Ok(value));
        }

        let store = p.try_store_in(&heap, probe, value);
        let load = p.try_load_in(&heap, probe);
        if probe < n {
            prop_assert!(store.is_ok());
            prop_assert_eq!(load, Ok(value));
        } else {
            prop_assert_eq!(
                store,
                Err(RuntimeError::PtrOutOfBounds { op: "ptr_store", index: probe, length: n })
            );
            prop_assert_eq!(
                load,
                Err(RuntimeError::PtrOutOfBounds { op: "ptr_load", index: probe, length: n })
            );
        }
    }

    #[test]
    fn stores_do_not_disturb_neighbours(
        values in proptest::collection::vec(any::<u32>(), 1..32),
    ) {
        let heap = GcHeap::new();
        let p = CheckedPtr::<u32>::alloc_in(&heap, values.len());
        for (i, v) in values.iter().enumerate() {
            p.store_in(&heap, i, *v);
        }
        for (i, v) in values.iter().enumerate() {
            prop_assert_eq!(p.load_in(&heap, i), *v);
        }
    }
}
