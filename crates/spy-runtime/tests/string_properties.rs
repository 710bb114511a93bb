//! String operations: concrete scenarios plus properties over arbitrary bytes.

use proptest::prelude::*;
use serial_test::serial;
use spy_runtime::builtins::int_to_str_in;
use spy_runtime::{GcHeap, RuntimeError, SpyStr, int_to_str};

#[test]
#[serial]
fn foo_plus_bar() {
    let joined = SpyStr::from("foo") + SpyStr::from("bar");
    assert_eq!(joined.len(), 6);
    assert_eq!(joined, SpyStr::from("foobar"));
    assert_eq!(joined.to_string(), "foobar");
}

#[test]
#[serial]
fn ab_times_three() {
    let repeated = SpyStr::from("ab").mul(3);
    assert_eq!(repeated.len(), 6);
    assert_eq!(repeated, SpyStr::from("ababab"));
}

#[test]
#[serial]
fn int_to_str_matches_reference_values() {
    assert_eq!(int_to_str(0), SpyStr::from("0"));
    assert_eq!(int_to_str(42), SpyStr::from("42"));
    assert_eq!(int_to_str(-17), SpyStr::from("-17"));
    assert_eq!(int_to_str(i32::MIN), SpyStr::from("-2147483648"));
    assert_eq!(int_to_str(i32::MIN).len(), 11);
}

#[test]
#[serial]
#[should_panic(expected = "string index out of bound")]
fn getitem_past_the_end_terminates() {
    SpyStr::from("abc").getitem(3);
}

#[test]
#[serial]
fn debug_output_shows_contents() {
    assert_eq!(format!("{:?}", SpyStr::from("hi")), r#"SpyStr("hi")"#);
}

proptest! {
    #[test]
    fn add_preserves_both_halves(
        a in proptest::collection::vec(any::<u8>(), 0..64),
        b in proptest::collection::vec(any::<u8>(), 0..64),
    ) {
        let heap = GcHeap::new();
        let sa = SpyStr::from_bytes_in(&heap, &a);
        let sb = SpyStr::from_bytes_in(&heap, &b);
        let joined = sa.add_in(&heap, sb).to_bytes_in(&heap);

        prop_assert_eq!(joined.len(), a.len() + b.len());
        prop_assert_eq!(&joined[..a.len()], &a[..]);
        prop_assert_eq!(&joined[a.len()..], &b[..]);
    }

    #[test]
    fn mul_scales_length(
        a in proptest::collection::vec(any::<u8>(), 0..16),
        n in 0i32..16,
    ) {
        let heap = GcHeap::new();
        let s = SpyStr::from_bytes_in(&heap, &a);
        let repeated = s.mul_in(&heap, n);

        prop_assert_eq!(repeated.len_in(&heap), a.len() * n as usize);
        prop_assert_eq!(repeated.to_bytes_in(&heap), a.repeat(n as usize));
        prop_assert!(s.mul_in(&heap, 1).eq_in(&heap, s));
        prop_assert_eq!(s.mul_in(&heap, 0).len_in(&heap), 0);
    }

    #[test]
    fn mul_rejects_every_negative_count(n in i32::MIN..0) {
        let heap = GcHeap::new();
        let s = SpyStr::from_bytes_in(&heap, b"x");
        prop_assert_eq!(s.try_mul_in(&heap, n), Err(RuntimeError::NegativeRepeat { count: n }));
    }

    #[test]
    fn eq_is_reflexive_symmetric_and_length_sensitive(
        a in proptest::collection::vec(any::<u8>(), 0..32),
        b in proptest::collection::vec(any::<u8>(), 0..32),
    ) {
        let heap = GcHeap::new();
        let sa = SpyStr::from_bytes_in(&heap, &a);
        let sb = SpyStr::from_bytes_in(&heap, &b);
        let sa_copy = SpyStr::from_bytes_in(&heap, &a);

        prop_assert!(sa.eq_in(&heap, sa));
        prop_assert!(sa.eq_in(&heap, sa_copy));
        prop_assert_eq!(sa.eq_in(&heap, sb), sb.eq_in(&heap, sa));
        prop_assert_eq!(sa.eq_in(&heap, sb), a == b);
        if a.len() != b.len() {
            prop_assert!(!sa.eq_in(&heap, sb));
        }
    }

    #[test]
    fn getitem_follows_python_indexing(
        bytes in proptest::collection::vec(any::<u8>(), 1..32),
        raw in -64i32..64,
    ) {
        let heap = GcHeap::new();
        let s = SpyStr::from_bytes_in(&heap, &bytes);
        let len = bytes.len() as i32;
        let result = s.try_getitem_in(&heap, raw);

        let resolved = if raw < 0 { raw + len } else { raw };
        if (0..len).contains(&resolved) {
            let item = result.unwrap();
            prop_assert_eq!(item.to_bytes_in(&heap), vec![bytes[resolved as usize]]);
        } else {
            prop_assert_eq!(
                result.unwrap_err(),
                RuntimeError::StrIndexOutOfBounds { index: i64::from(raw), length: bytes.len() }
            );
        }

        let last = s.getitem_in(&heap, -1).to_bytes_in(&heap);
        let explicit = s.getitem_in(&heap, len - 1).to_bytes_in(&heap);
        prop_assert_eq!(last, explicit);
        prop_assert!(s.try_getitem_in(&heap, len).is_err());
        prop_assert!(s.try_getitem_in(&heap, -(len + 1)).is_err());
    }

    #[test]
    fn int_to_str_agrees_with_std(x in any::<i32>()) {
        let heap = GcHeap::new();
        prop_assert_eq!(int_to_str_in(&heap, x).to_bytes_in(&heap), x.to_string().into_bytes());
    }
}
