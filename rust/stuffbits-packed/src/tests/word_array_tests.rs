use std::sync::{Arc, Barrier};
use std::thread;

use stuffbits_common::ErrorKind;

use crate::word_array::{WordArray, WordArrayOptions};

fn mask(width: u32) -> u128 {
    if width == 128 {
        u128::MAX
    } else {
        (1u128 << width) - 1
    }
}

#[test]
fn test_set_get_all_widths() {
    let mut rng = fastrand::Rng::with_seed(1234);
    for width in 1..=128u32 {
        // Small segments so values land on word boundaries, lock-region
        // boundaries and in several segments.
        let array = WordArray::new(
            WordArrayOptions::new(width).with_segment_bits(width as u64 * 37),
        )
        .unwrap();
        let count = 200u64;
        let values: Vec<u128> = (0..count).map(|_| rng.u128(..) & mask(width)).collect();
        for (i, &v) in values.iter().enumerate() {
            array.set(i as u64, v);
        }
        for (i, &v) in values.iter().enumerate() {
            assert_eq!(array.get(i as u64), v, "width {width}, index {i}");
        }
        assert_eq!(array.num_values(), count);
        assert_eq!(array.values_per_segment(), 37);
        assert!(array.num_segments() >= (count as usize).div_ceil(37));
    }
}

#[test]
fn test_straddling_value_does_not_disturb_neighbors() {
    // 61-bit values: element 1 spans words 0 and 1.
    let array = WordArray::with_width(61).unwrap();
    array.set(0, mask(61));
    array.set(2, mask(61));
    array.set(1, 0x0123_4567_89ab_cdef & mask(61));
    assert_eq!(array.get(0), mask(61));
    assert_eq!(array.get(1), 0x0123_4567_89ab_cdef & mask(61));
    assert_eq!(array.get(2), mask(61));

    array.set(1, 0);
    assert_eq!(array.get(0), mask(61));
    assert_eq!(array.get(1), 0);
    assert_eq!(array.get(2), mask(61));
}

#[test]
fn test_values_are_masked() {
    let array = WordArray::with_width(5).unwrap();
    array.set(3, u128::MAX);
    assert_eq!(array.get(3), 31);
    assert_eq!(array.get(2), 0);
    assert_eq!(array.get(4), 0);
    assert_eq!(array.value_mask(), 31);
}

#[test]
fn test_lazy_segment_growth() {
    let array = WordArray::new(WordArrayOptions::new(8).with_segment_bits(64)).unwrap();
    assert_eq!(array.num_segments(), 0);
    assert_eq!(array.capacity(), 0);

    array.set(100, 7);
    // 8 values per segment: index 100 lives in segment 12.
    assert_eq!(array.num_segments(), 13);
    assert_eq!(array.num_values(), 101);
    assert_eq!(array.get(0), 0);
    assert_eq!(array.get(100), 7);

    array.set(5, 1);
    assert_eq!(array.num_values(), 101);
}

#[test]
fn test_allocate_and_clear() {
    let array = WordArray::new(WordArrayOptions::new(12).with_segment_bits(120)).unwrap();
    array.allocate(0);
    assert_eq!(array.num_segments(), 0);
    array.allocate(25);
    assert_eq!(array.num_segments(), 3);
    assert_eq!(array.num_values(), 0);
    assert_eq!(array.get(24), 0);

    for i in 0..25 {
        array.set(i, i as u128 + 1);
    }
    array.allocate(10);
    assert_eq!(array.get(9), 10);

    array.clear();
    assert_eq!(array.num_segments(), 3);
    assert!((0..25).all(|i| array.get(i) == 0));
}

#[test]
fn test_out_of_bounds_get() {
    let array = WordArray::with_width(16).unwrap();
    array.set(0, 1);
    let capacity = array.capacity();
    assert!(array.try_get(capacity - 1).is_ok());

    let err = array.try_get(capacity).unwrap_err();
    assert!(err.is_precondition_violation());
    assert!(matches!(err.kind(), ErrorKind::OutOfBounds { .. }));
}

#[test]
#[should_panic]
fn test_get_unallocated_panics() {
    let array = WordArray::with_width(16).unwrap();
    array.get(0);
}

#[test]
fn test_invalid_options() {
    for width in [0, 129] {
        let err = WordArray::with_width(width).unwrap_err();
        assert!(matches!(err.kind(), ErrorKind::InvalidArgument { .. }));
    }
    let err = WordArray::new(WordArrayOptions::new(64).with_segment_bits(32)).unwrap_err();
    assert!(err.is_precondition_violation());
}

#[test]
fn test_lock_geometry() {
    assert_eq!(WordArray::with_width(7).unwrap().words_per_lock(), 2);
    assert_eq!(WordArray::with_width(64).unwrap().words_per_lock(), 2);
    assert_eq!(WordArray::with_width(100).unwrap().words_per_lock(), 2);
    assert_eq!(WordArray::with_width(128).unwrap().words_per_lock(), 2);
}

#[test]
fn test_without_locks_single_thread() {
    let array = WordArray::new(WordArrayOptions::new(33).with_locks(false)).unwrap();
    assert!(!array.uses_locks());
    for i in 0..1000 {
        array.set(i, (i * 7919) as u128 & mask(33));
    }
    for i in 0..1000 {
        assert_eq!(array.get(i), (i * 7919) as u128 & mask(33));
    }
}

#[test]
fn test_dump_values() {
    let array = WordArray::with_width(8).unwrap();
    array.set(0, 0xab);
    array.set(1, 0x01);
    let dump = array.dump_values();
    let lines: Vec<&str> = dump.lines().collect();
    assert_eq!(lines.len(), 2);
    assert!(lines[0].ends_with(" ab"));
    assert!(lines[1].ends_with(" 01"));
}

#[test]
fn test_concurrent_disjoint_sets() {
    // Interleaved indices put neighboring elements, which share words and
    // lock regions, on different threads. Small segments make the threads
    // grow the segment list concurrently too.
    let width = 61;
    let num_threads = 8;
    let count = 20_000u64;
    let array = Arc::new(
        WordArray::new(WordArrayOptions::new(width).with_segment_bits(61 * 100)).unwrap(),
    );
    let barrier = Arc::new(Barrier::new(num_threads));
    let expected = move |i: u64| ((i as u128) * 0x9e37_79b9_7f4a_7c15) & mask(width);

    let handles: Vec<_> = (0..num_threads)
        .map(|t| {
            let array = array.clone();
            let barrier = barrier.clone();
            thread::spawn(move || {
                barrier.wait();
                let mut i = t as u64;
                while i < count {
                    array.set(i, expected(i));
                    i += num_threads as u64;
                }
            })
        })
        .collect();
    for handle in handles {
        handle.join().unwrap();
    }

    assert_eq!(array.num_values(), count);
    for i in 0..count {
        assert_eq!(array.get(i), expected(i), "index {i}");
    }
}

#[test]
fn test_concurrent_same_elements_never_tear() {
    // Writers flip straddling 100-bit elements between all zeros and all ones;
    // readers must only ever observe one of the two.
    let width = 100;
    let array = Arc::new(WordArray::with_width(width).unwrap());
    array.allocate(64);
    let num_threads = 6;
    let iterations = 5_000;
    let barrier = Arc::new(Barrier::new(num_threads));

    let handles: Vec<_> = (0..num_threads)
        .map(|t| {
            let array = array.clone();
            let barrier = barrier.clone();
            thread::spawn(move || {
                barrier.wait();
                let mut rng = fastrand::Rng::with_seed(t as u64);
                for _ in 0..iterations {
                    let i = rng.u64(..64);
                    if t % 2 == 0 {
                        let v = if rng.bool() { mask(width) } else { 0 };
                        array.set(i, v);
                    } else {
                        let v = array.get(i);
                        assert!(v == 0 || v == mask(width), "torn value {v:#x}");
                    }
                }
            })
        })
        .collect();
    for handle in handles {
        handle.join().unwrap();
    }
    for i in 0..64 {
        let v = array.get(i);
        assert!(v == 0 || v == mask(width));
    }
}
