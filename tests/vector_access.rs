// tests/vector_access.rs
//
// Plain-vector access patterns, bit helpers, and scans.

use shroud::vector::{PlainVector, simple_subset};

fn v<T: shroud::Element>(data: Vec<T>) -> PlainVector<T> {
    PlainVector::from(data)
}

#[test]
fn strided_and_sliced_views() {
    let x: PlainVector<i32> = (0..10).collect();

    assert!(x.simple_subset_reference(0, 2, 9).same_as(&v(vec![0, 2, 4, 6, 8])));
    assert!(x.simple_subset_reference(1, 3, 9).same_as(&v(vec![1, 4, 7])));
    // step 1 degenerates to a slice
    assert!(x.simple_subset_reference(2, 1, 5).same_as(&v(vec![2, 3, 4, 5])));
    assert!(x.slice_range(3, 6).same_as(&v(vec![3, 4, 5])));
    assert!(x.slice_from(7).same_as(&v(vec![7, 8, 9])));
}

#[test]
fn alternating_views() {
    let x: PlainVector<i32> = (0..10).collect();

    assert!(
        x.alternating_subset_reference(2, 2)
            .same_as(&v(vec![0, 1, 4, 5, 8, 9]))
    );
    // short final chunk
    let y: PlainVector<i32> = (0..9).collect();
    assert!(
        y.alternating_subset_reference(2, 2)
            .same_as(&v(vec![0, 1, 4, 5, 8]))
    );
    // reversed variant flips each included chunk
    assert!(
        x.reversed_alternating_subset_reference(2, 2)
            .same_as(&v(vec![1, 0, 5, 4, 9, 8]))
    );
}

#[test]
fn repeat_cycle_reverse_views() {
    let x: PlainVector<i32> = (1..4).collect();

    assert!(x.repeated_subset_reference(2).same_as(&v(vec![1, 1, 2, 2, 3, 3])));
    assert!(x.cyclic_subset_reference(2).same_as(&v(vec![1, 2, 3, 1, 2, 3])));
    assert!(x.directed_subset_reference(-1).same_as(&v(vec![3, 2, 1])));
    assert!(x.directed_subset_reference(1).same_as(&x));
}

#[test]
fn views_write_through_shared_storage() {
    let x: PlainVector<i32> = (0..8).collect();
    let evens = x.simple_subset_reference(0, 2, 7);

    evens.set(1, 100);
    assert_eq!(x.get(2), 100);

    // and the other way: writes to the base show up in the view
    x.set(4, -1);
    assert_eq!(evens.get(2), -1);
}

#[test]
fn included_reference_filters_by_flag() {
    let x: PlainVector<i32> = (1..7).collect();
    let flag = v(vec![0i32, 0, 1, 1, 0, 1]);
    assert!(x.included_reference(&flag).same_as(&v(vec![3, 4, 6])));

    // a shorter flag excludes the rest
    let short = v(vec![1i32, 0]);
    assert!(x.included_reference(&short).same_as(&v(vec![1])));
}

#[test]
fn mapping_reference_and_composition() {
    let x: PlainVector<i32> = (0..6).map(|i| i * 10).collect();

    let map = v(vec![5i32, 0, 3]);
    let view = x.mapping_reference(&map).unwrap();
    assert!(view.same_as(&v(vec![50, 0, 30])));

    // a second explicit mapping is rejected
    assert!(view.mapping_reference(&map).is_err());

    // composition under the existing mapping
    let mut view = view;
    view.apply_mapping(&v(vec![2i32, 0])).unwrap();
    assert!(view.same_as(&v(vec![30, 50])));

    // growth is rejected
    assert!(view.apply_mapping(&v(vec![0i32, 0, 0])).is_err());

    // out-of-range entries are rejected
    assert!(x.mapping_reference(&v(vec![9i32])).is_err());
}

#[test]
fn materialize_detaches_storage() {
    let x: PlainVector<i32> = (0..4).collect();
    let view = x.directed_subset_reference(-1);
    let mut owned = view.clone();
    owned.materialize_inplace();
    assert!(!owned.has_mapping());

    x.set(0, 99);
    assert_eq!(view.get(3), 99);
    assert_eq!(owned.get(3), 0);
}

#[test]
fn batch_window_scopes_relative_ops() {
    let mut x: PlainVector<i32> = (0..8).collect();
    x.set_batch(2, 6);
    assert_eq!(x.size(), 4);
    assert_eq!(x.total_size(), 8);
    assert_eq!(x.get(0), 2);

    x.zero();
    x.reset_batch();
    assert!(x.same_as(&v(vec![0, 1, 0, 0, 0, 0, 6, 7])));
}

#[test]
fn resize_and_tail() {
    let mut x: PlainVector<i32> = (0..5).collect();
    x.resize(8);
    assert_eq!(x.total_size(), 8);
    assert_eq!(x.get(7), 0);

    x.tail(3);
    assert!(x.same_as(&v(vec![0, 0, 0])));

    // resizing a mapped view appends storage and points new indices at it
    let y: PlainVector<i32> = (0..4).collect();
    let mut view = y.directed_subset_reference(-1);
    view.resize(6);
    assert_eq!(view.total_size(), 6);
    view.set(4, 7);
    // the storage is shared, so the base vector grew too
    assert_eq!(y.total_size(), 6);
    assert_eq!(y.get(4), 7);
}

#[test]
fn bit_shifts_and_parity() {
    let x = v(vec![-8i8, 8, 1]);
    assert!(x.bit_arithmetic_right_shift(2).same_as(&v(vec![-2i8, 2, 0])));
    assert!(x.bit_logical_right_shift(2).same_as(&v(vec![62i8, 2, 0])));
    assert!(x.bit_left_shift(1).same_as(&v(vec![-16i8, 16, 2])));

    let p = v(vec![0b0110i8, 0b0111, 0]);
    assert!(p.bit_xor().same_as(&v(vec![0i8, 1, 0])));

    let e = v(vec![1i8, 2, 3]);
    assert!(e.extend_lsb().same_as(&v(vec![-1i8, 0, -1])));
    assert!(v(vec![-5i8, 5, 0]).ltz().same_as(&v(vec![1i8, 0, 0])));
}

#[test]
fn level_shifts() {
    // chunk size 2: every low bit copies from its chunk's high bit
    let x = v(vec![0x69u8 as i8]);
    assert!(x.bit_level_shift(1).same_as(&v(vec![0x3cu8 as i8])));
    assert!(x.reverse_bit_level_shift(1).same_as(&v(vec![0xc3u8 as i8])));

    // canonical mask table
    assert_eq!(<i64 as shroud::Element>::level_mask(0), 0x5555_5555_5555_5555);
    assert_eq!(<i64 as shroud::Element>::level_mask(1), 0x2222_2222_2222_2222);
    assert_eq!(<i64 as shroud::Element>::level_mask(2), 0x0808_0808_0808_0808);
}

#[test]
fn pack_and_unpack_bit_planes() {
    let src = v(vec![0b100i8, 0b111, 0b000, 0b101, 0b110, 0b011, 0b001, 0b010]);
    let packed = PlainVector::<i8>::zeroed(1);
    packed.pack_from(&src, 2);
    // bit 2 of each element, LSB-first
    assert_eq!(packed.get(0), 0b0001_1011);

    let dst = PlainVector::<i8>::zeroed(8);
    dst.unpack_from(&packed, 2);
    for i in 0..8 {
        assert_eq!(dst.get(i), (src.get(i) >> 2 & 1) << 2);
    }
}

#[test]
fn simple_bit_compress_roundtrip() {
    let src = v(vec![0b0101_0101u8 as i8, 0b0011_0011u8 as i8]);
    // gather bits 0, 2, 4, 6 of each element
    let packed = src.simple_bit_compress(0, 2, 6, 1);
    assert_eq!(packed.size(), 1);
    assert_eq!(packed.get(0), 0b0101_1111u8 as i8);

    let restored = PlainVector::<i8>::zeroed(2);
    restored.simple_bit_decompress(&packed, 0, 2, 6, 1);
    assert_eq!(restored.get(0), 0b0101_0101u8 as i8);
    assert_eq!(restored.get(1), 0b0001_0001);
}

#[test]
fn alternating_bit_compress_directions() {
    let src = v(vec![0b0011_0011u8 as i8]);
    // chunks of 2 bits included, 2 excluded: bits 0,1 and 4,5
    let lsb_first = src.alternating_bit_compress(0, 1, 2, 2, 1);
    assert_eq!(lsb_first.get(0) & 0xF, 0b1111);

    let x = v(vec![0b0001_0010u8 as i8]);
    let forward = x.alternating_bit_compress(0, 1, 2, 2, 1);
    // bits 0,1,4,5 LSB-first: 0,1,1,0
    assert_eq!(forward.get(0) & 0xF, 0b0110);
    let backward = x.alternating_bit_compress(0, 1, 2, 2, -1);
    // per chunk MSB-first: bits 1,0,5,4: 1,0,0,1
    assert_eq!(backward.get(0) & 0xF, 0b1001);

    // decompress restores the gathered positions
    let restored = PlainVector::<i8>::zeroed(1);
    restored.alternating_bit_decompress(&forward, 0, 1, 2, 2, 1);
    assert_eq!(restored.get(0), 0b0001_0010);
}

#[test]
fn scans_and_reductions() {
    let x = v(vec![1i64, 2, 3, 4]);
    x.prefix_sum();
    assert!(x.same_as(&v(vec![1, 3, 6, 10])));

    let m = v(vec![-1i64, 5, 2, 7, 3]);
    m.prefix_sum_with(std::cmp::max);
    assert!(m.same_as(&v(vec![-1, 5, 5, 7, 7])));

    let c = v(vec![1i64, 2, 3, 4, 5]);
    assert!(c.chunked_sum(2).same_as(&v(vec![3, 7, 5])));
    assert!(c.chunked_sum(0).same_as(&v(vec![15])));

    let d = v(vec![1i64, 2, 3, 4]);
    let e = v(vec![5i64, 6, 7, 8]);
    assert!(d.dot_product(&e, 2).same_as(&v(vec![17, 53])));
    assert!(d.dot_product(&e, 0).same_as(&v(vec![70])));
}

#[test]
fn divrem_single_pass() {
    let x = v(vec![17i64, -17, 4, 0]);
    let (q, r) = x.divrem(5);
    assert!(q.same_as(&v(vec![3, -3, 0, 0])));
    assert!(r.same_as(&v(vec![2, -2, 4, 0])));
}

#[test]
fn equality_and_prefixes() {
    let x = v(vec![1i32, 2, 3]);
    assert!(x.same_as(&v(vec![1, 2, 3])));
    assert!(!x.same_as(&v(vec![1, 2])));
    assert!(!x.same_as(&v(vec![1, 2, 4])));
    assert!(x.starts_with(&v(vec![1, 2])));
    assert!(!x.starts_with(&v(vec![2])));
    assert!(!x.starts_with(&v(vec![1, 2, 3, 4])));
}

#[test]
fn extract_valid_gathers() {
    let x = v(vec![10i32, 20, 30, 40]);
    let valid = v(vec![1i32, 0, 0, 1]);
    assert!(x.extract_valid(&valid).same_as(&v(vec![10, 40])));
}

#[test]
fn simple_subset_copies() {
    let x: PlainVector<i32> = (0..10).collect();
    let sub = simple_subset(&x, 1, 3, 7);
    assert!(sub.same_as(&v(vec![1, 4, 7])));
    // a copy, not a view
    sub.set(0, 99);
    assert_eq!(x.get(1), 1);
}
