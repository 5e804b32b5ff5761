use super::*;

#[test]
fn chunk_bounds_partition_evenly() {
    let b = chunk_bounds(10, 4);
    assert_eq!(b, vec![0, 3, 6, 10]);
    for w in b.windows(2) {
        assert!(w[1] - w[0] <= 4);
    }
}

#[test]
fn chunk_bounds_smaller_than_one_chunk() {
    assert_eq!(chunk_bounds(3, 2000), vec![0, 3]);
    assert_eq!(chunk_bounds(0, 10), vec![0, 0]);
}

#[test]
fn chunk_bounds_exact_multiple_adds_a_chunk() {
    let b = chunk_bounds(8, 4);
    assert_eq!(b.len(), 4);
    assert_eq!(*b.last().unwrap(), 8);
    assert!(b.windows(2).all(|w| w[1] - w[0] <= 4));
}

#[test]
fn sample_times_and_shift() {
    let tt = sample_times(2, 5, 4.0);
    assert_eq!(tt, vec![0.5, 0.75, 1.0]);
    assert_eq!(shift_times(&tt, 0.5), vec![0.0, 0.25, 0.5]);
}
