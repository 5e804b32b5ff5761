use super::*;

#[test]
fn frame_index_is_one_based_and_snaps_exact_multiples() {
    assert_eq!(FrameIndex::at(0.0, 25.0), FrameIndex(1));
    assert_eq!(FrameIndex::at(1.0 / 25.0, 25.0), FrameIndex(2));
    assert_eq!(FrameIndex::at(0.1, 30.0), FrameIndex(4));
    assert_eq!(FrameIndex::at(0.999, 1.0), FrameIndex(1));
}

#[test]
fn frames_until_saturates_backwards() {
    assert_eq!(FrameIndex(3).frames_until(FrameIndex(7)), 4);
    assert_eq!(FrameIndex(7).frames_until(FrameIndex(3)), 0);
}

#[test]
fn size_helpers() {
    let a = Size::new(4, 9);
    let b = Size::from((6, 2));
    assert_eq!(a.max(b), Size::new(6, 9));
    assert_eq!(a.area(), 36);
    assert!(!a.is_even());
    assert!(b.is_even());
}

#[test]
fn parse_timestamp_accepts_clock_forms() {
    assert_eq!(parse_timestamp("12.5").unwrap(), 12.5);
    assert_eq!(parse_timestamp("01:30").unwrap(), 90.0);
    assert!((parse_timestamp("00:01:02.25").unwrap() - 62.25).abs() < 1e-9);
    assert!((parse_timestamp("01:00:00,5").unwrap() - 3600.5).abs() < 1e-9);
}

#[test]
fn parse_timestamp_rejects_garbage() {
    assert!(parse_timestamp("").is_err());
    assert!(parse_timestamp("1:2:3:4").is_err());
    assert!(parse_timestamp("ab:cd").is_err());
}
