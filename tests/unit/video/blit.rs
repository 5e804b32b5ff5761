use super::*;
use crate::foundation::core::Size;

fn solid(w: u32, h: u32, rgb: [u8; 3]) -> Raster<u8> {
    Raster::filled(Size::new(w, h), &rgb).unwrap()
}

#[test]
fn unmasked_blit_overwrites_overlap_only() {
    let dst = solid(4, 4, [0, 0, 0]);
    let src = solid(2, 2, [9, 9, 9]);
    let out = blit(&src, &dst, (3, 3), None).unwrap();
    assert_eq!(out.pixel(3, 3), &[9, 9, 9]);
    assert_eq!(out.pixel(2, 2), &[0, 0, 0]);
    assert_eq!(out.pixel(3, 2), &[0, 0, 0]);
}

#[test]
fn negative_offsets_crop_the_source() {
    let dst = solid(3, 3, [0, 0, 0]);
    let mut src = Raster::<u8>::zeros(Size::new(2, 2), 3);
    src.pixel_mut(1, 1).copy_from_slice(&[5, 6, 7]);
    let out = blit(&src, &dst, (-1, -1), None).unwrap();
    assert_eq!(out.pixel(0, 0), &[5, 6, 7]);
    assert_eq!(out.pixel(1, 0), &[0, 0, 0]);
}

#[test]
fn disjoint_blit_returns_destination_unchanged() {
    let dst = solid(3, 3, [1, 2, 3]);
    let src = solid(2, 2, [200, 200, 200]);
    for pos in [(3, 0), (0, 3), (-2, 0), (10, -10)] {
        assert_eq!(blit(&src, &dst, pos, None).unwrap(), dst);
    }
}

#[test]
fn mask_blends_linearly() {
    let dst = solid(1, 1, [100, 0, 200]);
    let src = solid(1, 1, [200, 100, 0]);
    let mask = Raster::filled(Size::new(1, 1), &[0.5f32]).unwrap();
    let out = blit(&src, &dst, (0, 0), Some(&mask)).unwrap();
    assert_eq!(out.pixel(0, 0), &[150, 50, 100]);
}

#[test]
fn opaque_mask_equals_plain_blit() {
    let dst = solid(4, 3, [10, 20, 30]);
    let src = solid(2, 2, [40, 50, 60]);
    let ones = Raster::filled(Size::new(2, 2), &[1.0f32]).unwrap();
    assert_eq!(
        blit(&src, &dst, (1, 1), Some(&ones)).unwrap(),
        blit(&src, &dst, (1, 1), None).unwrap()
    );
}

#[test]
fn shape_mismatches_are_rejected() {
    let dst = solid(2, 2, [0, 0, 0]);
    let rgba = Raster::<u8>::zeros(Size::new(1, 1), 4);
    assert!(matches!(
        blit(&rgba, &dst, (0, 0), None),
        Err(MontageError::Validation(_))
    ));
    let src = solid(2, 2, [1, 1, 1]);
    let small_mask = Raster::<f32>::zeros(Size::new(1, 1), 1);
    assert!(blit(&src, &dst, (0, 0), Some(&small_mask)).is_err());
}
