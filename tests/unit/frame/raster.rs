use super::*;

#[test]
fn new_validates_length() {
    assert!(Raster::<u8>::new(Size::new(2, 2), 3, vec![0; 12]).is_ok());
    assert!(Raster::<u8>::new(Size::new(2, 2), 3, vec![0; 11]).is_err());
    assert!(Raster::<u8>::new(Size::new(2, 2), 0, vec![]).is_err());
}

#[test]
fn filled_repeats_color() {
    let r = Raster::filled(Size::new(2, 1), &[1u8, 2, 3]).unwrap();
    assert_eq!(r.data(), &[1, 2, 3, 1, 2, 3]);
    assert_eq!(r.pixel(1, 0), &[1, 2, 3]);
    assert!(Raster::<u8>::filled(Size::new(2, 1), &[]).is_err());
}

#[test]
fn fit_to_pads_with_fill_and_cuts() {
    let r = Raster::filled(Size::new(1, 1), &[9u8]).unwrap();
    let padded = r.fit_to(Size::new(2, 2), 1);
    assert_eq!(padded.data(), &[9, 1, 1, 1]);

    let cut = padded.fit_to(Size::new(1, 2), 0);
    assert_eq!(cut.data(), &[9, 1]);
}

#[test]
fn crop_clamps_to_bounds() {
    let data: Vec<u8> = (0..9).collect();
    let r = Raster::new(Size::new(3, 3), 1, data).unwrap();
    let c = r.crop(1, 1, 10, 10);
    assert_eq!(c.size(), Size::new(2, 2));
    assert_eq!(c.data(), &[4, 5, 7, 8]);
}

#[test]
fn split_and_join_alpha() {
    let rgba = Raster::new(Size::new(1, 1), 4, vec![10u8, 20, 30, 255]).unwrap();
    let (rgb, mask) = rgba.split_alpha().unwrap();
    assert_eq!(rgb.data(), &[10, 20, 30]);
    assert_eq!(mask.data(), &[1.0]);
    assert_eq!(rgb.with_alpha(&mask).unwrap(), rgba);
}

#[test]
fn mask_to_rgb_scales_to_255() {
    let mask = Raster::new(Size::new(2, 1), 1, vec![0.0f32, 1.0]).unwrap();
    assert_eq!(mask.to_rgb().data(), &[0, 0, 0, 255, 255, 255]);
}

#[test]
fn add_clamped_saturates_at_one() {
    let a = Raster::new(Size::new(2, 1), 1, vec![0.5f32, 0.8]).unwrap();
    let b = Raster::new(Size::new(2, 1), 1, vec![0.25f32, 0.8]).unwrap();
    assert_eq!(a.add_clamped(&b).unwrap().data(), &[0.75, 1.0]);
}

#[test]
fn convert_truncates_to_u8() {
    let m = Raster::new(Size::new(2, 1), 1, vec![3.9f32, 300.0]).unwrap();
    assert_eq!(m.convert::<u8>().data(), &[3, 255]);
}
