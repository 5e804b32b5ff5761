use super::*;

const CANVAS: Size = Size::new(100, 50);
const CLIP: Size = Size::new(20, 10);

#[test]
fn anchors_map_each_axis() {
    let at = |a: Anchor| Placement::from(a).resolve(CANVAS, CLIP, false);
    assert_eq!(at(Anchor::Center), (40, 20));
    assert_eq!(at(Anchor::Left), (0, 20));
    assert_eq!(at(Anchor::Right), (80, 20));
    assert_eq!(at(Anchor::Top), (40, 0));
    assert_eq!(at(Anchor::Bottom), (40, 40));
}

#[test]
fn center_truncates_odd_remainders() {
    let p = Placement::from(Anchor::Center).resolve(Size::new(5, 5), Size::new(2, 2), false);
    assert_eq!(p, (1, 1));
}

#[test]
fn relative_scales_pixel_values_only() {
    let p = Placement {
        x: XPos::Px(0.25),
        y: YPos::Bottom,
    };
    assert_eq!(p.resolve(CANVAS, CLIP, true), (25, 40));
    assert_eq!(Placement::xy(0.5, 0.5).resolve(CANVAS, CLIP, true), (50, 25));
}

#[test]
fn negative_offsets_survive_resolution() {
    assert_eq!(Placement::xy(-3.7, 2.9).resolve(CANVAS, CLIP, false), (-3, 2));
}

#[test]
fn animated_position_follows_time() {
    let pos = Position::animated(|t| Placement::xy(10.0 * t, 0.0));
    assert_eq!(pos.at(0.5), Placement::xy(5.0, 0.0));
    let fixed: Position = Anchor::Top.into();
    assert_eq!(fixed.at(99.0), Placement::from(Anchor::Top));
}
