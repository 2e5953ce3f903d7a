use atlaspack_core::search::pack_maxrects;
use atlaspack_core::{PackError, Rect, Settings};

#[test]
fn rejects_a_rect_too_large_for_the_page_in_both_orientations() {
    let settings = Settings::builder().max_size(64, 64).min_size(8, 8).rotation(true).build();
    let rects = vec![Rect::new("giant", 200, 200)];
    let err = pack_maxrects(rects, &settings).unwrap_err();
    assert!(matches!(err, PackError::InputTooLarge { .. }));
}

#[test]
fn accepts_a_rect_that_only_fits_when_rotated() {
    let settings = Settings::builder().max_size(64, 32).min_size(8, 8).rotation(true).build();
    let rects = vec![Rect::new("tall", 16, 60)];
    let pages = pack_maxrects(rects, &settings).unwrap();
    assert_eq!(pages.len(), 1);
    assert_eq!(pages[0].output_rects.len(), 1);
    assert!(pages[0].output_rects[0].rotated);
}

#[test]
fn rejects_when_rotation_is_disabled_and_only_the_rotated_footprint_fits() {
    let settings = Settings::builder().max_size(64, 32).min_size(8, 8).rotation(false).build();
    let rects = vec![Rect::new("tall", 16, 60)];
    let err = pack_maxrects(rects, &settings).unwrap_err();
    assert!(matches!(err, PackError::InputTooLarge { .. }));
}
