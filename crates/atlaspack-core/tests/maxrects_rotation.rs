use atlaspack_core::packer::maxrects::{MaxRects, MaxRectsHeuristic};
use atlaspack_core::Rect;

#[test]
fn rotates_a_tall_rect_to_fit_a_wide_bin() {
    let mut mr = MaxRects::new(20, 10);
    let mut rect = Rect::new("tall", 9, 18);
    let placed = mr.insert(&mut rect, MaxRectsHeuristic::BestAreaFit, true, 0, 0);
    assert!(placed);
    assert!(rect.rotated);
    assert_eq!(rect.width, 18);
    assert_eq!(rect.height, 9);
}

#[test]
fn refuses_rotation_when_disabled() {
    let mut mr = MaxRects::new(20, 10);
    let mut rect = Rect::new("tall", 9, 18);
    let placed = mr.insert(&mut rect, MaxRectsHeuristic::BestAreaFit, false, 0, 0);
    assert!(!placed);
}

#[test]
fn pack_reports_unfit_rects_separately() {
    let rects = vec![Rect::new("fits", 8, 8), Rect::new("too_big", 50, 50)];
    let (placed, unfit) = MaxRects::pack(rects, 16, 16, MaxRectsHeuristic::BestShortSideFit, true, 0, 0);
    assert_eq!(placed.len(), 1);
    assert_eq!(unfit.len(), 1);
    assert_eq!(unfit[0].name, "too_big");
}
