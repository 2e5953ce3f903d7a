use atlaspack_core::packer::grid::pack_grid;
use atlaspack_core::{Rect, Settings};

fn rect(name: &str, w: u32, h: u32) -> Rect {
    Rect::new(name, w, h)
}

#[test]
fn preserves_input_order_across_rows() {
    let settings = Settings::builder()
        .padding(2, 2)
        .edge_padding(true)
        .max_size(24, 24)
        .min_size(8, 8)
        .grid(true)
        .build();
    let rects = vec![rect("a", 8, 8), rect("b", 8, 8), rect("c", 8, 8), rect("d", 8, 8)];
    let pages = pack_grid(rects, &settings).unwrap();
    assert_eq!(pages.len(), 1);
    let names: Vec<_> = pages[0].output_rects.iter().map(|r| r.name.as_str()).collect();
    assert_eq!(names, vec!["a", "b", "c", "d"]);
    // 2x2 cells of pitch 10 -> a square 20x20 content box, reported as such.
    assert_eq!(pages[0].width, 20);
    assert_eq!(pages[0].height, 20);
    let rows: Vec<_> = pages[0].output_rects.iter().map(|r| r.y).collect();
    assert_ne!(rows[0], rows[2]);
}

#[test]
fn single_row_reports_a_square_bounding_box() {
    // Mirrors the spec's tiny-grid scenario: three 8x8 rects in one row
    // quantise to a square page even though the row itself is wide and flat.
    let settings = Settings::builder()
        .padding(2, 2)
        .edge_padding(true)
        .max_size(64, 64)
        .min_size(16, 16)
        .power_of_two(true)
        .grid(true)
        .build();
    let rects = vec![rect("a", 8, 8), rect("b", 8, 8), rect("c", 8, 8)];
    let pages = pack_grid(rects, &settings).unwrap();
    assert_eq!(pages.len(), 1);
    assert_eq!(pages[0].width, pages[0].height);
    assert_eq!(pages[0].image_width, pages[0].image_height);
    let ys: Vec<_> = pages[0].output_rects.iter().map(|r| r.y).collect();
    assert_eq!(ys, vec![ys[0]; 3]);
}

#[test]
fn never_rotates() {
    let settings = Settings::builder().max_size(64, 64).min_size(8, 8).grid(true).rotation(true).build();
    let rects = vec![rect("wide", 20, 4)];
    let pages = pack_grid(rects, &settings).unwrap();
    assert!(!pages[0].output_rects[0].rotated);
}

#[test]
fn splits_across_multiple_pages_when_one_cell_per_row() {
    let settings = Settings::builder()
        .padding(0, 0)
        .edge_padding(false)
        .max_size(10, 10)
        .min_size(8, 8)
        .grid(true)
        .build();
    let rects = vec![rect("a", 10, 10), rect("b", 10, 10), rect("c", 10, 10)];
    let pages = pack_grid(rects, &settings).unwrap();
    assert_eq!(pages.iter().map(|p| p.output_rects.len()).sum::<usize>(), 3);
}
