use image::RgbaImage;

use atlaspack_core::assembler::{assemble_page, encode_page, ImageSource, NoopBleed};
use atlaspack_core::progress::NoopProgress;
use atlaspack_core::{Page, Rect, Settings};

struct SolidSource;

impl ImageSource for SolidSource {
    fn load(&self, _rect_name: &str) -> atlaspack_core::Result<RgbaImage> {
        Ok(RgbaImage::from_pixel(8, 8, image::Rgba([10, 20, 30, 255])))
    }
}

fn page(width: u32, height: u32) -> Page {
    let mut rect = Rect::new("only", 8, 8);
    rect.x = 0;
    rect.y = 0;
    Page {
        output_rects: vec![rect],
        width,
        height,
        image_width: 0,
        image_height: 0,
        x: 0,
        y: 0,
        image_name: Some("atlas.png".into()),
        ..Page::default()
    }
}

#[test]
fn quantises_final_image_to_a_power_of_two() {
    let settings = Settings::builder().power_of_two(true).min_size(1, 1).edge_padding(false).build();
    let mut p = page(10, 10);
    let mut progress = NoopProgress;
    let canvas = assemble_page(&mut p, &settings, &SolidSource, &NoopBleed, &mut progress).unwrap();
    assert_eq!(canvas.width(), 16);
    assert_eq!(canvas.height(), 16);
    assert_eq!(p.image_width, 16);
    assert_eq!(p.image_height, 16);
}

#[test]
fn quantises_final_image_to_a_multiple_of_four() {
    let settings = Settings::builder().multiple_of_four(true).min_size(1, 1).edge_padding(false).build();
    let mut p = page(10, 10);
    let mut progress = NoopProgress;
    let canvas = assemble_page(&mut p, &settings, &SolidSource, &NoopBleed, &mut progress).unwrap();
    assert_eq!(canvas.width() % 4, 0);
    assert_eq!(canvas.height() % 4, 0);
}

#[test]
fn grows_for_edge_padding_before_quantising() {
    let settings = Settings::builder().padding(4, 4).edge_padding(true).min_size(1, 1).build();
    let mut p = page(8, 8);
    let mut progress = NoopProgress;
    let canvas = assemble_page(&mut p, &settings, &SolidSource, &NoopBleed, &mut progress).unwrap();
    // edge_pad_x/y default to padding_x/y (duplicate_padding is off), so the
    // canvas grows by 2*4 on each axis before quantisation.
    assert!(canvas.width() >= 16);
    assert!(canvas.height() >= 16);
}

#[test]
fn encode_page_produces_nonempty_png_bytes() {
    let settings = Settings::default();
    let canvas = RgbaImage::from_pixel(4, 4, image::Rgba([1, 2, 3, 255]));
    let bytes = encode_page(&canvas, &settings).unwrap();
    assert!(!bytes.is_empty());
    assert_eq!(&bytes[1..4], b"PNG");
}
