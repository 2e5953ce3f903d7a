use std::collections::HashSet;

use image::RgbaImage;

use atlaspack_core::assembler::{ImageSource, NoopBleed};
use atlaspack_core::progress::NoopProgress;
use atlaspack_core::{manifest, pack, PackError, PackOptions, Page, Rect, Settings};

struct SolidSource;

impl ImageSource for SolidSource {
    fn load(&self, _rect_name: &str) -> atlaspack_core::Result<RgbaImage> {
        Ok(RgbaImage::from_pixel(8, 8, image::Rgba([255, 0, 0, 255])))
    }
}

#[test]
fn pack_rejects_duplicate_rect_names_up_front() {
    let settings = Settings::default();
    let rects = vec![Rect::new("dup", 8, 8), Rect::new("dup", 8, 8)];
    let existing = HashSet::new();
    let options = PackOptions {
        atlas_name: "atlas",
        existing_manifest: None,
        existing_page_names: &existing,
        appending: false,
    };
    let mut progress = NoopProgress;
    let err = pack(rects, &settings, &SolidSource, &NoopBleed, &mut progress, &options).unwrap_err();
    assert!(matches!(err, PackError::NameCollision { .. }));
}

#[test]
fn check_name_collisions_flags_against_an_existing_manifest() {
    let mut hero = Rect::new("hero", 8, 8);
    hero.x = 0;
    hero.y = 0;
    let page = Page {
        output_rects: vec![hero],
        width: 8,
        height: 8,
        image_width: 8,
        image_height: 8,
        image_name: Some("atlas.png".into()),
        ..Page::default()
    };
    let settings = Settings::default();
    let existing_text = manifest::write(&[page.clone()], &settings, false);

    let result = manifest::check_name_collisions(&[page], Some(&existing_text));
    assert!(matches!(result, Err(PackError::NameCollision { .. })));
}
