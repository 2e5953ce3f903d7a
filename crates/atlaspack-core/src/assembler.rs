use std::collections::HashSet;

use image::{ImageEncoder, ImageFormat, RgbaImage};
use tracing::instrument;

use crate::compositing::{blit_rect, premultiply};
use crate::config::{OutputFormat, Settings};
use crate::error::{PackError, Result};
use crate::model::Page;
use crate::progress::ProgressSink;

/// Lazily yields decoded pixel data for a rect's source image. Called exactly
/// once per rect, from inside the assembler.
pub trait ImageSource {
    fn load(&self, rect_name: &str) -> Result<RgbaImage>;
}

/// Color-bleed post-process: infills transparent pixels with nearby opaque
/// colour so texture filtering doesn't sample the fully-transparent padding.
/// A narrow capability trait so callers who don't need it pay nothing.
pub trait BleedPostProcess {
    fn bleed(&self, canvas: &mut RgbaImage, iterations: u32);
}

#[derive(Debug, Default, Clone, Copy)]
pub struct NoopBleed;

impl BleedPostProcess for NoopBleed {
    fn bleed(&self, _canvas: &mut RgbaImage, _iterations: u32) {}
}

fn is_power_of_two(v: u32) -> bool {
    v != 0 && (v & (v - 1)) == 0
}

fn quantize(width: u32, height: u32, settings: &Settings) -> (u32, u32) {
    let mut w = width;
    let mut h = height;
    if settings.power_of_two {
        w = w.next_power_of_two();
        h = h.next_power_of_two();
    }
    if settings.multiple_of_four {
        w = (w + 3) & !3;
        h = (h + 3) & !3;
    }
    w = w.max(settings.min_width);
    h = h.max(settings.min_height);
    (w, h)
}

/// Composes one page's canvas image: grows for edge-padding, quantises to the
/// final on-disk size, blits every placed rect, and runs the optional
/// duplicate-padding and bleed post-processes. Mutates `page.x`/`y`/
/// `image_width`/`image_height` in place.
///
/// `progress` is consulted once per rect (in addition to whatever
/// page-granularity checkpoints the caller makes), so a cancellation request
/// takes effect within a page, not just between pages.
#[instrument(skip(page, settings, source, bleed, progress), fields(rects = page.output_rects.len()))]
pub fn assemble_page(
    page: &mut Page,
    settings: &Settings,
    source: &dyn ImageSource,
    bleed: &dyn BleedPostProcess,
    progress: &mut dyn ProgressSink,
) -> Result<RgbaImage> {
    let mut width = page.width;
    let mut height = page.height;

    if settings.edge_padding {
        page.x = settings.edge_pad_x();
        page.y = settings.edge_pad_y();
        width += 2 * settings.edge_pad_x();
        height += 2 * settings.edge_pad_y();
    } else {
        page.x = 0;
        page.y = 0;
    }

    let (image_width, image_height) = quantize(width, height, settings);
    page.image_width = image_width;
    page.image_height = image_height;

    let mut canvas = RgbaImage::new(image_width, image_height);

    let extrude = if settings.duplicate_padding {
        settings.edge_pad_x().max(settings.edge_pad_y())
    } else {
        0
    };

    let rect_count = page.output_rects.len();
    for (i, rect) in page.output_rects.iter().enumerate() {
        if progress.update(i, rect_count) {
            return Err(PackError::Cancelled);
        }
        let src = source.load(&rect.name)?;
        let dx = page.x + rect.x;
        let dy = page.y + page.height - rect.y - (rect.height.saturating_sub(settings.padding_y));
        blit_rect(
            &src,
            &mut canvas,
            dx,
            dy,
            rect.offset_x,
            rect.offset_y,
            rect.region_width,
            rect.region_height,
            rect.rotated,
            extrude,
        );
    }

    let jpeg_output = settings.output_format == OutputFormat::Jpg;
    if settings.bleed && !jpeg_output && !settings.premultiply_alpha {
        bleed.bleed(&mut canvas, settings.bleed_iterations);
    }

    if settings.premultiply_alpha {
        premultiply(&mut canvas);
    }

    Ok(canvas)
}

/// Encodes `canvas` to bytes in the configured output format.
pub fn encode_page(canvas: &RgbaImage, settings: &Settings) -> Result<Vec<u8>> {
    let mut buf = Vec::new();
    match settings.output_format {
        OutputFormat::Png => {
            let mut cursor = std::io::Cursor::new(&mut buf);
            canvas
                .write_to(&mut cursor, ImageFormat::Png)
                .map_err(PackError::Image)?;
        }
        OutputFormat::Jpg => {
            let rgb = image::DynamicImage::ImageRgba8(canvas.clone()).to_rgb8();
            let mut cursor = std::io::Cursor::new(&mut buf);
            let quality = (settings.jpeg_quality * 100.0).round().clamp(1.0, 100.0) as u8;
            let encoder = image::codecs::jpeg::JpegEncoder::new_with_quality(&mut cursor, quality);
            encoder
                .write_image(rgb.as_raw(), rgb.width(), rgb.height(), image::ExtendedColorType::Rgb8)
                .map_err(PackError::Image)?;
        }
    }
    Ok(buf)
}

/// Picks a unique page image file name against `existing`, appending `-N`
/// (or `N` when the base doesn't already end ambiguously in a digit) starting
/// at 2 and incrementing until unique.
pub fn unique_file_name(base: &str, existing: &HashSet<String>) -> String {
    if !existing.contains(base) {
        return base.to_string();
    }
    let ambiguous = ends_in_digit_or_scale_suffix(base);
    let mut n = 2;
    loop {
        let candidate = if ambiguous { format!("{base}-{n}") } else { format!("{base}{n}") };
        if !existing.contains(&candidate) {
            return candidate;
        }
        n += 1;
    }
}

fn ends_in_digit_or_scale_suffix(base: &str) -> bool {
    let mut chars = base.chars().rev().peekable();
    if matches!(chars.peek(), Some(c) if c.is_ascii_digit()) {
        return true;
    }
    let mut rest = base.chars().rev();
    while matches!(rest.clone().next(), Some(c) if c.is_ascii_digit()) {
        rest.next();
    }
    matches!(rest.next(), Some('x') | Some('X'))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Result as PackResult;
    use crate::model::Rect;

    struct SolidSource;
    impl ImageSource for SolidSource {
        fn load(&self, _rect_name: &str) -> PackResult<RgbaImage> {
            Ok(RgbaImage::from_pixel(16, 16, image::Rgba([255, 0, 0, 255])))
        }
    }

    #[test]
    fn quantises_to_power_of_two_and_min_size() {
        let settings = Settings::builder().power_of_two(true).min_size(8, 8).max_size(64, 64).build();
        let (w, h) = quantize(10, 10, &settings);
        assert_eq!((w, h), (16, 16));
    }

    #[test]
    fn assembles_canvas_of_final_size() {
        let settings = Settings::builder()
            .padding(0, 0)
            .edge_padding(false)
            .power_of_two(true)
            .min_size(4, 4)
            .max_size(64, 64)
            .build();
        let mut rect = Rect::new("a", 8, 8);
        rect.region_width = 8;
        rect.region_height = 8;
        let mut page = Page { output_rects: vec![rect], width: 8, height: 8, ..Page::default() };
        let mut progress = crate::progress::NoopProgress;
        let canvas = assemble_page(&mut page, &settings, &SolidSource, &NoopBleed, &mut progress).unwrap();
        assert_eq!(canvas.dimensions(), (8, 8));
        assert_eq!(page.image_width, 8);
    }

    struct CancelAfter(usize);
    impl crate::progress::ProgressSink for CancelAfter {
        fn update(&mut self, count: usize, _total: usize) -> bool {
            count >= self.0
        }
    }

    #[test]
    fn cancels_mid_page_between_rects() {
        let settings = Settings::builder()
            .padding(0, 0)
            .edge_padding(false)
            .min_size(4, 4)
            .max_size(64, 64)
            .build();
        let mut a = Rect::new("a", 4, 4);
        a.region_width = 4;
        a.region_height = 4;
        let mut b = Rect::new("b", 4, 4);
        b.x = 4;
        b.region_width = 4;
        b.region_height = 4;
        let mut page = Page { output_rects: vec![a, b], width: 8, height: 4, ..Page::default() };
        let mut progress = CancelAfter(1);
        let err = assemble_page(&mut page, &settings, &SolidSource, &NoopBleed, &mut progress).unwrap_err();
        assert!(matches!(err, PackError::Cancelled));
    }

    #[test]
    fn unique_file_name_disambiguates_digit_suffix() {
        let mut existing = HashSet::new();
        existing.insert("atlas1".to_string());
        assert_eq!(unique_file_name("atlas1", &existing), "atlas1-2");
    }

    #[test]
    fn unique_file_name_appends_bare_number() {
        let mut existing = HashSet::new();
        existing.insert("atlas".to_string());
        assert_eq!(unique_file_name("atlas", &existing), "atlas2");
    }
}
