use image::{Rgba, RgbaImage};

/// Blits a placed rect's source pixels onto a page canvas, honouring rotation
/// and (optionally) replicating its edge pixels into the surrounding padding
/// band ("duplicate padding").
///
/// - `(sx, sy, sw, sh)`: source rectangle within `src`, pre-rotation.
/// - `(dx, dy)`: destination top-left in `canvas` where the content begins.
/// - `rotated`: rotate 90° clockwise from source to destination.
/// - `extrude`: number of pixels to replicate into the padding band; `0`
///   leaves the band untouched (transparent).
pub fn blit_rect(
    src: &RgbaImage,
    canvas: &mut RgbaImage,
    dx: u32,
    dy: u32,
    sx: u32,
    sy: u32,
    sw: u32,
    sh: u32,
    rotated: bool,
    extrude: u32,
) {
    let (cw, ch) = canvas.dimensions();
    let (rw, rh) = if rotated { (sh, sw) } else { (sw, sh) };

    for yy in 0..rh {
        for xx in 0..rw {
            let (ix, iy) = if rotated { (sx + yy, sy + (sh - 1 - xx)) } else { (sx + xx, sy + yy) };
            if dx + xx < cw && dy + yy < ch {
                let px = *src.get_pixel(ix, iy);
                canvas.put_pixel(dx + xx, dy + yy, px);
            }
        }
    }

    if extrude > 0 {
        duplicate_edges(canvas, dx, dy, rw, rh, extrude);
    }
}

/// Replicates the outermost row/column of a just-blitted content area into
/// its padding band: edges by edge pixels, corners by the corner pixel.
fn duplicate_edges(canvas: &mut RgbaImage, dx: u32, dy: u32, rw: u32, rh: u32, extrude: u32) {
    let (cw, ch) = canvas.dimensions();

    for e in 1..=extrude {
        if dy >= e {
            for xx in 0..rw {
                if dx + xx < cw {
                    let p = *canvas.get_pixel(dx + xx, dy);
                    canvas.put_pixel(dx + xx, dy - e, p);
                }
            }
        }
        if dy + rh - 1 + e < ch {
            for xx in 0..rw {
                if dx + xx < cw {
                    let p = *canvas.get_pixel(dx + xx, dy + rh - 1);
                    canvas.put_pixel(dx + xx, dy + rh - 1 + e, p);
                }
            }
        }
        if dx >= e {
            for yy in 0..rh {
                if dy + yy < ch {
                    let p = *canvas.get_pixel(dx, dy + yy);
                    canvas.put_pixel(dx - e, dy + yy, p);
                }
            }
        }
        if dx + rw - 1 + e < cw {
            for yy in 0..rh {
                if dy + yy < ch {
                    let p = *canvas.get_pixel(dx + rw - 1, dy + yy);
                    canvas.put_pixel(dx + rw - 1 + e, dy + yy, p);
                }
            }
        }
    }

    let corner = |canvas: &RgbaImage, x: u32, y: u32| -> Rgba<u8> {
        if x < cw && y < ch {
            *canvas.get_pixel(x, y)
        } else {
            Rgba([0, 0, 0, 0])
        }
    };
    let c00 = corner(canvas, dx, dy);
    let c10 = corner(canvas, dx + rw - 1, dy);
    let c01 = corner(canvas, dx, dy + rh - 1);
    let c11 = corner(canvas, dx + rw - 1, dy + rh - 1);

    for ex in 1..=extrude {
        for ey in 1..=extrude {
            if dx >= ex && dy >= ey {
                canvas.put_pixel(dx - ex, dy - ey, c00);
            }
            if dy >= ey && dx + rw - 1 + ex < cw {
                canvas.put_pixel(dx + rw - 1 + ex, dy - ey, c10);
            }
            if dx >= ex && dy + rh - 1 + ey < ch {
                canvas.put_pixel(dx - ex, dy + rh - 1 + ey, c01);
            }
            if dx + rw - 1 + ex < cw && dy + rh - 1 + ey < ch {
                canvas.put_pixel(dx + rw - 1 + ex, dy + rh - 1 + ey, c11);
            }
        }
    }
}

/// Premultiplies RGB by alpha in place.
pub fn premultiply(canvas: &mut RgbaImage) {
    for px in canvas.pixels_mut() {
        let a = px[3] as u32;
        px[0] = ((px[0] as u32 * a) / 255) as u8;
        px[1] = ((px[1] as u32 * a) / 255) as u8;
        px[2] = ((px[2] as u32 * a) / 255) as u8;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::RgbaImage;

    #[test]
    fn blit_copies_pixels_unrotated() {
        let mut src = RgbaImage::new(4, 4);
        src.put_pixel(1, 1, Rgba([10, 20, 30, 255]));
        let mut canvas = RgbaImage::new(8, 8);
        blit_rect(&src, &mut canvas, 2, 2, 0, 0, 4, 4, false, 0);
        assert_eq!(*canvas.get_pixel(3, 3), Rgba([10, 20, 30, 255]));
    }

    #[test]
    fn blit_rotates_90_degrees() {
        let mut src = RgbaImage::new(4, 2);
        src.put_pixel(0, 0, Rgba([1, 2, 3, 255]));
        let mut canvas = RgbaImage::new(8, 8);
        // rotated footprint is (sh, sw) = (2, 4); src(0,0) lands at dest(1,0)
        // under this blit's clockwise-rotation mapping.
        blit_rect(&src, &mut canvas, 0, 0, 0, 0, 4, 2, true, 0);
        assert_eq!(*canvas.get_pixel(1, 0), Rgba([1, 2, 3, 255]));
    }

    #[test]
    fn duplicate_padding_replicates_edges() {
        let mut src = RgbaImage::new(2, 2);
        for (x, y) in [(0, 0), (1, 0), (0, 1), (1, 1)] {
            src.put_pixel(x, y, Rgba([9, 9, 9, 255]));
        }
        let mut canvas = RgbaImage::new(6, 6);
        blit_rect(&src, &mut canvas, 2, 2, 0, 0, 2, 2, false, 1);
        assert_eq!(*canvas.get_pixel(1, 2), Rgba([9, 9, 9, 255]));
        assert_eq!(*canvas.get_pixel(1, 1), Rgba([9, 9, 9, 255]));
    }

    #[test]
    fn premultiply_scales_rgb_by_alpha() {
        let mut canvas = RgbaImage::new(1, 1);
        canvas.put_pixel(0, 0, Rgba([200, 100, 50, 128]));
        premultiply(&mut canvas);
        let p = canvas.get_pixel(0, 0);
        assert_eq!(p[0], (200u32 * 128 / 255) as u8);
    }
}
