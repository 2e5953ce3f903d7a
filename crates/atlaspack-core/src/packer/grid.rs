use tracing::{debug, warn};

use crate::config::Settings;
use crate::error::Result;
use crate::model::{Page, Rect};

/// Deterministic uniform-cell packer. Preserves input order, never rotates,
/// and emits as many pages as needed to hold every rect.
///
/// `cell_width`/`cell_height` are the max rect extents across the whole
/// input plus padding, so every cell on every page is the same size.
pub fn pack_grid(rects: Vec<Rect>, settings: &Settings) -> Result<Vec<Page>> {
    if rects.is_empty() {
        return Ok(Vec::new());
    }

    let cell_width = rects.iter().map(|r| r.width).max().unwrap_or(0) + settings.padding_x;
    let cell_height = rects.iter().map(|r| r.height).max().unwrap_or(0) + settings.padding_y;
    let max_width = settings.adjusted_max_width();
    let max_height = settings.adjusted_max_height();

    debug!(cell_width, cell_height, max_width, max_height, "grid packer initialised");

    // Reverse so popping from the tail yields the rects in their original order.
    let mut remaining: Vec<Rect> = rects.into_iter().rev().collect();
    let mut pages = Vec::new();

    if cell_width > max_width || cell_height > max_height {
        // No cell fits the adjusted page at all: fall back to one oversized
        // rect per page rather than looping forever.
        warn!(cell_width, cell_height, max_width, max_height, "grid cell exceeds adjusted page; emitting one rect per page");
        while let Some(mut rect) = remaining.pop() {
            rect.x = 0;
            rect.y = 0;
            rect.width += settings.padding_x;
            rect.height += settings.padding_y;
            pages.push(finish_page(vec![rect], cell_width, cell_height, settings));
        }
        return Ok(pages);
    }

    while !remaining.is_empty() {
        let mut placed = Vec::new();
        let mut x = 0u32;
        let mut y = 0u32;
        let mut cols_used = 0u32;
        let mut rows_used = 0u32;

        loop {
            if remaining.is_empty() {
                break;
            }
            if x + cell_width > max_width {
                x = 0;
                y += cell_height;
            }
            if y > max_height.saturating_sub(cell_height) {
                break;
            }
            let mut rect = remaining.pop().unwrap();
            rect.x = x;
            rect.y = y;
            rect.width += settings.padding_x;
            rect.height += settings.padding_y;
            cols_used = cols_used.max(x / cell_width + 1);
            rows_used = rows_used.max(y / cell_height + 1);
            x += cell_width;
            placed.push(rect);
        }

        if placed.is_empty() {
            // Safety valve: should be unreachable given the cell-fit check
            // above, but avoid looping forever if it ever is.
            break;
        }

        let content_width = cols_used * cell_width;
        let content_height = rows_used * cell_height;

        // A uniform-cell grid reads as one sheet, not a row or column strip:
        // report a square bounding box (the wider of the two content
        // extents) so a lone row or column doesn't quantise to a long
        // sliver page. The assembler re-derives each rect's final Y from
        // `page.height` (see assemble_page's blit loop), so the same
        // bounding extent must be used here for the flip, not the raw
        // `content_height` — otherwise the two disagree and rects land in
        // the wrong place.
        let bounding_extent = content_width.max(content_height);

        // Flip Y so rows originate at the top of the page.
        for rect in placed.iter_mut() {
            rect.y = bounding_extent - rect.y - rect.height;
        }

        pages.push(finish_page(placed, bounding_extent, bounding_extent, settings));
    }

    Ok(pages)
}

fn finish_page(output_rects: Vec<Rect>, content_width: u32, content_height: u32, settings: &Settings) -> Page {
    let width = content_width.saturating_sub(settings.padding_x);
    let height = content_height.saturating_sub(settings.padding_y);
    let mut page = Page {
        output_rects,
        remaining_rects: Vec::new(),
        width,
        height,
        image_width: 0,
        image_height: 0,
        x: 0,
        y: 0,
        image_name: None,
    };
    // image_width/image_height are filled in by the assembler's quantisation
    // pass; report the packed size in the meantime for callers that only
    // care about layout.
    page.image_width = width;
    page.image_height = height;
    page
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rect(name: &str, w: u32, h: u32) -> Rect {
        Rect::new(name, w, h)
    }

    #[test]
    fn preserves_input_order_within_a_row() {
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
        let names: Vec<_> = pages[0].output_rects.iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, vec!["a", "b", "c"]);
        // cell_width = 8+2 = 10; three cells fit comfortably inside the
        // adjusted max width, so all three land on one row.
        assert_eq!(pages[0].output_rects[0].x, 0);
        assert_eq!(pages[0].output_rects[1].x, 10);
        assert_eq!(pages[0].output_rects[2].x, 20);
        // A single row's bounding box is squared up before reporting, so the
        // packed size (pre-assembler) comes out equal on both axes, and
        // every rect on that row shares the same flipped y.
        assert_eq!(pages[0].width, pages[0].height);
        let ys: Vec<_> = pages[0].output_rects.iter().map(|r| r.y).collect();
        assert_eq!(ys, vec![20, 20, 20]);
    }

    #[test]
    fn never_rotates() {
        let settings = Settings::builder().grid(true).max_size(64, 64).min_size(8, 8).build();
        let pages = pack_grid(vec![rect("tall", 8, 40)], &settings).unwrap();
        assert!(!pages[0].output_rects[0].rotated);
    }

    #[test]
    fn wraps_to_a_new_row_when_the_page_is_narrow() {
        let settings = Settings::builder()
            .padding(0, 0)
            .edge_padding(false)
            .max_size(20, 40)
            .min_size(4, 4)
            .grid(true)
            .build();
        let rects = vec![rect("a", 8, 8), rect("b", 8, 8), rect("c", 8, 8)];
        let pages = pack_grid(rects, &settings).unwrap();
        assert_eq!(pages.len(), 1);
        // cell 8x8, adjusted max width 20 -> 2 columns per row.
        let placed = &pages[0].output_rects;
        assert_eq!(placed[0].x, 0);
        assert_eq!(placed[1].x, 8);
        // c wraps to the next row; after the internal Y-flip it lands above row 0.
        assert_eq!(placed[2].x, 0);
        assert_ne!(placed[2].y, placed[0].y);
    }

    #[test]
    fn oversized_rect_gets_its_own_page() {
        let settings = Settings::builder()
            .padding(0, 0)
            .edge_padding(false)
            .max_size(16, 16)
            .min_size(4, 4)
            .grid(true)
            .build();
        let pages = pack_grid(vec![rect("huge", 32, 32)], &settings).unwrap();
        assert_eq!(pages.len(), 1);
        assert_eq!(pages[0].output_rects.len(), 1);
    }
}
