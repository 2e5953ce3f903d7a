use tracing::{instrument, warn};

use crate::config::Settings;
use crate::error::{PackError, Result};
use crate::model::{atlas_name, Page, Rect};
use crate::packer::maxrects::{MaxRects, MaxRectsHeuristic, ALL_HEURISTICS};

fn is_power_of_two(v: u32) -> bool {
    v != 0 && (v & (v - 1)) == 0
}

fn next_power_of_two(v: u32) -> u32 {
    v.next_power_of_two()
}

fn next_multiple_of_four(v: u32) -> u32 {
    (v + 3) & !3
}

/// Rounds `v` up to the next size that satisfies `power_of_two`/`multiple_of_four`.
fn quantize_up(v: u32, settings: &Settings) -> u32 {
    let mut v = v.max(1);
    if settings.power_of_two {
        v = next_power_of_two(v);
    }
    if settings.multiple_of_four {
        v = next_multiple_of_four(v);
    }
    v
}

/// Geometric candidate ladder from `min` to `max`, every entry quantised and
/// deduplicated, ascending. Encodes POT/mod4 as a generator rather than a
/// post-hoc filter so the ladder is always monotone.
fn candidate_ladder(min: u32, max: u32, steps: u32, settings: &Settings) -> Vec<u32> {
    let min = quantize_up(min, settings).min(max.max(1));
    let max = max.max(min);
    let mut out = Vec::new();
    if min >= max {
        out.push(quantize_up(max, settings).min(max).max(min.min(max)));
        out.dedup();
        if out.is_empty() {
            out.push(max);
        }
        return out;
    }
    let ratio = (max as f64 / min as f64).powf(1.0 / steps as f64);
    let mut v = min as f64;
    for _ in 0..=steps {
        let candidate = quantize_up(v.round() as u32, settings).min(max);
        if out.last().copied() != Some(candidate) {
            out.push(candidate);
        }
        v *= ratio;
    }
    if out.last().copied() != Some(max) {
        out.push(max);
    }
    out.retain(|&c| c >= min && c <= max);
    out.dedup();
    out
}

struct Fit {
    page: Page,
    occupancy: f64,
}

/// Runs every heuristic at a fixed `(w, h)` and keeps the best result.
/// When `fully` is true, any result leaving rects unplaced is rejected.
fn pack_at_size(fully: bool, w: u32, h: u32, rects: &[Rect], settings: &Settings) -> Option<Fit> {
    let mut best: Option<Fit> = None;
    for heuristic in ALL_HEURISTICS {
        let (output_rects, remaining_rects) = run_heuristic(rects.to_vec(), w, h, heuristic, settings);
        if fully && !remaining_rects.is_empty() {
            continue;
        }
        let page = Page {
            output_rects,
            remaining_rects,
            width: w.saturating_sub(settings.padding_x),
            height: h.saturating_sub(settings.padding_y),
            image_width: 0,
            image_height: 0,
            x: 0,
            y: 0,
            image_name: None,
        };
        let occupancy = page.occupancy();
        let better = match &best {
            None => true,
            Some(b) => occupancy > b.occupancy,
        };
        if better {
            best = Some(Fit { page, occupancy });
        }
    }
    best
}

fn run_heuristic(
    rects: Vec<Rect>,
    w: u32,
    h: u32,
    heuristic: MaxRectsHeuristic,
    settings: &Settings,
) -> (Vec<Rect>, Vec<Rect>) {
    if settings.fast {
        let mut engine = MaxRects::new(w, h);
        let mut placed = Vec::new();
        let mut remaining = Vec::new();
        for mut rect in rects {
            if engine.insert(&mut rect, heuristic, settings.rotation, settings.padding_x, settings.padding_y) {
                placed.push(rect);
            } else {
                remaining.push(rect);
            }
        }
        (placed, remaining)
    } else {
        MaxRects::pack(rects, w, h, heuristic, settings.rotation, settings.padding_x, settings.padding_y)
    }
}

fn fits_either_orientation(rect: &Rect, max_w: u32, max_h: u32, settings: &Settings) -> bool {
    let upright = rect.width <= max_w && rect.height <= max_h;
    if upright {
        return true;
    }
    if !settings.rotation || !rect.can_rotate {
        return false;
    }
    let (rw, rh) = rect.rotated_footprint(settings.padding_x, settings.padding_y);
    rw <= max_w && rh <= max_h
}

/// Packs `rects` (already carrying padding embedded in `width`/`height`) onto
/// as many pages as necessary, searching page sizes per page.
#[instrument(skip(rects, settings), fields(count = rects.len()))]
pub fn pack_maxrects(mut rects: Vec<Rect>, settings: &Settings) -> Result<Vec<Page>> {
    if rects.is_empty() {
        return Ok(Vec::new());
    }

    let max_w = settings.adjusted_max_width();
    let max_h = settings.adjusted_max_height();

    for rect in &rects {
        if !fits_either_orientation(rect, max_w, max_h, settings) {
            return Err(PackError::InputTooLarge {
                name: rect.name.clone(),
                width: rect.original_width,
                height: rect.original_height,
                max_width: max_w,
                max_height: max_h,
            });
        }
    }

    if settings.fast {
        if settings.rotation {
            rects.sort_by(|a, b| b.width.max(b.height).cmp(&a.width.max(a.height)));
        } else {
            rects.sort_by(|a, b| b.width.cmp(&a.width));
        }
    }

    let min_w = rects.iter().map(|r| r.width).max().unwrap_or(1).max(settings.min_width);
    let min_h = rects.iter().map(|r| r.height).max().unwrap_or(1).max(settings.min_height);

    let mut pages = Vec::new();
    let mut remaining = rects;

    while !remaining.is_empty() {
        let page = pack_one_page(&remaining, min_w, min_h, max_w, max_h, settings);
        remaining = page.remaining_rects.clone();
        let mut page = page;
        page.remaining_rects = Vec::new();
        if page.output_rects.is_empty() {
            // Nothing fits even a forced full-size attempt; every rect already
            // passed the fits_either_orientation check, so this should be
            // unreachable, but avoid looping forever if it ever happens.
            warn!("page-size search produced an empty page with rects remaining; aborting");
            break;
        }
        pages.push(page);
    }

    Ok(pages)
}

fn pack_one_page(rects: &[Rect], min_w: u32, min_h: u32, max_w: u32, max_h: u32, settings: &Settings) -> Page {
    let steps = if settings.fast { 25 } else { 15 };

    let height_candidates = if settings.square {
        candidate_ladder(min_w.max(min_h), max_w.min(max_h), steps, settings)
    } else {
        candidate_ladder(min_h, max_h, steps, settings)
    };

    let mut best: Option<Fit> = None;

    for &h in &height_candidates {
        let width_candidates = if settings.square { vec![h] } else { candidate_ladder(min_w, max_w, steps, settings) };

        // Binary search within the width ladder for the smallest width that
        // still fits every rect at this height.
        let mut lo = 0usize;
        let mut hi = width_candidates.len();
        let mut found: Option<(u32, Fit)> = None;
        while lo < hi {
            let mid = lo + (hi - lo) / 2;
            let w = width_candidates[mid];
            match pack_at_size(true, w, h, rects, settings) {
                Some(fit) => {
                    found = Some((w, fit));
                    hi = mid;
                }
                None => {
                    lo = mid + 1;
                }
            }
        }

        if let Some((w, fit)) = found {
            let area = w as u64 * h as u64;
            let replace = match &best {
                None => true,
                Some(b) => {
                    let best_area = (b.page.width + 2 * settings.edge_pad_x()) as u64
                        * (b.page.height + 2 * settings.edge_pad_y()) as u64;
                    area < best_area || (area == best_area && fit.occupancy > b.occupancy)
                }
            };
            if replace {
                best = Some(fit);
            }
        }
    }

    if let Some(fit) = best {
        let mut page = fit.page;
        page.output_rects.sort_by(|a, b| {
            atlas_name(&a.name, settings.flatten_paths).cmp(&atlas_name(&b.name, settings.flatten_paths))
        });
        return page;
    }

    // Nothing fits on a single page: forced fallback at the full adjusted
    // max size, taking whatever fits and leaving the rest for the next page.
    let w = quantize_up(max_w, settings).min(max_w).max(min_w.min(max_w));
    let h = quantize_up(max_h, settings).min(max_h).max(min_h.min(max_h));
    warn!(w, h, "no page size fully fits the remaining rects; forcing a best-effort page");
    let mut fit = pack_at_size(false, max_w, max_h, rects, settings)
        .unwrap_or_else(|| Fit { page: Page::default(), occupancy: 0.0 });
    fit.page.output_rects.sort_by(|a, b| {
        atlas_name(&a.name, settings.flatten_paths).cmp(&atlas_name(&b.name, settings.flatten_paths))
    });
    fit.page
}
