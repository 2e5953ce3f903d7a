use std::collections::HashSet;

use crate::config::Settings;
use crate::error::{PackError, Result};
use crate::model::{atlas_name, Alias, NinePatch, Page, Rect};

/// Writes the manifest text for `pages` in the dialect selected by
/// `settings.legacy_output`. `appending` controls whether a leading blank
/// separator line is emitted before the first page header.
pub fn write(pages: &[Page], settings: &Settings, appending: bool) -> String {
    let mut out = String::new();
    for (i, page) in pages.iter().enumerate() {
        if appending && i == 0 {
            out.push('\n');
        }
        write_page(&mut out, page, settings);
    }
    out
}

fn write_page(out: &mut String, page: &Page, settings: &Settings) {
    let name = page.image_name.as_deref().unwrap_or("page");
    out.push_str(name);
    out.push('\n');

    if settings.legacy_output {
        out.push_str(&format!("  size: {},{}\n", page.image_width, page.image_height));
        out.push_str("  format: RGBA8888\n");
        out.push_str("  filter: Nearest,Nearest\n");
        out.push_str("  repeat: none\n");
    } else {
        out.push_str(&format!("  size: {},{}\n", page.image_width, page.image_height));
        if settings.premultiply_alpha {
            out.push_str("  pma: true\n");
        }
    }

    let mut sorted: Vec<&Rect> = page.output_rects.iter().collect();
    sorted.sort_by(|a, b| atlas_name(&a.name, settings.flatten_paths).cmp(&atlas_name(&b.name, settings.flatten_paths)));

    for rect in sorted {
        write_region(out, rect, page, settings);
        let mut aliases: Vec<&Alias> = rect.aliases.iter().collect();
        aliases.sort_by(|a, b| {
            atlas_name(&a.name, settings.flatten_paths).cmp(&atlas_name(&b.name, settings.flatten_paths))
        });
        for alias in aliases {
            let applied = alias.apply_to(rect);
            write_region(out, &applied, page, settings);
        }
    }
}

fn write_region(out: &mut String, rect: &Rect, page: &Page, settings: &Settings) {
    let name = atlas_name(&rect.name, settings.flatten_paths);
    out.push_str(&name);
    out.push('\n');

    let y = page.y + page.height - rect.y - (rect.height.saturating_sub(settings.padding_y));

    if settings.legacy_output {
        out.push_str(&format!("  rotate: {}\n", rect.rotated));
        out.push_str(&format!("  xy: {}, {}\n", page.x + rect.x, y));
        out.push_str(&format!("  size: {}, {}\n", rect.region_width, rect.region_height));
        out.push_str(&format!("  split: {}\n", format_ninepatch(rect.splits.unwrap_or([0, 0, 0, 0]))));
        out.push_str(&format!("  pad: {}\n", format_ninepatch(rect.pads.unwrap_or([0, 0, 0, 0]))));
        out.push_str(&format!(
            "  orig: {}, {}\n",
            rect.original_width, rect.original_height
        ));
        out.push_str(&format!("  offset: {}, {}\n", rect.offset_x, rect.offset_y));
        out.push_str(&format!("  index: {}\n", rect.index.unwrap_or(-1)));
        return;
    }

    if let Some(index) = rect.index {
        if index != -1 {
            out.push_str(&format!("  index: {index}\n"));
        }
    }
    out.push_str(&format!(
        "  bounds: {},{},{},{}\n",
        page.x + rect.x,
        y,
        rect.region_width,
        rect.region_height
    ));
    let offsets_nondefault = rect.offset_x != 0
        || rect.offset_y != 0
        || rect.original_width != rect.region_width
        || rect.original_height != rect.region_height;
    if offsets_nondefault {
        out.push_str(&format!(
            "  offsets: {},{},{},{}\n",
            rect.offset_x, rect.offset_y, rect.original_width, rect.original_height
        ));
    }
    if rect.rotated {
        out.push_str("  rotate: true\n");
    }
    if let Some(splits) = rect.splits {
        out.push_str(&format!("  split: {}\n", format_ninepatch(splits)));
    } else if rect.pads.is_some() {
        out.push_str("  split: 0,0,0,0\n");
    }
    if let Some(pads) = rect.pads {
        out.push_str(&format!("  pad: {}\n", format_ninepatch(pads)));
    }
}

fn format_ninepatch(v: NinePatch) -> String {
    format!("{},{},{},{}", v[0], v[1], v[2], v[3])
}

/// A minimal parsed view of a manifest, enough to detect name collisions and
/// to round-trip bounds/splits/pads/offsets/rotate/index for a given region.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct ParsedRegion {
    pub name: String,
    pub page_name: String,
    pub bounds: (u32, u32, u32, u32),
    pub splits: Option<NinePatch>,
    pub pads: Option<NinePatch>,
    pub offsets: (u32, u32, u32, u32),
    pub rotated: bool,
    pub index: Option<i32>,
}

/// Parses a manifest written by `write`. Tolerant only of the shapes this
/// writer itself produces; it is not a general-purpose atlas parser.
pub fn parse(text: &str) -> Result<Vec<ParsedRegion>> {
    let mut regions = Vec::new();
    let mut lines = text.lines().peekable();
    let mut current_page = String::new();

    while let Some(line) = lines.next() {
        if line.trim().is_empty() {
            continue;
        }
        if !line.starts_with(' ') {
            // A header line: either a page name or a region name. Pages are
            // distinguished by their first indented line being `size:`.
            let is_page = matches!(lines.peek(), Some(next) if next.trim_start().starts_with("size:"));
            if is_page {
                current_page = line.to_string();
                consume_kv_block(&mut lines);
                continue;
            }
            let name = line.to_string();
            let mut region = ParsedRegion { name, page_name: current_page.clone(), ..Default::default() };
            parse_region_block(&mut lines, &mut region)?;
            regions.push(region);
        }
    }

    Ok(regions)
}

fn consume_kv_block<'a, I: Iterator<Item = &'a str>>(lines: &mut std::iter::Peekable<I>) {
    while let Some(next) = lines.peek() {
        if next.starts_with(' ') {
            lines.next();
        } else {
            break;
        }
    }
}

fn parse_region_block<'a, I: Iterator<Item = &'a str>>(
    lines: &mut std::iter::Peekable<I>,
    region: &mut ParsedRegion,
) -> Result<()> {
    while let Some(next) = lines.peek() {
        if !next.starts_with(' ') {
            break;
        }
        let line = lines.next().unwrap();
        let line = line.trim();
        let (key, value) = line
            .split_once(':')
            .ok_or_else(|| PackError::ConfigInvalid(format!("malformed manifest line: {line}")))?;
        let value = value.trim();
        match key.trim() {
            "bounds" => region.bounds = parse_4(value)?,
            "xy" => {
                let (x, y) = parse_2(value)?;
                region.bounds.0 = x;
                region.bounds.1 = y;
            }
            "size" => {
                let (w, h) = parse_2(value)?;
                region.bounds.2 = w;
                region.bounds.3 = h;
            }
            "offsets" => {
                let parsed = parse_4(value)?;
                region.offsets = parsed;
            }
            "offset" => {
                let (x, y) = parse_2(value)?;
                region.offsets.0 = x;
                region.offsets.1 = y;
            }
            "orig" => {
                let (w, h) = parse_2(value)?;
                region.offsets.2 = w;
                region.offsets.3 = h;
            }
            "rotate" => region.rotated = value == "true",
            "split" => region.splits = Some(parse_ninepatch(value)?),
            "pad" => region.pads = Some(parse_ninepatch(value)?),
            "index" => {
                region.index = value.parse::<i32>().ok().filter(|v| *v != -1);
            }
            _ => {}
        }
    }
    Ok(())
}

fn parse_2(v: &str) -> Result<(u32, u32)> {
    let parts: Vec<&str> = v.split(',').map(str::trim).collect();
    if parts.len() != 2 {
        return Err(PackError::ConfigInvalid(format!("expected 2 values, got '{v}'")));
    }
    Ok((parse_u32(parts[0])?, parse_u32(parts[1])?))
}

fn parse_4(v: &str) -> Result<(u32, u32, u32, u32)> {
    let parts: Vec<&str> = v.split(',').map(str::trim).collect();
    if parts.len() != 4 {
        return Err(PackError::ConfigInvalid(format!("expected 4 values, got '{v}'")));
    }
    Ok((parse_u32(parts[0])?, parse_u32(parts[1])?, parse_u32(parts[2])?, parse_u32(parts[3])?))
}

fn parse_ninepatch(v: &str) -> Result<NinePatch> {
    let parts: Vec<&str> = v.split(',').map(str::trim).collect();
    if parts.len() != 4 {
        return Err(PackError::ConfigInvalid(format!("expected 4 values, got '{v}'")));
    }
    let mut out = [0i32; 4];
    for (i, p) in parts.iter().enumerate() {
        out[i] = p.parse::<i32>().map_err(|_| PackError::ConfigInvalid(format!("bad integer '{p}'")))?;
    }
    Ok(out)
}

fn parse_u32(v: &str) -> Result<u32> {
    v.parse::<u32>().map_err(|_| PackError::ConfigInvalid(format!("bad integer '{v}'")))
}

/// Checks `pages` for a name collision against an existing manifest's regions
/// (parsed via `parse`), or among themselves. Aliases count as names too.
pub fn check_name_collisions(pages: &[Page], existing: Option<&str>) -> Result<()> {
    let mut seen: HashSet<String> = HashSet::new();
    if let Some(text) = existing {
        for region in parse(text)? {
            if !seen.insert(region.name) {
                // existing manifest already had an internal collision; not
                // this writer's concern to diagnose further.
            }
        }
    }
    for page in pages {
        for rect in &page.output_rects {
            if !seen.insert(rect.name.clone()) {
                return Err(PackError::NameCollision { name: rect.name.clone() });
            }
            for alias in &rect.aliases {
                if !seen.insert(alias.name.clone()) {
                    return Err(PackError::NameCollision { name: alias.name.clone() });
                }
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Rect;

    fn page_with(rects: Vec<Rect>) -> Page {
        Page {
            output_rects: rects,
            width: 32,
            height: 32,
            image_width: 32,
            image_height: 32,
            image_name: Some("atlas.png".to_string()),
            ..Page::default()
        }
    }

    #[test]
    fn modern_writer_sorts_rects_lexicographically() {
        let settings = Settings::builder().build();
        let mut a = Rect::new("zeta", 8, 8);
        a.region_width = 8;
        a.region_height = 8;
        let mut b = Rect::new("alpha", 8, 8);
        b.region_width = 8;
        b.region_height = 8;
        let text = write(&[page_with(vec![a, b])], &settings, false);
        let alpha_pos = text.find("alpha").unwrap();
        let zeta_pos = text.find("zeta").unwrap();
        assert!(alpha_pos < zeta_pos);
    }

    #[test]
    fn legacy_writer_emits_all_fields() {
        let settings = Settings::builder().legacy_output(true).build();
        let mut r = Rect::new("a", 8, 8);
        r.region_width = 8;
        r.region_height = 8;
        let text = write(&[page_with(vec![r])], &settings, false);
        for key in ["rotate:", "xy:", "size:", "split:", "pad:", "orig:", "offset:", "index:"] {
            assert!(text.contains(key), "missing {key} in:\n{text}");
        }
    }

    #[test]
    fn alias_emitted_after_primary() {
        let settings = Settings::builder().build();
        let mut r = Rect::new("a", 8, 8);
        r.region_width = 8;
        r.region_height = 8;
        r.aliases.push(Alias {
            name: "a_alt".to_string(),
            index: Some(1),
            splits: None,
            pads: None,
            offset_x: 0,
            offset_y: 0,
            original_width: 8,
            original_height: 8,
        });
        let text = write(&[page_with(vec![r])], &settings, false);
        let a_pos = text.find("a\n").unwrap();
        let alt_pos = text.find("a_alt").unwrap();
        assert!(a_pos < alt_pos);
    }

    #[test]
    fn round_trip_preserves_bounds() {
        let settings = Settings::builder().build();
        let mut r = Rect::new("thing", 8, 8);
        r.x = 4;
        r.y = 4;
        r.region_width = 8;
        r.region_height = 8;
        r.rotated = true;
        let text = write(&[page_with(vec![r])], &settings, false);
        let regions = parse(&text).unwrap();
        assert_eq!(regions.len(), 1);
        assert_eq!(regions[0].name, "thing");
        assert!(regions[0].rotated);
    }

    #[test]
    fn appending_with_collision_is_rejected() {
        let existing = "atlas.png\n  size: 32,32\nthing\n  bounds: 0,0,8,8\n";
        let mut r = Rect::new("thing", 8, 8);
        r.region_width = 8;
        r.region_height = 8;
        let page = page_with(vec![r]);
        let err = check_name_collisions(&[page], Some(existing)).unwrap_err();
        assert!(matches!(err, PackError::NameCollision { .. }));
    }
}
