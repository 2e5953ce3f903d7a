use std::collections::HashSet;

use image::RgbaImage;
use tracing::{error, instrument};

use crate::assembler::{assemble_page, unique_file_name, BleedPostProcess, ImageSource};
use crate::config::Settings;
use crate::error::{PackError, Result};
use crate::manifest;
use crate::model::{Page, Rect};
use crate::packer::grid::pack_grid;
use crate::progress::ProgressSink;
use crate::search::pack_maxrects;

/// Inputs that don't come from `Settings`/`Rect` but are still needed to
/// produce a complete, collision-checked, uniquely-named pack run.
pub struct PackOptions<'a> {
    pub atlas_name: &'a str,
    /// An existing manifest's text, if this run is appending to one.
    pub existing_manifest: Option<&'a str>,
    /// Page image file names already present in the output directory.
    pub existing_page_names: &'a HashSet<String>,
    pub appending: bool,
}

/// The full output of one pack run: placements, page images ready to
/// encode/write, and the manifest text.
pub struct PackResult {
    pub pages: Vec<Page>,
    pub images: Vec<RgbaImage>,
    pub manifest: String,
}

fn check_duplicate_names(rects: &[Rect]) -> Result<()> {
    let mut seen = HashSet::new();
    for rect in rects {
        if !seen.insert(rect.name.clone()) {
            return Err(PackError::NameCollision { name: rect.name.clone() });
        }
        for alias in &rect.aliases {
            if !seen.insert(alias.name.clone()) {
                return Err(PackError::NameCollision { name: alias.name.clone() });
            }
        }
    }
    Ok(())
}

/// Embeds padding into every rect's width/height, per the pre-pass the
/// MaxRects page-size search driver expects (the grid packer does this
/// itself, inline, as it places each rect).
fn embed_padding(rects: &[Rect], settings: &Settings) -> Vec<Rect> {
    rects
        .iter()
        .map(|r| {
            let mut r = r.clone();
            r.width += settings.padding_x;
            r.height += settings.padding_y;
            r
        })
        .collect()
}

fn assign_image_names(pages: &mut [Page], atlas_name: &str, settings: &Settings, existing: &HashSet<String>) {
    let mut taken: HashSet<String> = existing.clone();
    let ext = match settings.output_format {
        crate::config::OutputFormat::Png => "png",
        crate::config::OutputFormat::Jpg => "jpg",
    };
    for (i, page) in pages.iter_mut().enumerate() {
        let base = if pages.len() == 1 { format!("{atlas_name}.{ext}") } else { format!("{atlas_name}_{i}.{ext}") };
        let name = unique_file_name(&base, &taken);
        taken.insert(name.clone());
        page.image_name = Some(name);
    }
}

/// Runs one full pack: validates settings, places every rect via the
/// configured packer, assembles page images, and writes the manifest text.
/// Call once per configured scale; the caller is responsible for looping
/// over `settings.scale[]` with appropriately-scaled `rects` and a fresh
/// `Settings` for each scale.
#[instrument(skip(rects, settings, source, bleed, progress, options), fields(count = rects.len(), atlas = options.atlas_name))]
pub fn pack(
    rects: Vec<Rect>,
    settings: &Settings,
    source: &dyn ImageSource,
    bleed: &dyn BleedPostProcess,
    progress: &mut dyn ProgressSink,
    options: &PackOptions,
) -> Result<PackResult> {
    settings.validate()?;

    if rects.is_empty() {
        return Err(PackError::Empty);
    }

    check_duplicate_names(&rects)?;

    progress.start(1.0);

    let mut pages = if settings.grid {
        pack_grid(rects, settings)?
    } else {
        let padded = embed_padding(&rects, settings);
        pack_maxrects(padded, settings)?
    };

    assign_image_names(&mut pages, options.atlas_name, settings, options.existing_page_names);

    manifest::check_name_collisions(&pages, options.existing_manifest)?;

    let mut images = Vec::with_capacity(pages.len());
    for (i, page) in pages.iter_mut().enumerate() {
        if progress.update(i, pages.len()) {
            progress.end();
            return Err(PackError::Cancelled);
        }
        let canvas = assemble_page(page, settings, source, bleed, progress).map_err(|e| {
            error!(page = i, error = %e, "failed to assemble page");
            e
        })?;
        images.push(canvas);
    }
    progress.update(pages.len(), pages.len());
    progress.end();

    let manifest_text = manifest::write(&pages, settings, options.appending);

    Ok(PackResult { pages, images, manifest: manifest_text })
}
