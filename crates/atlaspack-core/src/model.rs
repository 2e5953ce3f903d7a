use serde::{Deserialize, Serialize};

/// Optional 9-patch metadata: `[left, right, top, bottom]` in source pixels.
pub type NinePatch = [i32; 4];

/// A packable record: a named rectangle plus whitespace-strip and 9-patch
/// bookkeeping carried through from the (external) image processor.
///
/// `width`/`height` *include* the right/top padding while a rect is being
/// placed by a packer; `original_width`/`original_height`/`region_width`/
/// `region_height`/`offset_x`/`offset_y` describe the untrimmed source and
/// are never touched by a packer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Rect {
    pub name: String,
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,

    pub index: Option<i32>,
    pub can_rotate: bool,
    pub rotated: bool,

    pub offset_x: u32,
    pub offset_y: u32,
    pub original_width: u32,
    pub original_height: u32,
    pub region_width: u32,
    pub region_height: u32,

    pub splits: Option<NinePatch>,
    pub pads: Option<NinePatch>,

    /// Scratch heuristic scores. Meaningful only during packing; callers must
    /// not rely on their value once a rect has been placed.
    #[serde(skip)]
    pub score1: i64,
    #[serde(skip)]
    pub score2: i64,

    /// Alternative names/9-patch metadata sharing this rect's placement.
    pub aliases: Vec<Alias>,
}

impl Rect {
    /// Builds a fresh, unplaced rect with the given name and (untrimmed) size.
    /// `width`/`height`, `original_width`/`original_height` and
    /// `region_width`/`region_height` all start out equal; an image processor
    /// that trims whitespace is expected to shrink `width`/`height` and
    /// `region_*` while leaving `original_*` untouched.
    pub fn new(name: impl Into<String>, width: u32, height: u32) -> Self {
        Self {
            name: name.into(),
            x: 0,
            y: 0,
            width,
            height,
            index: None,
            can_rotate: true,
            rotated: false,
            offset_x: 0,
            offset_y: 0,
            original_width: width,
            original_height: height,
            region_width: width,
            region_height: height,
            splits: None,
            pads: None,
            score1: 0,
            score2: 0,
            aliases: Vec::new(),
        }
    }

    /// Width/height as they would occupy page space if rotated 90 degrees,
    /// per the padding-aware rotation formula shared by every packer.
    pub fn rotated_footprint(&self, padding_x: u32, padding_y: u32) -> (u32, u32) {
        (
            (self.height + padding_x).saturating_sub(padding_y),
            (self.width + padding_y).saturating_sub(padding_x),
        )
    }

    pub fn right(&self) -> u32 {
        self.x + self.width
    }

    pub fn bottom(&self) -> u32 {
        self.y + self.height
    }

    pub fn area(&self) -> u64 {
        self.width as u64 * self.height as u64
    }
}

/// An alternative name/9-patch record sharing its primary rect's placement.
/// Applied onto a copy of the primary's final placement at manifest-emit time.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Alias {
    pub name: String,
    pub index: Option<i32>,
    pub splits: Option<NinePatch>,
    pub pads: Option<NinePatch>,
    pub offset_x: u32,
    pub offset_y: u32,
    pub original_width: u32,
    pub original_height: u32,
}

impl Alias {
    /// Applies this alias's metadata onto a copy of `primary`'s placement.
    pub fn apply_to(&self, primary: &Rect) -> Rect {
        let mut r = primary.clone();
        r.name = self.name.clone();
        r.index = self.index;
        r.splits = self.splits;
        r.pads = self.pads;
        r.offset_x = self.offset_x;
        r.offset_y = self.offset_y;
        r.original_width = self.original_width;
        r.original_height = self.original_height;
        r.aliases = Vec::new();
        r
    }
}

/// The name a rect is known by in the manifest: the file-name component only
/// when `flatten_paths` is set, else the name verbatim.
pub fn atlas_name(name: &str, flatten_paths: bool) -> String {
    if flatten_paths {
        name.rsplit('/').next().unwrap_or(name).to_string()
    } else {
        name.to_string()
    }
}

/// One placement result produced by a packer for a single page.
#[derive(Debug, Clone, Default)]
pub struct Page {
    pub output_rects: Vec<Rect>,
    pub remaining_rects: Vec<Rect>,
    /// Packed width/height (padding-subtracted), before edge-pad growth and
    /// POT/mod4/min-size quantisation.
    pub width: u32,
    pub height: u32,
    /// Final on-disk dimensions after the assembler's quantisation pass.
    pub image_width: u32,
    pub image_height: u32,
    /// Edge-pad origin of placed content within the final image.
    pub x: u32,
    pub y: u32,
    pub image_name: Option<String>,
}

impl Page {
    pub fn occupancy(&self) -> f64 {
        if self.width == 0 || self.height == 0 {
            return 0.0;
        }
        let used: u64 = self.output_rects.iter().map(|r| r.area()).sum();
        used as f64 / (self.width as u64 * self.height as u64) as f64
    }
}
