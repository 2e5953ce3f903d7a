use serde::{Deserialize, Serialize};

use crate::error::{PackError, Result};

/// Pixel output container for emitted pages.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    Png,
    Jpg,
}

impl Default for OutputFormat {
    fn default() -> Self {
        OutputFormat::Png
    }
}

/// Resampling filter used when producing a scaled variant of the atlas.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ResamplingFilter {
    Nearest,
    Bilinear,
    Bicubic,
}

impl Default for ResamplingFilter {
    fn default() -> Self {
        ResamplingFilter::Bilinear
    }
}

impl ResamplingFilter {
    pub fn to_image_filter(self) -> image::imageops::FilterType {
        match self {
            ResamplingFilter::Nearest => image::imageops::FilterType::Nearest,
            ResamplingFilter::Bilinear => image::imageops::FilterType::Triangle,
            ResamplingFilter::Bicubic => image::imageops::FilterType::CatmullRom,
        }
    }
}

/// Validated, immutable packing configuration.
///
/// Constructed once per run (typically deserialized from a per-directory JSON
/// file by the CLI) and never mutated afterwards; see `validate`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub padding_x: u32,
    pub padding_y: u32,
    pub edge_padding: bool,
    pub duplicate_padding: bool,

    pub min_width: u32,
    pub min_height: u32,
    pub max_width: u32,
    pub max_height: u32,

    pub power_of_two: bool,
    pub multiple_of_four: bool,
    pub square: bool,

    pub rotation: bool,
    pub fast: bool,
    pub grid: bool,

    pub bleed: bool,
    pub bleed_iterations: u32,
    pub premultiply_alpha: bool,

    pub output_format: OutputFormat,
    pub jpeg_quality: f32,

    pub flatten_paths: bool,
    pub legacy_output: bool,
    pub pretty_print: bool,

    pub scale: Vec<f32>,
    pub scale_suffix: Vec<String>,
    pub scale_resampling: Vec<ResamplingFilter>,

    pub atlas_extension: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            padding_x: 2,
            padding_y: 2,
            edge_padding: true,
            duplicate_padding: false,
            min_width: 16,
            min_height: 16,
            max_width: 1024,
            max_height: 1024,
            power_of_two: false,
            multiple_of_four: false,
            square: false,
            rotation: true,
            fast: false,
            grid: false,
            bleed: false,
            bleed_iterations: 2,
            premultiply_alpha: false,
            output_format: OutputFormat::Png,
            jpeg_quality: 0.9,
            flatten_paths: false,
            legacy_output: false,
            pretty_print: true,
            scale: vec![1.0],
            scale_suffix: vec![String::new()],
            scale_resampling: vec![ResamplingFilter::Bilinear],
            atlas_extension: ".atlas".to_string(),
        }
    }
}

fn is_power_of_two(v: u32) -> bool {
    v != 0 && (v & (v - 1)) == 0
}

impl Settings {
    /// Validates invariants that must hold before any packing work begins.
    ///
    /// Mirrors `ConfigInvalid` in the error taxonomy: POT/mod4 constraints on
    /// `max_width`/`max_height`, `min_* <= max_*`, and scale-array arity.
    pub fn validate(&self) -> Result<()> {
        if self.max_width == 0 || self.max_height == 0 {
            return Err(PackError::ConfigInvalid(format!(
                "max_width/max_height must be > 0 (got {}x{})",
                self.max_width, self.max_height
            )));
        }
        if self.min_width == 0 || self.min_height == 0 {
            return Err(PackError::ConfigInvalid(format!(
                "min_width/min_height must be > 0 (got {}x{})",
                self.min_width, self.min_height
            )));
        }
        if self.min_width > self.max_width || self.min_height > self.max_height {
            return Err(PackError::ConfigInvalid(format!(
                "min dimensions ({}x{}) exceed max dimensions ({}x{})",
                self.min_width, self.min_height, self.max_width, self.max_height
            )));
        }
        if self.power_of_two && (!is_power_of_two(self.max_width) || !is_power_of_two(self.max_height))
        {
            return Err(PackError::ConfigInvalid(format!(
                "power_of_two requires max_width/max_height to be powers of two (got {}x{})",
                self.max_width, self.max_height
            )));
        }
        if self.multiple_of_four && (self.max_width % 4 != 0 || self.max_height % 4 != 0) {
            return Err(PackError::ConfigInvalid(format!(
                "multiple_of_four requires max_width/max_height % 4 == 0 (got {}x{})",
                self.max_width, self.max_height
            )));
        }
        if !(0.0..=1.0).contains(&self.jpeg_quality) {
            return Err(PackError::ConfigInvalid(format!(
                "jpeg_quality must be in [0,1] (got {})",
                self.jpeg_quality
            )));
        }
        if self.scale.is_empty() {
            return Err(PackError::ConfigInvalid("scale[] must not be empty".into()));
        }
        if self.scale.len() != self.scale_suffix.len() || self.scale.len() != self.scale_resampling.len()
        {
            return Err(PackError::ConfigInvalid(format!(
                "scale[] ({}), scale_suffix[] ({}) and scale_resampling[] ({}) must have matching length",
                self.scale.len(),
                self.scale_suffix.len(),
                self.scale_resampling.len()
            )));
        }
        Ok(())
    }

    /// Per-edge padding reserved by the assembler: `padding_* / 2` when
    /// `duplicate_padding` halves the band, else the full `padding_*`.
    pub fn edge_pad_x(&self) -> u32 {
        if self.duplicate_padding {
            self.padding_x / 2
        } else {
            self.padding_x
        }
    }

    pub fn edge_pad_y(&self) -> u32 {
        if self.duplicate_padding {
            self.padding_y / 2
        } else {
            self.padding_y
        }
    }

    /// Max page width available to a packer once the edge-padding margin
    /// that the assembler will later re-add is reserved.
    pub fn adjusted_max_width(&self) -> u32 {
        if self.edge_padding {
            self.max_width.saturating_sub(2 * self.edge_pad_x())
        } else {
            self.max_width
        }
    }

    pub fn adjusted_max_height(&self) -> u32 {
        if self.edge_padding {
            self.max_height.saturating_sub(2 * self.edge_pad_y())
        } else {
            self.max_height
        }
    }
}

/// Builder for `Settings` for ergonomic construction from code (as opposed to
/// deserializing a JSON settings file).
#[derive(Debug, Default, Clone)]
pub struct SettingsBuilder {
    cfg: Settings,
}

impl SettingsBuilder {
    pub fn new() -> Self {
        Self { cfg: Settings::default() }
    }
    pub fn padding(mut self, x: u32, y: u32) -> Self {
        self.cfg.padding_x = x;
        self.cfg.padding_y = y;
        self
    }
    pub fn edge_padding(mut self, v: bool) -> Self {
        self.cfg.edge_padding = v;
        self
    }
    pub fn duplicate_padding(mut self, v: bool) -> Self {
        self.cfg.duplicate_padding = v;
        self
    }
    pub fn min_size(mut self, w: u32, h: u32) -> Self {
        self.cfg.min_width = w;
        self.cfg.min_height = h;
        self
    }
    pub fn max_size(mut self, w: u32, h: u32) -> Self {
        self.cfg.max_width = w;
        self.cfg.max_height = h;
        self
    }
    pub fn power_of_two(mut self, v: bool) -> Self {
        self.cfg.power_of_two = v;
        self
    }
    pub fn multiple_of_four(mut self, v: bool) -> Self {
        self.cfg.multiple_of_four = v;
        self
    }
    pub fn square(mut self, v: bool) -> Self {
        self.cfg.square = v;
        self
    }
    pub fn rotation(mut self, v: bool) -> Self {
        self.cfg.rotation = v;
        self
    }
    pub fn fast(mut self, v: bool) -> Self {
        self.cfg.fast = v;
        self
    }
    pub fn grid(mut self, v: bool) -> Self {
        self.cfg.grid = v;
        self
    }
    pub fn bleed(mut self, v: bool, iterations: u32) -> Self {
        self.cfg.bleed = v;
        self.cfg.bleed_iterations = iterations;
        self
    }
    pub fn premultiply_alpha(mut self, v: bool) -> Self {
        self.cfg.premultiply_alpha = v;
        self
    }
    pub fn output_format(mut self, v: OutputFormat) -> Self {
        self.cfg.output_format = v;
        self
    }
    pub fn jpeg_quality(mut self, v: f32) -> Self {
        self.cfg.jpeg_quality = v;
        self
    }
    pub fn flatten_paths(mut self, v: bool) -> Self {
        self.cfg.flatten_paths = v;
        self
    }
    pub fn legacy_output(mut self, v: bool) -> Self {
        self.cfg.legacy_output = v;
        self
    }
    pub fn pretty_print(mut self, v: bool) -> Self {
        self.cfg.pretty_print = v;
        self
    }
    pub fn atlas_extension(mut self, v: impl Into<String>) -> Self {
        self.cfg.atlas_extension = v.into();
        self
    }
    pub fn build(self) -> Settings {
        self.cfg
    }
}

impl Settings {
    pub fn builder() -> SettingsBuilder {
        SettingsBuilder::new()
    }
}
