use thiserror::Error;

#[derive(Debug, Error)]
pub enum PackError {
    #[error("invalid configuration: {0}")]
    ConfigInvalid(String),

    #[error("rect '{name}' ({width}x{height}) exceeds maximum page dimensions ({max_width}x{max_height}) in both orientations")]
    InputTooLarge {
        name: String,
        width: u32,
        height: u32,
        max_width: u32,
        max_height: u32,
    },

    #[error("name collision: '{name}' is used by more than one rect or alias")]
    NameCollision { name: String },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("image error: {0}")]
    Image(#[from] image::ImageError),

    #[error("unsupported or unknown output format: {0}")]
    EncoderMissing(String),

    #[error("nothing to pack: input rect list is empty")]
    Empty,

    #[error("pack run cancelled")]
    Cancelled,
}

pub type Result<T> = std::result::Result<T, PackError>;
