use crate::model::SpriteId;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AtlasPackerError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Image error: {0}")]
    Image(#[from] image::ImageError),
    #[error("Invalid input: {0}")]
    InvalidInput(String),
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
    #[error("Context requires options")]
    MissingOptions,
    #[error("Context requires a packer")]
    MissingPacker,
    #[error("Unknown sprite {0:?}")]
    UnknownSprite(SpriteId),
    #[error("Page {page} out of range ({count} pages)")]
    PageOutOfRange { page: usize, count: usize },
    #[error("No sprites rendered on page {page}")]
    NothingRendered { page: usize },
    #[error("Operation not supported by the {0} packer")]
    Unsupported(&'static str),
    #[error("Nothing to pack")]
    Empty,
}

pub type Result<T> = std::result::Result<T, AtlasPackerError>;
