use thiserror::Error;
use warp_core::EngineError;
use warp_data::BlobError;

#[derive(Error, Debug)]
pub enum LiquifyError {
    #[error(transparent)]
    Blob(#[from] BlobError),
    #[error(transparent)]
    Engine(#[from] EngineError),
    #[error("buffer holds {got} floats but the region needs {need}")]
    BufferSize { need: usize, got: usize },
    #[error("destination region exceeds the source region")]
    RoiMismatch,
    #[error(transparent)]
    IoError(#[from] std::io::Error),
}
