use thiserror::Error;

#[derive(Debug, Error)]
#[non_exhaustive]
pub enum Error {
    #[error("cartvel-hw: Length mismatch (model = {}, input = {})", model, input)]
    LengthMismatch { model: usize, input: usize },
    #[error("cartvel-hw: Connection error : {}", message)]
    Connection { message: String },
    #[error("cartvel-hw: Other: {:?}", .0)]
    Other(#[from] anyhow::Error),
}
