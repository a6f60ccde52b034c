use thiserror::Error;

use crate::traits::BackendId;

/// Failure modes of one backend call. Malformed reply content is NOT an
/// error: the normalizer absorbs it into a best-effort result instead.
#[derive(Error, Debug)]
pub enum BackendError {
    #[error("backend has not been initialized with a usable credential")]
    NotReady,

    #[error("{backend} API error ({status}): {body}")]
    Api {
        backend: BackendId,
        status: u16,
        body: String,
    },

    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("credential contains characters not usable in a header")]
    Header(#[from] reqwest::header::InvalidHeaderValue),

    #[error("{backend} returned a reply with no text content")]
    EmptyReply { backend: BackendId },

    #[error("{backend} does not support image input")]
    ImageUnsupported { backend: BackendId },
}
