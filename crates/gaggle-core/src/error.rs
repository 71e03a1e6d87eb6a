use thiserror::Error;

/// Failure stages of an optimistic submit. Whichever stage fails first,
/// the optimistic entry is retracted and the user notified exactly once.
#[derive(Debug, Error)]
pub enum SendError {
    #[error("could not persist message: {0}")]
    Persistence(#[source] anyhow::Error),

    #[error("could not deliver message: {0}")]
    Transmission(#[source] anyhow::Error),
}
