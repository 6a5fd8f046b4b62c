use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum Error {
    #[error("invalid house rule `{field}`: {reason}")]
    InvalidRule {
        field: &'static str,
        reason: String,
    },
    #[error("no cards left in the shoe")]
    EmptyShoe,
    #[error("cannot draw a card of rank {rank}: none left in the shoe")]
    InvalidDraw { rank: u8 },
    #[error("recursion depth must not be negative, got {0}")]
    InvalidDepth(i32),
    #[error("invalid card: {0}")]
    InvalidCard(String),
    #[error("failed to build thread pool: {0}")]
    ThreadPool(String),
}

pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    pub(crate) fn invalid_rule(field: &'static str, reason: impl Into<String>) -> Self {
        Error::InvalidRule {
            field,
            reason: reason.into(),
        }
    }
}

/// Validates a card rank, which must be in [1, 10].
pub(crate) fn check_rank(rank: u8) -> Result<u8> {
    if rank == 0 || rank > 10 {
        return Err(Error::InvalidCard(format!(
            "rank {} is out of range, it must be in [1, 10]",
            rank
        )));
    }
    Ok(rank)
}

/// Converts a signed recursion depth coming from callers.
pub(crate) fn check_depth(depth: i32) -> Result<usize> {
    usize::try_from(depth).map_err(|_| Error::InvalidDepth(depth))
}
