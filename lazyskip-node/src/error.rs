#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Invalid probability: {0}, expected a value in (0, 1)")]
    InvalidProbability(f64),

    #[error("Invalid max height: {0}, expected at least 1")]
    InvalidMaxHeight(usize),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
