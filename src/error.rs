#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Options: {0}")]
    Options(#[from] lazyskip_node::error::Error),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
