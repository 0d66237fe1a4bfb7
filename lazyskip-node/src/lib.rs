pub mod error;
pub mod height;
pub mod key;
pub mod node;

pub mod prelude {
    pub use crate::error::{Error, Result};
    pub use crate::height::{DEFAULT_MAX_HEIGHT, DEFAULT_P, HeightSampler};
    pub use crate::key::KeyRef;
    pub use crate::node::{Node, NodeKind, link_nodes};
}
