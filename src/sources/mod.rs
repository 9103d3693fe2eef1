pub mod resolver;

pub use resolver::{SourceAction, SourceResolver, DEFAULT_DOWNLOAD_BASE};
