pub mod cache;
pub mod text;

pub use cache::*;
pub use text::*;
