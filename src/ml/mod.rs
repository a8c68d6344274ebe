pub mod nlms;
pub mod regime;

pub use nlms::*;
pub use regime::*;
