pub mod bar;
pub mod trade;

pub use bar::*;
pub use trade::*;
