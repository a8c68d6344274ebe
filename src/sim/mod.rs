pub mod rng;
pub mod synthesizer;

pub use rng::*;
pub use synthesizer::*;
