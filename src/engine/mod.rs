pub mod forecast;
pub mod results;
pub mod session;
pub mod trading;

pub use forecast::*;
pub use results::*;
pub use session::*;
pub use trading::*;
