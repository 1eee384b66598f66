pub mod response;
pub mod stoch;
pub mod window;

pub use response::*;
pub use stoch::*;
pub use window::*;
