mod frame;
mod measurement;
mod reading;
mod source;

pub use frame::*;
pub use measurement::*;
pub use reading::*;
pub use source::*;
