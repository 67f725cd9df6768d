pub mod flow;
pub mod step;
pub mod value;

pub use flow::*;
pub use step::*;
pub use value::*;
