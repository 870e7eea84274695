pub mod ticker;
pub mod master;

pub use ticker::*;
pub use master::*;
