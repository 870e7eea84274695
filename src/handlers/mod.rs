pub mod stocks;
pub mod tse_stocks;

pub use stocks::*;
pub use tse_stocks::*;
