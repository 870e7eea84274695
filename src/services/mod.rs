pub mod diff;
pub mod jpx_fetcher;
pub mod jpx_parser;
pub mod master_file;
pub mod master_store;
pub mod stock_search;
pub mod tse_master;

pub use jpx_fetcher::JpxFetcher;
pub use master_store::{FileMasterStore, MasterStore};
pub use tse_master::TseMasterService;
