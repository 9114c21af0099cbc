//! Command implementations for the mdpull CLI

mod check;
mod fetch;
mod scan;
mod sweep;

pub use check::execute as check_urls;
pub use fetch::{FetchOptions, execute as fetch_documents};
pub use scan::execute as scan_posts;
pub use sweep::execute as sweep_cache;
