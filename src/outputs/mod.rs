//! Files a crawl leaves behind.
//!
//! - [`dataset`]: the per-domain CSV of (author, headline) facts
//! - [`summary`]: the JSON crawl summary
//!
//! ```text
//! output_dir/
//! ├── ndtv.com_data.csv
//! └── ndtv.com_summary.json   # only with --summary-file
//! ```

pub mod dataset;
pub mod summary;
