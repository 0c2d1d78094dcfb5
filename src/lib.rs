//! Rainsheet - browse and re-export spreadsheets held by a storage API
//!
//! The storage service parses uploaded workbooks and serves their sheets as
//! JSON rows. This crate is the client side: it lists and uploads files,
//! selects a (file, sheet) pair, shows the rows with empty columns hidden,
//! and writes the loaded rows back out as an `.xlsx` workbook.
//!
//! # Example
//!
//! ```no_run
//! use rainsheet::client::{DataService, HttpDataService};
//! use rainsheet::config::ClientConfig;
//! use rainsheet::export::SheetExporter;
//! use rainsheet::table::visible_columns;
//!
//! # async fn run() -> rainsheet::ViewerResult<()> {
//! let service = HttpDataService::new(ClientConfig::default());
//! let rows = service.fetch_rows("hujan.xlsx", "Januari").await?;
//!
//! println!("Columns with data: {:?}", visible_columns(&rows));
//!
//! if let Some(workbook) = SheetExporter::new(&rows, Some("Januari")).export()? {
//!     workbook.save(std::path::Path::new(&workbook.file_name))?;
//! }
//! # Ok(())
//! # }
//! ```

pub mod cli;
pub mod client;
pub mod config;
pub mod error;
pub mod export;
pub mod logging;
pub mod session;
pub mod table;
pub mod types;
pub mod viewer;

// Re-export commonly used types
pub use error::{ViewerError, ViewerResult};
pub use types::{Dataset, Row};
