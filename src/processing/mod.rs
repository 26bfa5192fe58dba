//! In-memory table transformations.
//!
//! The processing layer operates on [`crate::types::Table`] values produced by ingestion.
//! Every operation returns a new table and leaves its inputs untouched.
//!
//! Currently implemented:
//!
//! - [`concat()`]: append one table's rows to another's
//! - [`filter_first_block()`]: the block at the last marker row (marker row included)
//! - [`filter_all_blocks()`]: the blocks after every marker row (marker rows excluded)
//!
//! ## Example: merge two reports, then cut out a section
//!
//! ```rust
//! use rust_table_extract::ingestion::decode_csv;
//! use rust_table_extract::processing::{concat, filter_all_blocks};
//!
//! let jan = decode_csv(b"Positions,,\nAAA,10\nBBB,20\n,\nFooter\n").unwrap();
//! let feb = decode_csv(b"positions\nCCC,30\n").unwrap();
//!
//! let merged = concat(&jan, &feb);
//! let positions = filter_all_blocks("POSITIONS", &merged);
//!
//! let symbols: Vec<&str> = positions.iter().map(|r| r[0].as_str()).collect();
//! assert_eq!(symbols, ["AAA", "BBB", "CCC"]);
//! ```

pub mod block;
pub mod concat;

pub use block::{filter_all_blocks, filter_first_block};
pub use concat::concat;
