// ABOUTME: Main library entry point for the quotes page extractor.
// ABOUTME: Re-exports the public API: Client, descriptors, Document, extraction functions and result types.

//! Quotes - declarative extraction of scalar fields and tables from quote pages.
//!
//! A page is fetched once, parsed into an immutable [`Document`], and every
//! descriptor of a [`DescriptorSet`] is applied to it. Fields resolve to
//! [`ScalarResult`]s, tables to fixed-width [`Record`]s.
//!
//! # Example
//!
//! ```no_run
//! use quotes::{load_builtin_profile, Client};
//!
//! #[tokio::main]
//! async fn main() {
//!     let profile = load_builtin_profile();
//!     let client = Client::builder().build();
//!     let page = client
//!         .extract_page(&profile.url_for("mult3"), &profile.descriptors)
//!         .await;
//!     println!("{}", page.format_text());
//! }
//! ```

pub mod client;
pub mod descriptor;
pub mod document;
pub mod error;
pub mod fetch;
pub mod field;
pub mod options;
pub mod profile;
pub mod result;
pub mod selectors;
pub mod table;

pub use crate::client::{Client, PageLoad};
pub use crate::descriptor::{DescriptorSet, FieldDescriptor, TableDescriptor};
pub use crate::document::Document;
pub use crate::error::{ErrorCode, ScrapeError};
pub use crate::fetch::{Fetcher, HttpFetcher, StaticFetcher};
pub use crate::field::extract_field;
pub use crate::options::{ClientBuilder, Options};
pub use crate::profile::{load_builtin_profile, Profile};
pub use crate::result::{
    Failure, FailureKind, FieldEntry, Outcome, PageExtraction, Record, ScalarResult, TableEntry,
};
pub use crate::table::{extract_table, extract_table_with_stats, TableStats};
