//! # refdata-core
//!
//! Core domain logic for the refdata browser service.
//!
//! This crate provides everything below the HTTP surface:
//!
//! - **Layout**: canonical path resolution and catalog discovery for
//!   date-partitioned SQLite files
//! - **Provisioning**: lazy creation and fixture seeding of data files
//! - **Query Gateway**: table listing, paginated reads, and SQL execution
//!   against a chosen file
//! - **Error Types**: shared error definitions and result types
//!
//! ## Crate Boundary
//!
//! `refdata-core` knows nothing about HTTP. The API crate composes these
//! pieces behind axum handlers; tests can drive them directly against a
//! temporary root directory.
//!
//! ## Example
//!
//! ```rust
//! use refdata_core::date::CalendarDate;
//! use refdata_core::layout::StoreLayout;
//!
//! let layout = StoreLayout::new("/var/lib/refdata");
//! let date = CalendarDate::new(2024, 1, 15).unwrap();
//! assert!(layout.resolve(&date).ends_with("2024/01/15/refdata/refdata.db"));
//! ```

#![forbid(unsafe_code)]
#![deny(missing_docs)]
#![deny(rust_2018_idioms)]
#![warn(clippy::pedantic)]
#![cfg_attr(test, allow(clippy::expect_used, clippy::unwrap_used))]

pub mod date;
pub mod error;
pub mod gateway;
pub mod layout;
pub mod observability;
pub mod provision;

pub use date::CalendarDate;
pub use error::{Error, Result};
pub use gateway::{QueryGateway, QueryResult, TablePage, format_for_display};
pub use layout::StoreLayout;
pub use provision::Provisioner;
