//! Database connectivity
//!
//! The benchmark core depends on the [`Driver`] and [`Connection`] traits only.

mod driver;
#[cfg(test)]
pub mod mock;
mod postgres;

pub use driver::{Connection, DbError, Driver, Scheme, UrlDriver};
