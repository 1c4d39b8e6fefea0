//! Table I/O.
//!
//! CSV import/export of secret shares and plaintext ingest, behind the
//! `io-csv` feature.

#[cfg(feature = "io-csv")]
pub mod csv;
