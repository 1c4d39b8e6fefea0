//! CSV share files and plaintext ingest.
//!
//! Share-file format: one header cell per column per replication index,
//! named `column_r` (so column `"[city]"` under two-way replication
//! exports as `[city]_0,[city]_1`), then one row of decimal integers per
//! record. Plaintext ingest reads a CSV whose header names schema columns
//! directly; a missing validity column is set to all ones for the rows
//! read.

use crate::element::Element;
use crate::error::{Error, Result};
use crate::relational::{ColumnData, EncodedTable, VALID_COL};
use crate::vector::PlainVector;
use std::path::Path;

fn parse_element<T: Element>(token: &str) -> Result<T> {
    token
        .trim()
        .parse::<i128>()
        .map(T::from_i128)
        .map_err(|e| Error::precondition(format!("bad integer '{token}': {e}")))
}

/// Split a share-file header cell into `(column name, replication index)`.
/// The delimiter is the final underscore.
fn split_share_header(cell: &str) -> Result<(String, usize)> {
    match cell.rfind('_') {
        Some(pos) => {
            let index = cell[pos + 1..]
                .parse::<usize>()
                .map_err(|e| Error::precondition(format!("bad share header '{cell}': {e}")))?;
            Ok((cell[..pos].to_string(), index))
        }
        None => Ok((cell.to_string(), 0)),
    }
}

impl<T: Element> EncodedTable<T> {
    /// Export every column's shares to a CSV file.
    pub fn output_csv_secret_shares(&self, path: impl AsRef<Path>) -> Result<()> {
        let mut writer = csv::Writer::from_path(path).map_err(csv_io_error)?;

        let names = self.column_names();
        let replication = self.context().replication();

        let mut header = Vec::new();
        for name in &names {
            for r in 0..replication {
                header.push(format!("{name}_{r}"));
            }
        }
        writer.write_record(&header).map_err(csv_io_error)?;

        for row in 0..self.size() {
            let mut record = Vec::new();
            for name in &names {
                let shares = match self.column(name)? {
                    ColumnData::Arithmetic(v) => v.shares().clone(),
                    ColumnData::Boolean(v) => v.shares().clone(),
                };
                for r in 0..replication {
                    record.push(shares.share(r).get(row).to_i128().to_string());
                }
            }
            writer.write_record(&record).map_err(csv_io_error)?;
        }
        writer.flush()?;
        Ok(())
    }

    /// Import shares previously written by
    /// [`Self::output_csv_secret_shares`]. Rows beyond the file stay
    /// zeroed; if the file carries no validity column, the rows read are
    /// marked valid.
    pub fn input_csv_secret_shares(&mut self, path: impl AsRef<Path>) -> Result<()> {
        let mut reader = csv::Reader::from_path(path).map_err(csv_io_error)?;

        let header = reader.headers().map_err(csv_io_error)?.clone();
        let mut mapping = Vec::with_capacity(header.len());
        let mut has_valid = false;
        for cell in header.iter() {
            let (name, r) = split_share_header(cell)?;
            if name == VALID_COL {
                has_valid = true;
            }
            mapping.push((name, r));
        }

        let rows = self.size();
        let mut row = 0usize;
        for record in reader.records() {
            let record = record.map_err(csv_io_error)?;
            if row >= rows {
                break;
            }
            for (token, (name, r)) in record.iter().zip(&mapping) {
                let value: T = parse_element(token)?;
                let shares = match self.column(name)? {
                    ColumnData::Arithmetic(v) => v.shares().clone(),
                    ColumnData::Boolean(v) => v.shares().clone(),
                };
                shares.share(*r).set(row, value);
            }
            row += 1;
        }

        if !has_valid {
            let ones = PlainVector::filled(row, T::ONE);
            let shared = T::protocol(&**self.context()).public_share_b(&ones);
            let valid = self.valid_column();
            valid.slice_range(0, row).assign(
                &crate::encoded::BSharedVector::from_shares(self.context(), shared),
            );
        }
        Ok(())
    }

    /// Plaintext ingest: `input_party` reads a CSV whose header names
    /// schema columns and secret-shares every column to the group. Rows
    /// beyond the file are zero. A validity column absent from the file
    /// is set to ones.
    pub fn input_csv_data(&mut self, path: impl AsRef<Path>, input_party: usize) -> Result<()> {
        let names = self.column_names();
        let rows = self.size();
        let column_data: Vec<PlainVector<T>> =
            names.iter().map(|_| PlainVector::zeroed(rows)).collect();
        let mut valid_read = false;

        if self.context().party_id() == input_party {
            let mut reader = csv::Reader::from_path(path).map_err(csv_io_error)?;

            let header = reader.headers().map_err(csv_io_error)?.clone();
            let mut indices = Vec::with_capacity(header.len());
            for cell in header.iter() {
                match names.iter().position(|n| n == cell) {
                    Some(i) => {
                        if names[i] == VALID_COL {
                            valid_read = true;
                        }
                        indices.push(i);
                    }
                    None => {
                        return Err(Error::precondition(format!(
                            "column '{cell}' not found in schema"
                        )));
                    }
                }
            }

            let mut row = 0usize;
            for record in reader.records() {
                let record = record.map_err(csv_io_error)?;
                if row >= rows {
                    break;
                }
                for (token, column) in record.iter().zip(&indices) {
                    column_data[*column].set(row, parse_element(token)?);
                }
                row += 1;
            }

            if !valid_read {
                if let Some(i) = names.iter().position(|n| n == VALID_COL) {
                    for r in 0..row {
                        column_data[i].set(r, T::ONE);
                    }
                }
            }
        }

        let proto = T::protocol(&**self.context());
        for (name, data) in names.iter().zip(column_data) {
            match self.column(name)? {
                ColumnData::Boolean(v) => v
                    .shares()
                    .assign(&proto.secret_share_b(&data, input_party)),
                ColumnData::Arithmetic(v) => v
                    .shares()
                    .assign(&proto.secret_share_a(&data, input_party)),
            }
        }
        Ok(())
    }

    /// Export one column's shares, one line per element, replicated
    /// shares separated by spaces.
    pub fn output_secret_shares(&self, column: &str, path: impl AsRef<Path>) -> Result<()> {
        let shares = match self.column(column)? {
            ColumnData::Arithmetic(v) => v.shares().clone(),
            ColumnData::Boolean(v) => v.shares().clone(),
        };
        let mut out = String::new();
        for row in 0..shares.size() {
            let line: Vec<String> = (0..shares.replication())
                .map(|r| shares.share(r).get(row).to_i128().to_string())
                .collect();
            out.push_str(&line.join(" "));
            out.push('\n');
        }
        std::fs::write(path, out)?;
        Ok(())
    }

    /// Import one column's shares from the format written by
    /// [`Self::output_secret_shares`]. Does not touch the validity bit.
    pub fn input_secret_shares(&mut self, column: &str, path: impl AsRef<Path>) -> Result<()> {
        let text = std::fs::read_to_string(path)?;
        let shares = match self.column(column)? {
            ColumnData::Arithmetic(v) => v.shares().clone(),
            ColumnData::Boolean(v) => v.shares().clone(),
        };
        for (row, line) in text.lines().enumerate() {
            if row >= shares.size() {
                break;
            }
            for (r, token) in line.split_whitespace().enumerate() {
                if r >= shares.replication() {
                    break;
                }
                shares.share(r).set(row, parse_element(token)?);
            }
        }
        Ok(())
    }
}

fn csv_io_error(e: csv::Error) -> Error {
    match e.into_kind() {
        csv::ErrorKind::Io(io) => Error::Io(io),
        other => Error::precondition(format!("csv parse error: {other:?}")),
    }
}
