//! Reads sales records from CSV.
//!
//! The first row is a header and is skipped. Columns, in order:
//! `ProductID,ProductName,Category,SaleDate,Amount,Quantity,Region,SalesRep`.
//! A malformed row is logged and skipped; only an unreadable stream fails the
//! whole read.

use crate::error::{RecordError, RowError};
use crate::record::{Money, SalesRecord};
use chrono::NaiveDate;
use csv::{ReaderBuilder, StringRecord};
use std::fs::File;
use std::io::Read;
use std::path::Path;

/// Columns every row must carry
pub const EXPECTED_COLUMNS: usize = 8;

/// Sale dates are ISO calendar dates
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// Records parsed from one stream, plus how many rows were rejected
#[derive(Debug, Default)]
pub struct ReadSummary {
    pub records: Vec<SalesRecord>,
    pub skipped: usize,
    /// 1-based line on which each rejected row starts
    pub skipped_lines: Vec<u64>,
}

impl ReadSummary {
    fn skip(&mut self, line: u64) {
        self.skipped += 1;
        self.skipped_lines.push(line);
    }
}

/// Read every valid record from `reader`
pub fn read_records<R: Read>(reader: R) -> Result<ReadSummary, RecordError> {
    let mut csv_reader = ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(reader);

    let mut summary = ReadSummary::default();
    for (index, row) in csv_reader.records().enumerate() {
        // Header is line 1; quoted newlines push later rows further down
        let fallback = index as u64 + 2;
        let row = match row {
            Ok(row) => row,
            Err(e) if e.is_io_error() => return Err(e.into()),
            Err(e) => {
                let line = e.position().map_or(fallback, |p| p.line());
                log::warn!("skipping unreadable row at line {}: {}", line, e);
                summary.skip(line);
                continue;
            }
        };

        match parse_row(&row) {
            Ok(record) => summary.records.push(record),
            Err(e) => {
                let line = row.position().map_or(fallback, |p| p.line());
                log::warn!("skipping invalid row at line {}: {}", line, e);
                summary.skip(line);
            }
        }
    }

    log::debug!(
        "read {} records, skipped {} rows",
        summary.records.len(),
        summary.skipped
    );
    Ok(summary)
}

/// Open and read the CSV file at `path`
pub fn read_path(path: impl AsRef<Path>) -> Result<ReadSummary, RecordError> {
    let file = File::open(path.as_ref())?;
    read_records(file)
}

/// Parse one data row into a record
pub fn parse_row(row: &StringRecord) -> Result<SalesRecord, RowError> {
    if row.len() < EXPECTED_COLUMNS {
        return Err(RowError::FieldCount {
            expected: EXPECTED_COLUMNS,
            found: row.len(),
        });
    }

    let sale_date = NaiveDate::parse_from_str(&row[3], DATE_FORMAT)
        .map_err(|_| RowError::Date(row[3].to_string()))?;
    let amount: Money = row[4].parse()?;
    let quantity: u32 = row[5]
        .trim()
        .parse()
        .map_err(|_| RowError::Quantity(row[5].to_string()))?;

    SalesRecord::new(
        &row[0], &row[1], &row[2], sale_date, amount, quantity, &row[6], &row[7],
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const HEADER: &str = "ProductID,ProductName,Category,SaleDate,Amount,Quantity,Region,SalesRep\n";

    fn read_str(body: &str) -> ReadSummary {
        read_records(format!("{}{}", HEADER, body).as_bytes()).unwrap()
    }

    #[test]
    fn test_reads_valid_rows() {
        let summary = read_str(
            "P001,Laptop,Electronics,2024-01-15,1000.00,2,North,John\n\
             P002,Mouse,Electronics,2024-01-20,30.00,5,South,Jane\n\
             P003,Chair,Furniture,2024-02-10,200.00,3,North,John\n\
             P001,Laptop,Electronics,2024-02-15,1000.00,1,East,Mike\n\
             P004,Desk,Furniture,2024-03-05,400.00,2,South,Jane\n",
        );
        assert_eq!(summary.records.len(), 5);
        assert_eq!(summary.skipped, 0);
        assert_eq!(summary.records[1].product_name, "Mouse");
        assert_eq!(summary.records[1].amount, Money::from_cents(3_000));
    }

    #[test]
    fn test_skips_bad_date() {
        let summary = read_str(
            "P001,Laptop,Electronics,invalid-date,1000.00,2,North,John\n\
             P002,Mouse,Electronics,2024-01-20,30.00,5,South,Jane\n",
        );
        assert_eq!(summary.records.len(), 1);
        assert_eq!(summary.skipped, 1);
    }

    #[test]
    fn test_skips_bad_amount() {
        let summary = read_str(
            "P001,Laptop,Electronics,2024-01-15,not-a-number,2,North,John\n\
             P002,Mouse,Electronics,2024-01-20,30.00,5,South,Jane\n",
        );
        assert_eq!(summary.records.len(), 1);
        assert_eq!(summary.records[0].product_id, "P002");
    }

    #[test]
    fn test_skips_short_row() {
        let summary = read_str(
            "P001,Laptop,Electronics,2024-01-15,1000.00,2\n\
             P002,Mouse,Electronics,2024-01-20,30.00,5,South,Jane\n",
        );
        assert_eq!(summary.records.len(), 1);
        assert_eq!(summary.skipped, 1);
    }

    #[test]
    fn test_skips_negative_quantity() {
        let summary = read_str("P001,Laptop,Electronics,2024-01-15,10.00,-2,North,John\n");
        assert!(summary.records.is_empty());
        assert_eq!(summary.skipped, 1);
    }

    #[test]
    fn test_skipped_line_counts_quoted_newlines() {
        let summary = read_str(
            "P001,\"Desk\nStanding\",Furniture,2024-01-15,10.00,1,North,John\n\
             P002,Mouse,Electronics,bad-date,30.00,5,South,Jane\n\
             P003,Chair,Furniture\n",
        );
        assert_eq!(summary.records.len(), 1);
        assert_eq!(summary.records[0].product_name, "Desk\nStanding");
        // Header is line 1, the first record spans lines 2 and 3
        assert_eq!(summary.skipped_lines, vec![4, 5]);
    }

    #[test]
    fn test_huge_amount_times_quantity_row_is_exact() {
        let summary = read_str("P1,Big,C,2024-01-01,100000000000000.00,1000,R,S\n");
        assert_eq!(summary.records.len(), 1);
        let total: Money = summary.records.iter().map(|r| r.total_value()).sum();
        assert_eq!(total.to_string(), "100000000000000000.00");
    }

    #[test]
    fn test_skips_amount_beyond_cent_range() {
        let summary = read_str(
            "P1,Big,C,2024-01-01,100000000000000000.00,1,R,S\n\
             P2,Ok,C,2024-01-01,1E+3,2,R,S\n",
        );
        assert_eq!(summary.skipped_lines, vec![2]);
        assert_eq!(summary.records[0].amount, Money::from_cents(100_000));
    }

    #[test]
    fn test_header_only_and_empty_input() {
        assert!(read_str("").records.is_empty());
        assert!(read_records("".as_bytes()).unwrap().records.is_empty());
    }

    #[test]
    fn test_quoted_fields() {
        let summary =
            read_str("P010,\"Desk, Standing\",Furniture,2024-04-01,650.50,1,West,\"Ann\"\n");
        assert_eq!(summary.records[0].product_name, "Desk, Standing");
        assert_eq!(summary.records[0].amount, Money::from_cents(65_050));
    }

    #[test]
    fn test_parse_row_errors() {
        let row = StringRecord::from(vec!["P1", "X", "C", "2024-13-01", "1", "1", "R", "S"]);
        assert_eq!(parse_row(&row), Err(RowError::Date("2024-13-01".into())));

        let row = StringRecord::from(vec!["P1", "X", "C", "2024-01-01", "1", "many", "R", "S"]);
        assert_eq!(parse_row(&row), Err(RowError::Quantity("many".into())));
    }

    #[test]
    fn test_read_path_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            "{}P001,Laptop,Electronics,2024-01-15,1000.00,2,North,John\n",
            HEADER
        )
        .unwrap();
        let summary = read_path(file.path()).unwrap();
        assert_eq!(summary.records.len(), 1);
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let result = read_path(dir.path().join("absent.csv"));
        assert!(matches!(result, Err(RecordError::Io(_))));
    }
}
