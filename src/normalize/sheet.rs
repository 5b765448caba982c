//! Spreadsheet row materialization with column-letter addressing.

use crate::types::{CellValue, SheetRow, SheetRows};

/// Convert a 1-based column index to its spreadsheet letter label.
///
/// Bijective base-26: there is no zero digit, so 26 is `Z` and 27 is `AA`. Index 0 has no label
/// and yields an empty string.
pub fn column_letter(index: u32) -> String {
    let mut n = index;
    let mut letters = Vec::new();
    while n > 0 {
        let rem = (n - 1) % 26;
        letters.push(b'A' + rem as u8);
        n = (n - 1) / 26;
    }
    letters.reverse();
    String::from_utf8(letters).unwrap_or_default()
}

/// Build one row record from its populated cells.
///
/// `cells` yields `(1-based column index, value)` for populated cells only. Returns `None` when
/// nothing is populated, so empty rows are never materialized.
pub fn materialize_row<I>(row_number: u32, cells: I, include_orig_row: bool) -> Option<SheetRow>
where
    I: IntoIterator<Item = (u32, CellValue)>,
{
    let mut row = SheetRow::default();
    for (col, value) in cells {
        row.cells.insert(column_letter(col), value);
    }
    if row.is_empty() {
        return None;
    }
    if include_orig_row {
        row.orig_row = Some(row_number);
    }
    Some(row)
}

/// Apply the per-sheet row cap.
///
/// Under the cap the rows pass through unchanged; over it, the first `cap` rows are wrapped with
/// the total count.
pub fn limit_rows(mut rows: Vec<SheetRow>, cap: usize) -> SheetRows {
    if rows.len() <= cap {
        return SheetRows::Rows(rows);
    }
    let total_rows = rows.len();
    rows.truncate(cap);
    SheetRows::Truncated {
        data: rows,
        truncated: true,
        total_rows,
    }
}

/// Integral floats are reported as integers, matching how spreadsheets display them.
pub fn number_cell(f: f64) -> CellValue {
    if f.is_finite() && f.fract() == 0.0 && f.abs() < i64::MAX as f64 {
        CellValue::Int64(f as i64)
    } else {
        CellValue::Float64(f)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn column_letters_are_bijective_base_26() {
        let cases = [
            (1, "A"),
            (2, "B"),
            (26, "Z"),
            (27, "AA"),
            (52, "AZ"),
            (53, "BA"),
            (702, "ZZ"),
            (703, "AAA"),
            (16_384, "XFD"),
        ];
        for (idx, want) in cases {
            assert_eq!(column_letter(idx), want, "index {idx}");
        }
        assert_eq!(column_letter(0), "");
    }

    #[test]
    fn empty_rows_are_dropped() {
        assert!(materialize_row(3, Vec::new(), true).is_none());

        let row = materialize_row(4, vec![(2, CellValue::Int64(7))], true).unwrap();
        assert_eq!(row.get("B"), Some(&CellValue::Int64(7)));
        assert_eq!(row.get("A"), None);
        assert_eq!(row.orig_row, Some(4));

        let row = materialize_row(4, vec![(1, CellValue::from("x"))], false).unwrap();
        assert_eq!(row.orig_row, None);
    }

    #[test]
    fn cap_wraps_only_when_exceeded() {
        let rows: Vec<SheetRow> = (1..=3)
            .filter_map(|i| materialize_row(i, vec![(1, CellValue::Int64(i as i64))], false))
            .collect();

        assert!(!limit_rows(rows.clone(), 3).is_truncated());

        match limit_rows(rows, 2) {
            SheetRows::Truncated {
                data, total_rows, ..
            } => {
                assert_eq!(data.len(), 2);
                assert_eq!(total_rows, 3);
            }
            other => panic!("expected wrapper, got {other:?}"),
        }
    }

    #[test]
    fn integral_numbers_become_ints() {
        assert_eq!(number_cell(3.0), CellValue::Int64(3));
        assert_eq!(number_cell(2.5), CellValue::Float64(2.5));
    }
}
