use std::io::Cursor;

use calamine::{Data, Range, Reader, open_workbook_auto_from_rs};
use chrono::{Duration, NaiveDate};
use indexmap::IndexMap;
use tracing::warn;

use crate::error::{ConversionError, ConvertResult};
use crate::format::FormatTag;
use crate::normalize::sheet::{limit_rows, materialize_row, number_cell};
use crate::types::{CellValue, Converted, SheetResult, SheetRow};

use super::registry::StrategyContext;

/// Convert a workbook into one sheet result per worksheet, in workbook order.
///
/// Behavior:
/// - Cells are addressed by column letter (`A`, `B`, ...) using their absolute position
/// - Empty cells are omitted and rows without populated cells are dropped
/// - Each sheet is capped at `limits.sheet_row_cap` rows, with an explicit truncation wrapper
pub fn convert_spreadsheet(content: &[u8], ctx: &StrategyContext) -> ConvertResult<Converted> {
    let fail = |e: calamine::Error| ConversionError::processing(FormatTag::Spreadsheet, e.to_string());

    let mut workbook = open_workbook_auto_from_rs(Cursor::new(content)).map_err(fail)?;
    let names = workbook.sheet_names().to_vec();

    let mut sheets = IndexMap::new();
    for name in names {
        let range = workbook.worksheet_range(&name).map_err(fail)?;
        let rows = materialize_range(&range, ctx.include_original_row_numbers);
        if rows.len() > ctx.limits.sheet_row_cap {
            warn!(sheet = %name, rows = rows.len(), cap = ctx.limits.sheet_row_cap, "sheet truncated");
        }

        let sheet = SheetResult {
            file_name: ctx.include_file_name.then(|| ctx.file_name.clone()),
            sheet_name: ctx.include_sheet_name.then(|| name.clone()),
            data: limit_rows(rows, ctx.limits.sheet_row_cap),
        };
        sheets.insert(name, sheet);
    }

    Ok(Converted::sheets(sheets))
}

fn materialize_range(range: &Range<Data>, include_orig_row: bool) -> Vec<SheetRow> {
    let (row0, col0) = range.start().unwrap_or((0, 0));
    range
        .rows()
        .enumerate()
        .filter_map(|(i, cells)| {
            let row_number = row0 + i as u32 + 1;
            let populated = cells
                .iter()
                .enumerate()
                .filter_map(|(j, c)| convert_cell(c).map(|v| (col0 + j as u32 + 1, v)));
            materialize_row(row_number, populated, include_orig_row)
        })
        .collect()
}

fn convert_cell(c: &Data) -> Option<CellValue> {
    match c {
        Data::Empty => None,
        Data::String(s) if s.is_empty() => None,
        Data::String(s) => Some(CellValue::Utf8(s.clone())),
        Data::Int(i) => Some(CellValue::Int64(*i)),
        Data::Float(f) => Some(number_cell(*f)),
        Data::Bool(b) => Some(CellValue::Bool(*b)),
        Data::DateTime(dt) if dt.is_datetime() => Some(
            excel_serial_to_iso(dt.as_f64())
                .map(CellValue::Utf8)
                .unwrap_or_else(|| number_cell(dt.as_f64())),
        ),
        Data::DateTime(dt) => Some(number_cell(dt.as_f64())),
        Data::DateTimeIso(s) | Data::DurationIso(s) => Some(CellValue::Utf8(s.clone())),
        Data::Error(e) => Some(CellValue::Utf8(e.to_string())),
    }
}

/// Excel serial date (1900 system) to an ISO-8601 UTC timestamp.
fn excel_serial_to_iso(serial: f64) -> Option<String> {
    if !serial.is_finite() {
        return None;
    }
    let epoch = NaiveDate::from_ymd_opt(1899, 12, 30)?.and_hms_opt(0, 0, 0)?;
    let millis = (serial * 86_400_000.0).round() as i64;
    let dt = epoch.checked_add_signed(Duration::milliseconds(millis))?;
    Some(dt.format("%Y-%m-%dT%H:%M:%S%.3fZ").to_string())
}
