use indexmap::IndexMap;

use crate::error::{ConversionError, ConvertResult};
use crate::format::FormatTag;
use crate::normalize::sheet::column_letter;
use crate::streaming::{self, CsvTable};
use crate::types::{CellValue, Converted, SheetResult, SheetRow, SheetRows};

use super::registry::StrategyContext;

/// Name of the single sheet produced from delimited text.
pub const CSV_SHEET_NAME: &str = "Sheet1";

/// Parse delimited text into one sheet keyed by header.
///
/// Blank header cells fall back to the column letter, as do fields past the header width. Empty
/// fields are omitted from their row.
pub fn convert_csv(content: &[u8], ctx: &StrategyContext) -> ConvertResult<Converted> {
    let table = streaming::read_csv(content, &ctx.limits)
        .map_err(|e| ConversionError::processing(FormatTag::TabularText, e.to_string()))?;

    let warning = table
        .truncated()
        .then(|| format!("CSV truncated to {} rows", ctx.limits.csv_row_cap));
    let rows = rows_from_table(&table, ctx.include_original_row_numbers);

    let sheet = SheetResult {
        file_name: ctx.include_file_name.then(|| ctx.file_name.clone()),
        sheet_name: ctx.include_sheet_name.then(|| CSV_SHEET_NAME.to_string()),
        data: SheetRows::Rows(rows),
    };
    let mut sheets = IndexMap::new();
    sheets.insert(CSV_SHEET_NAME.to_string(), sheet);
    Ok(Converted::sheets(sheets).with_warning(warning))
}

fn rows_from_table(table: &CsvTable, include_orig_row: bool) -> Vec<SheetRow> {
    let keys: Vec<String> = table
        .headers
        .iter()
        .enumerate()
        .map(|(i, h)| column_key(h, i))
        .collect();

    table
        .records
        .iter()
        .map(|record| {
            let mut row = SheetRow::default();
            for (i, field) in record.iter().enumerate() {
                if field.is_empty() {
                    continue;
                }
                let key = keys.get(i).cloned().unwrap_or_else(|| column_key("", i));
                row.cells.insert(key, CellValue::Utf8(field.to_string()));
            }
            if include_orig_row {
                row.orig_row = record.position().map(|p| p.line() as u32);
            }
            row
        })
        .collect()
}

fn column_key(header: &str, index: usize) -> String {
    let header = header.trim();
    if header.is_empty() {
        column_letter(index as u32 + 1)
    } else {
        header.to_string()
    }
}
