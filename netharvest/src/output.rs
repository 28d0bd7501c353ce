//! Result workbook writer.

use std::path::Path;

use log::{info, warn};
use rust_xlsxwriter::{Format, Workbook};

use crate::batch::ExecutionResults;
use crate::error::OutputError;

/// Name of the single result worksheet.
pub const SHEET_NAME: &str = "Results";

/// Header of the host column.
pub const DEVICE_HEADER: &str = "Device";

/// Longest text a worksheet cell accepts.
pub const MAX_CELL_CHARS: usize = 32_767;

/// Columns in a worksheet.
pub const MAX_COLUMNS: usize = 16_384;

/// The result table: a header row, then one row per device.
///
/// A variable a device has no value for is an empty string.
pub fn result_rows(results: &ExecutionResults) -> Vec<Vec<String>> {
    let header = std::iter::once(DEVICE_HEADER.to_string())
        .chain(results.variables.iter().cloned())
        .collect();

    let rows = results.rows.iter().map(|row| {
        std::iter::once(row.host.clone())
            .chain(
                results
                    .variables
                    .iter()
                    .map(|v| row.values.get(v).cloned().unwrap_or_default()),
            )
            .collect()
    });

    std::iter::once(header).chain(rows).collect()
}

/// Write `results` to a new workbook at `path`, replacing any existing file.
pub fn write_workbook(results: &ExecutionResults, path: impl AsRef<Path>) -> Result<(), OutputError> {
    let path = path.as_ref();
    let columns = results.variables.len() + 1;
    if columns > MAX_COLUMNS {
        return Err(OutputError::TooManyColumns(results.variables.len()));
    }

    let mut workbook = Workbook::new();
    let worksheet = workbook.add_worksheet();
    worksheet.set_name(SHEET_NAME)?;
    let bold = Format::new().set_bold();

    for (row, cells) in result_rows(results).iter().enumerate() {
        let row = row as u32;
        for (column, text) in cells.iter().enumerate() {
            let column = column as u16;
            if row == 0 {
                worksheet.write_string_with_format(row, column, text, &bold)?;
                continue;
            }
            if text.is_empty() {
                continue;
            }
            worksheet.write_string(row, column, fit_cell(text, &cells[0]))?;
        }
    }
    worksheet.set_freeze_panes(1, 1)?;

    workbook.save(path)?;
    info!(
        "wrote {} device row(s) to {}",
        results.rows.len(),
        path.display()
    );
    Ok(())
}

/// `text` cut to the cell limit.
fn fit_cell<'a>(text: &'a str, host: &str) -> &'a str {
    match text.char_indices().nth(MAX_CELL_CHARS) {
        Some((cut, _)) => {
            warn!(
                "{host}: output of {} chars truncated to {MAX_CELL_CHARS}",
                text.chars().count()
            );
            &text[..cut]
        }
        None => text,
    }
}

#[cfg(test)]
mod tests {
    use calamine::{Data, Reader, open_workbook_auto};
    use indexmap::IndexMap;

    use super::*;
    use crate::batch::DeviceRow;

    fn results() -> ExecutionResults {
        let mut results = ExecutionResults::new(vec!["ver".into(), "clock".into()]);
        results.rows.push(DeviceRow {
            host: "10.0.0.1".into(),
            values: IndexMap::from([
                ("ver".to_string(), "IOS-A".to_string()),
                ("clock".to_string(), "12:00".to_string()),
            ]),
        });
        results.rows.push(DeviceRow {
            host: "10.0.0.3".into(),
            values: IndexMap::from([("ver".to_string(), "IOS-C".to_string())]),
        });
        results
    }

    #[test]
    fn test_result_rows_layout() {
        let rows = result_rows(&results());
        assert_eq!(
            rows,
            vec![
                vec!["Device", "ver", "clock"],
                vec!["10.0.0.1", "IOS-A", "12:00"],
                vec!["10.0.0.3", "IOS-C", ""],
            ]
        );
    }

    #[test]
    fn test_result_rows_without_variables() {
        let mut results = ExecutionResults::new(Vec::new());
        results.rows.push(DeviceRow {
            host: "r1".into(),
            values: IndexMap::new(),
        });
        assert_eq!(result_rows(&results), vec![vec!["Device"], vec!["r1"]]);
    }

    #[test]
    fn test_write_and_read_back() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("results.xlsx");

        write_workbook(&results(), &path).unwrap();

        let mut workbook = open_workbook_auto(&path).unwrap();
        assert_eq!(workbook.sheet_names(), vec![SHEET_NAME.to_string()]);
        let range = workbook.worksheet_range(SHEET_NAME).unwrap();

        assert_eq!(range.get_size(), (3, 3));
        assert_eq!(
            range.get_value((0, 0)),
            Some(&Data::String("Device".into()))
        );
        assert_eq!(
            range.get_value((1, 1)),
            Some(&Data::String("IOS-A".into()))
        );
        assert_eq!(
            range.get_value((2, 0)),
            Some(&Data::String("10.0.0.3".into()))
        );
        assert_eq!(range.get_value((2, 2)), Some(&Data::Empty));
    }

    #[test]
    fn test_empty_results_write_header_only() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("empty.xlsx");

        write_workbook(&ExecutionResults::new(vec!["ver".into()]), &path).unwrap();

        let mut workbook = open_workbook_auto(&path).unwrap();
        let range = workbook.worksheet_range(SHEET_NAME).unwrap();
        assert_eq!(range.get_size(), (1, 2));
        assert_eq!(range.get_value((0, 1)), Some(&Data::String("ver".into())));
    }

    #[test]
    fn test_too_many_columns() {
        let variables = (0..MAX_COLUMNS).map(|i| format!("v{i}")).collect();
        let err = write_workbook(&ExecutionResults::new(variables), "unused.xlsx").unwrap_err();
        assert!(matches!(err, OutputError::TooManyColumns(n) if n == MAX_COLUMNS));
    }

    #[test]
    fn test_fit_cell_truncates_on_char_boundary() {
        let long = "é".repeat(MAX_CELL_CHARS + 10);
        let cut = fit_cell(&long, "r1");
        assert_eq!(cut.chars().count(), MAX_CELL_CHARS);

        assert_eq!(fit_cell("short", "r1"), "short");
    }
}
