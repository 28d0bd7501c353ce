//! Template workbook loading: the device roster and the command dictionary.
//!
//! The template is a workbook with at least two sheets:
//!
//! ```text
//! sheet 1   row 13, columns B..      one device host per column
//! sheet 2   rows 2.., column A       variable name
//!           rows 2.., column B       command text sent verbatim
//! ```

use std::path::Path;
use std::time::Duration;

use calamine::{Data, Range, Reader, open_workbook_auto};
use indexmap::IndexMap;
use log::debug;

use crate::driver::DEFAULT_TIMEOUT;
use crate::error::InputError;
use crate::platform::CISCO_IOS;

/// Zero-based row holding device hosts (row 13 in the sheet).
pub const DEVICE_ROW: u32 = 12;

/// Zero-based column of the first device (column B).
pub const FIRST_DEVICE_COLUMN: u32 = 1;

/// Zero-based row of the first command (row 2, below the header).
pub const FIRST_COMMAND_ROW: u32 = 1;

/// One device to collect from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceTarget {
    /// Hostname or IP address, never empty.
    pub host: String,

    /// Device-family tag.
    pub platform: String,

    pub port: u16,

    /// Connect timeout, also applied to each read from the device.
    pub timeout: Duration,
}

impl DeviceTarget {
    pub fn new(host: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            platform: CISCO_IOS.to_string(),
            port: 22,
            timeout: DEFAULT_TIMEOUT,
        }
    }
}

/// Variable name to command text, in first-seen order.
pub type CommandDictionary = IndexMap<String, String>;

/// Everything read from a template workbook.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Template {
    /// Devices in sheet order.
    pub roster: Vec<DeviceTarget>,

    pub commands: CommandDictionary,
}

/// Open a template workbook and read its roster and commands.
pub fn load_template(path: impl AsRef<Path>) -> Result<Template, InputError> {
    let path = path.as_ref();
    let mut workbook = open_workbook_auto(path).map_err(|source| InputError::Open {
        path: path.to_path_buf(),
        source,
    })?;

    let found = workbook.sheet_names().len();
    if found < 2 {
        return Err(InputError::MissingSheet { found });
    }

    let devices = workbook
        .worksheet_range_at(0)
        .ok_or(InputError::MissingSheet { found })?
        .map_err(|source| InputError::Sheet {
            sheet: "device",
            source,
        })?;
    let commands = workbook
        .worksheet_range_at(1)
        .ok_or(InputError::MissingSheet { found })?
        .map_err(|source| InputError::Sheet {
            sheet: "command",
            source,
        })?;

    let template = parse_sheets(&devices, &commands)?;
    debug!(
        "template {}: {} device(s), {} command(s)",
        path.display(),
        template.roster.len(),
        template.commands.len()
    );
    Ok(template)
}

/// Build a template from the device and command sheets.
pub fn parse_sheets(devices: &Range<Data>, commands: &Range<Data>) -> Result<Template, InputError> {
    Ok(Template {
        roster: read_roster(devices)?,
        commands: read_commands(commands)?,
    })
}

fn read_roster(sheet: &Range<Data>) -> Result<Vec<DeviceTarget>, InputError> {
    let (_, last_column) = sheet.end().ok_or(InputError::EmptySheet { sheet: "device" })?;

    let cells: Vec<(u32, Option<String>)> = (FIRST_DEVICE_COLUMN..=last_column)
        .map(|column| (column, cell_text(sheet, DEVICE_ROW, column)))
        .collect();

    // Other rows may be wider than the device row; blanks past the last
    // device are not gaps.
    let populated = cells
        .iter()
        .rposition(|(_, host)| host.is_some())
        .map_or(0, |last| last + 1);

    cells
        .into_iter()
        .take(populated)
        .map(|(column, host)| {
            host.map(DeviceTarget::new).ok_or_else(|| InputError::BlankHost {
                cell: cell_name(DEVICE_ROW, column),
            })
        })
        .collect()
}

fn read_commands(sheet: &Range<Data>) -> Result<CommandDictionary, InputError> {
    let (last_row, _) = sheet.end().ok_or(InputError::EmptySheet { sheet: "command" })?;

    let mut commands = CommandDictionary::new();
    for row in FIRST_COMMAND_ROW..=last_row {
        match (cell_text(sheet, row, 0), cell_text(sheet, row, 1)) {
            (Some(variable), command) => {
                if let Some(previous) = commands.insert(variable.clone(), command.unwrap_or_default()) {
                    debug!("variable {variable:?} redefined in row {}, was {previous:?}", row + 1);
                }
            }
            (None, None) => continue,
            (None, Some(_)) => return Err(InputError::MissingVariable { row: row + 1 }),
        }
    }
    Ok(commands)
}

/// Trimmed text of a cell, `None` when blank or an error value.
fn cell_text(sheet: &Range<Data>, row: u32, column: u32) -> Option<String> {
    let text = match sheet.get_value((row, column))? {
        Data::Empty | Data::Error(_) => return None,
        Data::String(s) => s.trim().to_string(),
        other => other.to_string().trim().to_string(),
    };
    (!text.is_empty()).then_some(text)
}

/// A1-style name of a zero-based cell position.
fn cell_name(row: u32, column: u32) -> String {
    let mut letters = Vec::new();
    let mut n = column + 1;
    while n > 0 {
        let rem = (n - 1) % 26;
        letters.push(char::from(b'A' + rem as u8));
        n = (n - 1) / 26;
    }
    letters.iter().rev().collect::<String>() + &(row + 1).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sheet(cells: &[((u32, u32), &str)]) -> Range<Data> {
        let max_row = cells.iter().map(|((r, _), _)| *r).max().unwrap_or(0);
        let max_col = cells.iter().map(|((_, c), _)| *c).max().unwrap_or(0);
        let mut range = Range::new((0, 0), (max_row, max_col));
        for (pos, value) in cells {
            range.set_value(*pos, Data::String(value.to_string()));
        }
        range
    }

    fn hosts(template: &Template) -> Vec<&str> {
        template.roster.iter().map(|t| t.host.as_str()).collect()
    }

    fn command_sheet() -> Range<Data> {
        sheet(&[
            ((0, 0), "Variable"),
            ((0, 1), "Command"),
            ((1, 0), "ver"),
            ((1, 1), "show version"),
        ])
    }

    #[test]
    fn test_roster_from_device_row() {
        let devices = sheet(&[
            ((0, 0), "Site inventory"),
            ((12, 0), "Hosts"),
            ((12, 1), "10.0.0.1"),
            ((12, 2), " 10.0.0.2 "),
            ((12, 3), "core-sw01"),
        ]);

        let template = parse_sheets(&devices, &command_sheet()).unwrap();
        assert_eq!(hosts(&template), vec!["10.0.0.1", "10.0.0.2", "core-sw01"]);
        assert!(template.roster.iter().all(|t| t.platform == "cisco_ios"));
        assert!(template.roster.iter().all(|t| t.port == 22));
    }

    #[test]
    fn test_trailing_blanks_ignored() {
        // Row 1 is wider than the device row.
        let devices = sheet(&[
            ((0, 6), "notes"),
            ((12, 1), "10.0.0.1"),
            ((12, 2), "10.0.0.2"),
        ]);

        let template = parse_sheets(&devices, &command_sheet()).unwrap();
        assert_eq!(hosts(&template), vec!["10.0.0.1", "10.0.0.2"]);
    }

    #[test]
    fn test_interior_blank_host_rejected() {
        let devices = sheet(&[((12, 1), "10.0.0.1"), ((12, 2), "  "), ((12, 3), "10.0.0.3")]);

        let err = parse_sheets(&devices, &command_sheet()).unwrap_err();
        match err {
            InputError::BlankHost { cell } => assert_eq!(cell, "C13"),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_no_device_row_is_empty_roster() {
        let devices = sheet(&[((0, 0), "title only")]);
        let template = parse_sheets(&devices, &command_sheet()).unwrap();
        assert!(template.roster.is_empty());
    }

    #[test]
    fn test_numeric_host_cell() {
        let mut devices = sheet(&[((12, 1), "10.0.0.1")]);
        devices.set_value((12, 2), Data::Int(1001));

        let template = parse_sheets(&devices, &command_sheet()).unwrap();
        assert_eq!(hosts(&template), vec!["10.0.0.1", "1001"]);
    }

    #[test]
    fn test_duplicate_variables_overwrite() {
        let devices = sheet(&[((12, 1), "10.0.0.1")]);
        let commands = sheet(&[
            ((0, 0), "Variable"),
            ((1, 0), "ver"),
            ((1, 1), "show version"),
            ((2, 0), "clock"),
            ((2, 1), "show clock"),
            ((3, 0), "ver"),
            ((3, 1), "show version | include IOS"),
        ]);

        let template = parse_sheets(&devices, &commands).unwrap();
        assert_eq!(template.commands.len(), 2);
        assert_eq!(template.commands["ver"], "show version | include IOS");
        assert_eq!(
            template.commands.keys().collect::<Vec<_>>(),
            vec!["ver", "clock"]
        );
    }

    #[test]
    fn test_header_only_command_sheet() {
        let devices = sheet(&[((12, 1), "10.0.0.1")]);
        let commands = sheet(&[((0, 0), "Variable"), ((0, 1), "Command")]);

        let template = parse_sheets(&devices, &commands).unwrap();
        assert!(template.commands.is_empty());
        assert_eq!(template.roster.len(), 1);
    }

    #[test]
    fn test_command_rows_skip_blanks() {
        let devices = sheet(&[((12, 1), "10.0.0.1")]);
        let commands = sheet(&[
            ((0, 0), "Variable"),
            ((1, 0), "ver"),
            ((1, 1), "show version"),
            ((3, 0), "empty"),
        ]);

        let template = parse_sheets(&devices, &commands).unwrap();
        assert_eq!(template.commands.len(), 2);
        assert_eq!(template.commands["empty"], "");
    }

    #[test]
    fn test_command_without_variable_rejected() {
        let devices = sheet(&[((12, 1), "10.0.0.1")]);
        let commands = sheet(&[((0, 0), "Variable"), ((4, 1), "show clock")]);

        let err = parse_sheets(&devices, &commands).unwrap_err();
        assert!(matches!(err, InputError::MissingVariable { row: 5 }));
    }

    #[test]
    fn test_empty_sheets_rejected() {
        let empty: Range<Data> = Range::empty();
        let devices = sheet(&[((12, 1), "10.0.0.1")]);

        assert!(matches!(
            parse_sheets(&empty, &command_sheet()),
            Err(InputError::EmptySheet { sheet: "device" })
        ));
        assert!(matches!(
            parse_sheets(&devices, &empty),
            Err(InputError::EmptySheet { sheet: "command" })
        ));
    }

    #[test]
    fn test_cell_name() {
        assert_eq!(cell_name(12, 1), "B13");
        assert_eq!(cell_name(0, 25), "Z1");
        assert_eq!(cell_name(0, 26), "AA1");
        assert_eq!(cell_name(9, 27), "AB10");
    }

    #[test]
    fn test_load_template_from_file() {
        use rust_xlsxwriter::Workbook;

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("template.xlsx");

        let mut workbook = Workbook::new();
        let devices = workbook.add_worksheet();
        devices.write_string(0, 0, "Prime import").unwrap();
        devices.write_string(12, 0, "Devices").unwrap();
        devices.write_string(12, 1, "10.0.0.1").unwrap();
        devices.write_string(12, 2, "10.0.0.2").unwrap();
        let commands = workbook.add_worksheet();
        commands.write_string(0, 0, "Variable").unwrap();
        commands.write_string(0, 1, "Command").unwrap();
        commands.write_string(1, 0, "ver").unwrap();
        commands.write_string(1, 1, "show version").unwrap();
        workbook.save(&path).unwrap();

        let template = load_template(&path).unwrap();
        assert_eq!(hosts(&template), vec!["10.0.0.1", "10.0.0.2"]);
        assert_eq!(template.commands["ver"], "show version");
    }

    #[test]
    fn test_load_template_requires_two_sheets() {
        use rust_xlsxwriter::Workbook;

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("one-sheet.xlsx");

        let mut workbook = Workbook::new();
        workbook
            .add_worksheet()
            .write_string(12, 1, "10.0.0.1")
            .unwrap();
        workbook.save(&path).unwrap();

        assert!(matches!(
            load_template(&path),
            Err(InputError::MissingSheet { found: 1 })
        ));
    }

    #[test]
    fn test_load_template_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = load_template(dir.path().join("absent.xlsx")).unwrap_err();
        assert!(matches!(err, InputError::Open { .. }));
    }
}
