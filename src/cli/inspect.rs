//! Inspect command implementation

use anyhow::Result;
use clap::Args;
use std::path::PathBuf;

use super::utils::delimiter_name;
use crate::domain::SourceKind;
use crate::source::{
    is_delimited_path, normalize_column_name, read_delimited, read_spreadsheet, SourceTable,
    TableOrigin,
};

#[derive(Args)]
pub struct InspectArgs {
    /// Workbook or CSV file to inspect
    #[arg(value_name = "FILE")]
    pub path: PathBuf,

    /// Label errors with this source kind (default: forecast for CSV, partial otherwise)
    #[arg(long, value_enum)]
    pub kind: Option<SourceKind>,

    /// Sheet to read (workbooks only; default: first sheet)
    #[arg(long, value_name = "NAME")]
    pub sheet: Option<String>,

    /// Header row, counted from the first non-empty row (workbooks only)
    #[arg(long, value_name = "N", default_value_t = 0)]
    pub header_row: usize,

    /// Field delimiter (CSV only; sniffed when unset)
    #[arg(long, value_name = "CHAR")]
    pub delimiter: Option<char>,

    /// Text encoding label (CSV only; detected when unset)
    #[arg(long, value_name = "LABEL")]
    pub encoding: Option<String>,
}

pub fn run(args: InspectArgs) -> Result<()> {
    let delimited = is_delimited_path(&args.path);
    let table = if delimited {
        let kind = args.kind.unwrap_or(SourceKind::Forecast);
        read_delimited(kind, &args.path, args.delimiter, args.encoding.as_deref())?
    } else {
        let kind = args.kind.unwrap_or(SourceKind::Partial);
        read_spreadsheet(kind, &args.path, args.sheet.as_deref(), args.header_row)?
    };

    for line in describe(&table) {
        println!("{line}");
    }
    Ok(())
}

fn describe(table: &SourceTable) -> Vec<String> {
    let mut lines = vec![format!("File: {}", table.path.display())];
    match &table.origin {
        TableOrigin::Workbook { sheet, sheets } => {
            lines.push("Format: workbook".to_string());
            lines.push(format!("Sheet: {} (sheets: {})", sheet, sheets.join(", ")));
        }
        TableOrigin::Delimited { encoding, delimiter } => {
            lines.push("Format: delimited".to_string());
            lines.push(format!("Encoding: {}", encoding));
            lines.push(format!("Delimiter: {}", delimiter_name(*delimiter)));
        }
    }
    lines.push(format!("Columns: {}", table.headers.len()));
    for (idx, header) in table.headers.iter().enumerate() {
        lines.push(format!("  {:>3}  {}  ->  {}", idx, header, normalize_column_name(header)));
    }
    lines.push(format!("Data rows: {}", table.rows.len()));
    lines
}
