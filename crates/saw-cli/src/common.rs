//! Output formats and table rendering shared by every subcommand.

use anyhow::{Context, Result};
use clap::ValueEnum;
use saw_core::{Table, Value};
use std::io::Write;
use std::path::Path;
use tabwriter::TabWriter;

/// Which engine a session talks to.
#[derive(ValueEnum, Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum EngineKind {
    /// The SimAuto bridge process
    #[default]
    Bridge,
    /// In-process engine over a JSON case snapshot
    Memory,
}

/// Output format for tabular data.
#[derive(ValueEnum, Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum OutputFormat {
    /// Aligned columns for reading at a terminal
    #[default]
    Table,
    /// JSON array of objects, one per row
    Json,
    /// Comma-separated values with a header row
    Csv,
}

fn json_value(value: &Value) -> serde_json::Value {
    match value {
        Value::Null => serde_json::Value::Null,
        Value::Int(i) => serde_json::Value::from(*i),
        // NaN and infinities have no JSON spelling.
        Value::Real(x) => serde_json::Number::from_f64(*x)
            .map(serde_json::Value::Number)
            .unwrap_or(serde_json::Value::Null),
        Value::Text(s) => serde_json::Value::from(s.as_str()),
    }
}

pub fn table_to_json(table: &Table) -> serde_json::Value {
    table
        .rows()
        .iter()
        .map(|row| {
            table
                .columns()
                .iter()
                .zip(row)
                .map(|(column, value)| (column.clone(), json_value(value)))
                .collect::<serde_json::Map<_, _>>()
        })
        .map(serde_json::Value::Object)
        .collect()
}

/// Write `table` to `out` in the requested format.
pub fn write_table<W: Write>(out: W, table: &Table, format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Table => {
            let mut writer = TabWriter::new(out);
            writeln!(writer, "{}", table.columns().join("\t"))?;
            for row in table.rows() {
                let cells: Vec<String> = row.iter().map(Value::to_string).collect();
                writeln!(writer, "{}", cells.join("\t"))?;
            }
            writer.flush()?;
        }
        OutputFormat::Json => {
            let mut out = out;
            serde_json::to_writer_pretty(&mut out, &table_to_json(table))
                .context("serializing table to JSON")?;
            writeln!(out)?;
        }
        OutputFormat::Csv => {
            let mut writer = csv::Writer::from_writer(out);
            writer.write_record(table.columns())?;
            for row in table.rows() {
                writer.write_record(row.iter().map(Value::to_string))?;
            }
            writer.flush()?;
        }
    }
    Ok(())
}

/// Print a table to stdout, or a one-line notice when there is none.
pub fn print_table(label: &str, table: Option<&Table>, format: OutputFormat) -> Result<()> {
    let stdout = std::io::stdout();
    match table {
        Some(table) => write_table(stdout.lock(), table, format),
        None => {
            match format {
                OutputFormat::Json => println!("null"),
                _ => println!("no {label} elements"),
            }
            Ok(())
        }
    }
}

/// Load a CSV file whose header row names fields. Cells stay text until
/// the session cleans them against the field catalog; empty cells are null.
pub fn read_csv_table(path: &Path) -> Result<Table> {
    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_path(path)
        .with_context(|| format!("opening {}", path.display()))?;
    let columns: Vec<String> = reader
        .headers()
        .with_context(|| format!("reading header of {}", path.display()))?
        .iter()
        .map(str::to_string)
        .collect();

    let mut table = Table::new(columns);
    for (line, record) in reader.records().enumerate() {
        let record = record.with_context(|| format!("reading {} row {}", path.display(), line + 1))?;
        let row = record
            .iter()
            .map(|cell| {
                if cell.is_empty() {
                    Value::Null
                } else {
                    Value::Text(cell.to_string())
                }
            })
            .collect();
        table.push_row(row)?;
    }
    Ok(table)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::NamedTempFile;

    fn sample() -> Table {
        Table::from_rows(
            vec!["BusNum", "BusName", "BusPUVolt"],
            vec![
                vec![Value::Int(1), Value::Text("One".into()), Value::Real(1.02)],
                vec![Value::Int(2), Value::Text("Two".into()), Value::Real(f64::NAN)],
            ],
        )
        .unwrap()
    }

    #[test]
    fn json_rows_are_objects_and_nan_is_null() {
        let json = table_to_json(&sample());
        assert_eq!(json[0]["BusName"], "One");
        assert_eq!(json[0]["BusNum"], 1);
        assert!(json[1]["BusPUVolt"].is_null());
    }

    #[test]
    fn csv_output_has_header() {
        let mut out = Vec::new();
        write_table(&mut out, &sample(), OutputFormat::Csv).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert!(text.starts_with("BusNum,BusName,BusPUVolt\n1,One,1.02\n"));
    }

    #[test]
    fn csv_input_keeps_text_and_nulls() {
        let file = NamedTempFile::new().unwrap();
        std::fs::write(file.path(), "BusNum, BusPUVolt\n1, 1.03\n2,\n").unwrap();

        let table = read_csv_table(file.path()).unwrap();
        assert_eq!(table.columns(), &["BusNum".to_string(), "BusPUVolt".to_string()][..]);
        assert_eq!(table.value(0, "BusPUVolt"), Some(&Value::Text("1.03".into())));
        assert_eq!(table.value(1, "BusPUVolt"), Some(&Value::Null));
    }
}
