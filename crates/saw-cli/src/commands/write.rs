use anyhow::{Context, Result};
use saw_cli::common::read_csv_table;
use saw_session::Session;
use std::path::Path;

pub fn set(session: &mut Session, object_type: &str, input: &Path, verify: bool) -> Result<()> {
    let table = read_csv_table(input)?;
    if table.is_empty() {
        eprintln!("{} has no rows; nothing to write", input.display());
        return Ok(());
    }

    if verify {
        let report = session
            .write_many_verified(object_type, &table)
            .with_context(|| format!("writing {object_type} from {}", input.display()))?;
        println!(
            "Confirmed {} of {} {object_type} row(s)",
            report.rows_compared, report.rows_written
        );
        if report.rows_missing > 0 {
            eprintln!(
                "{} row(s) were not returned by the re-read",
                report.rows_missing
            );
        }
    } else {
        session
            .write_many(object_type, &table)
            .with_context(|| format!("writing {object_type} from {}", input.display()))?;
        println!("Wrote {} {object_type} row(s)", table.height());
    }
    Ok(())
}
