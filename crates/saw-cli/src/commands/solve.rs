use anyhow::{anyhow, Result};
use saw_cli::common::{print_table, table_to_json, OutputFormat};
use saw_core::SolveMethod;
use saw_session::Session;
use std::time::Instant;
use tracing::info;

pub fn solve(
    session: &mut Session,
    method: &str,
    results: &[String],
    format: OutputFormat,
) -> Result<()> {
    let method: SolveMethod = method.parse().map_err(|e: String| anyhow!(e))?;
    let start = Instant::now();
    session.solve_power_flow(method)?;
    eprintln!(
        "Solved power flow ({method}) in {:.3}s",
        start.elapsed().as_secs_f64()
    );

    if format == OutputFormat::Json && results.len() > 1 {
        let mut doc = serde_json::Map::new();
        for object_type in results {
            let table = session.get_power_flow_results(object_type.as_str())?;
            doc.insert(
                object_type.clone(),
                table.as_ref().map(table_to_json).unwrap_or_default(),
            );
        }
        println!("{}", serde_json::to_string_pretty(&doc)?);
        return Ok(());
    }

    for (idx, object_type) in results.iter().enumerate() {
        let table = session.get_power_flow_results(object_type.as_str())?;
        info!(object_type = %object_type, "printing power flow results");
        if results.len() > 1 {
            if idx > 0 {
                println!();
            }
            println!("[{object_type}]");
        }
        print_table(object_type, table.as_ref(), format)?;
    }
    Ok(())
}
