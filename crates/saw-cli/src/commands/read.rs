use anyhow::Result;
use saw_cli::common::{print_table, OutputFormat};
use saw_session::Session;
use tracing::info;

pub fn list(
    session: &mut Session,
    object_type: &str,
    filter: &str,
    format: OutputFormat,
) -> Result<()> {
    let devices = session.list_devices(object_type, filter)?;
    info!(object_type, rows = devices.as_ref().map_or(0, |t| t.height()), "listed devices");
    print_table(object_type, devices.as_ref(), format)
}

pub fn get(
    session: &mut Session,
    object_type: &str,
    fields: &[String],
    filter: &str,
    format: OutputFormat,
) -> Result<()> {
    let table = session.read_many(object_type, fields, filter)?;
    print_table(object_type, table.as_ref(), format)
}
