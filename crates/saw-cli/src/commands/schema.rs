use anyhow::Result;
use saw_cli::common::{print_table, OutputFormat};
use saw_session::Session;

pub fn fields(session: &mut Session, object_type: &str, format: OutputFormat) -> Result<()> {
    let table = session.get_field_list(object_type)?;
    print_table(object_type, Some(&table), format)
}

pub fn keys(session: &mut Session, object_type: &str, format: OutputFormat) -> Result<()> {
    let table = session.get_key_fields_for_object_type(object_type)?;
    print_table(object_type, Some(&table), format)
}
