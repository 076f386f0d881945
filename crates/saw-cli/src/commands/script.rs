use anyhow::Result;
use saw_session::Session;

pub fn run(session: &mut Session, statements: &[String]) -> Result<()> {
    session.run_script(statements)?;
    println!("Ran {} statement(s)", statements.len());
    Ok(())
}
