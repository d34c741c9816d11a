use miette::{IntoDiagnostic, Result};
use polyres_core::version::{version_string, RESOLUTION_SCHEMA_VERSION};
use polyres_core::VERSION;
use serde_json::json;

pub fn run(json: bool) -> Result<()> {
    if json {
        let output = json!({
            "version": VERSION,
            "schema_version": RESOLUTION_SCHEMA_VERSION,
        });
        println!("{}", serde_json::to_string_pretty(&output).into_diagnostic()?);
    } else {
        println!("{}", version_string());
    }
    Ok(())
}
