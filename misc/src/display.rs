use anyhow::Result;
use serde::Serialize;

/// Prints a value as pretty JSON, for `--print-config` style flags.
pub fn pretty_json<T: Serialize>(o: T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(&o)?);
    Ok(())
}
