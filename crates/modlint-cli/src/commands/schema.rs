//! Schema command - print the effective values schema

use console::style;
use std::path::Path;

use super::load_module;
use crate::error::Result;

pub fn run(path: &Path) -> Result<()> {
    let (module, _) = load_module(path)?;

    match module.effective_schema()? {
        Some(schema) => print!("{}", schema.to_yaml()?),
        None => eprintln!(
            "{} module {} has no openapi values schema",
            style("⚠").yellow(),
            module.name
        ),
    }

    Ok(())
}
