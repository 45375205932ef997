//! Values command - print the synthesized values documents

use modlint_engine::Linter;
use std::path::Path;

use super::{SynthesisArgs, load_module};
use crate::error::Result;

pub fn run(path: &Path, synthesis: &SynthesisArgs, json: bool) -> Result<()> {
    let (module, mut config) = load_module(path)?;
    synthesis.apply(&mut config);

    let documents = Linter::new(config).values_documents(&module)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&documents)?);
    } else {
        for document in &documents {
            print!("---\n{}", serde_yaml::to_string(document)?);
        }
    }

    Ok(())
}
