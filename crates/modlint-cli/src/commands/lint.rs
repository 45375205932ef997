//! Lint command - render a module against every values branch

use console::style;
use modlint_engine::{Linter, RenderReport};
use std::path::Path;

use super::{RenderArgs, SynthesisArgs, load_module};
use crate::error::{CliError, Result};

pub fn run(path: &Path, synthesis: &SynthesisArgs, render: &RenderArgs) -> Result<()> {
    let (module, mut config) = load_module(path)?;
    synthesis.apply(&mut config);
    render.apply(&mut config);

    println!(
        "{} Linting module {} at {}",
        style("→").blue(),
        style(&module.name).bold(),
        path.display()
    );

    let linter = Linter::new(config);
    let report = linter.lint(&module)?;

    if report.load_report.has_errors() {
        println!("  {} Some templates could not be loaded:", style("✗").red());
        print_errors(&report.load_report);
    }

    for outcome in &report.outcomes {
        if outcome.is_success() {
            println!(
                "  {} values document #{}: {} manifest(s)",
                style("✓").green(),
                outcome.index,
                outcome.manifests.len()
            );
            continue;
        }

        println!(
            "  {} values document #{}: {}",
            style("✗").red(),
            outcome.index,
            outcome.report.summary()
        );
        println!(
            "    {} {}",
            style("values:").dim(),
            serde_json::to_string(&outcome.values)?
        );
        print_errors(&outcome.report);
    }

    println!();
    let errors = report.total_errors();
    if errors > 0 {
        let documents = report.failed_documents().count();
        return Err(CliError::lint_failed(errors, documents));
    }

    println!(
        "{} Linting passed for {} values document(s)",
        style("✓").green().bold(),
        report.outcomes.len()
    );
    Ok(())
}

fn print_errors(report: &RenderReport) {
    for (template, errors) in &report.errors_by_template {
        for error in errors {
            println!("    {} {}: {}", style("✗").red(), template, error.message);
            println!("{:?}", miette::Report::new(error.clone()));
        }
    }
}
