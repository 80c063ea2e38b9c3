//! `packhorse formats` command handler

use packhorse_format::FormatRegistry;

use crate::error::CliError;

/// Execute the `formats` command.
///
/// Prints the canonical id and aliases of every registered format.
pub fn execute() -> Result<(), CliError> {
    let registry = FormatRegistry::new();

    let id_width = registry
        .formats()
        .map(|f| f.id().as_str().len())
        .max()
        .unwrap_or(0)
        .max("FORMAT".len());

    println!("{:id_width$}  ALIASES", "FORMAT");
    for format in registry.formats() {
        println!(
            "{:id_width$}  {}",
            format.id().as_str(),
            format.aliases().join(", ")
        );
    }
    Ok(())
}
