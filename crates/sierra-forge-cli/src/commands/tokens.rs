use anyhow::Result;
use serde::Serialize;

use sierra_forge_core::metadata::ApplicationMetadata;
use sierra_forge_core::tokens::TokenMapping;

use crate::output;

#[derive(Serialize)]
struct TokenRow<'a> {
    token: String,
    value: &'a str,
    description: &'static str,
}

/// List the substitution vocabulary with the values it would take for `name`.
pub async fn run(name: &str, version_name: &str, json: bool) -> Result<()> {
    let metadata = ApplicationMetadata::new(name, version_name)?;
    let tokens = TokenMapping::from_metadata(&metadata);

    let rows: Vec<TokenRow<'_>> = tokens
        .iter()
        .map(|(token, value)| TokenRow {
            token: token.to_string(),
            value,
            description: token.description(),
        })
        .collect();

    if json {
        println!("{}", serde_json::to_string_pretty(&rows)?);
        return Ok(());
    }

    output::print_header("tokens", metadata.name());
    for row in &rows {
        output::print_token(&row.token, row.value, row.description);
    }
    println!();
    println!("  Write $${{NAME}} to emit a literal ${{NAME}} (e.g. CMake variables).");
    println!("  The names above cannot be escaped.");
    println!();

    Ok(())
}
