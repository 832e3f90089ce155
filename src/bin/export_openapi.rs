//! Write the dashboard OpenAPI document as JSON
//!
//!   cargo run --bin export_openapi                       # stdout
//!   cargo run --bin export_openapi -- --output api.json  # file
//!   cargo run --bin export_openapi -- --compact          # single line

use anyhow::Context;
use cash_cannon::gateway::openapi::ApiDoc;
use utoipa::OpenApi;

fn get_output_path() -> Option<String> {
    let args: Vec<String> = std::env::args().collect();
    args.iter()
        .position(|a| a == "--output" || a == "-o")
        .and_then(|i| args.get(i + 1).cloned())
}

fn main() -> anyhow::Result<()> {
    let doc = ApiDoc::openapi();
    let json = if std::env::args().any(|a| a == "--compact") {
        doc.to_json()
    } else {
        doc.to_pretty_json()
    }
    .context("serializing OpenAPI document")?;

    match get_output_path() {
        Some(path) => {
            std::fs::write(&path, json.as_bytes()).with_context(|| format!("writing {}", path))?;
            eprintln!("OpenAPI document written to {} ({} paths)", path, doc.paths.paths.len());
        }
        None => println!("{}", json),
    }
    Ok(())
}
