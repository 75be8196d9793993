//! services/api/src/bin/openapi.rs
//!
//! Writes the OpenAPI document for the letters API, by default to
//! `openapi.json`. Pass a path as the first argument to write elsewhere.

use letter_api::web::rest::ApiDoc;
use utoipa::OpenApi;

const DEFAULT_OUTPUT: &str = "openapi.json";

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| DEFAULT_OUTPUT.to_string());
    let spec_json = ApiDoc::openapi().to_pretty_json()?;
    std::fs::write(&path, spec_json)?;
    println!("✅ OpenAPI document written to {}", path);
    Ok(())
}
