//! services/api/src/bin/openapi.rs
//!
//! Dumps the TalentFlow assessments OpenAPI document. Usage:
//!
//! ```text
//! openapi [PATH]    # writes PATH, `openapi.json` by default
//! openapi -         # writes to stdout
//! ```

use std::io::Write;

use api_lib::web::ApiDoc;
use utoipa::OpenApi;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let doc = ApiDoc::openapi();
    let rendered = doc.to_pretty_json()?;

    match std::env::args().nth(1).as_deref() {
        Some("-") => std::io::stdout().write_all(rendered.as_bytes())?,
        target => {
            let path = target.unwrap_or("openapi.json");
            std::fs::write(path, &rendered)?;
            eprintln!(
                "Wrote {} route(s) of {} {} to {}",
                doc.paths.paths.len(),
                doc.info.title,
                doc.info.version,
                path
            );
        }
    }
    Ok(())
}
