pub mod auto;
pub mod case;
pub mod erd;
pub mod error;
pub mod inflect;
pub mod model;
pub mod names;
pub mod options;
pub mod qname;
pub mod relater;
pub mod resolver;
pub mod sql;

use wasm_bindgen::prelude::*;

use auto::{Generated, generate};
use error::AutoError;
use options::AutoOptions;
use sql::{Dialect, SchemaIntrospector, introspector_for};

/// Introspect a SQL dump and run the generation pipeline over it.
pub fn generate_from_sql(
    sql: &str,
    dialect: Dialect,
    options: &AutoOptions,
) -> Result<Generated, AutoError> {
    let introspector = introspector_for(sql, dialect);
    tracing::debug!(dialect = ?introspector.dialect(), "Introspecting dump");
    let td = introspector.introspect()?;
    generate(td, options, introspector.as_ref())
}

fn run_wasm(sql: &str, options: Option<String>) -> Result<Generated, String> {
    let options = match options.as_deref() {
        Some(json) if !json.trim().is_empty() => {
            AutoOptions::from_json(json).map_err(|e| e.to_string())?
        }
        _ => AutoOptions::default(),
    };
    generate_from_sql(sql, Dialect::Auto, &options).map_err(|e| e.to_string())
}

/// Initialize panic hook for better error messages in WASM
#[wasm_bindgen(start)]
pub fn init() {
    #[cfg(target_arch = "wasm32")]
    console_error_panic_hook::set_once();
}

/// Generate models from a SQL dump, returned as JSON
#[wasm_bindgen(js_name = "generateModels")]
pub fn generate_models(sql: &str, options: Option<String>) -> Result<String, String> {
    let generated = run_wasm(sql, options)?;
    serde_json::to_string(&generated).map_err(|e| e.to_string())
}

/// Generate models from a SQL dump, returned as ERD text
#[wasm_bindgen(js_name = "generateErd")]
pub fn generate_erd(sql: &str, options: Option<String>) -> Result<String, String> {
    let generated = run_wasm(sql, options)?;
    Ok(erd::serialize(&generated))
}
