//! WASM bindings for in-browser use.
//!
//! This module exposes the document-level transformation to JavaScript via wasm-bindgen.

use wasm_bindgen::prelude::*;

use crate::IntensityLevel;

/// Initialize panic hook for better error messages in the browser console.
#[wasm_bindgen(start)]
pub fn init() {
    #[cfg(feature = "wasm")]
    console_error_panic_hook::set_once();
}

fn level(name: &str) -> Result<IntensityLevel, JsValue> {
    name.parse().map_err(|e: crate::Error| JsValue::from_str(&e.to_string()))
}

/// Emphasize an HTML document.
///
/// `level` is one of "Glance", "Focus" or "Deep" (any case).
#[wasm_bindgen]
pub fn bionic_html(html: &str, level_name: &str) -> Result<String, JsValue> {
    crate::bionic_html(html, level(level_name)?, None).map_err(|e| JsValue::from_str(&e.to_string()))
}

/// Remove all emphasis from an HTML document.
#[wasm_bindgen]
pub fn strip_html(html: &str) -> String {
    crate::strip_html(html)
}

/// Markup for a single text run.
#[wasm_bindgen]
pub fn render_text(text: &str, level_name: &str) -> Result<String, JsValue> {
    Ok(crate::Transformer::new(level(level_name)?).render_markup(text))
}
