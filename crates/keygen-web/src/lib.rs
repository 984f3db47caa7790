//! Keygen Web - WebGPU-powered key viewer and control panel
//!
//! This crate provides the browser frontend: it asks the key service to
//! generate a key, shows the resulting STL model, and offers its download.

mod app;
mod models;
mod network;
mod scene;
mod ui;

use keygen_core::LogLevel;
use wasm_bindgen::prelude::*;

/// Entry point for WASM module
#[wasm_bindgen(start)]
pub fn main() {
    // Set panic hook for better error messages
    console_error_panic_hook::set_once();

    // Warn by default to keep wgpu noise down; `?log=debug` raises it
    let level = network::page_search()
        .map(|search| LogLevel::from_search(&search))
        .unwrap_or_default();
    tracing_wasm::set_as_global_default_with_config(
        tracing_wasm::WASMLayerConfigBuilder::new()
            .set_max_level(level.to_tracing())
            .build(),
    );

    app::run();
}
