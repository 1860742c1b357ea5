//! Browser-facing surface for the NP2/NP21 bridge.
//!
//! All JS interop is `wasm32`-only; on native targets this crate compiles to
//! almost nothing so workspace-wide builds and tests stay green. The actual
//! semantics live in `np2-bridge` — this crate only adapts the emscripten
//! module object behind the [`np2_bridge::NativeModule`] trait and forwards
//! the host surface through `wasm-bindgen`.

#![forbid(unsafe_code)]

use wasm_bindgen::prelude::*;

#[cfg(target_arch = "wasm32")]
mod em_module;
#[cfg(target_arch = "wasm32")]
mod instance;

#[cfg(target_arch = "wasm32")]
pub use instance::{EmulatorVariant, Np2Instance};

/// Crate version, exposed for the embedding runtime's handshake.
#[wasm_bindgen]
pub fn version() -> String {
    env!("CARGO_PKG_VERSION").to_string()
}
