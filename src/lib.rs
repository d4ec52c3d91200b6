pub mod calc;
pub mod config;
pub mod dim;

#[cfg(target_arch = "wasm32")]
pub mod wasm;
