//! Organizer-side booth placement editor.
//!
//! Everything outside the `wasm32` modules is plain Rust and runs under
//! native tests; the browser front end only wires DOM events to a
//! [`session::PlacementSession`].

pub mod clock;
pub mod editor;
pub mod geometry;
pub mod kv;
pub mod notify;
pub mod persistence;
pub mod reconcile;
pub mod session;
pub mod state;
pub mod store;

#[cfg(target_arch = "wasm32")]
mod app;
#[cfg(target_arch = "wasm32")]
mod dom;
#[cfg(target_arch = "wasm32")]
mod net;
#[cfg(target_arch = "wasm32")]
mod render;
#[cfg(target_arch = "wasm32")]
mod web_storage;
#[cfg(target_arch = "wasm32")]
mod ws;

#[cfg(target_arch = "wasm32")]
pub use app::{favorite_booths, run, toggle_favorite};
