//! Polycode: translate source code between programming languages through a
//! text-completion provider, with local conversion history.
//!
//! - `core`: language detection, history, persistence, and the conversion features
//! - `api`: the HTTP backend wrapping the completion proxy
//! - `shared`: errors, wire types, events, settings

pub mod api;
pub mod core;
pub mod shared;

use tracing_subscriber::EnvFilter;

/// Install the global tracing subscriber. `RUST_LOG` overrides the default filter.
pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("polycode=info"));

    // A second init (e.g. from tests) is harmless
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}
