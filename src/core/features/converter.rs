//! Client side of code conversion
//!
//! `ConversionOrchestrator` runs request/response cycles against the backend;
//! `Workspace` layers the editor commands (swap, upload, format...) on top.

pub mod client;
pub mod markup;
pub mod orchestrator;
pub mod workspace;

pub use client::{BackendClient, HttpBackendClient};
pub use markup::strip_markup;
pub use orchestrator::ConversionOrchestrator;
pub use workspace::{EditorState, Workspace};
