//! Backend side of code conversion: prompt shaping and provider access

pub mod provider;
pub mod proxy;

pub use provider::{CompletionProvider, HttpCompletionProvider};
pub use proxy::{clean_code_output, CompletionProxy};
