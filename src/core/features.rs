//! Conversion features
//!
//! `completion` runs inside the backend and talks to the provider;
//! `converter` runs in the client and talks to the backend.

pub mod completion;
pub mod converter;
