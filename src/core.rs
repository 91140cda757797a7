pub mod context;
pub mod features;
pub mod history;
pub mod storage;
pub mod theme;
