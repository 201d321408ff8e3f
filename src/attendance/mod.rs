pub mod aggregate;
pub mod bucket;
pub mod classify;
pub mod error;
pub mod report;
pub mod service;
pub mod shift;
pub mod store;
pub mod window;
