//! File I/O: dispatch trace export.

pub mod export;
