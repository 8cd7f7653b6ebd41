//! Utility functions and helpers

pub mod string;

pub use string::StringUtils;
