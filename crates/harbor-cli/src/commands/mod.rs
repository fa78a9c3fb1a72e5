//! Resource steps

pub mod fetch;
pub mod out;
