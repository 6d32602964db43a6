//! Format-specific table extraction. Each parser produces raw field rows;
//! validation happens once, in [`crate::normalize`].

pub mod csv;
pub mod pdf;
pub mod xlsx;
