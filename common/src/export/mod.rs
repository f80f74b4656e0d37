//! Export core modules shared by the CLI and the dashboard.

#[cfg(feature = "excel")]
pub mod excel_core;
