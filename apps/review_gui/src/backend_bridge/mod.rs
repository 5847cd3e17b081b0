//! Backend bridge: UI command queue drained by a tokio runtime thread.

pub mod commands;
pub mod runtime;
