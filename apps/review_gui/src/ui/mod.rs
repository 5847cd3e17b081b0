//! UI layer: app shell and record cards.

pub mod app;
pub mod record_card;
