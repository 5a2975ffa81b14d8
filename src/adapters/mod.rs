// Adapters layer: concrete implementations for external systems (http lookups, smtp, csv).

pub mod dataset;
pub mod http;
pub mod mail;
