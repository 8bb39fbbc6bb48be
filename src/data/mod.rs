//! Data layer: cleaning, caching, filtering and aggregation.
//!
//! Architecture:
//! ```text
//!  .csv / .tsv / .json / .parquet
//!        │
//!        ▼
//!   ┌──────────┐
//!   │  loader   │  parse file → HealthTable (+ Schema)
//!   └──────────┘
//!        │            cache: keyed by path + mtime
//!        ▼
//!   ┌──────────┐
//!   │  filter   │  FilterSelection → View (row indices)
//!   └──────────┘
//!        │
//!        ▼
//!   ┌───────────┐
//!   │ aggregate  │  View → Summary<…> per chart, Dashboard
//!   └───────────┘
//! ```

pub mod aggregate;
pub mod cache;
pub mod filter;
pub mod loader;
pub mod model;
