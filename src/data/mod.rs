/// Data layer: dataset discovery, selection, loading, and sampling.
///
/// Architecture:
/// ```text
///   json/ directory
///        │
///        ▼
///   ┌──────────┐
///   │ catalog   │  list gfs_YYYYMMDD_HH.json names
///   └──────────┘
///        │
///        ▼
///   ┌──────────┐
///   │ selector  │  pick the latest embedded date
///   └──────────┘
///        │
///        ▼
///   ┌──────────┐
///   │  loader   │  parse grib2json → WindField
///   └──────────┘
///        │
///        ▼
///   ┌──────────┐
///   │  filter   │  region + stride → WindVector list
///   └──────────┘
/// ```

pub mod catalog;
pub mod filter;
pub mod loader;
pub mod model;
pub mod selector;
