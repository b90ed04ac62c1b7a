/// Data layer: core types, loading, and the transformation pipeline steps.
///
/// Architecture:
/// ```text
///  .csv / .tsv
///        │
///        ▼
///   ┌──────────┐
///   │  loader   │  parse file → Dataset (number / text / null cells)
///   └──────────┘
///        │
///        ▼
///   ┌──────────┐
///   │  dates    │  leftmost all-date column → coerced to DateTime
///   └──────────┘
///        │
///        ▼
///   ┌──────────┐
///   │  filter   │  inclusive date window → row subset
///   └──────────┘
///        │
///        ▼
///   ┌──────────┐
///   │ resample  │  calendar buckets (D/W/M/Y) → per-bucket means
///   └──────────┘
///        │
///        ▼
///   ┌──────────┐
///   │ indicator │  optional SMA / EMA series per feature
///   └──────────┘
/// ```

pub mod dates;
pub mod filter;
pub mod indicator;
pub mod loader;
pub mod model;
pub mod resample;
