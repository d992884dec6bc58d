//! Data layer: scan records, loading, and export.
//!
//! Architecture:
//! ```text
//!  .txt / .npz / .parquet / .csv
//!        │
//!        ▼
//!   ┌──────────┐
//!   │  loader   │  parse file → ScanRecord (counts → cm for archives)
//!   └──────────┘
//!        │
//!        ▼
//!   ┌──────────┐
//!   │ScanRecord │  position, visibility, metadata
//!   └──────────┘
//!        │   (analysis)
//!        ▼
//!   ┌──────────┐
//!   │  export   │  AnalysisResult → JSON / CSV
//!   └──────────┘
//! ```

pub mod export;
pub mod loader;
pub mod model;
