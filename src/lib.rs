//! Interferogram analysis for a double-sided Fourier transform spectrometer.
//!
//! ```text
//!  .txt / .npz / .parquet / .csv
//!        │
//!        ▼
//!   ┌──────────┐
//!   │   data    │  parse file → ScanRecord
//!   └──────────┘
//!        │
//!        ▼
//!   ┌──────────┐
//!   │ analysis  │  fringe → branches → detrend → window → DCT
//!   └──────────┘
//!        │
//!        ▼
//!   AnalysisResult  → viewer / JSON / CSV export
//! ```

pub mod analysis;
pub mod data;
pub mod sweep;
