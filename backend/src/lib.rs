//! # Retail ETL - batch pipeline for retail sales extracts
//!
//! Turns a raw sales-order extract into a cleaned table, an enriched
//! customer-level table, four curated summaries and a KPI report.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────┐     ┌─────────────┐     ┌─────────────┐     ┌─────────────┐     ┌─────────────┐
//! │   Raw CSV   │────▶│   Cleaner   │────▶│ Transformer │────▶│   Curator   │────▶│  Reporter   │
//! │  (ISO/UTF8) │     │ (fill+dedup)│     │ (customers) │     │ (summaries) │     │ (KPIs+JSON) │
//! └─────────────┘     └─────────────┘     └─────────────┘     └─────────────┘     └─────────────┘
//! ```
//!
//! Stages hand off through CSV files on disk, so each one can be run on
//! its own. Every stage is also available as a pure function over
//! in-memory [`Table`]s.
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use retail_etl::{run_all, PipelineConfig};
//!
//! fn main() -> Result<(), retail_etl::PipelineError> {
//!     let summary = run_all(&PipelineConfig::default().with_base_dir("."))?;
//!     println!("Total revenue: {}", summary.report.kpis.total_revenue);
//!     Ok(())
//! }
//! ```
//!
//! ## Modules
//!
//! - [`error`] - Hierarchical error types
//! - [`models`] - Typed cells, tables and summary rows
//! - [`parser`] - CSV reading with encoding and delimiter detection
//! - [`clean`] - Cleaner stage
//! - [`transform`] - Transformer stage and group/join helpers
//! - [`curate`] - Curator stage
//! - [`report`] - Reporter stage
//! - [`validation`] - JSON Schema checks of sales records
//! - [`pipeline`] - File-to-file stage runners
//! - [`config`] - Paths and settings
//! - [`logs`] - Structured log sink

// Core modules
pub mod error;
pub mod models;

// Ambient
pub mod config;
pub mod logs;

// Parsing
pub mod parser;

// Stages
pub mod clean;
pub mod curate;
pub mod report;
pub mod transform;

// Validation
pub mod validation;

// Orchestration
pub mod pipeline;

// =============================================================================
// Re-exports - Error types
// =============================================================================

pub use error::{
    CsvError, CsvResult, PipelineError, PipelineResult, StageError, StageResult, ValidationError,
    ValidationResult,
};

// =============================================================================
// Re-exports - Models
// =============================================================================

pub use models::{
    Cell, CountrySummary, CuratedTables, CustomerSummary, DealSize, Kpis, MonthlySummary,
    MonthlyTrendPoint, ProductSummary, Row, Table,
};

// =============================================================================
// Re-exports - Stages
// =============================================================================

pub use clean::{clean_table, CleanOutput, CleanReport};
pub use curate::curate;
pub use parser::{parse_bytes_auto, read_raw_file, read_table_file, write_table_file, ParseResult};
pub use report::{build_report, read_curated, write_report, Report};
pub use transform::{transform_table, TransformOutput, TransformReport};
pub use validation::{validate_table, ValidationReport};

// =============================================================================
// Re-exports - Pipeline
// =============================================================================

pub use config::PipelineConfig;
pub use logs::{LogFormat, LOG_SINK};
pub use pipeline::{run_all, run_clean, run_curate, run_report, run_transform, RunSummary};
