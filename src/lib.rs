//! methane_rs
//!
//! Load, query and chart the global methane emissions table (one row per
//! country, type, segment and reason, in kilotonnes). Pairs with the
//! `methane` CLI.
//!
//! ### Features
//! - Load and validate the raw CSV, dropping free-text columns
//! - Filter and group with a small query model (sum, mean, count)
//! - Summary statistics (min, max, mean, median) over grouped results
//! - Cross-tabulations of two dimensions with explicit missing cells
//! - Join country totals to GeoJSON boundaries for choropleth maps
//! - SVG/PNG bar, stacked bar, pie, heat map and choropleth charts
//! - Save results as CSV or JSON
//!
//! ### Example
//! ```no_run
//! use methane_rs::{Column, EmissionType, Query, aggregate, summary};
//!
//! let table = methane_rs::load("methane.csv")?;
//! let query = Query::new()
//!     .filter_eq(Column::Type, EmissionType::Energy.as_str())
//!     .filter_eq(Column::Segment, "Total")
//!     .filter_eq(Column::Reason, "All")
//!     .group_by(Column::Region);
//! let per_region = aggregate(&table, &query).sorted_desc();
//! println!("{:#?}", summary::summarize(&per_region)?);
//! methane_rs::viz::plot_bar(
//!     &per_region,
//!     "energy.svg",
//!     &methane_rs::viz::ChartOptions::titled("Energy emissions per region"),
//!     methane_rs::viz::Orientation::Horizontal,
//! )?;
//! # Ok::<(), anyhow::Error>(())
//! ```

pub mod analysis;
pub mod crosstab;
pub mod error;
pub mod geo;
pub mod models;
pub mod query;
pub mod storage;
pub mod summary;
pub mod table;
pub mod viz;

pub use analysis::{Report, ReportOptions};
pub use crosstab::{CrossTab, cross_tab};
pub use error::AnalysisError;
pub use geo::{Boundaries, GeoJoin};
pub use models::{Column, EmissionType, GroupKey, Record};
pub use query::{AggFn, AggregateTable, Condition, Predicate, Query, aggregate};
pub use summary::{Extremum, Summary};
pub use table::{Table, load};
