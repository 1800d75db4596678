//! # Sell-out Consolidator
//!
//! A library for appending monthly retail sell-out data from several
//! wholesale clients, each with its own sheet layout, onto two running
//! historical tables without duplicating or skipping periods.
//!
//! ## Core Concepts
//!
//! - **Period**: a (month, year) pair; month codes are the Spanish
//!   three-letter abbreviations `ENE` through `DIC`
//! - **Expected period**: the month after the latest one recorded for a
//!   client. A client is only ever advanced by exactly one period per run
//! - **Reshaping**: each client's raw table is turned into canonical detail
//!   rows, aggregated by product, store, city and description
//! - **Append-only history**: existing rows are never modified; a client
//!   whose input is absent or invalid simply contributes nothing
//!
//! ## Example
//!
//! ```rust,ignore
//! use sellout_consolidator::*;
//!
//! let config = RunConfig::new("/data/naturesse")
//!     .with_client_file(Client::Makro, "JUL_MAKRO.xlsx");
//!
//! let tables = storage::load_tables(&config)?;
//! let makro = RawClientInput::new(Client::Makro, "JUL_MAKRO.xlsx", makro_sheet);
//!
//! let report = consolidate(&config, tables, vec![makro]);
//! storage::save_tables(&config, &report.tables)?;
//! ```

pub mod catalog;
pub mod error;
pub mod history;
pub mod intake;
pub mod merge;
pub mod period;
pub mod reshape;
pub mod resolver;
pub mod run;
pub mod schema;
pub mod storage;
pub mod table;

pub use catalog::{
    package_label, package_multiplier, sell_through_units, DEFAULT_PACKAGE_MULTIPLIER,
    UNLABELLED_PACKAGE,
};
pub use error::{Result, SellOutError};
pub use history::{latest_period, LatestPeriod};
pub use intake::{verify_expected_month, InputFileName};
pub use merge::{merge_records, merge_summaries};
pub use period::{month_number, next_month, MonthCode, Period};
pub use reshape::{reshape, RawClientInput, ReshapeOutput, ReshapeStats};
pub use resolver::{StoreCityResolver, StoreLocation};
pub use run::{ClientOutcome, ConsolidationRun, RunReport};
pub use schema::*;
pub use table::{Cell, ColumnHeader, RawTable};

/// Runs one consolidation pass over `inputs` against `tables`.
pub fn consolidate(
    config: &RunConfig,
    tables: HistoricalTables,
    inputs: Vec<RawClientInput>,
) -> RunReport {
    ConsolidationRun::new(config).execute(tables, inputs)
}
