//! Delivery-log query engine.
//!
//! Scans the rotated generations of an AFD delivery log, filters records
//! against multi-dimensional criteria and streams formatted rows to a
//! [`RowSink`]. Queries with an open end keep following the live generation
//! and survive log rotation.
//!
//! Data flow: the [`Query`] driver selects generations through
//! `dlog-registry`, memory-maps each one, locates the time window with the
//! core time index, plans a per-record predicate, and drives the scanner;
//! the scanner consults the record grammar, the archive interpreter and the
//! job-id resolver per record and pushes surviving rows to the sink in
//! batches. With an open window end the driver arms the tail follower,
//! which re-runs the scanner on growth deltas until the window closes or
//! the user stops the query.
//!
//! ```no_run
//! use dlog_engine::{Criteria, Query, QueryConfig};
//! # use dlog_engine::{Row, RowSink, Summary};
//! # struct Stdout;
//! # impl RowSink for Stdout {
//! #     fn clear(&mut self) {}
//! #     fn push_batch(&mut self, rows: Vec<Row>) {}
//! #     fn publish_summary(&mut self, _: &Summary) {}
//! #     fn publish_status(&mut self, _: &str) {}
//! #     fn check_interrupt(&mut self) -> bool { false }
//! # }
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let criteria = Criteria::new()
//!     .with_file_names(vec!["wx-*".into()])
//!     .with_end_time(1_700_000_000);
//! let config = QueryConfig::new("/var/log/afd");
//!
//! let mut sink = Stdout;
//! let outcome = Query::new(criteria, config).run(&mut sink).await?;
//! # Ok(())
//! # }
//! ```

pub mod clock;
pub mod config;
pub mod criteria;
pub mod error;
pub mod pattern;
pub mod planner;
pub mod query;
pub mod resolver;
pub mod row;
pub mod scanner;
pub mod sink;

mod follow;

pub use clock::{Clock, FixedClock, SystemClock};
pub use config::QueryConfig;
pub use criteria::{CompareOp, Criteria, NameDisplay, NumericFilter, ViewFlags};
pub use error::{EngineError, Result};
pub use pattern::{PatternSet, Verdict};
pub use planner::{Plan, PlanKind};
pub use query::{GenerationIndex, Query, QueryOutcome, QueryState};
pub use resolver::{JobEntry, JobInfo, JobResolver, LookupMode, NoJobInfo, StaticJobInfo};
pub use row::Row;
pub use scanner::LineIndex;
pub use sink::{RowSink, Summary};
