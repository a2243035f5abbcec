//! # JSON Probe
//!
//! Bounded traversal and query engine for JSON documents that are too large
//! to return in full. Every operation here takes a parsed
//! [`serde_json::Value`], produces a *new* value (the source tree is never
//! mutated), and leaves output budgeting to a single final [`bound`] pass.
//!
//! ## Architecture
//!
//! ```text
//! Document (serde_json::Value, insertion order preserved)
//!     │
//!     ├──> path      - dot-notation resolution (NotFound is not null)
//!     ├──> select    - slice / key projection / predicate filter
//!     ├──> transform - map / reduce / sort
//!     ├──> search    - recursive key/value regex search, capped
//!     ├──> sample    - depth/breadth-bounded structural overview
//!     │
//!     └──> bound     - output budget enforcement + marker rendering,
//!                      applied exactly once to the final payload
//! ```
//!
//! User-supplied predicates and transform expressions run through the
//! restricted grammar in [`expr`] rather than any host-language evaluator.

mod bound;
mod error;
mod expr;
mod lint;
mod path;
mod sample;
mod search;
mod select;
mod transform;
mod value;

pub use bound::{bound, render, DEFAULT_MAX_OUTPUT_LEN, MAX_STRING_LEN};
pub use error::{ProbeError, Result};
pub use expr::Expr;
pub use lint::{lint_text, Issue, LintOptions};
pub use path::{parse_path, resolve};
pub use sample::{sample, stats, SampleOptions, Stats};
pub use search::{search, HitKind, SearchHit, SearchTarget, DEFAULT_MAX_RESULTS};
pub use select::{filter, project_keys, slice_array};
pub use transform::{map_values, reduce_values, sort_values};
pub use value::{depth_of, type_name};
