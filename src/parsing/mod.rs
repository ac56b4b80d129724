//! Field-level parsers for raw report tokens.
//!
//! Each parser turns one raw string into a typed value. A token that cannot
//! be parsed yields the [`IssueKind`] describing the failure; the caller
//! stores a typed null and records a field issue. Parsers never fail a file.

pub mod coordinate;
pub mod date;
pub mod grammar;
pub mod number;

pub use coordinate::{audit_coordinates, parse_coordinate, render_coordinate, CoordinateToken};
pub use date::{complement_last_seen, parse_date};
pub use grammar::Grammar;
pub use number::{forward_fill, parse_hemisphere, parse_unsigned};

use crate::models::IssueKind;

/// Outcome of parsing a single field
pub type FieldResult<T> = std::result::Result<T, IssueKind>;
