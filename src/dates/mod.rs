//! Date resolution (verb module)
//!
//! Turns relative or absolute date expressions into the absolute UTC bounds of
//! the analysis window. The anchor time is always passed in; nothing here reads
//! the system clock.

mod error;
mod parse;
mod resolve;

pub use error::DateError;
pub use parse::relative_date_parse;
pub use resolve::{resolve_from, resolve_to, DateResolver, ResolvedWindow, ALL_TIME};
