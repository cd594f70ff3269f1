//! Breakdown request types (noun module)

mod error;
mod request;

pub use error::SpecError;
pub use request::{BreakdownQuery, DateRange};
