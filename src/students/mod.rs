//! Student query resolution.
//!
//! [`StudentQueryResolver`] owns validation and lookup; [`Envelope`] is the
//! response shape both transports serialize. Backing data comes from any
//! [`StudentSource`].

mod envelope;
pub(crate) mod fixtures;
mod resolver;
mod source;

pub use envelope::{Envelope, ErrorCode, ErrorDetail, Meta};
pub use fixtures::fixture_students;
pub use resolver::{StudentListing, StudentQueryResolver, ValidatedQuery};
pub use source::{FixtureSource, StudentSource};
