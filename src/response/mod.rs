//! JSON response shaping
//!
//! Everything a handler sends back, success or failure, ends up as a JSON
//! envelope with exactly one of `result` / `error` at the top level. The
//! pieces here are independent: [`Envelope`] is the shape, [`ApiError`] is
//! the error side with driver-signal translation, and
//! [`JsonNormalizeLayer`] reshapes whatever the handler actually returned.

mod envelope;
mod error;
mod normalize;

pub use envelope::{error_handler, Envelope, ErrorBody};
pub use error::{ApiError, OrNotFound};
pub use normalize::{normalize_value, JsonNormalizeLayer, JsonNormalizeService};
