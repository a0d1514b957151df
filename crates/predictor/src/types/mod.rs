//! Query and response types used by API handlers.

mod queries;
mod responses;

pub use queries::*;
pub use responses::*;
