//! Shared response envelope types for API handlers.
//!
//! `/api` responses use a `{ "data": ... }` envelope. `/search` is the
//! exception and returns a bare JSON array.

use serde::Serialize;

/// Standard `{ "data": T }` response envelope.
#[derive(Debug, Serialize)]
pub struct DataResponse<T: Serialize> {
    pub data: T,
}
