//! Base URL for links minted during a request.

use std::convert::Infallible;

use axum::extract::FromRequestParts;
use axum::http::header;
use axum::http::request::Parts;

use crate::state::AppState;

/// `scheme://host` the caller reached us on, or the configured public URL.
#[derive(Debug, Clone)]
pub struct RequestBase(pub String);

impl FromRequestParts<AppState> for RequestBase {
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let host = parts
            .headers
            .get(header::HOST)
            .and_then(|v| v.to_str().ok());
        Ok(RequestBase(state.links.base(host)))
    }
}
