//! Resolves the [`Caller`] from the identity headers set by the auth proxy.

use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use axum::http::HeaderMap;
use std::convert::Infallible;
use tracing::debug;
use crate::access::{Caller, Role};
use crate::domain::value_objects::UserId;

pub const USER_ID_HEADER: &str = "x-user-id";
pub const ROLES_HEADER: &str = "x-user-roles";

/// Missing or blank user header means anonymous. Unknown roles are dropped.
pub fn caller_from_headers(headers: &HeaderMap) -> Caller {
    let header = |name: &str| headers.get(name).and_then(|v| v.to_str().ok());
    let user_id = header(USER_ID_HEADER).and_then(UserId::new);
    let roles = header(ROLES_HEADER)
        .into_iter()
        .flat_map(|raw| raw.split(','))
        .filter(|r| !r.trim().is_empty())
        .filter_map(|r| match r.parse::<Role>() {
            Ok(role) => Some(role),
            Err(e) => { debug!(error = %e, "ignoring role"); None }
        });
    Caller::new(user_id, roles)
}

#[axum::async_trait]
impl<S: Send + Sync> FromRequestParts<S> for Caller {
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(caller_from_headers(&parts.headers))
    }
}
