use axum::http::{HeaderMap, header::AUTHORIZATION};
use todo_core::Claims;

use crate::{error::ApiError, handler::ApiHandler};

/// Extract the raw bearer token from the `Authorization` header.
///
/// `Ok(None)` when the header is absent.
fn bearer(headers: &HeaderMap) -> Result<Option<&str>, ApiError> {
    let Some(value) = headers.get(AUTHORIZATION) else {
        return Ok(None);
    };
    let value = value
        .to_str()
        .map_err(|_| ApiError::Unauthorized("Token error".into()))?;

    let mut parts = value.split(' ');
    let (Some(scheme), Some(token), None) = (parts.next(), parts.next(), parts.next()) else {
        return Err(ApiError::Unauthorized("Token error".into()));
    };
    if !scheme.eq_ignore_ascii_case("bearer") {
        return Err(ApiError::Unauthorized("Token malformatted".into()));
    }
    Ok(Some(token))
}

/// Identify the caller of a request.
///
/// A present token must be valid. A missing token is fine unless `required`.
pub(crate) fn identify<H: ApiHandler>(
    handler: &H,
    headers: &HeaderMap,
    required: bool,
) -> Result<Option<Claims>, ApiError> {
    match bearer(headers)? {
        Some(token) => handler
            .verify_token(token)
            .map(Some)
            .map_err(|_| ApiError::Unauthorized("Invalid token".into())),
        None if required => Err(ApiError::Unauthorized("No token provided".into())),
        None => Ok(None),
    }
}
