// SPDX-License-Identifier: MIT OR Apache-2.0
//! HTTP status → error taxonomy mapping (§6, §4.7).

use dgw_core::ErrorKind;
use reqwest::StatusCode;

/// Map a backend HTTP response status to the gateway's error taxonomy.
/// `None` means the status indicates success (200/201).
#[must_use]
pub fn map_status(status: StatusCode) -> Option<ErrorKind> {
    match status.as_u16() {
        200 | 201 => None,
        400 => Some(ErrorKind::InvalidArgument),
        401 | 403 => Some(ErrorKind::BackendAuthFailed),
        404 => Some(ErrorKind::NotFound),
        409 => Some(ErrorKind::Conflict),
        429 => Some(ErrorKind::RateLimited),
        500..=599 => Some(ErrorKind::BackendUnavailable),
        _ => Some(ErrorKind::BackendUnavailable),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn success_statuses_map_to_none() {
        assert_eq!(map_status(StatusCode::OK), None);
        assert_eq!(map_status(StatusCode::CREATED), None);
    }

    #[test]
    fn client_error_statuses_map_exactly() {
        assert_eq!(map_status(StatusCode::BAD_REQUEST), Some(ErrorKind::InvalidArgument));
        assert_eq!(map_status(StatusCode::UNAUTHORIZED), Some(ErrorKind::BackendAuthFailed));
        assert_eq!(map_status(StatusCode::FORBIDDEN), Some(ErrorKind::BackendAuthFailed));
        assert_eq!(map_status(StatusCode::NOT_FOUND), Some(ErrorKind::NotFound));
        assert_eq!(map_status(StatusCode::CONFLICT), Some(ErrorKind::Conflict));
        assert_eq!(map_status(StatusCode::TOO_MANY_REQUESTS), Some(ErrorKind::RateLimited));
    }

    #[test]
    fn server_errors_map_to_backend_unavailable() {
        assert_eq!(
            map_status(StatusCode::INTERNAL_SERVER_ERROR),
            Some(ErrorKind::BackendUnavailable)
        );
        assert_eq!(
            map_status(StatusCode::SERVICE_UNAVAILABLE),
            Some(ErrorKind::BackendUnavailable)
        );
    }
}
