//! Caller identity forwarded by the authentication gateway.
//!
//! The gateway in front of this server checks credentials and forwards who
//! the caller is as headers:
//!
//! ```text
//! x-user-id:    65f1c0...      (required)
//! x-user-role:  user | admin   (default user)
//! x-user-email: asha@example   (optional)
//! ```
//!
//! Handlers take [`Identity`] for any signed-in caller and [`AdminIdentity`]
//! for admin-only routes.

use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use axum::http::HeaderMap;
use tracing::debug;

use culturaft_core::{Requester, Role};

use crate::error::ApiError;

pub const USER_ID_HEADER: &str = "x-user-id";
pub const USER_ROLE_HEADER: &str = "x-user-role";
pub const USER_EMAIL_HEADER: &str = "x-user-email";

/// A signed-in caller.
#[derive(Debug, Clone)]
pub struct Identity(pub Requester);

/// A signed-in caller with the admin role.
#[derive(Debug, Clone)]
pub struct AdminIdentity(pub Requester);

fn header<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|v| !v.is_empty())
}

/// Reads the gateway headers.
pub fn requester_from_headers(headers: &HeaderMap) -> Result<Requester, ApiError> {
    let user_id = header(headers, USER_ID_HEADER).ok_or(ApiError::Unauthenticated)?;

    let role = match header(headers, USER_ROLE_HEADER) {
        Some(raw) => raw.parse::<Role>()?,
        None => Role::User,
    };

    Ok(Requester {
        user_id: user_id.to_string(),
        role,
        email: header(headers, USER_EMAIL_HEADER).map(String::from),
    })
}

impl<S> FromRequestParts<S> for Identity
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let requester = requester_from_headers(&parts.headers)?;
        debug!(user_id = %requester.user_id, role = ?requester.role, "Caller identified");
        Ok(Identity(requester))
    }
}

impl<S> FromRequestParts<S> for AdminIdentity
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Identity(requester) = Identity::from_request_parts(parts, state).await?;
        if !requester.is_admin() {
            return Err(ApiError::AdminOnly);
        }
        Ok(AdminIdentity(requester))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn headers(pairs: &[(&'static str, &'static str)]) -> HeaderMap {
        let mut map = HeaderMap::new();
        for (k, v) in pairs {
            map.insert(*k, HeaderValue::from_static(v));
        }
        map
    }

    #[test]
    fn test_user_defaults() {
        let requester = requester_from_headers(&headers(&[("x-user-id", "u1")])).unwrap();
        assert_eq!(requester.user_id, "u1");
        assert_eq!(requester.role, Role::User);
        assert!(requester.email.is_none());
    }

    #[test]
    fn test_admin_with_email() {
        let requester = requester_from_headers(&headers(&[
            ("x-user-id", "a1"),
            ("x-user-role", "admin"),
            ("x-user-email", "ops@culturaft.example"),
        ]))
        .unwrap();
        assert!(requester.is_admin());
        assert_eq!(requester.email.as_deref(), Some("ops@culturaft.example"));
    }

    #[test]
    fn test_missing_id_and_bad_role() {
        let err = requester_from_headers(&headers(&[("x-user-role", "admin")])).unwrap_err();
        assert!(matches!(err, ApiError::Unauthenticated));

        let err = requester_from_headers(&headers(&[("x-user-id", "u1"), ("x-user-role", "root")]))
            .unwrap_err();
        assert!(matches!(err, ApiError::Core(_)));
    }
}
