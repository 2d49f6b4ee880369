#[cfg(test)]
use crate::features::auth::model::AuthenticatedUser;

#[cfg(test)]
use axum::{extract::Request, middleware::Next, response::Response, Router};

#[cfg(test)]
pub fn test_user() -> AuthenticatedUser {
    AuthenticatedUser {
        user_id: "test-user-id".to_string(),
        email: "test@example.com".to_string(),
    }
}

#[cfg(test)]
async fn inject_test_user_middleware(mut request: Request, next: Next) -> Response {
    request.extensions_mut().insert(test_user());
    next.run(request).await
}

/// Wrap a router so every request carries the test user, bypassing JWT
/// verification.
#[cfg(test)]
pub fn with_test_auth(router: Router) -> Router {
    router.layer(axum::middleware::from_fn(inject_test_user_middleware))
}
