use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// User identity extracted from a verified bearer token.
///
/// Token issuance lives in the identity service; this backend only verifies
/// signatures and reads the claims it needs for ownership checks.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct AuthenticatedUser {
    pub user_id: String,
    pub email: String,
}
