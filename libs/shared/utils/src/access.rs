//! Role guards shared by the cell handlers.

use shared_models::auth::{Role, SessionUser};
use shared_models::error::AppError;

pub fn ensure_admin(user: &SessionUser) -> Result<(), AppError> {
    if user.is_admin() {
        Ok(())
    } else {
        Err(AppError::Forbidden("Admin access required".to_string()))
    }
}

pub fn ensure_role(user: &SessionUser, allowed: &[Role]) -> Result<(), AppError> {
    if allowed.contains(&user.role) {
        Ok(())
    } else {
        Err(AppError::Forbidden(format!(
            "Role '{}' may not perform this action",
            user.role
        )))
    }
}

/// Passes when the caller is `id` itself or an admin.
pub fn ensure_self_or_admin(user: &SessionUser, id: &str) -> Result<(), AppError> {
    if user.is_admin() || user.is(id) {
        Ok(())
    } else {
        Err(AppError::Forbidden("Not allowed to access another user's data".to_string()))
    }
}
