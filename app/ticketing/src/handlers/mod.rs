//! HTTP handlers for the seat lifecycle facade (C9, §6.1).

pub mod bookings;
pub mod health;
pub mod queue;
pub mod reservations;

use ticketing_core::UserId;
use ticketing_web::AppError;

/// Enforces the authentication rule from §6.1: any request body field
/// naming a different user than the authenticated principal yields 403.
pub(crate) fn check_user_matches(authenticated: &UserId, claimed: Option<&str>) -> Result<(), AppError> {
    match claimed {
        Some(claimed) if claimed != authenticated.as_str() => {
            Err(AppError::forbidden("request body user does not match X-User-ID"))
        }
        _ => Ok(()),
    }
}
