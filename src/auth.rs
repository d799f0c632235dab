use crate::error::{AppError, AppResult};
use sha2::{Digest, Sha256};
use uuid::Uuid;

/// Generate an invitation secret key
///
/// # Arguments
/// * `salt` - Something tied to the addressee (e-mail address or user id)
///
/// # Returns
/// 64 lowercase hex characters
pub fn generate_secret_key(salt: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(Uuid::new_v4().as_bytes());
    hasher.update(salt.as_bytes());
    hex::encode(hasher.finalize())
}

/// Require an acting user for views behind the login wall
pub fn require_actor(actor: Option<Uuid>) -> AppResult<Uuid> {
    actor.ok_or_else(|| AppError::Unauthorized("Login required".to_string()))
}

/// Extract the acting user id from the value the host's authentication layer forwards
///
/// An empty value means anonymous; anything else must be a UUID.
pub fn parse_actor(value: &str) -> AppResult<Option<Uuid>> {
    let value = value.trim();
    if value.is_empty() {
        return Ok(None);
    }

    Uuid::parse_str(value)
        .map(Some)
        .map_err(|e| AppError::Validation(format!("Invalid user id: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_secret_keys_are_hex_and_unique() {
        let a = generate_secret_key("reader@example.com");
        let b = generate_secret_key("reader@example.com");

        assert_eq!(a.len(), 64);
        assert!(a.chars().all(|c| c.is_ascii_hexdigit()));
        assert_ne!(a, b);
    }

    #[test]
    fn test_require_actor() {
        assert!(matches!(require_actor(None), Err(AppError::Unauthorized(_))));
        let id = Uuid::new_v4();
        assert_eq!(require_actor(Some(id)).unwrap(), id);
    }

    #[test]
    fn test_parse_actor() {
        assert_eq!(parse_actor("  ").unwrap(), None);
        let id = Uuid::new_v4();
        assert_eq!(parse_actor(&id.to_string()).unwrap(), Some(id));
        assert!(parse_actor("not-a-uuid").is_err());
    }
}
