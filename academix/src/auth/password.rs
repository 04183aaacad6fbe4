use crate::error::{PortalError, Result};

pub const MIN_PASSWORD_LENGTH: usize = 8;

/// Check a new password and its confirmation
pub fn validate_new_password(password: &str, password_confirm: &str) -> Result<()> {
    if password.chars().count() < MIN_PASSWORD_LENGTH {
        return Err(PortalError::bad_request(format!(
            "Password must be at least {MIN_PASSWORD_LENGTH} characters long"
        )));
    }
    if password != password_confirm {
        return Err(PortalError::bad_request("Passwords do not match!"));
    }
    Ok(())
}

/// Hash on the blocking pool; bcrypt is deliberately slow
pub async fn hash_password(password: &str, cost: u32) -> Result<String> {
    let password = password.to_string();
    tokio::task::spawn_blocking(move || bcrypt::hash(password, cost))
        .await
        .map_err(|e| PortalError::internal_error(format!("hashing task failed: {e}")))?
        .map_err(PortalError::from)
}

pub async fn verify_password(password: &str, hash: &str) -> Result<bool> {
    let password = password.to_string();
    let hash = hash.to_string();
    tokio::task::spawn_blocking(move || bcrypt::verify(password, &hash))
        .await
        .map_err(|e| PortalError::internal_error(format!("hashing task failed: {e}")))?
        .map_err(PortalError::from)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_new_password() {
        assert!(validate_new_password("longenough", "longenough").is_ok());

        let err = validate_new_password("longenough", "different").unwrap_err();
        assert_eq!(err.to_string(), "Passwords do not match!");

        let err = validate_new_password("short", "short").unwrap_err();
        assert!(matches!(err, PortalError::BadRequest(_)));
    }

    #[tokio::test]
    async fn test_hash_and_verify() {
        let hash = hash_password("correct horse", 4).await.unwrap();
        assert!(verify_password("correct horse", &hash).await.unwrap());
        assert!(!verify_password("battery staple", &hash).await.unwrap());
    }
}
