use argon2::password_hash::SaltString;
use argon2::{Argon2, PasswordHash, PasswordHasher, PasswordVerifier};
use rand::rngs::OsRng;
use validator::ValidationError;

/// Hash a password using `Argon2id`.
///
/// # Errors
///
/// Returns an error if hashing fails.
pub fn hash_password(password: &str) -> anyhow::Result<String> {
    let salt = SaltString::generate(&mut OsRng);
    let hash = Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| anyhow::anyhow!("Failed to hash password: {e}"))?;
    Ok(hash.to_string())
}

/// Verify a password against an `Argon2id` hash.
///
/// # Errors
///
/// Returns an error if the hash format is invalid.
pub fn verify_password(password: &str, hash: &str) -> anyhow::Result<bool> {
    let parsed_hash =
        PasswordHash::new(hash).map_err(|e| anyhow::anyhow!("Invalid password hash: {e}"))?;
    Ok(Argon2::default()
        .verify_password(password.as_bytes(), &parsed_hash)
        .is_ok())
}

/// Password rule for signup DTOs: 8-128 characters with at least one letter and one digit.
///
/// # Errors
///
/// Returns a validation error describing the first failed rule.
pub fn validate_password(password: &str) -> Result<(), ValidationError> {
    let len = password.chars().count();
    if !(8..=128).contains(&len) {
        return Err(ValidationError::new("password_length")
            .with_message("Password must be between 8 and 128 characters.".into()));
    }
    if !password.chars().any(char::is_alphabetic) || !password.chars().any(|c| c.is_ascii_digit())
    {
        return Err(ValidationError::new("password_strength")
            .with_message("Password must contain a letter and a digit.".into()));
    }
    Ok(())
}

/// Nicknames: 2-20 characters of letters, digits, `_` or `.`.
///
/// # Errors
///
/// Returns a validation error if the nickname has an invalid length or character.
pub fn validate_nickname(nickname: &str) -> Result<(), ValidationError> {
    let len = nickname.chars().count();
    if !(2..=20).contains(&len) {
        return Err(ValidationError::new("nickname_length")
            .with_message("Nickname must be between 2 and 20 characters.".into()));
    }
    if !nickname
        .chars()
        .all(|c| c.is_alphanumeric() || c == '_' || c == '.')
    {
        return Err(ValidationError::new("nickname_format").with_message(
            "Nickname may only contain letters, numbers, underscores and dots.".into(),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hash_and_verify() {
        let hash = hash_password("hunter22").unwrap_or_default();
        assert!(verify_password("hunter22", &hash).unwrap_or(false));
        assert!(!verify_password("hunter23", &hash).unwrap_or(true));
    }

    #[test]
    fn password_rules() {
        assert!(validate_password("short1").is_err());
        assert!(validate_password("onlyletters").is_err());
        assert!(validate_password("12345678").is_err());
        assert!(validate_password("letters123").is_ok());
    }

    #[test]
    fn nickname_rules() {
        assert!(validate_nickname("a").is_err());
        assert!(validate_nickname("has space").is_err());
        assert!(validate_nickname("jane_doe.42").is_ok());
    }
}
