use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};

use super::claims::SessionClaims;

pub fn validate_jwt(token: &str, secret: &str) -> Result<SessionClaims, String> {
    let mut validation = Validation::new(Algorithm::HS256);
    validation.validate_exp = true;

    let token_data = decode::<SessionClaims>(token, &DecodingKey::from_secret(secret.as_bytes()), &validation)
        .map_err(|e| format!("JWT validation failed: {}", e))?;

    Ok(token_data.claims)
}

/// Signs a session token for `employee_id`. Used by tooling and tests; the
/// identity provider issues tokens in production.
pub fn issue_jwt(employee_id: i32, secret: &str, ttl: Duration) -> Result<String, String> {
    let now = Utc::now();
    let claims = SessionClaims {
        sub: employee_id.to_string(),
        iat: now.timestamp(),
        exp: (now + ttl).timestamp(),
    };

    encode(
        &Header::new(Algorithm::HS256),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .map_err(|e| format!("Failed to sign JWT: {}", e))
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &str = "a-test-secret-of-some-length";

    #[test]
    fn issued_token_validates() {
        let token = issue_jwt(42, SECRET, Duration::minutes(5)).unwrap();
        let claims = validate_jwt(&token, SECRET).unwrap();
        assert_eq!(claims.employee_id().unwrap(), 42);
    }

    #[test]
    fn wrong_secret_is_rejected() {
        let token = issue_jwt(42, SECRET, Duration::minutes(5)).unwrap();
        assert!(validate_jwt(&token, "another-secret-entirely").is_err());
    }

    #[test]
    fn expired_token_is_rejected() {
        let token = issue_jwt(42, SECRET, Duration::hours(-2)).unwrap();
        assert!(validate_jwt(&token, SECRET).is_err());
    }
}
