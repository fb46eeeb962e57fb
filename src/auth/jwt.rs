use crate::models::Claims;
use jsonwebtoken::{decode, DecodingKey, Validation};

/// Verify a bearer token minted by the identity provider (shared HS256
/// secret) and hand back its claims.
pub fn verify_token(token: &str, secret: &str) -> Result<Claims, String> {
    decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::default(),
    )
    .map(|data| data.claims)
    .map_err(|e| e.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::TokenType;
    use jsonwebtoken::{encode, EncodingKey, Header};
    use std::time::{SystemTime, UNIX_EPOCH};

    const SECRET: &str = "test-secret";

    fn now() -> usize {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap()
            .as_secs() as usize
    }

    fn sign(claims: &Claims) -> String {
        encode(
            &Header::default(),
            claims,
            &EncodingKey::from_secret(SECRET.as_bytes()),
        )
        .unwrap()
    }

    #[test]
    fn valid_token_round_trips_claims() {
        let claims = Claims {
            user_id: 7,
            sub: "jane".to_string(),
            role: 3,
            exp: now() + 900,
            jti: uuid::Uuid::new_v4().to_string(),
            token_type: TokenType::Access,
            employee_id: Some(42),
        };

        let verified = verify_token(&sign(&claims), SECRET).unwrap();
        assert_eq!(verified.user_id, 7);
        assert_eq!(verified.employee_id, Some(42));
        assert_eq!(verified.role, 3);
    }

    #[test]
    fn expired_token_is_rejected() {
        let claims = Claims {
            user_id: 7,
            sub: "jane".to_string(),
            role: 3,
            exp: now().saturating_sub(3600),
            jti: uuid::Uuid::new_v4().to_string(),
            token_type: TokenType::Access,
            employee_id: None,
        };

        assert!(verify_token(&sign(&claims), SECRET).is_err());
    }

    #[test]
    fn wrong_secret_is_rejected() {
        let claims = Claims {
            user_id: 7,
            sub: "jane".to_string(),
            role: 1,
            exp: now() + 900,
            jti: uuid::Uuid::new_v4().to_string(),
            token_type: TokenType::Access,
            employee_id: None,
        };

        assert!(verify_token(&sign(&claims), "other-secret").is_err());
    }
}
