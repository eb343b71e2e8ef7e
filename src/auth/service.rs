//! Authentication service
//!
//! Holds the signing secret and turns bearer tokens into actors.

use crate::models::Actor;

use super::jwt::{generate_token, verify_token, JwtError};

#[derive(Clone)]
pub struct AuthService {
    jwt_secret: String,
    token_ttl_seconds: i64,
}

impl AuthService {
    pub fn new(jwt_secret: String, token_ttl_seconds: i64) -> Self {
        Self {
            jwt_secret,
            token_ttl_seconds,
        }
    }

    pub fn authenticate(&self, token: &str) -> Result<Actor, JwtError> {
        verify_token(token, &self.jwt_secret)?.actor()
    }

    pub fn issue_token(&self, actor: &Actor) -> Result<String, JwtError> {
        generate_token(actor, &self.jwt_secret, self.token_ttl_seconds)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Role;
    use uuid::Uuid;

    #[test]
    fn test_issue_then_authenticate() {
        let service = AuthService::new("secret".to_string(), 600);
        let actor = Actor::new(Uuid::new_v4(), Role::Admin);
        let token = service.issue_token(&actor).unwrap();
        assert_eq!(service.authenticate(&token).unwrap(), actor);
    }
}
