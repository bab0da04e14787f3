use bankdesk_core::{FetchError, SessionUser, StoredSession};
use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize)]
pub(crate) struct LoginRequest<'a> {
    pub email: &'a str,
    pub password: &'a str,
}

/// Shortest password the register endpoint accepts.
pub const MIN_PASSWORD_LEN: usize = 6;

/// Body of `POST /auth/register`. New accounts always get the `user` role.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NewRegistration {
    pub name: String,
    pub email: String,
    pub password: String,
}

impl NewRegistration {
    /// Build a registration with surrounding whitespace stripped from the
    /// name and email.
    pub fn new(name: &str, email: &str, password: &str) -> Self {
        Self {
            name: name.trim().to_string(),
            email: email.trim().to_string(),
            password: password.to_string(),
        }
    }

    /// Reject what the server would refuse anyway.
    pub fn validate(&self) -> Result<(), String> {
        if self.name.is_empty() {
            return Err("name must not be empty".to_string());
        }
        if !self.email.contains('@') {
            return Err(format!("'{}' is not a valid email address", self.email));
        }
        if self.password.chars().count() < MIN_PASSWORD_LEN {
            return Err(format!(
                "password must be at least {} characters",
                MIN_PASSWORD_LEN
            ));
        }
        Ok(())
    }
}

#[derive(Debug, Deserialize)]
struct TokenBody {
    access_token: String,
}

/// Answer of `POST /auth/login`.
///
/// The API nests the token (`{data, token: {access_token}}`); older builds
/// answer flat (`{access_token, user}`). Both are accepted.
#[derive(Debug, Deserialize)]
pub(crate) struct LoginResponse {
    #[serde(default)]
    access_token: Option<String>,
    #[serde(default)]
    token: Option<TokenBody>,
    #[serde(default, alias = "data")]
    user: Option<SessionUser>,
}

impl LoginResponse {
    pub fn into_session(self) -> Result<StoredSession, FetchError> {
        let token = self
            .access_token
            .or(self.token.map(|t| t.access_token))
            .filter(|t| !t.is_empty())
            .ok_or_else(|| FetchError::malformed("login response carries no access token"))?;
        Ok(StoredSession {
            token,
            user: self.user,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn parse(value: serde_json::Value) -> Result<StoredSession, FetchError> {
        serde_json::from_value::<LoginResponse>(value)
            .unwrap()
            .into_session()
    }

    #[test]
    fn nested_token_shape() {
        let session = parse(json!({
            "success": true,
            "message": "Login successful",
            "data": {
                "id": 1,
                "name": "Admin",
                "email": "admin@abcbank.com",
                "role": "admin",
                "is_active": true,
                "created_at": "2024-01-01T00:00:00"
            },
            "token": { "access_token": "jwt", "token_type": "bearer" }
        }))
        .unwrap();
        assert_eq!(session.token, "jwt");
        assert!(session.user.unwrap().is_admin());
    }

    #[test]
    fn flat_token_shape() {
        let session = parse(json!({
            "access_token": "jwt",
            "user": { "id": 2, "name": "M", "email": "m@abcbank.com", "role": "manager" }
        }))
        .unwrap();
        assert_eq!(session.token, "jwt");
        assert!(session.user.unwrap().can_manage_users());
    }

    #[test]
    fn registration_is_trimmed_and_checked() {
        let registration = NewRegistration::new("  Nia ", " nia@abcbank.com ", "hunter22");
        assert_eq!(registration.name, "Nia");
        assert_eq!(registration.email, "nia@abcbank.com");
        assert_eq!(registration.validate(), Ok(()));

        let short = NewRegistration::new("Nia", "nia@abcbank.com", "12345");
        assert_eq!(
            short.validate(),
            Err("password must be at least 6 characters".to_string())
        );
        assert!(NewRegistration::new("   ", "nia@abcbank.com", "hunter22")
            .validate()
            .is_err());
        assert!(NewRegistration::new("Nia", "nia", "hunter22").validate().is_err());
    }

    #[test]
    fn missing_token_is_malformed() {
        let err = parse(json!({ "success": true, "message": "ok" })).unwrap_err();
        assert!(matches!(err, FetchError::MalformedResponse(_)));
    }
}
