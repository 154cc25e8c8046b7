use serde::{Deserialize, Serialize, de::DeserializeOwned};

/// Value of the `typ` claim carried by access tokens.
pub const ACCESS_TOKEN_TYPE: &str = "JWT";

/// Minimal user projection handed to the issuer by the identity lookup.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserIdentity {
    pub id: i64,
    pub first_name: String,
    pub last_name: String,
}

impl UserIdentity {
    pub fn new(id: i64, first_name: impl Into<String>, last_name: impl Into<String>) -> Self {
        Self {
            id,
            first_name: first_name.into(),
            last_name: last_name.into(),
        }
    }

    pub fn display_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }
}

/// Claims embedded in an access token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccessClaims {
    pub sub: String, // Subject (user ID)
    pub name: String,
    pub iss: String,
    pub aud: String, // Set at issuance, not checked on verification
    pub iat: i64,
    pub exp: i64,
    pub typ: String,
}

/// Claims embedded in a refresh token. Only the subject and the time window;
/// identity details are re-read from the directory when the pair is renewed.
///
/// Closed set: an access token (which carries `name`, `iss`, `aud`, `typ`)
/// does not deserialize into this type and so cannot be used as a refresh token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RefreshClaims {
    pub sub: String,
    pub iat: i64,
    pub exp: i64,
}

/// Shared view over both claim kinds so one decode path serves both.
pub trait TokenClaims: DeserializeOwned {
    fn subject(&self) -> &str;
    fn expires_at(&self) -> i64;
}

impl TokenClaims for AccessClaims {
    fn subject(&self) -> &str {
        &self.sub
    }

    fn expires_at(&self) -> i64 {
        self.exp
    }
}

impl TokenClaims for RefreshClaims {
    fn subject(&self) -> &str {
        &self.sub
    }

    fn expires_at(&self) -> i64 {
        self.exp
    }
}

/// Freshly issued credentials. Serialises as the login/refresh response body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
}
