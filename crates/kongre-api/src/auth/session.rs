//! Session relay between the browser and server-side handlers
//!
//! The browser signs in with the auth provider and hands its tokens to
//! `POST /api/auth/set`. The access token is verified here (HS256, audience check) and
//! both tokens are moved into HttpOnly cookies, so later requests carry the session
//! without exposing it to scripts.

use axum::http::{header, HeaderMap};
use chrono::Utc;
use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use kongre_core::{AppError, AuthConfig, SessionUser};
use serde::Deserialize;

/// Claims we read from the auth provider's access token
#[derive(Debug, Deserialize)]
struct AccessClaims {
    sub: String,
    exp: i64,
    #[serde(default)]
    email: Option<String>,
    #[serde(default)]
    role: Option<String>,
}

/// A verified access token
#[derive(Debug, Clone, PartialEq)]
pub struct VerifiedSession {
    pub user: SessionUser,
    /// Expiry of the access token (unix seconds)
    pub expires_at: i64,
}

#[derive(Clone)]
pub struct SessionManager {
    decoding_key: DecodingKey,
    validation: Validation,
    access_cookie: String,
    refresh_cookie: String,
    refresh_max_age_secs: i64,
    secure_cookies: bool,
}

impl SessionManager {
    pub fn new(config: &AuthConfig, secure_cookies: bool) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.set_audience(&[config.jwt_audience.as_str()]);
        validation.set_required_spec_claims(&["exp", "sub", "aud"]);

        Self {
            decoding_key: DecodingKey::from_secret(config.jwt_secret.as_bytes()),
            validation,
            access_cookie: format!("{}-access-token", config.cookie_prefix),
            refresh_cookie: format!("{}-refresh-token", config.cookie_prefix),
            refresh_max_age_secs: config.refresh_cookie_max_age_secs,
            secure_cookies,
        }
    }

    pub fn access_cookie_name(&self) -> &str {
        &self.access_cookie
    }

    pub fn refresh_cookie_name(&self) -> &str {
        &self.refresh_cookie
    }

    /// Verify an access token issued by the auth provider.
    pub fn verify(&self, access_token: &str) -> Result<VerifiedSession, AppError> {
        let data = decode::<AccessClaims>(access_token, &self.decoding_key, &self.validation)
            .map_err(|e| {
                tracing::debug!(error = %e, "Access token rejected");
                AppError::Unauthorized("Invalid or expired access token".to_string())
            })?;

        let claims = data.claims;
        Ok(VerifiedSession {
            user: SessionUser {
                id: claims.sub,
                email: claims.email,
                role: claims.role,
            },
            expires_at: claims.exp,
        })
    }

    /// `Set-Cookie` values that store both tokens.
    pub fn session_cookies(
        &self,
        session: &VerifiedSession,
        access_token: &str,
        refresh_token: &str,
    ) -> Result<[String; 2], AppError> {
        if !is_cookie_safe(access_token) || !is_cookie_safe(refresh_token) {
            return Err(AppError::InvalidInput(
                "Tokens contain characters that cannot be stored in a cookie".to_string(),
            ));
        }
        let access_max_age = (session.expires_at - Utc::now().timestamp()).max(0);
        Ok([
            self.cookie(&self.access_cookie, access_token, access_max_age),
            self.cookie(&self.refresh_cookie, refresh_token, self.refresh_max_age_secs),
        ])
    }

    /// `Set-Cookie` values that expire both tokens.
    pub fn clear_cookies(&self) -> [String; 2] {
        [
            self.cookie(&self.access_cookie, "", 0),
            self.cookie(&self.refresh_cookie, "", 0),
        ]
    }

    /// The user of the request's session cookie, if it holds a valid access token.
    pub fn current_user(&self, headers: &HeaderMap) -> Option<SessionUser> {
        let token = read_cookie(headers, &self.access_cookie)?;
        self.verify(&token).ok().map(|session| session.user)
    }

    fn cookie(&self, name: &str, value: &str, max_age_secs: i64) -> String {
        let mut cookie = format!(
            "{}={}; Path=/; HttpOnly; SameSite=Lax; Max-Age={}",
            name, value, max_age_secs
        );
        if self.secure_cookies {
            cookie.push_str("; Secure");
        }
        cookie
    }
}

/// RFC 6265 cookie-octets
fn is_cookie_safe(value: &str) -> bool {
    value
        .bytes()
        .all(|b| b.is_ascii_graphic() && !matches!(b, b'"' | b',' | b';' | b'\\'))
}

fn read_cookie(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(key, _)| *key == name)
        .map(|(_, value)| value.to_string())
        .filter(|value| !value.is_empty())
}
