use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, TimeZone, Utc};
use hmac::{Hmac, Mac};
use jwt::{Claims, Header, RegisteredClaims, SignWithKey, Token, VerifyWithKey};
use sha2::Sha256;

use crate::global::GlobalState;

/// The claims carried by an access token. Token issuance is owned by the
/// authentication service; this type only needs to agree with it on the
/// claim layout.
pub struct JwtState {
    pub user_id: i64,
    pub expiration: Option<DateTime<Utc>>,
    pub issued_at: DateTime<Utc>,
    pub not_before: Option<DateTime<Utc>>,
    pub audience: Option<String>,
}

impl JwtState {
    pub fn new(user_id: i64, valid_for: Duration) -> Self {
        let now = Utc::now();
        Self {
            user_id,
            expiration: Some(now + chrono::Duration::seconds(valid_for.as_secs() as i64)),
            issued_at: now,
            not_before: None,
            audience: None,
        }
    }

    pub fn serialize(&self, global: &Arc<GlobalState>) -> Option<String> {
        let key = Hmac::<Sha256>::new_from_slice(global.config.jwt.secret.as_bytes()).ok()?;
        let claims = Claims::new(RegisteredClaims {
            issuer: Some(global.config.jwt.issuer.clone()),
            subject: Some(self.user_id.to_string()),
            audience: self.audience.clone(),
            expiration: self.expiration.map(|x| x.timestamp() as u64),
            not_before: self.not_before.map(|x| x.timestamp() as u64),
            issued_at: Some(self.issued_at.timestamp() as u64),
            json_web_token_id: None,
        });

        claims.sign_with_key(&key).ok()
    }

    pub fn verify(global: &Arc<GlobalState>, token: &str) -> Option<Self> {
        let key = Hmac::<Sha256>::new_from_slice(global.config.jwt.secret.as_bytes()).ok()?;
        let token: Token<Header, Claims, _> = token.verify_with_key(&key).ok()?;

        let claims = token.claims();

        if claims.registered.issuer.as_ref()? != &global.config.jwt.issuer {
            return None;
        }

        let iat = Utc
            .timestamp_opt(claims.registered.issued_at? as i64, 0)
            .single()?;
        if iat > Utc::now() {
            return None;
        }

        let nbf = claims
            .registered
            .not_before
            .and_then(|x| Utc.timestamp_opt(x as i64, 0).single());
        if let Some(nbf) = nbf {
            if nbf > Utc::now() {
                return None;
            }
        }

        let exp = claims
            .registered
            .expiration
            .and_then(|x| Utc.timestamp_opt(x as i64, 0).single());
        if let Some(exp) = exp {
            if exp < Utc::now() {
                return None;
            }
        }

        let user_id = claims.registered.subject.as_ref()?.parse::<i64>().ok()?;

        Some(JwtState {
            user_id,
            expiration: exp,
            issued_at: iat,
            not_before: nbf,
            audience: claims.registered.audience.clone(),
        })
    }
}
