//! JWT 令牌服务实现
//!
//! HS256 签名，负载携带 `type` 声明；只有 `accessToken` 类型的令牌
//! 会被认证链路接受（类型门控由应用层执行）。

use chrono::{Duration, Utc};
use config::JwtConfig;
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use application::token::{TokenError, TokenService};
use domain::{TokenPayload, UserId, ACCESS_TOKEN_TYPE};

#[derive(Debug, Serialize, Deserialize)]
struct Claims {
    sub: String,
    aud: String,
    iss: String,
    exp: i64,
    #[serde(rename = "type")]
    token_type: String,
}

pub struct JwtTokenService {
    config: JwtConfig,
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
}

impl JwtTokenService {
    pub fn new(config: JwtConfig) -> Self {
        let encoding_key = EncodingKey::from_secret(config.secret.as_ref());
        let decoding_key = DecodingKey::from_secret(config.secret.as_ref());

        let mut validation = Validation::default();
        validation.set_audience(&[config.audience.clone()]);
        validation.set_issuer(&[config.issuer.clone()]);

        Self {
            config,
            encoding_key,
            decoding_key,
            validation,
        }
    }
}

impl TokenService for JwtTokenService {
    fn issue(&self, uid: UserId) -> Result<String, TokenError> {
        let exp = Utc::now() + Duration::hours(self.config.expiration_hours);

        let claims = Claims {
            sub: Uuid::from(uid).to_string(),
            aud: self.config.audience.clone(),
            iss: self.config.issuer.clone(),
            exp: exp.timestamp(),
            token_type: ACCESS_TOKEN_TYPE.to_string(),
        };

        encode(&Header::default(), &claims, &self.encoding_key)
            .map_err(|err| TokenError::issue(err.to_string()))
    }

    fn verify(&self, token: &str) -> Result<TokenPayload, TokenError> {
        let data = decode::<Claims>(token, &self.decoding_key, &self.validation)
            .map_err(|err| TokenError::invalid(err.to_string()))?;

        let id = Uuid::parse_str(&data.claims.sub)
            .map_err(|_| TokenError::invalid("subject is not a valid id"))?;

        Ok(TokenPayload {
            id: UserId::from(id),
            aud: data.claims.aud,
            iss: data.claims.iss,
            exp: data.claims.exp,
            token_type: data.claims.token_type,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn service() -> JwtTokenService {
        JwtTokenService::new(JwtConfig {
            secret: "unit-test-secret-key-with-enough-length!".to_string(),
            expiration_hours: 1,
            audience: "groupfit".to_string(),
            issuer: "groupfit-server".to_string(),
        })
    }

    #[test]
    fn test_issue_and_verify_round_trip() {
        let service = service();
        let uid = UserId::from(Uuid::new_v4());

        let token = service.issue(uid).unwrap();
        let payload = service.verify(&token).unwrap();

        assert_eq!(payload.id, uid);
        assert_eq!(payload.token_type, ACCESS_TOKEN_TYPE);
        assert!(payload.ensure_access_token().is_ok());
    }

    #[test]
    fn test_verify_rejects_garbage() {
        let service = service();
        assert!(service.verify("not-a-token").is_err());
    }

    #[test]
    fn test_verify_rejects_foreign_audience() {
        let issuing = JwtTokenService::new(JwtConfig {
            secret: "unit-test-secret-key-with-enough-length!".to_string(),
            expiration_hours: 1,
            audience: "someone-else".to_string(),
            issuer: "groupfit-server".to_string(),
        });
        let token = issuing.issue(UserId::from(Uuid::new_v4())).unwrap();

        assert!(service().verify(&token).is_err());
    }
}
