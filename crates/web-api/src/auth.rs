//! 请求认证
//!
//! 令牌从自定义头 `X-HERO-AUTH-TOKEN` 提取，缺失或空白直接拒绝。

use axum::http::HeaderMap;
use domain::{AuthUser, AuthUserToken, AUTH_TOKEN_HEADER};

use crate::{error::ApiError, state::AppState};

pub fn extract_token(headers: &HeaderMap) -> Result<AuthUserToken, ApiError> {
    let value = headers
        .get(AUTH_TOKEN_HEADER)
        .and_then(|header| header.to_str().ok())
        .ok_or_else(|| ApiError::unauthorized("missing auth token header"))?;

    let token = AuthUserToken::from_value(value);
    if token.is_invalid() {
        return Err(ApiError::unauthorized("blank auth token"));
    }
    Ok(token)
}

pub async fn resolve_user(state: &AppState, headers: &HeaderMap) -> Result<AuthUser, ApiError> {
    let token = extract_token(headers)?;
    let user = state.auth_service.resolve_auth_user(&token).await?;
    Ok(user)
}
