use axum::{
    body::Bytes,
    extract::State,
    http::{header, HeaderMap, StatusCode},
    Json,
};
use serde::Deserialize;
use serde_json::{json, Value};

use crate::state::{Account, REFRESH_COOKIE, REFRESH_TTL_SECS, TOKEN_TTL_SECS};
use crate::{bearer_token, error, ApiResult, Db};

type WithCookie<T> = ([(header::HeaderName, String); 1], T);

#[derive(Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Deserialize)]
pub struct RefreshRequest {
    #[serde(default)]
    pub refresh_token: Option<String>,
}

fn user_json(account: &Account) -> Value {
    json!({
        "id": account.id,
        "email": account.email,
        "first_name": account.first_name,
        "last_name": account.last_name,
        "organization_id": account.organization_id,
        "roles": account.roles,
    })
}

fn refresh_cookie(token: &str, max_age: u64) -> [(header::HeaderName, String); 1] {
    [(
        header::SET_COOKIE,
        format!("{REFRESH_COOKIE}={token}; Path=/; Max-Age={max_age}; HttpOnly"),
    )]
}

/// Value of the `name` cookie sent by the caller, if any.
pub(crate) fn request_cookie<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|v| v.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(key, value)| *key == name && !value.is_empty())
        .map(|(_, value)| value)
}

/// The refresh token travels only in an HttpOnly cookie, never in the body.
pub async fn login(
    State(db): State<Db>,
    Json(input): Json<LoginRequest>,
) -> ApiResult<WithCookie<Json<Value>>> {
    let mut platform = db.write().await;
    let account = platform
        .accounts
        .iter()
        .find(|a| a.email.eq_ignore_ascii_case(&input.email) && a.password == input.password)
        .cloned()
        .ok_or_else(|| error(StatusCode::UNAUTHORIZED, "invalid credentials"))?;
    let (access, refresh) = platform.issue_tokens(account.id);
    Ok((
        refresh_cookie(&refresh, REFRESH_TTL_SECS),
        Json(json!({
            "access_token": access,
            "expires_in": TOKEN_TTL_SECS,
            "token_type": "Bearer",
            "user": user_json(&account),
        })),
    ))
}

/// Reads the refresh token from the cookie first, then from a JSON body.
/// Rotates both tokens: the presented pair stops working.
pub async fn refresh(
    State(db): State<Db>,
    headers: HeaderMap,
    body: Bytes,
) -> ApiResult<WithCookie<Json<Value>>> {
    let presented = match request_cookie(&headers, REFRESH_COOKIE) {
        Some(token) => Some(token.to_string()),
        None => serde_json::from_slice::<RefreshRequest>(&body)
            .ok()
            .and_then(|r| r.refresh_token)
            .filter(|t| !t.is_empty()),
    };
    let presented =
        presented.ok_or_else(|| error(StatusCode::BAD_REQUEST, "refresh token is required"))?;

    let mut platform = db.write().await;
    let (access, refresh) = platform
        .rotate_tokens(&presented)
        .ok_or_else(|| error(StatusCode::UNAUTHORIZED, "invalid refresh token"))?;
    Ok((
        refresh_cookie(&refresh, REFRESH_TTL_SECS),
        Json(json!({
            "access_token": access,
            "expires_in": TOKEN_TTL_SECS,
        })),
    ))
}

/// Revokes the presented access token and every refresh token of its owner.
pub async fn logout(State(db): State<Db>, headers: HeaderMap) -> ApiResult<WithCookie<StatusCode>> {
    let mut platform = db.write().await;
    let account_id = bearer_token(&headers)
        .and_then(|token| platform.access_tokens.remove(token))
        .ok_or_else(|| error(StatusCode::UNAUTHORIZED, "not logged in"))?;
    platform
        .refresh_tokens
        .retain(|_, grant| grant.account_id != account_id);
    Ok((refresh_cookie("", 0), StatusCode::NO_CONTENT))
}
