use std::sync::Arc;

use axum::{
    async_trait,
    extract::{Extension, FromRequest, RequestParts},
    http::{header, HeaderMap},
};
use cookie::{time::Duration, Cookie, CookieJar, Key, SameSite};

use crate::{
    constants::{SESSION_COOKIE_NAME, SESSION_DURATION_SECS},
    error::AppError,
    models::User,
    server::State,
};

/// The verified session of a request: the id of the user it was issued to.
///
/// Only the cookie's signature is checked here. Use [`CurrentUser`] when the user record is needed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    pub user_id: String,
}

/// The user making a request, loaded fresh from the store.
#[derive(Debug, Clone)]
pub struct CurrentUser(pub User);

#[async_trait]
impl<B> FromRequest<B> for Session
where
    B: Send,
{
    type Rejection = AppError;

    async fn from_request(req: &mut RequestParts<B>) -> Result<Self, Self::Rejection> {
        let Extension(state) = Extension::<Arc<State>>::from_request(req).await?;

        match verified_user_id(req.headers(), &state.session_key) {
            Some(user_id) => Ok(Session { user_id }),
            None => Err(AppError::Unauthenticated),
        }
    }
}

#[async_trait]
impl<B> FromRequest<B> for CurrentUser
where
    B: Send,
{
    type Rejection = AppError;

    async fn from_request(req: &mut RequestParts<B>) -> Result<Self, Self::Rejection> {
        let Extension(state) = Extension::<Arc<State>>::from_request(req).await?;
        let session = Session::from_request(req).await?;

        match state.store.user_by_id(&session.user_id).await? {
            Some(user) => Ok(CurrentUser(user)),
            None => {
                tracing::debug!("Session refers to missing user {}", session.user_id);
                Err(AppError::Unauthenticated)
            }
        }
    }
}

/// Read the session cookie from `headers` and return its user id if the signature holds.
fn verified_user_id(headers: &HeaderMap, key: &Key) -> Option<String> {
    let mut jar = CookieJar::new();
    for value in headers.get_all(header::COOKIE) {
        let value = match value.to_str() {
            Ok(value) => value,
            Err(_) => continue,
        };
        for pair in value.split(';') {
            if let Ok(cookie) = Cookie::parse(pair.trim().to_owned()) {
                jar.add_original(cookie);
            }
        }
    }

    jar.signed(key)
        .get(SESSION_COOKIE_NAME)
        .map(|cookie| cookie.value().to_owned())
        .filter(|user_id| !user_id.is_empty())
}

/// A `Set-Cookie` value starting a session for `user_id`.
pub(crate) fn session_cookie(key: &Key, user_id: &str, secure: bool) -> String {
    let cookie = Cookie::build(SESSION_COOKIE_NAME, user_id.to_owned())
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .secure(secure)
        .max_age(Duration::seconds(SESSION_DURATION_SECS))
        .finish();

    let mut jar = CookieJar::new();
    jar.signed_mut(key).add(cookie);
    jar.get(SESSION_COOKIE_NAME)
        .map(|signed| signed.to_string())
        .unwrap_or_default()
}

/// A `Set-Cookie` value that ends the session.
pub(crate) fn removal_cookie() -> String {
    let mut cookie = Cookie::build(SESSION_COOKIE_NAME, "")
        .path("/")
        .http_only(true)
        .finish();
    cookie.make_removal();
    cookie.to_string()
}
