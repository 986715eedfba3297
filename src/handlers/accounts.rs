use std::sync::Arc;

use axum::{
    extract::{Extension, Form},
    http::{header, StatusCode},
    response::{IntoResponse, Redirect, Response},
};
use minijinja::context;
use serde::Deserialize;
use validator::Validate;

use crate::auth::{removal_cookie, session_cookie, CurrentUser};
use crate::constants::RE_PERSON_NAME;
use crate::error::{AppError, Submission};
use crate::models::User;
use crate::server::State;
use crate::utils::pass::{check_password, hash_password, PasswordCheck};
use crate::views::UserView;

/// The form input of `POST /signup` and `POST /settings`.
#[derive(Debug, Default, Validate, Deserialize)]
#[serde(default)]
pub(crate) struct ProfileForm {
    #[validate(regex(
        path = "RE_PERSON_NAME",
        message = "First name is required and may only contain letters, spaces, apostrophes, dashes and periods"
    ))]
    first_name: String,
    #[validate(regex(
        path = "RE_PERSON_NAME",
        message = "Last name is required and may only contain letters, spaces, apostrophes, dashes and periods"
    ))]
    last_name: String,
    #[validate(email(message = "Must be a valid email address."))]
    email: String,
    #[validate(length(
        min = 8,
        max = 128,
        message = "Minimum length is 8 characters, maximum is 128"
    ))]
    password: String,
}

impl ProfileForm {
    fn trimmed(mut self) -> Self {
        self.first_name = self.first_name.trim().to_owned();
        self.last_name = self.last_name.trim().to_owned();
        self.email = self.email.trim().to_owned();
        self
    }
}

/// The form input of a `POST /login` request.
#[derive(Debug, Default, Validate, Deserialize)]
#[serde(default)]
pub(crate) struct LoginForm {
    #[validate(email(message = "Must be a valid email address."))]
    email: String,
    #[validate(length(min = 1, message = "Password is required"))]
    password: String,
}

/// Redirect to `location` with a fresh session for `user_id`.
fn signed_in(state: &State, user_id: &str, location: &str) -> Response {
    let cookie = session_cookie(&state.session_key, user_id, state.secure_cookies);
    ([(header::SET_COOKIE, cookie)], Redirect::to(location)).into_response()
}

/// Handler for `GET /`
pub(crate) async fn landing(
    Extension(state): Extension<Arc<State>>,
    user: Option<CurrentUser>,
) -> Result<Response, AppError> {
    let user = user.map(|CurrentUser(user)| UserView::from(&user));

    state.views.render_with_status(
        StatusCode::OK,
        "main.html",
        context! {
            title => "Poi App",
            signed_in => user.is_some(),
            user => user,
            errors => Vec::<String>::new(),
        },
    )
}

/// Handler for `GET /signup`
pub(crate) async fn show_signup(
    Extension(state): Extension<Arc<State>>,
) -> Result<Response, AppError> {
    render_signup(&state, &ProfileForm::default(), StatusCode::OK, Vec::new())
}

fn render_signup(
    state: &State,
    input: &ProfileForm,
    status: StatusCode,
    errors: Vec<String>,
) -> Result<Response, AppError> {
    state.views.render_with_status(
        status,
        "signup.html",
        context! {
            title => "Sign up",
            form => context! {
                first_name => &input.first_name,
                last_name => &input.last_name,
                email => &input.email,
            },
            errors => errors,
        },
    )
}

/// Handler for `POST /signup`
pub(crate) async fn signup(
    Extension(state): Extension<Arc<State>>,
    Form(input): Form<ProfileForm>,
) -> Result<Response, AppError> {
    let input = input.trimmed();
    match register(&state, &input).await {
        Ok(user) => {
            tracing::info!("Registered user {}", user.id);
            Ok(signed_in(&state, &user.id, "/home"))
        }
        Err(rejection) => render_signup(&state, &input, rejection.status, rejection.errors),
    }
}

async fn register(state: &State, input: &ProfileForm) -> Submission<User> {
    input.validate().map_err(AppError::from)?;

    if state.store.user_by_email(&input.email).await?.is_some() {
        return Err(AppError::EmailTaken.into());
    }

    let user = User::new(
        &input.first_name,
        &input.last_name,
        &input.email,
        hash_password(&input.password)?,
    );
    state.store.insert_user(&user).await?;
    Ok(user)
}

/// Handler for `GET /login`
pub(crate) async fn show_login(
    Extension(state): Extension<Arc<State>>,
) -> Result<Response, AppError> {
    render_login(&state, "", StatusCode::OK, Vec::new())
}

fn render_login(
    state: &State,
    email: &str,
    status: StatusCode,
    errors: Vec<String>,
) -> Result<Response, AppError> {
    state.views.render_with_status(
        status,
        "login.html",
        context! {
            title => "Log in",
            form => context! { email => email },
            errors => errors,
        },
    )
}

/// Handler for `POST /login`
pub(crate) async fn login(
    Extension(state): Extension<Arc<State>>,
    Form(mut input): Form<LoginForm>,
) -> Result<Response, AppError> {
    input.email = input.email.trim().to_owned();
    match authenticate(&state, &input).await {
        Ok(user) => {
            tracing::debug!("{} logged in", user.id);
            Ok(signed_in(&state, &user.id, "/home"))
        }
        Err(rejection) => render_login(&state, &input.email, rejection.status, rejection.errors),
    }
}

async fn authenticate(state: &State, input: &LoginForm) -> Submission<User> {
    input.validate().map_err(AppError::from)?;

    let mut user = state
        .store
        .user_by_email(&input.email)
        .await?
        .ok_or(AppError::UnknownEmail)?;

    match check_password(&user.password, &input.password) {
        PasswordCheck::Mismatch => return Err(AppError::PasswordMismatch.into()),
        PasswordCheck::Valid => {}
        PasswordCheck::ValidOutdated => {
            // password needs to be updated
            user.password = hash_password(&input.password)?;
            state.store.update_user(&user).await?;
            tracing::info!("Rehashed the password of {}", user.id);
        }
    }

    Ok(user)
}

/// Handler for `GET /logout`
pub(crate) async fn logout() -> Response {
    ([(header::SET_COOKIE, removal_cookie())], Redirect::to("/")).into_response()
}

/// Handler for `GET /settings`
pub(crate) async fn show_settings(
    Extension(state): Extension<Arc<State>>,
    CurrentUser(user): CurrentUser,
) -> Result<Response, AppError> {
    let input = ProfileForm {
        first_name: user.first_name.clone(),
        last_name: user.last_name.clone(),
        email: user.email.clone(),
        password: String::new(),
    };
    render_settings(&state, &user, &input, StatusCode::OK, Vec::new())
}

fn render_settings(
    state: &State,
    user: &User,
    input: &ProfileForm,
    status: StatusCode,
    errors: Vec<String>,
) -> Result<Response, AppError> {
    state.views.render_with_status(
        status,
        "settings.html",
        context! {
            title => "Settings",
            user => UserView::from(user),
            form => context! {
                first_name => &input.first_name,
                last_name => &input.last_name,
                email => &input.email,
            },
            errors => errors,
        },
    )
}

/// Handler for `POST /settings`
pub(crate) async fn update_settings(
    Extension(state): Extension<Arc<State>>,
    CurrentUser(user): CurrentUser,
    Form(input): Form<ProfileForm>,
) -> Result<Response, AppError> {
    let input = input.trimmed();
    match save_profile(&state, user.clone(), &input).await {
        Ok(()) => {
            tracing::info!("{} updated their settings", user.id);
            Ok(Redirect::to("/home").into_response())
        }
        Err(rejection) => {
            render_settings(&state, &user, &input, rejection.status, rejection.errors)
        }
    }
}

async fn save_profile(state: &State, mut user: User, input: &ProfileForm) -> Submission<()> {
    input.validate().map_err(AppError::from)?;

    if let Some(owner) = state.store.user_by_email(&input.email).await? {
        if owner.id != user.id {
            return Err(AppError::EmailTaken.into());
        }
    }

    user.rename(&input.first_name, &input.last_name);
    user.email = input.email.clone();
    user.password = hash_password(&input.password)?;
    state.store.update_user(&user).await?;
    Ok(())
}

/// Handler for `POST /settings/delete`
pub(crate) async fn delete_account(
    Extension(state): Extension<Arc<State>>,
    CurrentUser(user): CurrentUser,
) -> Result<Response, AppError> {
    state.store.delete_user(&user.id).await?;
    tracing::info!("Deleted account {}", user.id);

    Ok(([(header::SET_COOKIE, removal_cookie())], Redirect::to("/")).into_response())
}
