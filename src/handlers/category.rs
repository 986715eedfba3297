use std::sync::Arc;

use axum::{
    extract::{Extension, Form},
    response::{IntoResponse, Redirect, Response},
};
use serde::Deserialize;
use validator::Validate;

use crate::auth::CurrentUser;
use crate::error::{AppError, Submission};
use crate::handlers::poi::render_dashboard;
use crate::models::{Category, User};
use crate::server::State;

/// The form input of a `POST /category` request.
#[derive(Debug, Default, Validate, Deserialize)]
#[serde(default)]
pub(crate) struct CategoryForm {
    #[validate(length(min = 1, message = "Category name is required"))]
    name: String,
    description: String,
}

/// Handler for `POST /category`
pub(crate) async fn create(
    Extension(state): Extension<Arc<State>>,
    CurrentUser(user): CurrentUser,
    Form(input): Form<CategoryForm>,
) -> Result<Response, AppError> {
    match add_category(&state, &user, input).await {
        Ok(category) => {
            tracing::info!("{} added category {}", user.id, category.id);
            Ok(Redirect::to("/home").into_response())
        }
        Err(rejection) => {
            render_dashboard(&state, &user, rejection.status, rejection.errors).await
        }
    }
}

async fn add_category(state: &State, user: &User, mut input: CategoryForm) -> Submission<Category> {
    input.name = input.name.trim().to_owned();
    input.validate().map_err(AppError::from)?;

    let category = Category::new(&input.name, &input.description, &user.id);
    state.store.insert_category(&category).await?;
    Ok(category)
}
