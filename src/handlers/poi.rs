use std::collections::HashMap;
use std::sync::Arc;

use axum::{
    extract::{Extension, Form, Multipart, Path},
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
};
use minijinja::context;
use validator::Validate;

use crate::actions::{authorize, is_allowed, Delete, Read, Reassign, Report, Update};
use crate::auth::CurrentUser;
use crate::error::{AppError, Submission};
use crate::handlers::{read_multipart, PoiForm};
use crate::models::{Category, PointOfInterest, User};
use crate::server::State;
use crate::views::{CategoryView, PoiView, UserView};

/// Handler for `GET /home`
pub(crate) async fn home(
    Extension(state): Extension<Arc<State>>,
    CurrentUser(user): CurrentUser,
) -> Result<Response, AppError> {
    render_dashboard(&state, &user, StatusCode::OK, Vec::new()).await
}

/// The dashboard as it stands: the user's points (every point for admins), the user's
/// categories and, for admins, the regular users.
pub(crate) async fn render_dashboard(
    state: &State,
    user: &User,
    status: StatusCode,
    errors: Vec<String>,
) -> Result<Response, AppError> {
    let pois = if user.is_admin {
        state.store.pois().await?
    } else {
        state.store.pois_by_contributor(&user.id).await?
    };
    let categories = state.store.categories_by_contributor(&user.id).await?;
    let users = if user.is_admin {
        state.store.regular_users().await?
    } else {
        Vec::new()
    };

    let pois = resolve(state, &pois).await?;

    state.views.render_with_status(
        status,
        "home.html",
        context! {
            title => if user.is_admin { "Admin Dashboard" } else { "User Dashboard" },
            user => UserView::from(user),
            pois => pois,
            categories => categories.iter().map(CategoryView::from).collect::<Vec<_>>(),
            users => users.iter().map(UserView::from).collect::<Vec<_>>(),
            errors => errors,
        },
    )
}

/// Handler for `GET /report`
pub(crate) async fn report(
    Extension(state): Extension<Arc<State>>,
    CurrentUser(user): CurrentUser,
) -> Result<Response, AppError> {
    authorize(&state, &user, Read, Report).await?;

    let pois = resolve(&state, &state.store.pois().await?).await?;

    state.views.render_with_status(
        StatusCode::OK,
        "report.html",
        context! {
            title => "Report",
            user => UserView::from(&user),
            pois => pois,
            errors => Vec::<String>::new(),
        },
    )
}

/// Handler for `POST /addpoi`
pub(crate) async fn create(
    Extension(state): Extension<Arc<State>>,
    CurrentUser(user): CurrentUser,
    multipart: Multipart,
) -> Result<Response, AppError> {
    match add_poi(&state, &user, multipart).await {
        Ok(poi) => {
            tracing::info!("{} added point of interest {}", user.id, poi.id);
            Ok(Redirect::to("/home").into_response())
        }
        Err(rejection) => {
            render_dashboard(&state, &user, rejection.status, rejection.errors).await
        }
    }
}

async fn add_poi(
    state: &State,
    user: &User,
    multipart: Multipart,
) -> Submission<PointOfInterest> {
    let (pairs, image) = read_multipart(multipart).await?;
    let form = PoiForm::from_pairs(pairs);
    form.validate().map_err(AppError::from)?;
    let location = form.location()?;
    let image = image.ok_or(AppError::MissingImage)?;
    let category_ids = existing_category_ids(state, &form.categories).await?;

    // nothing is persisted until the image host has answered
    let image_url = state.images.store(image).await?;
    let poi = PointOfInterest::new(
        &form.name,
        &form.description,
        location,
        image_url,
        category_ids,
        &user.id,
    );
    state.store.insert_poi(&poi).await?;
    state.store.adjust_contributions(&user.id, 1).await?;

    Ok(poi)
}

/// Handler for `GET /poi/:id`
pub(crate) async fn show(
    Extension(state): Extension<Arc<State>>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<String>,
) -> Result<Response, AppError> {
    let poi = find_poi(&state, &id).await?;
    authorize(&state, &user, Read, poi.clone()).await?;
    render_poi(&state, &user, &poi, StatusCode::OK, Vec::new()).await
}

async fn render_poi(
    state: &State,
    user: &User,
    poi: &PointOfInterest,
    status: StatusCode,
    errors: Vec<String>,
) -> Result<Response, AppError> {
    let can_edit = is_allowed(state, user, Update, poi.clone()).await?;
    let view = resolve_one(state, poi).await?;

    state.views.render_with_status(
        status,
        "poi.html",
        context! {
            title => &poi.name,
            user => UserView::from(user),
            poi => view,
            can_edit => can_edit,
            errors => errors,
        },
    )
}

/// Handler for `GET /poi/:id/edit`
pub(crate) async fn edit(
    Extension(state): Extension<Arc<State>>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<String>,
) -> Result<Response, AppError> {
    let poi = find_poi(&state, &id).await?;
    authorize(&state, &user, Update, poi.clone()).await?;
    render_edit(&state, &user, &poi, StatusCode::OK, Vec::new()).await
}

async fn render_edit(
    state: &State,
    user: &User,
    poi: &PointOfInterest,
    status: StatusCode,
    errors: Vec<String>,
) -> Result<Response, AppError> {
    // the editor's own categories plus whatever the point already carries
    let mut categories = state.store.categories_by_contributor(&user.id).await?;
    for category in state.store.categories_by_ids(&poi.category_ids).await? {
        if !categories.iter().any(|known| known.id == category.id) {
            categories.push(category);
        }
    }
    let users = if user.is_admin {
        state.store.regular_users().await?
    } else {
        Vec::new()
    };
    let view = resolve_one(state, poi).await?;

    state.views.render_with_status(
        status,
        "updatepoi.html",
        context! {
            title => format!("Update {}", poi.name),
            user => UserView::from(user),
            poi => view,
            categories => categories.iter().map(CategoryView::from).collect::<Vec<_>>(),
            users => users.iter().map(UserView::from).collect::<Vec<_>>(),
            errors => errors,
        },
    )
}

/// Handler for `POST /poi/:id`
pub(crate) async fn update(
    Extension(state): Extension<Arc<State>>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<String>,
    Form(pairs): Form<Vec<(String, String)>>,
) -> Result<Response, AppError> {
    let poi = find_poi(&state, &id).await?;
    authorize(&state, &user, Update, poi.clone()).await?;

    let form = PoiForm::from_pairs(pairs);
    match save_changes(&state, &user, poi.clone(), &form).await {
        Ok(()) => Ok(Redirect::to(&format!("/poi/{}", id)).into_response()),
        Err(rejection) => {
            render_edit(&state, &user, &poi, rejection.status, rejection.errors).await
        }
    }
}

async fn save_changes(
    state: &State,
    user: &User,
    mut poi: PointOfInterest,
    form: &PoiForm,
) -> Submission<()> {
    form.validate().map_err(AppError::from)?;

    let previous_owner = if form.contributor.is_empty() {
        None
    } else {
        authorize(state, user, Reassign, poi.clone()).await?;
        let owner = state
            .store
            .user_by_full_name(&form.contributor)
            .await?
            .ok_or_else(|| {
                AppError::Invalid(format!("There is no contributor named {}", form.contributor))
            })?;
        if owner.id == poi.contributor_id {
            None
        } else {
            Some(std::mem::replace(&mut poi.contributor_id, owner.id))
        }
    };

    if !form.thumbnail.is_empty() {
        if !poi.has_image(&form.thumbnail) {
            return Err(AppError::Invalid(
                "The thumbnail must be one of the point's images".to_owned(),
            )
            .into());
        }
        poi.thumbnail_url = form.thumbnail.clone();
    }

    poi.name = form.name.clone();
    poi.description = form.description.clone();
    poi.location = form.location()?;
    poi.category_ids = existing_category_ids(state, &form.categories).await?;

    state.store.update_poi(&poi).await?;

    if let Some(previous_owner) = previous_owner {
        state.store.adjust_contributions(&previous_owner, -1).await?;
        state.store.adjust_contributions(&poi.contributor_id, 1).await?;
        tracing::info!(
            "{} reassigned {} from {} to {}",
            user.id,
            poi.id,
            previous_owner,
            poi.contributor_id
        );
    }

    Ok(())
}

/// Handler for `POST /poi/:id/image`
pub(crate) async fn add_image(
    Extension(state): Extension<Arc<State>>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<String>,
    multipart: Multipart,
) -> Result<Response, AppError> {
    let poi = find_poi(&state, &id).await?;
    authorize(&state, &user, Update, poi.clone()).await?;

    match upload_image(&state, &poi, multipart).await {
        Ok(_) => Ok(Redirect::to(&format!("/poi/{}", id)).into_response()),
        Err(rejection) => {
            render_poi(&state, &user, &poi, rejection.status, rejection.errors).await
        }
    }
}

async fn upload_image(
    state: &State,
    poi: &PointOfInterest,
    multipart: Multipart,
) -> Submission<PointOfInterest> {
    let (_, image) = read_multipart(multipart).await?;
    let image = image.ok_or(AppError::MissingImage)?;
    let image_url = state.images.store(image).await?;
    Ok(state.store.append_image(&poi.id, &image_url).await?)
}

/// Handler for `POST /poi/:id/delete`
pub(crate) async fn delete(
    Extension(state): Extension<Arc<State>>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<String>,
) -> Result<Response, AppError> {
    let poi = find_poi(&state, &id).await?;
    authorize(&state, &user, Delete, poi.clone()).await?;

    if state.store.delete_poi(&poi.id).await? {
        state
            .store
            .adjust_contributions(&poi.contributor_id, -1)
            .await?;
        tracing::info!("{} deleted point of interest {}", user.id, poi.id);
    }

    let destination = if user.is_admin { "/report" } else { "/home" };
    Ok(Redirect::to(destination).into_response())
}

async fn find_poi(state: &State, id: &str) -> Result<PointOfInterest, AppError> {
    state.store.poi_by_id(id).await?.ok_or(AppError::NotFound)
}

/// Drop submitted category ids that do not name a stored category.
async fn existing_category_ids(state: &State, ids: &[String]) -> Result<Vec<String>, AppError> {
    Ok(state
        .store
        .categories_by_ids(ids)
        .await?
        .into_iter()
        .map(|category| category.id)
        .collect())
}

/// Attach contributors and categories to `pois`, one lookup per distinct contributor.
async fn resolve(state: &State, pois: &[PointOfInterest]) -> Result<Vec<PoiView>, AppError> {
    let mut category_ids: Vec<String> = pois
        .iter()
        .flat_map(|poi| poi.category_ids.iter().cloned())
        .collect();
    category_ids.sort();
    category_ids.dedup();
    let categories: Vec<Category> = state.store.categories_by_ids(&category_ids).await?;

    let mut contributors: HashMap<&str, Option<User>> = HashMap::new();
    for poi in pois {
        if !contributors.contains_key(poi.contributor_id.as_str()) {
            let contributor = state.store.user_by_id(&poi.contributor_id).await?;
            contributors.insert(&poi.contributor_id, contributor);
        }
    }

    Ok(pois
        .iter()
        .map(|poi| {
            let contributor = contributors
                .get(poi.contributor_id.as_str())
                .and_then(Option::as_ref);
            PoiView::new(poi, contributor, &categories)
        })
        .collect())
}

async fn resolve_one(state: &State, poi: &PointOfInterest) -> Result<PoiView, AppError> {
    let mut views = resolve(state, std::slice::from_ref(poi)).await?;
    views.pop().ok_or(AppError::NotFound)
}
