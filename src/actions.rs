//! CRUD action-like resources and the authorization policy built on them
use anyhow::Result;
use oso::{Oso, PolarClass, ToPolar};

use crate::error::AppError;
use crate::models::{PointOfInterest, User};
use crate::server::State;

/// The "READ" action. Because there is no data pertinent to this action it is a unit struct.
#[derive(Debug, Clone, Copy, PolarClass)]
pub struct Read;

/// The "UPDATE" action. Also covers adding images.
#[derive(Debug, Clone, Copy, PolarClass)]
pub struct Update;

/// The "DELETE" action.
#[derive(Debug, Clone, Copy, PolarClass)]
pub struct Delete;

/// Handing a point of interest to a different contributor.
#[derive(Debug, Clone, Copy, PolarClass)]
pub struct Reassign;

/// The admin report listing every contribution.
#[derive(Debug, Clone, Copy, PolarClass)]
pub struct Report;

const POLICY: &str = include_str!("../polar/pois.polar");

/// Attempt to create a new oso instance for managing authorization schemes.
pub fn try_register_oso() -> Result<Oso> {
    let mut oso = Oso::new();

    // NOTE: load classes here
    oso.register_class(User::get_polar_class())?;
    oso.register_class(PointOfInterest::get_polar_class())?;
    oso.register_class(Report::get_polar_class())?;

    // action classes in this module should be loaded here too
    oso.register_class(Read::get_polar_class())?;
    oso.register_class(Update::get_polar_class())?;
    oso.register_class(Delete::get_polar_class())?;
    oso.register_class(Reassign::get_polar_class())?;

    oso.load_str(POLICY)?;

    Ok(oso)
}

/// Whether `user` may perform `action` on `resource`.
pub(crate) async fn is_allowed<A, R>(
    state: &State,
    user: &User,
    action: A,
    resource: R,
) -> Result<bool, AppError>
where
    A: ToPolar + Send,
    R: ToPolar + Send,
{
    let oso = state.oso.lock().await;
    Ok(oso.is_allowed(user.clone(), action, resource)?)
}

/// Like [`is_allowed`], but a refusal is an [`AppError::Forbidden`].
pub(crate) async fn authorize<A, R>(
    state: &State,
    user: &User,
    action: A,
    resource: R,
) -> Result<(), AppError>
where
    A: ToPolar + Send,
    R: ToPolar + Send,
{
    if is_allowed(state, user, action, resource).await? {
        Ok(())
    } else {
        tracing::debug!("Refused {} an action", user.id);
        Err(AppError::Forbidden)
    }
}
