//! Domain models
//!
//! These are what handlers, views and the authorization policy work with. The
//! stores translate them to and from their persisted form.

mod category;
mod poi;
mod user;

pub use category::Category;
pub use poi::{Location, PointOfInterest};
pub use user::User;

/// Generate a new record id. ULIDs sort by creation time.
pub(crate) fn new_id() -> String {
    ulid::Ulid::new().to_string()
}
