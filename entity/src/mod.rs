//! SeaORM entities backing the user, point-of-interest and category stores.

pub mod prelude;

pub mod category;
pub mod point_of_interest;
pub mod user_account;
