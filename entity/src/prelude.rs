pub use super::category::Entity as Category;
pub use super::point_of_interest::Entity as PointOfInterest;
pub use super::user_account::Entity as UserAccount;
