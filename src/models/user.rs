use oso::PolarClass;

/// User model
#[derive(Debug, Clone, PartialEq, PolarClass)]
pub struct User {
    #[polar(attribute)]
    pub id: String,
    pub first_name: String,
    pub last_name: String,
    /// Always `"{first_name} {last_name}"`; admins reassign points of interest by it.
    pub full_name: String,
    pub email: String,
    /// The password in hashed PHC form
    pub password: String,
    #[polar(attribute)]
    pub is_admin: bool,
    pub contributed_pois: i32,
}

impl User {
    /// A fresh, non-admin user with no contributions.
    pub fn new(first_name: &str, last_name: &str, email: &str, password_hash: String) -> Self {
        let mut user = Self {
            id: super::new_id(),
            first_name: String::new(),
            last_name: String::new(),
            full_name: String::new(),
            email: email.trim().to_owned(),
            password: password_hash,
            is_admin: false,
            contributed_pois: 0,
        };
        user.rename(first_name, last_name);
        user
    }

    /// Change the first and last name, keeping the full name in step.
    pub fn rename(&mut self, first_name: &str, last_name: &str) {
        self.first_name = first_name.trim().to_owned();
        self.last_name = last_name.trim().to_owned();
        self.full_name = format!("{} {}", self.first_name, self.last_name);
    }
}
