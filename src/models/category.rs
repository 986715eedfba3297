/// A user-defined label for points of interest.
#[derive(Debug, Clone, PartialEq)]
pub struct Category {
    pub id: String,
    pub name: String,
    pub description: String,
    pub contributor_id: String,
}

impl Category {
    pub fn new(name: &str, description: &str, contributor_id: &str) -> Self {
        Self {
            id: super::new_id(),
            name: name.trim().to_owned(),
            description: description.trim().to_owned(),
            contributor_id: contributor_id.to_owned(),
        }
    }
}
