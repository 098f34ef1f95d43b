pub mod movie;
pub mod person;
pub mod user;

pub use movie::{CreditSet, Movie, MovieDocument, MoviePatch, PopulatedMovie};
pub use person::Person;
pub use user::{NewUser, User};

use std::collections::HashSet;
use thiserror::Error;
use uuid::Uuid;

/// Field-level problems found while normalizing a client document
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ModelError {
    #[error("Path `{0}` is required.")]
    MissingField(&'static str),

    #[error("Cast to {expected} failed for path `{field}`")]
    InvalidField { field: String, expected: &'static str },
}

/// Removes repeated identifiers, keeping the first occurrence of each.
pub fn dedupe_ids(ids: impl IntoIterator<Item = Uuid>) -> Vec<Uuid> {
    let mut seen = HashSet::new();
    ids.into_iter().filter(|id| seen.insert(*id)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dedupe_keeps_first_occurrence_order() {
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();
        assert_eq!(dedupe_ids(vec![a, b, a, b, a]), vec![a, b]);
        assert!(dedupe_ids(Vec::new()).is_empty());
    }
}
