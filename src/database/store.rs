use async_trait::async_trait;
use uuid::Uuid;

use crate::database::manager::DatabaseError;
use crate::database::models::{
    CreditSet, Movie, MovieDocument, MoviePatch, NewUser, Person, PopulatedMovie, User,
};

/// Result of removing one credit reference from a movie
#[derive(Debug, Clone, PartialEq)]
pub enum CreditRemoval {
    MovieNotFound,
    CreditNotFound,
    Removed(Movie),
}

/// Movie collection operations.
///
/// Every write is a single conditional operation: implementations must not
/// split an existence check and the write into separate store round trips.
#[async_trait]
pub trait MovieStore: Send + Sync {
    async fn count_movies(&self) -> Result<u64, DatabaseError>;

    /// Page of movies sorted by title ascending.
    async fn list_movies(&self, skip: u64, limit: u64) -> Result<Vec<Movie>, DatabaseError>;

    async fn find_movie(&self, id: Uuid) -> Result<Option<Movie>, DatabaseError>;

    /// Inserts unless a movie with the same title exists, in which case `None`.
    async fn insert_movie_if_absent(&self, document: MovieDocument) -> Result<Option<Movie>, DatabaseError>;

    /// Merges `patch` and returns the updated movie, or `None` if no movie matched.
    async fn update_movie(&self, id: Uuid, patch: &MoviePatch) -> Result<Option<Movie>, DatabaseError>;

    async fn delete_movie(&self, id: Uuid) -> Result<Option<Movie>, DatabaseError>;

    /// Set-union of `credits` into cast/crew. `None` if no movie matched.
    async fn add_credits(&self, id: Uuid, credits: &CreditSet) -> Result<Option<Movie>, DatabaseError>;

    async fn remove_credit(&self, id: Uuid, credit_id: Uuid) -> Result<CreditRemoval, DatabaseError>;
}

#[async_trait]
pub trait PersonStore: Send + Sync {
    async fn insert_person(&self, person: Person) -> Result<Person, DatabaseError>;

    /// Persons matching `ids`; unknown ids are skipped, order unspecified.
    async fn find_people(&self, ids: &[Uuid]) -> Result<Vec<Person>, DatabaseError>;
}

#[async_trait]
pub trait UserStore: Send + Sync {
    /// Inserts unless the username is taken, in which case `None`.
    async fn insert_user_if_absent(&self, user: NewUser) -> Result<Option<User>, DatabaseError>;

    async fn find_user(&self, id: Uuid) -> Result<Option<User>, DatabaseError>;

    async fn find_user_by_username(&self, username: &str) -> Result<Option<User>, DatabaseError>;

    /// All users sorted by username.
    async fn list_users(&self) -> Result<Vec<User>, DatabaseError>;
}

/// The full persistence gateway handed to request handlers
#[async_trait]
pub trait Store: MovieStore + PersonStore + UserStore {
    async fn ping(&self) -> Result<(), DatabaseError>;

    /// Loads a movie with cast and crew resolved into person documents.
    async fn find_movie_with_credits(&self, id: Uuid) -> Result<Option<PopulatedMovie>, DatabaseError> {
        let Some(movie) = self.find_movie(id).await? else {
            return Ok(None);
        };
        let people = self.find_people(&movie.document.credit_ids()).await?;
        Ok(Some(PopulatedMovie::resolve(movie, people)))
    }
}
