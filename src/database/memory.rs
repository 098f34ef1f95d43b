use async_trait::async_trait;
use std::collections::HashMap;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::database::manager::DatabaseError;
use crate::database::models::{CreditSet, Movie, MovieDocument, MoviePatch, NewUser, Person, User};
use crate::database::store::{CreditRemoval, MovieStore, PersonStore, Store, UserStore};

/// In-process store used for development and tests.
///
/// Each operation holds the lock for its whole read-modify-write, so the
/// conditional writes are atomic like their SQL counterparts.
#[derive(Default)]
pub struct MemoryStore {
    collections: RwLock<Collections>,
}

#[derive(Default)]
struct Collections {
    movies: HashMap<Uuid, MovieDocument>,
    people: HashMap<Uuid, Person>,
    users: HashMap<Uuid, User>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Collections {
    fn title_taken(&self, title: &str, except: Option<Uuid>) -> bool {
        self.movies
            .iter()
            .any(|(id, doc)| Some(*id) != except && doc.title == title)
    }

    fn movie(&self, id: Uuid) -> Option<Movie> {
        self.movies.get(&id).map(|doc| Movie {
            id,
            document: doc.clone(),
        })
    }
}

#[async_trait]
impl MovieStore for MemoryStore {
    async fn count_movies(&self) -> Result<u64, DatabaseError> {
        Ok(self.collections.read().await.movies.len() as u64)
    }

    async fn list_movies(&self, skip: u64, limit: u64) -> Result<Vec<Movie>, DatabaseError> {
        let collections = self.collections.read().await;
        let mut movies: Vec<Movie> = collections
            .movies
            .iter()
            .map(|(id, doc)| Movie {
                id: *id,
                document: doc.clone(),
            })
            .collect();
        movies.sort_by(|a, b| a.document.title.cmp(&b.document.title));

        Ok(movies
            .into_iter()
            .skip(skip as usize)
            .take(limit as usize)
            .collect())
    }

    async fn find_movie(&self, id: Uuid) -> Result<Option<Movie>, DatabaseError> {
        Ok(self.collections.read().await.movie(id))
    }

    async fn insert_movie_if_absent(&self, document: MovieDocument) -> Result<Option<Movie>, DatabaseError> {
        let mut collections = self.collections.write().await;
        if collections.title_taken(&document.title, None) {
            return Ok(None);
        }

        let id = Uuid::new_v4();
        collections.movies.insert(id, document.clone());
        Ok(Some(Movie { id, document }))
    }

    async fn update_movie(&self, id: Uuid, patch: &MoviePatch) -> Result<Option<Movie>, DatabaseError> {
        let mut collections = self.collections.write().await;
        if !collections.movies.contains_key(&id) {
            return Ok(None);
        }

        if let Some(title) = &patch.title {
            if collections.title_taken(title, Some(id)) {
                return Err(DatabaseError::Duplicate {
                    field: "title",
                    value: title.clone(),
                });
            }
        }

        let Some(doc) = collections.movies.get_mut(&id) else {
            return Ok(None);
        };
        doc.apply(patch);
        Ok(collections.movie(id))
    }

    async fn delete_movie(&self, id: Uuid) -> Result<Option<Movie>, DatabaseError> {
        let mut collections = self.collections.write().await;
        Ok(collections
            .movies
            .remove(&id)
            .map(|document| Movie { id, document }))
    }

    async fn add_credits(&self, id: Uuid, credits: &CreditSet) -> Result<Option<Movie>, DatabaseError> {
        let mut collections = self.collections.write().await;
        let Some(doc) = collections.movies.get_mut(&id) else {
            return Ok(None);
        };
        doc.add_credits(credits);
        Ok(collections.movie(id))
    }

    async fn remove_credit(&self, id: Uuid, credit_id: Uuid) -> Result<CreditRemoval, DatabaseError> {
        let mut collections = self.collections.write().await;
        let Some(doc) = collections.movies.get_mut(&id) else {
            return Ok(CreditRemoval::MovieNotFound);
        };
        if !doc.remove_credit(credit_id) {
            return Ok(CreditRemoval::CreditNotFound);
        }
        Ok(collections
            .movie(id)
            .map_or(CreditRemoval::MovieNotFound, CreditRemoval::Removed))
    }
}

#[async_trait]
impl PersonStore for MemoryStore {
    async fn insert_person(&self, person: Person) -> Result<Person, DatabaseError> {
        let mut collections = self.collections.write().await;
        collections.people.insert(person.id, person.clone());
        Ok(person)
    }

    async fn find_people(&self, ids: &[Uuid]) -> Result<Vec<Person>, DatabaseError> {
        let collections = self.collections.read().await;
        Ok(ids
            .iter()
            .filter_map(|id| collections.people.get(id).cloned())
            .collect())
    }
}

#[async_trait]
impl UserStore for MemoryStore {
    async fn insert_user_if_absent(&self, user: NewUser) -> Result<Option<User>, DatabaseError> {
        let mut collections = self.collections.write().await;
        if collections.users.values().any(|u| u.username == user.username) {
            return Ok(None);
        }

        let user = user.into_user();
        collections.users.insert(user.id, user.clone());
        Ok(Some(user))
    }

    async fn find_user(&self, id: Uuid) -> Result<Option<User>, DatabaseError> {
        Ok(self.collections.read().await.users.get(&id).cloned())
    }

    async fn find_user_by_username(&self, username: &str) -> Result<Option<User>, DatabaseError> {
        let collections = self.collections.read().await;
        Ok(collections
            .users
            .values()
            .find(|u| u.username == username)
            .cloned())
    }

    async fn list_users(&self) -> Result<Vec<User>, DatabaseError> {
        let mut users: Vec<User> = self.collections.read().await.users.values().cloned().collect();
        users.sort_by(|a, b| a.username.cmp(&b.username));
        Ok(users)
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn ping(&self) -> Result<(), DatabaseError> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{json, Map, Value};

    fn document(title: &str) -> MovieDocument {
        MovieDocument {
            title: title.to_string(),
            cast: Vec::new(),
            crew: Vec::new(),
            attributes: Map::new(),
        }
    }

    fn named(name: &str) -> Person {
        let mut attributes = Map::new();
        attributes.insert("name".into(), Value::String(name.into()));
        Person::new(attributes)
    }

    #[tokio::test]
    async fn insert_if_absent_rejects_duplicate_titles() {
        let store = MemoryStore::new();
        assert!(store.insert_movie_if_absent(document("Dune")).await.unwrap().is_some());
        assert!(store.insert_movie_if_absent(document("Dune")).await.unwrap().is_none());
        assert_eq!(store.count_movies().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn list_sorts_by_title_and_pages() {
        let store = MemoryStore::new();
        for title in ["Cobra", "Alien", "Brazil", "Dune"] {
            store.insert_movie_if_absent(document(title)).await.unwrap();
        }

        let titles = |movies: Vec<Movie>| -> Vec<String> {
            movies.into_iter().map(|m| m.document.title).collect()
        };

        assert_eq!(titles(store.list_movies(0, 2).await.unwrap()), vec!["Alien", "Brazil"]);
        assert_eq!(titles(store.list_movies(2, 2).await.unwrap()), vec!["Cobra", "Dune"]);
        assert!(store.list_movies(4, 2).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn update_rejects_title_of_another_movie() {
        let store = MemoryStore::new();
        let alien = store.insert_movie_if_absent(document("Alien")).await.unwrap().unwrap();
        store.insert_movie_if_absent(document("Brazil")).await.unwrap();

        let patch = MoviePatch {
            title: Some("Brazil".into()),
            ..Default::default()
        };
        let err = store.update_movie(alien.id, &patch).await.unwrap_err();
        assert!(matches!(err, DatabaseError::Duplicate { field: "title", .. }));

        let patch = MoviePatch {
            title: Some("Alien".into()),
            ..Default::default()
        };
        assert!(store.update_movie(alien.id, &patch).await.unwrap().is_some());
        assert!(store.update_movie(Uuid::new_v4(), &patch).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn credits_are_sets() {
        let store = MemoryStore::new();
        let movie = store.insert_movie_if_absent(document("Heat")).await.unwrap().unwrap();
        let actor = Uuid::new_v4();
        let credits = CreditSet {
            cast: vec![actor],
            crew: Vec::new(),
        };

        store.add_credits(movie.id, &credits).await.unwrap();
        let updated = store.add_credits(movie.id, &credits).await.unwrap().unwrap();
        assert_eq!(updated.document.cast, vec![actor]);

        assert!(store.add_credits(Uuid::new_v4(), &credits).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn remove_credit_reports_what_was_missing() {
        let store = MemoryStore::new();
        let movie = store.insert_movie_if_absent(document("Ran")).await.unwrap().unwrap();
        let director = Uuid::new_v4();
        store
            .add_credits(movie.id, &CreditSet { cast: Vec::new(), crew: vec![director] })
            .await
            .unwrap();

        assert_eq!(
            store.remove_credit(Uuid::new_v4(), director).await.unwrap(),
            CreditRemoval::MovieNotFound
        );
        assert!(matches!(
            store.remove_credit(movie.id, director).await.unwrap(),
            CreditRemoval::Removed(m) if m.document.crew.is_empty()
        ));
        assert_eq!(
            store.remove_credit(movie.id, director).await.unwrap(),
            CreditRemoval::CreditNotFound
        );
    }

    #[tokio::test]
    async fn populate_resolves_people() {
        let store = MemoryStore::new();
        let actor = store.insert_person(named("Toshiro Mifune")).await.unwrap();
        let movie = store.insert_movie_if_absent(document("Yojimbo")).await.unwrap().unwrap();
        store
            .add_credits(movie.id, &CreditSet { cast: vec![actor.id], crew: vec![Uuid::new_v4()] })
            .await
            .unwrap();

        let populated = store.find_movie_with_credits(movie.id).await.unwrap().unwrap();
        assert_eq!(populated.cast.len(), 1);
        assert_eq!(populated.cast[0].attributes.get("name"), Some(&json!("Toshiro Mifune")));
        assert!(populated.crew.is_empty());

        assert!(store.find_movie_with_credits(Uuid::new_v4()).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn usernames_are_unique() {
        let store = MemoryStore::new();
        let new_user = |name: &str| NewUser {
            username: name.to_string(),
            password_hash: "x".into(),
            admin: false,
        };

        let bob = store.insert_user_if_absent(new_user("bob")).await.unwrap().unwrap();
        assert!(store.insert_user_if_absent(new_user("bob")).await.unwrap().is_none());
        store.insert_user_if_absent(new_user("alice")).await.unwrap();

        assert_eq!(store.find_user(bob.id).await.unwrap().unwrap().username, "bob");
        assert!(store.find_user_by_username("carol").await.unwrap().is_none());

        let names: Vec<String> = store.list_users().await.unwrap().into_iter().map(|u| u.username).collect();
        assert_eq!(names, vec!["alice", "bob"]);
    }
}
