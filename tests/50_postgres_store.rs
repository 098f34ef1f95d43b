//! PgStore against a live database. Skipped unless DATABASE_URL is set.

use std::str::FromStr;

use anyhow::{Context, Result};
use serde_json::{json, Map, Value};
use sqlx::postgres::{PgConnectOptions, PgPoolOptions};
use sqlx::PgPool;
use uuid::Uuid;

use movies_api_rust::database::models::{CreditSet, MovieDocument, MoviePatch, NewUser, Person};
use movies_api_rust::database::{
    CreditRemoval, DatabaseError, DatabaseManager, MovieStore, PersonStore, PgStore, Store, UserStore,
};

/// A `PgStore` confined to a fresh schema, dropped by `cleanup`.
struct PgFixture {
    store: PgStore,
    admin: PgPool,
    schema: String,
}

impl PgFixture {
    async fn connect() -> Result<Option<Self>> {
        let Ok(url) = std::env::var("DATABASE_URL") else {
            eprintln!("DATABASE_URL not set; skipping postgres store test");
            return Ok(None);
        };

        let schema = format!("movies_test_{}", Uuid::new_v4().simple());
        let admin = PgPoolOptions::new()
            .max_connections(1)
            .connect(&url)
            .await
            .context("failed to connect to DATABASE_URL")?;
        sqlx::query(&format!("CREATE SCHEMA {}", schema)).execute(&admin).await?;

        let options = PgConnectOptions::from_str(&url)?.options([("search_path", schema.as_str())]);
        let pool = PgPoolOptions::new().max_connections(4).connect_with(options).await?;
        DatabaseManager::migrate(&pool).await?;

        Ok(Some(Self {
            store: PgStore::new(pool),
            admin,
            schema,
        }))
    }

    async fn cleanup(self) -> Result<()> {
        sqlx::query(&format!("DROP SCHEMA {} CASCADE", self.schema))
            .execute(&self.admin)
            .await?;
        Ok(())
    }
}

fn document(title: &str) -> MovieDocument {
    MovieDocument {
        title: title.to_string(),
        cast: Vec::new(),
        crew: Vec::new(),
        attributes: Map::new(),
    }
}

fn object(value: Value) -> Map<String, Value> {
    match value {
        Value::Object(map) => map,
        other => panic!("expected object, got {other}"),
    }
}

#[tokio::test]
async fn duplicate_titles_are_not_inserted() -> Result<()> {
    let Some(fx) = PgFixture::connect().await? else { return Ok(()) };

    let first = fx.store.insert_movie_if_absent(document("Dune")).await?;
    assert!(first.is_some());
    assert!(fx.store.insert_movie_if_absent(document("Dune")).await?.is_none());
    assert_eq!(fx.store.count_movies().await?, 1);

    fx.cleanup().await
}

#[tokio::test]
async fn list_pages_in_title_order() -> Result<()> {
    let Some(fx) = PgFixture::connect().await? else { return Ok(()) };

    for n in (1..=12).rev() {
        fx.store.insert_movie_if_absent(document(&format!("Movie {:02}", n))).await?;
    }

    let page: Vec<String> = fx
        .store
        .list_movies(5, 5)
        .await?
        .into_iter()
        .map(|movie| movie.document.title)
        .collect();
    assert_eq!(page, vec!["Movie 06", "Movie 07", "Movie 08", "Movie 09", "Movie 10"]);

    fx.cleanup().await
}

#[tokio::test]
async fn adding_credits_is_a_set_union() -> Result<()> {
    let Some(fx) = PgFixture::connect().await? else { return Ok(()) };
    let movie = fx.store.insert_movie_if_absent(document("Alien")).await?.context("insert")?;
    let actor = Uuid::new_v4();
    let director = Uuid::new_v4();
    let credits = CreditSet {
        cast: vec![actor],
        crew: vec![director],
    };

    fx.store.add_credits(movie.id, &credits).await?;
    let updated = fx.store.add_credits(movie.id, &credits).await?.context("movie exists")?;
    assert_eq!(updated.document.cast, vec![actor]);
    assert_eq!(updated.document.crew, vec![director]);

    assert!(fx.store.add_credits(Uuid::new_v4(), &credits).await?.is_none());

    fx.cleanup().await
}

#[tokio::test]
async fn removing_credits_reports_each_outcome() -> Result<()> {
    let Some(fx) = PgFixture::connect().await? else { return Ok(()) };
    let movie = fx.store.insert_movie_if_absent(document("Ran")).await?.context("insert")?;
    let actor = Uuid::new_v4();
    let director = Uuid::new_v4();
    fx.store
        .add_credits(movie.id, &CreditSet { cast: vec![actor], crew: vec![director] })
        .await?;

    assert_eq!(
        fx.store.remove_credit(movie.id, Uuid::new_v4()).await?,
        CreditRemoval::CreditNotFound
    );

    match fx.store.remove_credit(movie.id, director).await? {
        CreditRemoval::Removed(updated) => {
            assert!(updated.document.crew.is_empty());
            assert_eq!(updated.document.cast, vec![actor]);
        }
        other => panic!("expected removal, got {other:?}"),
    }

    assert_eq!(fx.store.remove_credit(movie.id, director).await?, CreditRemoval::CreditNotFound);
    assert_eq!(
        fx.store.remove_credit(Uuid::new_v4(), director).await?,
        CreditRemoval::MovieNotFound
    );

    fx.cleanup().await
}

#[tokio::test]
async fn update_merges_and_rejects_taken_titles() -> Result<()> {
    let Some(fx) = PgFixture::connect().await? else { return Ok(()) };
    let alien = fx
        .store
        .insert_movie_if_absent(MovieDocument::from_body(object(json!({ "title": "Alien", "year": 1979 })))?)
        .await?
        .context("insert")?;
    fx.store.insert_movie_if_absent(document("Aliens")).await?;

    let patch = MoviePatch::from_body(object(json!({ "director": "Ridley Scott" })))?;
    let updated = fx.store.update_movie(alien.id, &patch).await?.context("movie exists")?;
    assert_eq!(updated.document.title, "Alien");
    assert_eq!(updated.document.attributes.get("year"), Some(&json!(1979)));
    assert_eq!(updated.document.attributes.get("director"), Some(&json!("Ridley Scott")));

    let rename = MoviePatch::from_body(object(json!({ "title": "Aliens" })))?;
    let err = fx.store.update_movie(alien.id, &rename).await.unwrap_err();
    assert!(matches!(err, DatabaseError::Duplicate { field: "title", .. }), "got {err}");

    assert!(fx.store.update_movie(Uuid::new_v4(), &patch).await?.is_none());

    fx.cleanup().await
}

#[tokio::test]
async fn populate_resolves_people_and_drops_unknown_ids() -> Result<()> {
    let Some(fx) = PgFixture::connect().await? else { return Ok(()) };
    let movie = fx.store.insert_movie_if_absent(document("Heat")).await?.context("insert")?;
    let person = fx
        .store
        .insert_person(Person::new(object(json!({ "name": "Michael Mann" }))))
        .await?;
    fx.store
        .add_credits(movie.id, &CreditSet { cast: vec![Uuid::new_v4()], crew: vec![person.id] })
        .await?;

    let populated = fx.store.find_movie_with_credits(movie.id).await?.context("movie exists")?;
    assert!(populated.cast.is_empty());
    assert_eq!(populated.crew, vec![person]);

    assert!(fx.store.find_movie_with_credits(Uuid::new_v4()).await?.is_none());

    fx.cleanup().await
}

#[tokio::test]
async fn usernames_are_unique_and_listed_in_order() -> Result<()> {
    let Some(fx) = PgFixture::connect().await? else { return Ok(()) };
    let new_user = |username: &str| NewUser {
        username: username.to_string(),
        password_hash: "$argon2id$placeholder".to_string(),
        admin: false,
    };

    let zoe = fx.store.insert_user_if_absent(new_user("zoe")).await?.context("insert")?;
    fx.store.insert_user_if_absent(new_user("adam")).await?;
    assert!(fx.store.insert_user_if_absent(new_user("zoe")).await?.is_none());

    let found = fx.store.find_user_by_username("zoe").await?.context("zoe exists")?;
    assert_eq!(found.id, zoe.id);
    assert_eq!(fx.store.find_user(zoe.id).await?.map(|u| u.username), Some("zoe".to_string()));

    let names: Vec<String> = fx.store.list_users().await?.into_iter().map(|u| u.username).collect();
    assert_eq!(names, vec!["adam", "zoe"]);

    fx.cleanup().await
}
