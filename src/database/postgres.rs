use async_trait::async_trait;
use serde_json::Value;
use sqlx::{types::Json, PgPool};
use uuid::Uuid;

use crate::database::manager::{DatabaseError, DatabaseManager};
use crate::database::models::{CreditSet, Movie, MovieDocument, MoviePatch, NewUser, Person, User};
use crate::database::store::{CreditRemoval, MovieStore, PersonStore, Store, UserStore};

/// PostgreSQL store keeping movies and people as JSONB documents
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

type DocumentRow = (Uuid, Json<MovieDocument>);

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn into_movie((id, Json(document)): DocumentRow) -> Movie {
    Movie { id, document }
}

fn ids_json(ids: &[Uuid]) -> Json<Vec<String>> {
    Json(ids.iter().map(Uuid::to_string).collect())
}

/// Maps unique-index violations to `Duplicate`, everything else passes through.
fn unique_violation(err: sqlx::Error, field: &'static str, value: &str) -> DatabaseError {
    if let sqlx::Error::Database(db_err) = &err {
        if db_err.is_unique_violation() {
            return DatabaseError::Duplicate {
                field,
                value: value.to_string(),
            };
        }
    }
    DatabaseError::Sqlx(err)
}

#[async_trait]
impl MovieStore for PgStore {
    async fn count_movies(&self) -> Result<u64, DatabaseError> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM movies")
            .fetch_one(&self.pool)
            .await?;
        Ok(count.max(0) as u64)
    }

    async fn list_movies(&self, skip: u64, limit: u64) -> Result<Vec<Movie>, DatabaseError> {
        let rows: Vec<DocumentRow> = sqlx::query_as(
            "SELECT id, doc FROM movies ORDER BY title ASC OFFSET $1 LIMIT $2",
        )
        .bind(i64::try_from(skip).unwrap_or(i64::MAX))
        .bind(i64::try_from(limit).unwrap_or(i64::MAX))
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(into_movie).collect())
    }

    async fn find_movie(&self, id: Uuid) -> Result<Option<Movie>, DatabaseError> {
        let row: Option<DocumentRow> = sqlx::query_as("SELECT id, doc FROM movies WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(row.map(into_movie))
    }

    async fn insert_movie_if_absent(&self, document: MovieDocument) -> Result<Option<Movie>, DatabaseError> {
        let id = Uuid::new_v4();
        let inserted: Option<Uuid> = sqlx::query_scalar(
            "INSERT INTO movies (id, doc) VALUES ($1, $2) ON CONFLICT (title) DO NOTHING RETURNING id",
        )
        .bind(id)
        .bind(Json(&document))
        .fetch_optional(&self.pool)
        .await?;

        Ok(inserted.map(|id| Movie { id, document }))
    }

    async fn update_movie(&self, id: Uuid, patch: &MoviePatch) -> Result<Option<Movie>, DatabaseError> {
        let fields = Value::Object(patch.to_json());
        let row: Option<DocumentRow> = sqlx::query_as(
            "UPDATE movies SET doc = doc || $2 WHERE id = $1 RETURNING id, doc",
        )
        .bind(id)
        .bind(Json(&fields))
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| unique_violation(e, "title", patch.title.as_deref().unwrap_or_default()))?;

        Ok(row.map(into_movie))
    }

    async fn delete_movie(&self, id: Uuid) -> Result<Option<Movie>, DatabaseError> {
        let row: Option<DocumentRow> = sqlx::query_as("DELETE FROM movies WHERE id = $1 RETURNING id, doc")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(row.map(into_movie))
    }

    async fn add_credits(&self, id: Uuid, credits: &CreditSet) -> Result<Option<Movie>, DatabaseError> {
        // Appends only the ids not already present, keeping existing order.
        let sql = r#"
            UPDATE movies SET doc = doc
                || jsonb_build_object('cast',
                    COALESCE(doc->'cast', '[]'::jsonb) || COALESCE((
                        SELECT jsonb_agg(e.value) FROM jsonb_array_elements($2::jsonb) AS e(value)
                        WHERE NOT COALESCE(doc->'cast', '[]'::jsonb) @> jsonb_build_array(e.value)
                    ), '[]'::jsonb))
                || jsonb_build_object('crew',
                    COALESCE(doc->'crew', '[]'::jsonb) || COALESCE((
                        SELECT jsonb_agg(e.value) FROM jsonb_array_elements($3::jsonb) AS e(value)
                        WHERE NOT COALESCE(doc->'crew', '[]'::jsonb) @> jsonb_build_array(e.value)
                    ), '[]'::jsonb))
            WHERE id = $1
            RETURNING id, doc
        "#;

        let row: Option<DocumentRow> = sqlx::query_as(sql)
            .bind(id)
            .bind(ids_json(&credits.cast))
            .bind(ids_json(&credits.crew))
            .fetch_optional(&self.pool)
            .await?;

        Ok(row.map(into_movie))
    }

    async fn remove_credit(&self, id: Uuid, credit_id: Uuid) -> Result<CreditRemoval, DatabaseError> {
        let sql = r#"
            UPDATE movies SET doc = doc
                || jsonb_build_object('cast', COALESCE(doc->'cast', '[]'::jsonb) - $2::text)
                || jsonb_build_object('crew', COALESCE(doc->'crew', '[]'::jsonb) - $2::text)
            WHERE id = $1
              AND (COALESCE(doc->'cast', '[]'::jsonb) ? $2::text
                OR COALESCE(doc->'crew', '[]'::jsonb) ? $2::text)
            RETURNING id, doc
        "#;

        let row: Option<DocumentRow> = sqlx::query_as(sql)
            .bind(id)
            .bind(credit_id.to_string())
            .fetch_optional(&self.pool)
            .await?;

        if let Some(row) = row {
            return Ok(CreditRemoval::Removed(into_movie(row)));
        }

        let exists: bool = sqlx::query_scalar("SELECT EXISTS (SELECT 1 FROM movies WHERE id = $1)")
            .bind(id)
            .fetch_one(&self.pool)
            .await?;

        Ok(if exists {
            CreditRemoval::CreditNotFound
        } else {
            CreditRemoval::MovieNotFound
        })
    }
}

#[async_trait]
impl PersonStore for PgStore {
    async fn insert_person(&self, person: Person) -> Result<Person, DatabaseError> {
        sqlx::query("INSERT INTO people (id, doc) VALUES ($1, $2)")
            .bind(person.id)
            .bind(Json(&person.attributes))
            .execute(&self.pool)
            .await?;

        Ok(person)
    }

    async fn find_people(&self, ids: &[Uuid]) -> Result<Vec<Person>, DatabaseError> {
        if ids.is_empty() {
            return Ok(vec![]);
        }

        let rows: Vec<(Uuid, Json<serde_json::Map<String, Value>>)> =
            sqlx::query_as("SELECT id, doc FROM people WHERE id = ANY($1)")
                .bind(ids)
                .fetch_all(&self.pool)
                .await?;

        Ok(rows
            .into_iter()
            .map(|(id, Json(attributes))| Person { id, attributes })
            .collect())
    }
}

#[async_trait]
impl UserStore for PgStore {
    async fn insert_user_if_absent(&self, user: NewUser) -> Result<Option<User>, DatabaseError> {
        let user = user.into_user();
        let inserted: Option<Uuid> = sqlx::query_scalar(
            r#"
            INSERT INTO users (id, username, password_hash, admin, created_at)
            VALUES ($1, $2, $3, $4, $5)
            ON CONFLICT (username) DO NOTHING
            RETURNING id
            "#,
        )
        .bind(user.id)
        .bind(&user.username)
        .bind(&user.password_hash)
        .bind(user.admin)
        .bind(user.created_at)
        .fetch_optional(&self.pool)
        .await?;

        Ok(inserted.map(|_| user))
    }

    async fn find_user(&self, id: Uuid) -> Result<Option<User>, DatabaseError> {
        let user = sqlx::query_as::<_, User>(
            "SELECT id, username, password_hash, admin, created_at FROM users WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(user)
    }

    async fn find_user_by_username(&self, username: &str) -> Result<Option<User>, DatabaseError> {
        let user = sqlx::query_as::<_, User>(
            "SELECT id, username, password_hash, admin, created_at FROM users WHERE username = $1",
        )
        .bind(username)
        .fetch_optional(&self.pool)
        .await?;

        Ok(user)
    }

    async fn list_users(&self) -> Result<Vec<User>, DatabaseError> {
        let users = sqlx::query_as::<_, User>(
            "SELECT id, username, password_hash, admin, created_at FROM users ORDER BY username ASC",
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(users)
    }
}

#[async_trait]
impl Store for PgStore {
    async fn ping(&self) -> Result<(), DatabaseError> {
        DatabaseManager::health_check(&self.pool).await
    }
}
