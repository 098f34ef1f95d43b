use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::HashMap;
use uuid::Uuid;

use super::{dedupe_ids, ModelError, Person};

pub const TITLE: &str = "title";
pub const CAST: &str = "cast";
pub const CREW: &str = "crew";

/// Keys clients may send but which never reach the stored document
const IGNORED_KEYS: &[&str] = &["id", "_id"];

/// Stored movie body: everything except the identifier
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MovieDocument {
    pub title: String,
    #[serde(default)]
    pub cast: Vec<Uuid>,
    #[serde(default)]
    pub crew: Vec<Uuid>,
    #[serde(flatten)]
    pub attributes: Map<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Movie {
    pub id: Uuid,
    #[serde(flatten)]
    pub document: MovieDocument,
}

/// A validated set of field replacements for an existing movie
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MoviePatch {
    pub title: Option<String>,
    pub cast: Option<Vec<Uuid>>,
    pub crew: Option<Vec<Uuid>>,
    pub attributes: Map<String, Value>,
}

/// Credit identifiers to add to a movie's cast and crew sets
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CreditSet {
    pub cast: Vec<Uuid>,
    pub crew: Vec<Uuid>,
}

/// A movie whose cast and crew references are resolved into person documents
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PopulatedMovie {
    pub id: Uuid,
    pub title: String,
    pub cast: Vec<Person>,
    pub crew: Vec<Person>,
    #[serde(flatten)]
    pub attributes: Map<String, Value>,
}

impl MoviePatch {
    pub fn from_body(body: Map<String, Value>) -> Result<Self, ModelError> {
        let mut patch = MoviePatch::default();

        for (key, value) in body {
            match key.as_str() {
                k if IGNORED_KEYS.contains(&k) => {}
                TITLE => patch.title = Some(parse_title(value)?),
                CAST => patch.cast = Some(parse_id_list(CAST, value)?),
                CREW => patch.crew = Some(parse_id_list(CREW, value)?),
                _ => {
                    patch.attributes.insert(key, value);
                }
            }
        }

        Ok(patch)
    }

    /// JSON object holding only the replaced fields, ready to merge into a stored document.
    pub fn to_json(&self) -> Map<String, Value> {
        let mut fields = self.attributes.clone();
        if let Some(title) = &self.title {
            fields.insert(TITLE.into(), Value::String(title.clone()));
        }
        if let Some(cast) = &self.cast {
            fields.insert(CAST.into(), ids_to_json(cast));
        }
        if let Some(crew) = &self.crew {
            fields.insert(CREW.into(), ids_to_json(crew));
        }
        fields
    }
}

impl MovieDocument {
    pub fn from_body(body: Map<String, Value>) -> Result<Self, ModelError> {
        let patch = MoviePatch::from_body(body)?;
        let title = patch.title.ok_or(ModelError::MissingField(TITLE))?;

        Ok(Self {
            title,
            cast: patch.cast.unwrap_or_default(),
            crew: patch.crew.unwrap_or_default(),
            attributes: patch.attributes,
        })
    }

    pub fn apply(&mut self, patch: &MoviePatch) {
        if let Some(title) = &patch.title {
            self.title = title.clone();
        }
        if let Some(cast) = &patch.cast {
            self.cast = cast.clone();
        }
        if let Some(crew) = &patch.crew {
            self.crew = crew.clone();
        }
        for (key, value) in &patch.attributes {
            self.attributes.insert(key.clone(), value.clone());
        }
    }

    /// Adds credits with set semantics. Returns true if anything changed.
    pub fn add_credits(&mut self, credits: &CreditSet) -> bool {
        let before = (self.cast.len(), self.crew.len());
        self.cast = dedupe_ids(self.cast.iter().chain(&credits.cast).copied());
        self.crew = dedupe_ids(self.crew.iter().chain(&credits.crew).copied());
        before != (self.cast.len(), self.crew.len())
    }

    /// Drops `credit_id` from both sets. Returns false if neither set held it.
    pub fn remove_credit(&mut self, credit_id: Uuid) -> bool {
        let before = (self.cast.len(), self.crew.len());
        self.cast.retain(|id| *id != credit_id);
        self.crew.retain(|id| *id != credit_id);
        before != (self.cast.len(), self.crew.len())
    }

    /// Every referenced person, cast first, without repeats.
    pub fn credit_ids(&self) -> Vec<Uuid> {
        dedupe_ids(self.cast.iter().chain(&self.crew).copied())
    }
}

impl PopulatedMovie {
    /// Resolves references against `people`. References with no matching person are dropped.
    pub fn resolve(movie: Movie, people: Vec<Person>) -> Self {
        let by_id: HashMap<Uuid, Person> = people.into_iter().map(|p| (p.id, p)).collect();
        let pick = |ids: &[Uuid]| -> Vec<Person> {
            ids.iter().filter_map(|id| by_id.get(id).cloned()).collect()
        };

        let MovieDocument { title, cast, crew, attributes } = movie.document;
        Self {
            id: movie.id,
            title,
            cast: pick(&cast),
            crew: pick(&crew),
            attributes,
        }
    }
}

fn parse_title(value: Value) -> Result<String, ModelError> {
    match value {
        Value::String(title) if !title.is_empty() => Ok(title),
        _ => Err(ModelError::InvalidField {
            field: TITLE.to_string(),
            expected: "non-empty string",
        }),
    }
}

/// Accepts a single identifier or an array of identifiers.
pub(crate) fn parse_id_list(field: &str, value: Value) -> Result<Vec<Uuid>, ModelError> {
    let invalid = || ModelError::InvalidField {
        field: field.to_string(),
        expected: "[UUID]",
    };

    let items = match value {
        Value::Array(items) => items,
        single @ Value::String(_) => vec![single],
        _ => return Err(invalid()),
    };

    let ids = items
        .iter()
        .map(|item| item.as_str().and_then(|s| Uuid::parse_str(s).ok()).ok_or_else(invalid))
        .collect::<Result<Vec<_>, _>>()?;

    Ok(dedupe_ids(ids))
}

fn ids_to_json(ids: &[Uuid]) -> Value {
    Value::Array(ids.iter().map(|id| Value::String(id.to_string())).collect())
}
