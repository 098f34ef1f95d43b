use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use uuid::Uuid;

/// Target of a movie credit. Attributes are free-form (`name`, `birth_year`, ...).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Person {
    pub id: Uuid,
    #[serde(flatten)]
    pub attributes: Map<String, Value>,
}

impl Person {
    pub fn new(mut attributes: Map<String, Value>) -> Self {
        attributes.remove("id");
        attributes.remove("_id");
        Self {
            id: Uuid::new_v4(),
            attributes,
        }
    }
}
