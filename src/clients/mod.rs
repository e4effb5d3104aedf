//! Client (customer) records.

mod repository;


pub use repository::{ClientRepository, FirestoreClientRepository, CLIENTS_COLLECTION};

use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// A customer record as stored in Firestore.
///
/// Fields are read leniently: a missing or null field is empty, and numbers or
/// booleans (a phone stored as an integer) are shown as text.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Client {
    #[serde(default, deserialize_with = "text")]
    pub nome: String,
    #[serde(default, deserialize_with = "text")]
    pub email: String,
    #[serde(default, deserialize_with = "text")]
    pub telefone: String,
    #[serde(default, deserialize_with = "text")]
    pub endereco: String,
}

fn text<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    match Option::<Value>::deserialize(deserializer)? {
        None | Some(Value::Null) => Ok(String::new()),
        Some(Value::String(s)) => Ok(s),
        Some(Value::Number(n)) => Ok(n.to_string()),
        Some(Value::Bool(b)) => Ok(b.to_string()),
        Some(other) => Err(D::Error::custom(format!("expected text, got {}", other))),
    }
}

impl Client {
    /// Case-insensitive substring match against every field.
    pub fn matches(&self, needle: &str) -> bool {
        let needle = needle.to_lowercase();
        [&self.nome, &self.email, &self.telefone, &self.endereco]
            .iter()
            .any(|field| field.to_lowercase().contains(&needle))
    }
}

/// A client together with its document ID.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientEntry {
    pub id: String,
    pub client: Client,
}

/// Rows matching `search` in any field, in their original order. A blank
/// search keeps everything; otherwise the search is matched as typed.
pub fn filter_clients<'a>(entries: &'a [ClientEntry], search: &str) -> Vec<&'a ClientEntry> {
    if search.trim().is_empty() {
        return entries.iter().collect();
    }
    entries.iter().filter(|e| e.client.matches(search)).collect()
}
