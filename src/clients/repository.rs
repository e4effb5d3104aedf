use super::{Client, ClientEntry};
use crate::firestore::value::from_fields;
use crate::firestore::{FirebaseFirestore, FirestoreError};
use tracing::{debug, info, warn};

pub const CLIENTS_COLLECTION: &str = "clients";

/// Storage for client records.
#[async_trait::async_trait]
pub trait ClientRepository: Send + Sync {
    async fn list(&self) -> Result<Vec<ClientEntry>, FirestoreError>;
    /// Returns the ID of the new record.
    async fn add(&self, client: &Client) -> Result<String, FirestoreError>;
    async fn update(&self, id: &str, client: &Client) -> Result<(), FirestoreError>;
    async fn delete(&self, id: &str) -> Result<(), FirestoreError>;
}

/// The `clients` collection in Firestore.
pub struct FirestoreClientRepository {
    db: FirebaseFirestore,
}

impl FirestoreClientRepository {
    pub fn new(db: FirebaseFirestore) -> Self {
        Self { db }
    }
}

#[async_trait::async_trait]
impl ClientRepository for FirestoreClientRepository {
    /// Documents that cannot be read as a client are skipped with a warning.
    async fn list(&self) -> Result<Vec<ClientEntry>, FirestoreError> {
        let documents = self.db.collection(CLIENTS_COLLECTION).list_documents().await?;
        debug!(count = documents.len(), "fetched clients");

        Ok(documents
            .into_iter()
            .filter_map(|doc| {
                let id = doc.id().to_string();
                match from_fields::<Client>(doc.fields) {
                    Ok(client) => Some(ClientEntry { id, client }),
                    Err(e) => {
                        warn!(%id, error = %e, "skipping unreadable client");
                        None
                    }
                }
            })
            .collect())
    }

    async fn add(&self, client: &Client) -> Result<String, FirestoreError> {
        let doc = self.db.collection(CLIENTS_COLLECTION).add(client).await?;
        let id = doc.id().to_string();
        info!(%id, "client created");
        Ok(id)
    }

    async fn update(&self, id: &str, client: &Client) -> Result<(), FirestoreError> {
        self.db
            .collection(CLIENTS_COLLECTION)
            .doc(id)
            .update(client, None)
            .await?;
        info!(%id, "client updated");
        Ok(())
    }

    async fn delete(&self, id: &str) -> Result<(), FirestoreError> {
        self.db.collection(CLIENTS_COLLECTION).doc(id).delete().await?;
        info!(%id, "client deleted");
        Ok(())
    }
}
