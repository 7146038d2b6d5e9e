use super::domain::{ImportShipment, ShipmentId};

/// Storage abstraction for shipments; in-memory in the service binary.
pub trait ShipmentRepository: Send + Sync {
    fn insert(&self, shipment: ImportShipment) -> Result<ImportShipment, RepositoryError>;
    fn update(&self, shipment: ImportShipment) -> Result<(), RepositoryError>;
    fn fetch(&self, id: &ShipmentId) -> Result<Option<ImportShipment>, RepositoryError>;
    fn list(&self) -> Result<Vec<ImportShipment>, RepositoryError>;
}

/// Error enumeration for repository failures.
#[derive(Debug, thiserror::Error)]
pub enum RepositoryError {
    #[error("record already exists")]
    Conflict,
    #[error("record not found")]
    NotFound,
    #[error("repository unavailable: {0}")]
    Unavailable(String),
}
