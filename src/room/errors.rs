use thiserror::Error;

use crate::store::StoreError;

/// Everything a room handler can reject a request with. Errors go to the
/// requesting client only, never into the broadcast stream, and never crash
/// the room.
#[derive(Debug, Error)]
pub enum RoomError {
    #[error("Unknown item: {0}")]
    UnknownItem(String),

    #[error("Unknown seed: {0}")]
    UnknownSeed(String),

    #[error("Unknown SKU: {0}")]
    UnknownSku(String),

    #[error("Out of bounds")]
    OutOfBounds,

    #[error("Tile already occupied")]
    TileOccupied,

    #[error("Item not found")]
    ItemNotFound,

    #[error("Pet not found")]
    PetNotFound,

    #[error("Not ready to harvest")]
    NotReady,

    #[error("No seeds in inventory")]
    InsufficientSeeds,

    #[error("Insufficient coins")]
    InsufficientCoins,

    #[error("No eggs in inventory")]
    NoEggs,

    #[error("User not found")]
    UserNotFound,

    #[error("Premium item, purchase with gems")]
    WrongCurrency,

    /// The durable write matched no row; in-memory and durable state disagree.
    #[error("Update failed")]
    UpdateFailed,

    /// The persistence gateway threw. Retryable: nothing was changed.
    #[error("Persistence unavailable: {0}")]
    Persistence(#[from] StoreError),
}

impl RoomError {
    /// Whether the client may resubmit the same request unchanged and hope
    /// for a different outcome. Invalid key segments are a malformed request,
    /// not an outage.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            RoomError::Persistence(e) if !matches!(e, StoreError::InvalidKey(_))
        )
    }
}
