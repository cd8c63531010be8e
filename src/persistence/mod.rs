//! Profile storage
//!
//! The game only touches storage at a few well-defined points (game over,
//! purchases, power activation). Loads never fail: a missing or unreadable
//! entry is `None` and the caller falls back to defaults. Saves report a
//! [`StorageError`] which the session logs and otherwise ignores.

#[cfg(target_arch = "wasm32")]
mod local_storage;

#[cfg(target_arch = "wasm32")]
pub use local_storage::LocalStorageStore;

use thiserror::Error;

use crate::profile::PowerCharges;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("storage unavailable: {0}")]
    Unavailable(String),
    #[error("could not encode value: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// Key-value persistence for the player profile
pub trait ProfileStore {
    fn load_high_score(&self) -> Option<u64>;
    fn save_high_score(&mut self, score: u64) -> Result<(), StorageError>;
    fn load_currency(&self) -> Option<u64>;
    fn save_currency(&mut self, amount: u64) -> Result<(), StorageError>;
    fn load_owned_power_charges(&self) -> Option<PowerCharges>;
    fn save_owned_power_charges(&mut self, charges: &PowerCharges) -> Result<(), StorageError>;
    fn load_owned_skins(&self) -> Option<Vec<String>>;
    fn save_owned_skins(&mut self, skins: &[String]) -> Result<(), StorageError>;
    fn load_equipped_skin(&self) -> Option<String>;
    fn save_equipped_skin(&mut self, id: &str) -> Result<(), StorageError>;
}

/// In-process store (native runs and tests)
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    pub high_score: Option<u64>,
    pub currency: Option<u64>,
    pub charges: Option<PowerCharges>,
    pub skins: Option<Vec<String>>,
    pub equipped_skin: Option<String>,
    /// Number of successful saves, for checking write frequency
    pub writes: u32,
    /// Make every save fail
    pub read_only: bool,
}

impl MemoryStore {
    fn write(&mut self) -> Result<(), StorageError> {
        if self.read_only {
            return Err(StorageError::Unavailable("store is read-only".into()));
        }
        self.writes += 1;
        Ok(())
    }
}

impl ProfileStore for MemoryStore {
    fn load_high_score(&self) -> Option<u64> {
        self.high_score
    }

    fn save_high_score(&mut self, score: u64) -> Result<(), StorageError> {
        self.write()?;
        self.high_score = Some(score);
        Ok(())
    }

    fn load_currency(&self) -> Option<u64> {
        self.currency
    }

    fn save_currency(&mut self, amount: u64) -> Result<(), StorageError> {
        self.write()?;
        self.currency = Some(amount);
        Ok(())
    }

    fn load_owned_power_charges(&self) -> Option<PowerCharges> {
        self.charges
    }

    fn save_owned_power_charges(&mut self, charges: &PowerCharges) -> Result<(), StorageError> {
        self.write()?;
        self.charges = Some(*charges);
        Ok(())
    }

    fn load_owned_skins(&self) -> Option<Vec<String>> {
        self.skins.clone()
    }

    fn save_owned_skins(&mut self, skins: &[String]) -> Result<(), StorageError> {
        self.write()?;
        self.skins = Some(skins.to_vec());
        Ok(())
    }

    fn load_equipped_skin(&self) -> Option<String> {
        self.equipped_skin.clone()
    }

    fn save_equipped_skin(&mut self, id: &str) -> Result<(), StorageError> {
        self.write()?;
        self.equipped_skin = Some(id.to_string());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_memory_store_round_trip_counts_writes() {
        let mut store = MemoryStore::default();
        assert_eq!(store.load_high_score(), None);
        store.save_high_score(42).unwrap();
        store.save_owned_power_charges(&PowerCharges::uniform(3)).unwrap();
        assert_eq!(store.load_high_score(), Some(42));
        assert_eq!(store.load_owned_power_charges(), Some(PowerCharges::uniform(3)));
        assert_eq!(store.writes, 2);
    }

    #[test]
    fn test_read_only_store_reports_error() {
        let mut store = MemoryStore {
            read_only: true,
            ..Default::default()
        };
        assert!(matches!(store.save_currency(5), Err(StorageError::Unavailable(_))));
        assert_eq!(store.load_currency(), None);
        assert_eq!(store.writes, 0);
    }
}
