//! Browser LocalStorage backend

use serde::Serialize;
use serde::de::DeserializeOwned;
use web_sys::Storage;

use super::{ProfileStore, StorageError};
use crate::profile::PowerCharges;

const HIGH_SCORE_KEY: &str = "portal_flap_high_score";
const CURRENCY_KEY: &str = "portal_flap_currency";
const CHARGES_KEY: &str = "portal_flap_power_charges";
const SKINS_KEY: &str = "portal_flap_skins";
const EQUIPPED_SKIN_KEY: &str = "portal_flap_equipped_skin";

#[derive(Debug, Default)]
pub struct LocalStorageStore;

impl LocalStorageStore {
    fn storage() -> Option<Storage> {
        web_sys::window()
            .and_then(|w| w.local_storage().ok())
            .flatten()
    }

    fn read<T: DeserializeOwned>(key: &str) -> Option<T> {
        let json = Self::storage()?.get_item(key).ok().flatten()?;
        match serde_json::from_str(&json) {
            Ok(value) => Some(value),
            Err(err) => {
                log::warn!("ignoring unreadable {key}: {err}");
                None
            }
        }
    }

    fn write<T: Serialize + ?Sized>(key: &str, value: &T) -> Result<(), StorageError> {
        let storage =
            Self::storage().ok_or_else(|| StorageError::Unavailable("no localStorage".into()))?;
        let json = serde_json::to_string(value)?;
        storage
            .set_item(key, &json)
            .map_err(|err| StorageError::Unavailable(format!("{err:?}")))
    }
}

impl ProfileStore for LocalStorageStore {
    fn load_high_score(&self) -> Option<u64> {
        Self::read(HIGH_SCORE_KEY)
    }

    fn save_high_score(&mut self, score: u64) -> Result<(), StorageError> {
        Self::write(HIGH_SCORE_KEY, &score)
    }

    fn load_currency(&self) -> Option<u64> {
        Self::read(CURRENCY_KEY)
    }

    fn save_currency(&mut self, amount: u64) -> Result<(), StorageError> {
        Self::write(CURRENCY_KEY, &amount)
    }

    fn load_owned_power_charges(&self) -> Option<PowerCharges> {
        Self::read(CHARGES_KEY)
    }

    fn save_owned_power_charges(&mut self, charges: &PowerCharges) -> Result<(), StorageError> {
        Self::write(CHARGES_KEY, charges)
    }

    fn load_owned_skins(&self) -> Option<Vec<String>> {
        Self::read(SKINS_KEY)
    }

    fn save_owned_skins(&mut self, skins: &[String]) -> Result<(), StorageError> {
        Self::write(SKINS_KEY, skins)
    }

    fn load_equipped_skin(&self) -> Option<String> {
        Self::read(EQUIPPED_SKIN_KEY)
    }

    fn save_equipped_skin(&mut self, id: &str) -> Result<(), StorageError> {
        Self::write(EQUIPPED_SKIN_KEY, id)
    }
}
