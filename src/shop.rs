//! Spending currency on power charges and skins
//!
//! The shop only ever adds charges. Using a charge is the simulation's job.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::profile::Profile;
use crate::sim::PowerKind;
use crate::tuning::EconomyTuning;

/// Skins sold in the shop (the default skin is free and always owned)
pub const SKINS: [&str; 3] = ["sunset", "neon", "midnight"];

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "type", content = "id")]
pub enum ShopItem {
    /// One charge of a power
    Power(PowerKind),
    Skin(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PurchaseError {
    #[error("not enough currency: need {price}, have {balance}")]
    InsufficientFunds { price: u64, balance: u64 },
    #[error("already owned")]
    AlreadyOwned,
    #[error("unknown item")]
    UnknownItem,
}

/// A priced entry for the shop screen
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Listing {
    pub item: ShopItem,
    pub price: u64,
}

/// Everything for sale, with prices from the economy tuning
pub fn catalog(economy: &EconomyTuning) -> Vec<Listing> {
    let powers = [
        (PowerKind::Shield, economy.shield_price),
        (PowerKind::SpeedBurst, economy.burst_price),
        (PowerKind::GravityInvert, economy.gravity_price),
    ]
    .into_iter()
    .map(|(kind, price)| Listing {
        item: ShopItem::Power(kind),
        price,
    });
    let skins = SKINS.iter().map(|id| Listing {
        item: ShopItem::Skin(id.to_string()),
        price: economy.skin_price,
    });
    powers.chain(skins).collect()
}

/// Buy `item` for `price`. On error the profile is left untouched.
pub fn purchase(profile: &mut Profile, item: &ShopItem, price: u64) -> Result<(), PurchaseError> {
    if let ShopItem::Skin(id) = item {
        if !SKINS.contains(&id.as_str()) {
            return Err(PurchaseError::UnknownItem);
        }
        if profile.owns_skin(id) {
            return Err(PurchaseError::AlreadyOwned);
        }
    }
    if profile.currency < price {
        return Err(PurchaseError::InsufficientFunds {
            price,
            balance: profile.currency,
        });
    }

    profile.currency -= price;
    match item {
        ShopItem::Power(kind) => *profile.charges.get_mut(*kind) += 1,
        ShopItem::Skin(id) => profile.skins.push(id.clone()),
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_buy_charge() {
        let mut profile = Profile::new(0);
        profile.currency = 100;
        purchase(&mut profile, &ShopItem::Power(PowerKind::Shield), 50).unwrap();
        assert_eq!(profile.currency, 50);
        assert_eq!(profile.charges.shield, 1);
    }

    #[test]
    fn test_insufficient_funds_changes_nothing() {
        let mut profile = Profile::new(0);
        profile.currency = 10;
        let before = profile.clone();
        let err = purchase(&mut profile, &ShopItem::Power(PowerKind::GravityInvert), 60).unwrap_err();
        assert_eq!(
            err,
            PurchaseError::InsufficientFunds {
                price: 60,
                balance: 10
            }
        );
        assert_eq!(profile, before);
    }

    #[test]
    fn test_skins_bought_once() {
        let mut profile = Profile::new(0);
        profile.currency = 500;
        let neon = ShopItem::Skin("neon".into());
        purchase(&mut profile, &neon, 150).unwrap();
        assert!(profile.owns_skin("neon"));
        assert_eq!(purchase(&mut profile, &neon, 150), Err(PurchaseError::AlreadyOwned));
        assert_eq!(profile.currency, 350);
        assert_eq!(
            purchase(&mut profile, &ShopItem::Skin("gold".into()), 1),
            Err(PurchaseError::UnknownItem)
        );
    }

    #[test]
    fn test_catalog_prices() {
        let economy = EconomyTuning::default();
        let listings = catalog(&economy);
        assert_eq!(listings.len(), 6);
        assert_eq!(listings[1].item, ShopItem::Power(PowerKind::SpeedBurst));
        assert_eq!(listings[1].price, 40);
        assert!(listings[3..].iter().all(|l| l.price == economy.skin_price));
    }
}
