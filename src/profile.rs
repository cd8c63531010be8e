//! Player profile: best score, currency wallet, owned power charges and skins

use serde::{Deserialize, Serialize};

use crate::persistence::ProfileStore;
use crate::sim::PowerKind;

/// Skin every profile starts with
pub const DEFAULT_SKIN: &str = "classic";

/// Run medal, awarded from the final score
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Medal {
    Bronze,
    Silver,
    Gold,
}

impl Medal {
    pub fn for_score(score: u64) -> Self {
        match score {
            0..=10 => Medal::Bronze,
            11..=20 => Medal::Silver,
            _ => Medal::Gold,
        }
    }
}

/// Owned, not yet used power charges
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PowerCharges {
    pub shield: u32,
    pub speed_burst: u32,
    pub gravity_invert: u32,
}

impl PowerCharges {
    pub fn uniform(count: u32) -> Self {
        Self {
            shield: count,
            speed_burst: count,
            gravity_invert: count,
        }
    }

    pub fn get(&self, kind: PowerKind) -> u32 {
        match kind {
            PowerKind::Shield => self.shield,
            PowerKind::SpeedBurst => self.speed_burst,
            PowerKind::GravityInvert => self.gravity_invert,
        }
    }

    pub fn get_mut(&mut self, kind: PowerKind) -> &mut u32 {
        match kind {
            PowerKind::Shield => &mut self.shield,
            PowerKind::SpeedBurst => &mut self.speed_burst,
            PowerKind::GravityInvert => &mut self.gravity_invert,
        }
    }
}

/// Everything that outlives a run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Profile {
    pub high_score: u64,
    pub currency: u64,
    pub charges: PowerCharges,
    /// Owned skin ids (always contains the default skin)
    pub skins: Vec<String>,
    pub equipped_skin: String,
}

impl Profile {
    /// Fresh profile with the starter charges
    pub fn new(starter_charges: u32) -> Self {
        Self {
            high_score: 0,
            currency: 0,
            charges: PowerCharges::uniform(starter_charges),
            skins: vec![DEFAULT_SKIN.to_string()],
            equipped_skin: DEFAULT_SKIN.to_string(),
        }
    }

    /// Read the profile from storage. Missing entries fall back to a fresh profile.
    pub fn load<S: ProfileStore + ?Sized>(store: &S, starter_charges: u32) -> Self {
        let fresh = Self::new(starter_charges);
        let mut skins = store.load_owned_skins().unwrap_or_default();
        if !skins.iter().any(|s| s == DEFAULT_SKIN) {
            skins.insert(0, DEFAULT_SKIN.to_string());
        }
        // A stored skin that is no longer owned falls back to the default
        let equipped_skin = store
            .load_equipped_skin()
            .filter(|id| skins.contains(id))
            .unwrap_or(fresh.equipped_skin);
        let profile = Self {
            high_score: store.load_high_score().unwrap_or(fresh.high_score),
            currency: store.load_currency().unwrap_or(fresh.currency),
            charges: store.load_owned_power_charges().unwrap_or(fresh.charges),
            skins,
            equipped_skin,
        };
        log::info!(
            "profile loaded: best {}, {} coins, charges {:?}",
            profile.high_score,
            profile.currency,
            profile.charges
        );
        profile
    }

    pub fn owns_skin(&self, id: &str) -> bool {
        self.skins.iter().any(|s| s == id)
    }

    /// Record a finished run's score. Returns true if it is a new best.
    pub fn record_score(&mut self, score: u64) -> bool {
        if score > self.high_score {
            self.high_score = score;
            true
        } else {
            false
        }
    }

    /// Switch to an owned skin. Returns false for skins not owned.
    pub fn equip_skin(&mut self, id: &str) -> bool {
        if self.owns_skin(id) {
            self.equipped_skin = id.to_string();
            true
        } else {
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::persistence::MemoryStore;

    #[test]
    fn test_medal_boundaries() {
        assert_eq!(Medal::for_score(0), Medal::Bronze);
        assert_eq!(Medal::for_score(10), Medal::Bronze);
        assert_eq!(Medal::for_score(11), Medal::Silver);
        assert_eq!(Medal::for_score(20), Medal::Silver);
        assert_eq!(Medal::for_score(21), Medal::Gold);
    }

    #[test]
    fn test_record_score_only_when_beaten() {
        let mut profile = Profile::new(1);
        assert!(profile.record_score(12));
        assert!(!profile.record_score(12));
        assert!(!profile.record_score(3));
        assert_eq!(profile.high_score, 12);
    }

    #[test]
    fn test_charges_by_kind() {
        let mut charges = PowerCharges::uniform(2);
        *charges.get_mut(PowerKind::GravityInvert) -= 1;
        assert_eq!(charges.get(PowerKind::GravityInvert), 1);
        assert_eq!(charges.get(PowerKind::Shield), 2);
    }

    #[test]
    fn test_load_from_empty_store() {
        let store = MemoryStore::default();
        let profile = Profile::load(&store, 1);
        assert_eq!(profile, Profile::new(1));
        assert!(profile.owns_skin(DEFAULT_SKIN));
    }

    #[test]
    fn test_equip_requires_ownership() {
        let mut profile = Profile::new(0);
        assert!(!profile.equip_skin("neon"));
        profile.skins.push("neon".into());
        assert!(profile.equip_skin("neon"));
        assert_eq!(profile.equipped_skin, "neon");
    }

    #[test]
    fn test_load_equipped_skin_must_be_owned() {
        let mut store = MemoryStore {
            skins: Some(vec!["neon".into()]),
            equipped_skin: Some("neon".into()),
            ..Default::default()
        };
        assert_eq!(Profile::load(&store, 0).equipped_skin, "neon");

        store.equipped_skin = Some("midnight".into());
        assert_eq!(Profile::load(&store, 0).equipped_skin, DEFAULT_SKIN);
    }
}
