//! Browser bindings
//!
//! The page owns the canvas and the requestAnimationFrame loop. It forwards
//! input to [`WebGame`], calls `frame` with the RAF timestamp and draws from
//! `snapshot_json`.

use serde::de::DeserializeOwned;
use wasm_bindgen::prelude::*;

use crate::persistence::LocalStorageStore;
use crate::session::Session;
use crate::shop::{self, ShopItem};
use crate::sim::PowerKind;
use crate::tuning::Tuning;

#[wasm_bindgen(start)]
pub fn start() {
    console_error_panic_hook::set_once();
    if let Err(err) = console_log::init_with_level(log::Level::Info) {
        web_sys::console::warn_1(&format!("logger init failed: {err}").into());
    }
    log::info!("Portal Flap starting...");
}

fn parse<T: DeserializeOwned>(json: &str) -> Result<T, JsValue> {
    serde_json::from_str(json).map_err(|err| JsValue::from_str(&err.to_string()))
}

fn to_json<T: serde::Serialize>(value: &T) -> Result<String, JsValue> {
    serde_json::to_string(value).map_err(|err| JsValue::from_str(&err.to_string()))
}

#[wasm_bindgen]
pub struct WebGame {
    session: Session<LocalStorageStore>,
}

#[wasm_bindgen]
impl WebGame {
    /// Create a game. `tuning_json` may be empty for the default balance.
    #[wasm_bindgen(constructor)]
    pub fn new(tuning_json: &str) -> Result<WebGame, JsValue> {
        let tuning = if tuning_json.trim().is_empty() {
            Tuning::default()
        } else {
            Tuning::from_json(tuning_json).map_err(|err| JsValue::from_str(&err.to_string()))?
        };
        let seed = (js_sys::Math::random() * u32::MAX as f64) as u64;
        Ok(WebGame {
            session: Session::new(LocalStorageStore, seed, tuning),
        })
    }

    /// Advance to the RAF timestamp; returns the number of ticks run
    pub fn frame(&mut self, time_ms: f64) -> u32 {
        self.session.frame(time_ms)
    }

    pub fn flap(&mut self) {
        self.session.flap();
    }

    pub fn toggle_pause(&mut self) {
        self.session.toggle_pause();
    }

    /// `kind` is one of "shield", "speed_burst", "gravity_invert"
    pub fn activate(&mut self, kind: &str) -> Result<(), JsValue> {
        let kind = PowerKind::from_id(kind)
            .ok_or_else(|| JsValue::from_str(&format!("unknown power: {kind}")))?;
        self.session.activate(kind);
        Ok(())
    }

    pub fn set_float(&mut self, up: bool, down: bool) {
        self.session.set_float(up, down);
    }

    pub fn restart(&mut self) {
        self.session.restart();
    }

    /// `item_json` is a serialized shop item, e.g. `{"type":"skin","id":"neon"}`
    pub fn purchase(&mut self, item_json: &str, price: f64) -> Result<bool, JsValue> {
        let item: ShopItem = parse(item_json)?;
        Ok(self.session.purchase(&item, price as u64))
    }

    pub fn equip_skin(&mut self, id: &str) -> bool {
        self.session.equip_skin(id)
    }

    pub fn catalog_json(&self) -> Result<String, JsValue> {
        to_json(&shop::catalog(&self.session.state().tuning.economy))
    }

    pub fn profile_json(&self) -> Result<String, JsValue> {
        to_json(self.session.profile())
    }

    pub fn snapshot_json(&self) -> Result<String, JsValue> {
        to_json(&self.session.snapshot())
    }

    /// Drain game events (sounds, particles) as a JSON array
    pub fn events_json(&mut self) -> Result<String, JsValue> {
        to_json(&self.session.take_events())
    }
}
