//! Coin patterns inside the new world

use glam::Vec2;
use rand::Rng;
use serde::{Deserialize, Serialize};

use super::collision::circle_contains;
use super::events::{EventQueue, GameEvent};
use crate::consts::{CANVAS_HEIGHT, CANVAS_WIDTH};
use crate::tuning::CoinTuning;

/// Distance past the right edge at which patterns start
const SPAWN_OFFSET: f32 = 50.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CoinPattern {
    Line,
    Arc,
    Zigzag,
    Diamond,
    Wave,
}

impl CoinPattern {
    pub const ALL: [CoinPattern; 5] = [
        CoinPattern::Line,
        CoinPattern::Arc,
        CoinPattern::Zigzag,
        CoinPattern::Diamond,
        CoinPattern::Wave,
    ];

    /// Coin centres relative to the pattern origin (x) and a random base height
    fn layout<R: Rng>(self, rng: &mut R) -> Vec<Vec2> {
        match self {
            CoinPattern::Line => {
                let count = rng.random_range(5..=8);
                let y = 100.0 + rng.random::<f32>() * (CANVAS_HEIGHT - 250.0);
                (0..count).map(|i| Vec2::new(i as f32 * 45.0, y)).collect()
            }
            CoinPattern::Arc => {
                let base = 150.0 + rng.random::<f32>() * (CANVAS_HEIGHT - 350.0);
                (0..7)
                    .map(|i| {
                        let t = i as f32 / 6.0;
                        Vec2::new(i as f32 * 40.0, base - (t * std::f32::consts::PI).sin() * 80.0)
                    })
                    .collect()
            }
            CoinPattern::Zigzag => {
                let base = 200.0 + rng.random::<f32>() * (CANVAS_HEIGHT - 400.0);
                (0..8)
                    .map(|i| {
                        let dy = if i % 2 == 0 { -60.0 } else { 60.0 };
                        Vec2::new(i as f32 * 40.0, base + dy)
                    })
                    .collect()
            }
            CoinPattern::Diamond => {
                let base = 150.0 + rng.random::<f32>() * (CANVAS_HEIGHT - 350.0);
                [
                    (0.0, 0.0),
                    (40.0, -40.0),
                    (40.0, 40.0),
                    (80.0, -80.0),
                    (80.0, 0.0),
                    (80.0, 80.0),
                    (120.0, -40.0),
                    (120.0, 40.0),
                    (160.0, 0.0),
                ]
                .into_iter()
                .map(|(dx, dy)| Vec2::new(dx, base + dy))
                .collect()
            }
            CoinPattern::Wave => {
                let base = CANVAS_HEIGHT / 2.0;
                (0..10)
                    .map(|i| Vec2::new(i as f32 * 35.0, base + (i as f32 * 0.5).sin() * 100.0))
                    .collect()
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coin {
    /// Centre
    pub pos: Vec2,
    pub value: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CoinField {
    tuning: CoinTuning,
    pub coins: Vec<Coin>,
    active: bool,
    last_spawn_ms: Option<f64>,
    /// Coins picked up since the field was last started
    pub collected: u32,
}

impl CoinField {
    pub fn new(tuning: CoinTuning) -> Self {
        Self {
            tuning,
            coins: Vec::new(),
            active: false,
            last_spawn_ms: None,
            collected: 0,
        }
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn start(&mut self) {
        self.active = true;
        self.coins.clear();
        self.last_spawn_ms = None;
        self.collected = 0;
    }

    pub fn stop(&mut self) {
        if self.active {
            log::info!("coin field ended, {} coins collected", self.collected);
        }
        self.active = false;
        self.coins.clear();
    }

    /// Spawn, scroll and collect. Returns the currency earned this tick.
    pub fn update<R: Rng>(
        &mut self,
        now: f64,
        character_center: Vec2,
        rng: &mut R,
        queue: &mut EventQueue,
    ) -> u64 {
        if !self.active {
            return 0;
        }

        let due = self
            .last_spawn_ms
            .is_none_or(|last| now - last > self.tuning.spawn_interval_ms);
        if due {
            let pattern = CoinPattern::ALL[rng.random_range(0..CoinPattern::ALL.len())];
            self.spawn(pattern, rng);
            self.last_spawn_ms = Some(now);
        }

        let speed = self.tuning.speed;
        for coin in &mut self.coins {
            coin.pos.x -= speed;
        }

        let half = self.tuning.size / 2.0;
        let reach = self.tuning.collect_radius + half;
        let mut earned = 0;
        let mut picked = 0;
        self.coins.retain(|coin| {
            if circle_contains(character_center, reach, coin.pos) {
                earned += coin.value;
                picked += 1;
                queue.emit(GameEvent::CoinCollected {
                    pos: coin.pos,
                    value: coin.value,
                });
                return false;
            }
            coin.pos.x + half >= 0.0
        });
        self.collected += picked;
        earned
    }

    fn spawn<R: Rng>(&mut self, pattern: CoinPattern, rng: &mut R) {
        let origin = CANVAS_WIDTH + SPAWN_OFFSET;
        let value = self.tuning.value;
        let coins = pattern.layout(rng);
        log::debug!("coin pattern {pattern:?} with {} coins", coins.len());
        self.coins.extend(coins.into_iter().map(|offset| Coin {
            pos: Vec2::new(origin + offset.x, offset.y),
            value,
        }));
    }

    pub fn reset(&mut self) {
        *self = Self::new(self.tuning);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_pcg::Pcg32;

    #[test]
    fn test_inactive_field_does_nothing() {
        let mut field = CoinField::new(CoinTuning::default());
        let mut rng = Pcg32::seed_from_u64(1);
        let mut queue = EventQueue::default();
        assert_eq!(field.update(0.0, Vec2::ZERO, &mut rng, &mut queue), 0);
        assert!(field.coins.is_empty());
    }

    #[test]
    fn test_patterns_spawn_offscreen_right() {
        let mut rng = Pcg32::seed_from_u64(3);
        for pattern in CoinPattern::ALL {
            let mut field = CoinField::new(CoinTuning::default());
            field.start();
            field.spawn(pattern, &mut rng);
            assert!(!field.coins.is_empty());
            for coin in &field.coins {
                assert!(coin.pos.x >= CANVAS_WIDTH + SPAWN_OFFSET);
                assert!(coin.pos.y > 0.0 && coin.pos.y < CANVAS_HEIGHT);
            }
        }
    }

    #[test]
    fn test_spawn_interval() {
        let mut field = CoinField::new(CoinTuning::default());
        let mut rng = Pcg32::seed_from_u64(4);
        let mut queue = EventQueue::default();
        let far = Vec2::new(-500.0, -500.0);
        field.start();
        field.update(0.0, far, &mut rng, &mut queue);
        let first = field.coins.len();
        field.update(800.0, far, &mut rng, &mut queue);
        assert_eq!(field.coins.len(), first);
        field.update(801.0, far, &mut rng, &mut queue);
        assert!(field.coins.len() > first);
    }

    #[test]
    fn test_collect_within_reach() {
        let mut field = CoinField::new(CoinTuning::default());
        let mut rng = Pcg32::seed_from_u64(5);
        let mut queue = EventQueue::default();
        field.start();
        field.last_spawn_ms = Some(0.0);
        field.coins.push(Coin {
            pos: Vec2::new(142.0, 200.0),
            value: 1,
        });
        field.coins.push(Coin {
            pos: Vec2::new(300.0, 200.0),
            value: 1,
        });

        // After scrolling by 3 the first coin sits 39 px away (reach is 25 + 15)
        let earned = field.update(10.0, Vec2::new(100.0, 200.0), &mut rng, &mut queue);
        assert_eq!(earned, 1);
        assert_eq!(field.collected, 1);
        assert_eq!(field.coins.len(), 1);
        assert!(matches!(
            queue.events(),
            [GameEvent::CoinCollected { value: 1, .. }]
        ));
    }

    #[test]
    fn test_stop_clears_coins() {
        let mut field = CoinField::new(CoinTuning::default());
        let mut rng = Pcg32::seed_from_u64(6);
        let mut queue = EventQueue::default();
        field.start();
        field.update(0.0, Vec2::ZERO, &mut rng, &mut queue);
        field.stop();
        assert!(!field.is_active());
        assert!(field.coins.is_empty());
    }
}
