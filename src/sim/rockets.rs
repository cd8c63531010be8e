//! Rocket hazards
//!
//! Rockets arrive in waves of formations. Each formation splits the flight band
//! into lanes, leaves exactly one lane open and fills every other lane. A rocket
//! announces itself with a warning before it starts moving and cannot hit
//! anything until the warning is over.

use glam::Vec2;
use rand::Rng;
use serde::{Deserialize, Serialize};

use super::collision::Rect;
use super::events::{Command, EventQueue, ExplosionCause, GameEvent};
use crate::consts::{CANVAS_WIDTH, GROUND_Y};
use crate::tuning::RocketTuning;

/// Flight mode of a rocket
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum RocketMode {
    /// Flies straight left at the formation speed
    Normal,
    /// Knocked out of flight by the gravity invert; harmless, tumbles to the ground
    Ballistic { vel: Vec2, rotation: f32, spin: f32 },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Rocket {
    pub id: u32,
    /// Top-left corner
    pub pos: Vec2,
    pub width: f32,
    pub height: f32,
    pub speed: f32,
    pub spawn_ms: f64,
    pub warning_ms: f64,
    pub formation_id: u32,
    pub mode: RocketMode,
}

impl Rocket {
    pub fn is_warning(&self, now: f64) -> bool {
        self.mode == RocketMode::Normal && now - self.spawn_ms < self.warning_ms
    }

    /// Moving and able to hit the character
    pub fn is_active(&self, now: f64) -> bool {
        self.mode == RocketMode::Normal && !self.is_warning(now)
    }

    pub fn is_ballistic(&self) -> bool {
        matches!(self.mode, RocketMode::Ballistic { .. })
    }

    pub fn center(&self) -> Vec2 {
        self.pos + Vec2::new(self.width / 2.0, self.height / 2.0)
    }

    pub fn bounds(&self, tuning: &RocketTuning) -> Rect {
        Rect::new(self.pos.x, self.pos.y, self.width, self.height)
            .inset(tuning.hitbox_inset_x, tuning.hitbox_inset_y)
    }

    pub fn rotation(&self) -> f32 {
        match self.mode {
            RocketMode::Normal => 0.0,
            RocketMode::Ballistic { rotation, .. } => rotation,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RocketManager {
    tuning: RocketTuning,
    pub rockets: Vec<Rocket>,
    next_formation_ms: Option<f64>,
    formations_left: u32,
    next_id: u32,
    next_formation_id: u32,
}

impl RocketManager {
    pub fn new(tuning: RocketTuning) -> Self {
        Self {
            tuning,
            rockets: Vec::new(),
            next_formation_ms: None,
            formations_left: tuning.formations_per_wave,
            next_id: 1,
            next_formation_id: 1,
        }
    }

    /// Rest between waves; shrinks linearly as the score climbs past the threshold
    pub fn wave_interval_ms(&self, score: u64) -> f64 {
        let t = &self.tuning;
        let past = score.saturating_sub(t.score_threshold) as f32;
        let difficulty = if t.difficulty_ramp > 0.0 {
            (past / t.difficulty_ramp).min(1.0)
        } else {
            1.0
        };
        t.wave_interval_ms - difficulty as f64 * (t.wave_interval_ms - t.min_wave_interval_ms)
    }

    pub fn update<R: Rng>(
        &mut self,
        now: f64,
        score: u64,
        spawning_allowed: bool,
        rng: &mut R,
        queue: &mut EventQueue,
    ) {
        if spawning_allowed && score >= self.tuning.score_threshold {
            let due = self.next_formation_ms.is_none_or(|at| now >= at);
            if due {
                self.spawn_formation(now, rng, queue);
                self.formations_left = self.formations_left.saturating_sub(1);
                let wait = if self.formations_left == 0 {
                    self.formations_left = self.tuning.formations_per_wave;
                    self.wave_interval_ms(score)
                } else {
                    rng.random_range(
                        self.tuning.formation_delay_min_ms..=self.tuning.formation_delay_max_ms,
                    )
                };
                self.next_formation_ms = Some(now + wait);
            }
        }

        self.advance(now, queue);
    }

    fn spawn_formation<R: Rng>(&mut self, now: f64, rng: &mut R, queue: &mut EventQueue) {
        let t = self.tuning;
        let lanes = t.lane_count;
        let lane_height = (t.band_bottom() - t.min_y) / lanes as f32;
        let safe_lane = rng.random_range(0..lanes);
        let speed = rng.random_range(t.min_speed..=t.max_speed);

        let mut blocked: Vec<u32> = (0..lanes).filter(|&lane| lane != safe_lane).collect();
        // Occasionally double up one of the blocked lanes
        if rng.random_bool(0.5) {
            let extra = blocked[rng.random_range(0..blocked.len())];
            blocked.push(extra);
        }

        let formation_id = self.next_formation_id;
        self.next_formation_id += 1;
        log::debug!(
            "rocket formation {formation_id}: {} rockets, safe lane {safe_lane}",
            blocked.len()
        );

        for (i, lane) in blocked.into_iter().enumerate() {
            let lane_top = t.min_y + lane as f32 * lane_height;
            let slack = (lane_height - t.height).max(0.0);
            let y = lane_top + rng.random::<f32>() * slack;
            let id = self.next_id;
            self.next_id += 1;
            self.rockets.push(Rocket {
                id,
                pos: Vec2::new(CANVAS_WIDTH + t.width + i as f32 * t.stagger_x, y),
                width: t.width,
                height: t.height,
                speed,
                spawn_ms: now,
                warning_ms: t.warning_ms,
                formation_id,
                mode: RocketMode::Normal,
            });
            queue.emit(GameEvent::RocketWarning { y: y + t.height / 2.0 });
        }
    }

    fn advance(&mut self, now: f64, queue: &mut EventQueue) {
        let t = self.tuning;
        let mut landed = Vec::new();

        for rocket in &mut self.rockets {
            match &mut rocket.mode {
                RocketMode::Normal => {
                    if now - rocket.spawn_ms >= rocket.warning_ms {
                        rocket.pos.x -= rocket.speed;
                    }
                }
                RocketMode::Ballistic { vel, rotation, spin } => {
                    vel.y = (vel.y + t.ballistic_gravity).min(t.ballistic_terminal);
                    vel.x *= t.ballistic_drag;
                    rocket.speed *= t.ballistic_speed_decay;
                    rocket.pos.x += vel.x - rocket.speed;
                    rocket.pos.y += vel.y;
                    *spin += t.ballistic_spin_accel;
                    *rotation += *spin;
                    if rocket.pos.y + rocket.height >= GROUND_Y {
                        landed.push(rocket.id);
                    }
                }
            }
        }

        for id in landed {
            if let Some(index) = self.rockets.iter().position(|r| r.id == id) {
                let rocket = self.rockets.remove(index);
                queue.emit(GameEvent::RocketExploded {
                    pos: Vec2::new(rocket.center().x, GROUND_Y),
                    cause: ExplosionCause::Ground,
                });
                queue.command(Command::Shake(0.3));
            }
        }

        let margin = t.offscreen_margin;
        self.rockets.retain(|r| r.pos.x + r.width >= -margin);
    }

    /// Hit test against active, normal-mode rockets. The rocket that hits explodes.
    pub fn check_collision(&mut self, bounds: &Rect, now: f64, queue: &mut EventQueue) -> bool {
        let tuning = self.tuning;
        let hit = self
            .rockets
            .iter()
            .position(|r| r.is_active(now) && r.bounds(&tuning).intersects(bounds));
        match hit {
            Some(index) => {
                let rocket = self.rockets.remove(index);
                queue.emit(GameEvent::RocketExploded {
                    pos: rocket.center(),
                    cause: ExplosionCause::Collision,
                });
                queue.command(Command::Shake(0.6));
                true
            }
            None => false,
        }
    }

    /// Rockets the gravity invert would affect
    pub fn eligible_count(&self, now: f64) -> usize {
        self.rockets.iter().filter(|r| r.is_active(now)).count()
    }

    /// Knock every active rocket into a ballistic fall. Returns how many were converted.
    pub fn activate_gravity<R: Rng>(&mut self, now: f64, rng: &mut R) -> usize {
        let mut converted = 0;
        for rocket in self.rockets.iter_mut().filter(|r| r.is_active(now)) {
            rocket.mode = RocketMode::Ballistic {
                vel: Vec2::new(
                    (rng.random::<f32>() - 0.5) * 3.0,
                    -2.0 + rng.random::<f32>() * 2.0,
                ),
                rotation: 0.0,
                spin: 0.0,
            };
            converted += 1;
        }
        converted
    }

    /// Drop every rocket; the wave schedule is kept
    pub fn clear(&mut self) {
        self.rockets.clear();
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

    fn manager() -> RocketManager {
        RocketManager::new(RocketTuning::default())
    }

    fn rocket_at(m: &mut RocketManager, pos: Vec2, spawn_ms: f64) {
        let id = m.next_id;
        m.next_id += 1;
        m.rockets.push(Rocket {
            id,
            pos,
            width: 56.0,
            height: 40.0,
            speed: 4.0,
            spawn_ms,
            warning_ms: 800.0,
            formation_id: 0,
            mode: RocketMode::Normal,
        });
    }

    #[test]
    fn test_nothing_below_threshold() {
        let mut m = manager();
        let mut rng = Pcg32::seed_from_u64(1);
        let mut queue = EventQueue::default();
        m.update(0.0, 9, true, &mut rng, &mut queue);
        assert!(m.rockets.is_empty());
        m.update(0.0, 10, true, &mut rng, &mut queue);
        assert!(!m.rockets.is_empty());
    }

    #[test]
    fn test_formation_leaves_exactly_one_safe_lane() {
        let tuning = RocketTuning::default();
        let lane_height = (tuning.band_bottom() - tuning.min_y) / tuning.lane_count as f32;
        for seed in 0..64 {
            let mut m = manager();
            let mut rng = Pcg32::seed_from_u64(seed);
            let mut queue = EventQueue::default();
            m.update(0.0, 10, true, &mut rng, &mut queue);

            assert!((2..=3).contains(&m.rockets.len()));
            let mut covered = [false; 3];
            for r in &m.rockets {
                let lane = ((r.pos.y - tuning.min_y) / lane_height).floor() as usize;
                assert!(r.pos.y + r.height <= tuning.min_y + (lane + 1) as f32 * lane_height + 1e-3);
                covered[lane] = true;
                assert!(r.is_warning(0.0));
                assert_eq!(r.speed, m.rockets[0].speed);
            }
            assert_eq!(covered.iter().filter(|c| !**c).count(), 1);
        }
    }

    #[test]
    fn test_warning_rockets_are_harmless_and_parked() {
        let mut m = manager();
        let mut queue = EventQueue::default();
        rocket_at(&mut m, Vec2::new(100.0, 100.0), 0.0);
        let bounds = Rect::new(100.0, 100.0, 40.0, 30.0);

        assert!(!m.check_collision(&bounds, 799.0, &mut queue));
        m.advance(500.0, &mut queue);
        assert_eq!(m.rockets[0].pos.x, 100.0);

        assert!(m.check_collision(&bounds, 800.0, &mut queue));
        assert!(m.rockets.is_empty());
        assert!(matches!(
            queue.events(),
            [GameEvent::RocketExploded { cause: ExplosionCause::Collision, .. }]
        ));
    }

    #[test]
    fn test_wave_interval_shrinks() {
        let m = manager();
        assert_eq!(m.wave_interval_ms(10), 3000.0);
        assert_eq!(m.wave_interval_ms(25), 2250.0);
        assert_eq!(m.wave_interval_ms(40), 1500.0);
        assert_eq!(m.wave_interval_ms(500), 1500.0);
    }

    #[test]
    fn test_wave_schedule() {
        let mut m = manager();
        let mut rng = Pcg32::seed_from_u64(5);
        let mut queue = EventQueue::default();
        let mut formations = 0;
        let mut last_formation = 0;
        let mut now = 0.0;
        while now < 20_000.0 {
            m.update(now, 10, true, &mut rng, &mut queue);
            if m.next_formation_id - 1 != last_formation {
                last_formation = m.next_formation_id - 1;
                formations += 1;
            }
            now += 1000.0 / 60.0;
        }
        // At most one formation per 1200 ms and a 3000 ms rest after every third
        assert!((6..=13).contains(&formations), "{formations}");
    }

    #[test]
    fn test_gravity_converts_active_only() {
        let mut m = manager();
        let mut rng = Pcg32::seed_from_u64(9);
        rocket_at(&mut m, Vec2::new(200.0, 100.0), 0.0);
        rocket_at(&mut m, Vec2::new(300.0, 200.0), 1000.0);

        assert_eq!(m.eligible_count(1200.0), 1);
        assert_eq!(m.activate_gravity(1200.0, &mut rng), 1);
        assert!(m.rockets[0].is_ballistic());
        assert!(!m.rockets[1].is_ballistic());
        assert_eq!(m.eligible_count(1200.0), 0);
        assert_eq!(m.activate_gravity(1200.0, &mut rng), 0);
    }

    #[test]
    fn test_ballistic_is_harmless_and_explodes_on_ground() {
        let mut m = manager();
        let mut rng = Pcg32::seed_from_u64(2);
        let mut queue = EventQueue::default();
        rocket_at(&mut m, Vec2::new(200.0, 300.0), 0.0);
        m.activate_gravity(1000.0, &mut rng);

        let bounds = m.rockets[0].bounds(&RocketTuning::default());
        assert!(!m.check_collision(&bounds, 1000.0, &mut queue));

        let mut ticks = 0;
        while !m.rockets.is_empty() && ticks < 600 {
            m.advance(1000.0, &mut queue);
            ticks += 1;
            if let Some(r) = m.rockets.first() {
                if let RocketMode::Ballistic { vel, .. } = r.mode {
                    assert!(vel.y <= 15.0);
                }
            }
        }
        assert!(m.rockets.is_empty());
        assert!(queue.events().iter().any(|e| matches!(
            e,
            GameEvent::RocketExploded { cause: ExplosionCause::Ground, .. }
        )));
        assert!(queue.take_commands().contains(&Command::Shake(0.3)));
    }

    #[test]
    fn test_offscreen_removal() {
        let mut m = manager();
        let mut queue = EventQueue::default();
        rocket_at(&mut m, Vec2::new(-70.0, 100.0), 0.0);
        m.advance(1000.0, &mut queue);
        assert_eq!(m.rockets.len(), 1);
        m.advance(1000.0, &mut queue);
        assert!(m.rockets.is_empty());
    }
}
