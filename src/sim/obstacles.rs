//! Pipe pairs scrolling toward the character

use rand::Rng;
use serde::{Deserialize, Serialize};

use super::collision::Rect;
use crate::consts::{CANVAS_HEIGHT, CANVAS_WIDTH};
use crate::tuning::ObstacleTuning;

/// A top/bottom pipe pair with a gap between them
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Obstacle {
    pub id: u32,
    pub x: f32,
    pub width: f32,
    /// Height of the top segment (= y of the gap)
    pub top_height: f32,
    pub gap: f32,
    /// Set at most once, when the character clears the trailing edge
    pub passed: bool,
    pub top_destroyed: bool,
    pub bottom_destroyed: bool,
}

impl Obstacle {
    pub fn top_rect(&self) -> Rect {
        Rect::new(self.x, 0.0, self.width, self.top_height)
    }

    pub fn bottom_rect(&self) -> Rect {
        let y = self.top_height + self.gap;
        Rect::new(self.x, y, self.width, CANVAS_HEIGHT - y)
    }

    pub fn right(&self) -> f32 {
        self.x + self.width
    }
}

/// Which half of a pipe pair
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Segment {
    Top,
    Bottom,
}

/// Geometry of the pipe halves destroyed by a shield hit
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SegmentBreak {
    pub obstacle_id: u32,
    pub pieces: Vec<(Segment, Rect)>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ObstacleManager {
    tuning: ObstacleTuning,
    /// Ordered by spawn time (oldest first, so x is descending from the back)
    pub obstacles: Vec<Obstacle>,
    last_spawn_ms: Option<f64>,
    speed: f32,
    next_id: u32,
}

impl ObstacleManager {
    pub fn new(tuning: ObstacleTuning) -> Self {
        Self {
            tuning,
            obstacles: Vec::new(),
            last_spawn_ms: None,
            speed: tuning.base_speed,
            next_id: 1,
        }
    }

    pub fn speed(&self) -> f32 {
        self.speed
    }

    /// Override the scroll speed of every obstacle
    pub fn set_speed(&mut self, speed: f32) {
        self.speed = speed;
    }

    pub fn update<R: Rng>(&mut self, now: f64, spawning_allowed: bool, rng: &mut R) {
        let due = self
            .last_spawn_ms
            .is_none_or(|last| now - last > self.tuning.spawn_interval_ms);
        if spawning_allowed && due {
            self.spawn(rng);
            self.last_spawn_ms = Some(now);
        }

        for obstacle in &mut self.obstacles {
            obstacle.x -= self.speed;
        }
        self.obstacles.retain(|o| o.right() >= 0.0);
    }

    fn spawn<R: Rng>(&mut self, rng: &mut R) {
        let t = &self.tuning;
        let min_top = t.gap_margin;
        let max_top = CANVAS_HEIGHT - t.gap_margin - t.gap;
        let top_height = if max_top > min_top {
            rng.random_range(min_top..=max_top)
        } else {
            min_top
        };

        let id = self.next_id;
        self.next_id += 1;
        log::debug!("spawn obstacle {id} gap_y={top_height:.1}");
        self.obstacles.push(Obstacle {
            id,
            x: CANVAS_WIDTH,
            width: t.width,
            top_height,
            gap: t.gap,
            passed: false,
            top_destroyed: false,
            bottom_destroyed: false,
        });
    }

    /// True if `bounds` overlaps any intact segment
    pub fn check_collision(&self, bounds: &Rect) -> bool {
        self.obstacles.iter().any(|o| {
            (!o.top_destroyed && o.top_rect().intersects(bounds))
                || (!o.bottom_destroyed && o.bottom_rect().intersects(bounds))
        })
    }

    /// Destroy the intact half (or halves) of the first obstacle overlapping `bounds`
    pub fn destroy_colliding_segment(&mut self, bounds: &Rect) -> Option<SegmentBreak> {
        for obstacle in &mut self.obstacles {
            let mut pieces = Vec::new();
            if !obstacle.top_destroyed && obstacle.top_rect().intersects(bounds) {
                obstacle.top_destroyed = true;
                pieces.push((Segment::Top, obstacle.top_rect()));
            }
            if !obstacle.bottom_destroyed && obstacle.bottom_rect().intersects(bounds) {
                obstacle.bottom_destroyed = true;
                pieces.push((Segment::Bottom, obstacle.bottom_rect()));
            }
            if !pieces.is_empty() {
                return Some(SegmentBreak {
                    obstacle_id: obstacle.id,
                    pieces,
                });
            }
        }
        None
    }

    /// Mark the first newly cleared obstacle as passed. Returns false when none is.
    pub fn check_score(&mut self, character_x: f32) -> bool {
        match self
            .obstacles
            .iter_mut()
            .find(|o| !o.passed && character_x > o.right())
        {
            Some(obstacle) => {
                obstacle.passed = true;
                true
            }
            None => false,
        }
    }

    /// Drop every obstacle; spawn timing is kept
    pub fn clear(&mut self) {
        self.obstacles.clear();
    }

    pub fn reset(&mut self) {
        *self = Self::new(self.tuning);
    }
}
