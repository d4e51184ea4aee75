//! Adaptive Task Scheduler — reorders a pending task queue to match task
//! difficulty against the student's current cognitive load, and recommends a
//! focus-interval duration. See spec.md §4.9.

use serde::{Deserialize, Serialize};

use crate::settings::Settings;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Hash)]
#[serde(rename_all = "snake_case")]
pub enum Difficulty {
    Easy,
    Medium,
    Hard,
    Review,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Task {
    pub id: String,
    pub title: String,
    pub difficulty: Difficulty,
    #[serde(default = "default_estimated_minutes")]
    pub estimated_minutes: u32,
    #[serde(default)]
    pub tags: Vec<String>,
}

fn default_estimated_minutes() -> u32 {
    25
}

/// Stateless: every call reads `settings` fresh, matching the rest of the
/// engine's no-stale-config policy.
#[derive(Default)]
pub struct TaskScheduler;

impl TaskScheduler {
    pub fn new() -> Self {
        Self
    }

    /// Reorder `tasks` for optimal difficulty matching against `load_score`.
    /// High load prioritizes easy/review work; low load prioritizes
    /// hard/new-concept work. The sort is stable, so tasks that tie on
    /// difficulty rank keep their relative order.
    pub fn reorder(&self, tasks: Vec<Task>, load_score: f64, settings: &Settings) -> Vec<Task> {
        if tasks.is_empty() {
            return tasks;
        }

        let priority_order: [Difficulty; 4] = if load_score >= settings.high_load_threshold {
            [Difficulty::Easy, Difficulty::Review, Difficulty::Medium, Difficulty::Hard]
        } else if load_score >= 0.4 {
            [Difficulty::Medium, Difficulty::Hard, Difficulty::Review, Difficulty::Easy]
        } else {
            [Difficulty::Hard, Difficulty::Medium, Difficulty::Review, Difficulty::Easy]
        };

        let rank = |d: Difficulty| priority_order.iter().position(|&x| x == d).unwrap_or(99);

        let mut tasks = tasks;
        tasks.sort_by_key(|t| rank(t.difficulty));
        tasks
    }

    /// Recommended focus-interval duration in minutes, given the current
    /// load score.
    pub fn suggest_focus_minutes(&self, load_score: f64, settings: &Settings) -> u32 {
        if load_score >= settings.fatigue_threshold {
            10
        } else if load_score >= settings.high_load_threshold {
            15
        } else if load_score >= 0.45 {
            25
        } else {
            35
        }
    }
}
