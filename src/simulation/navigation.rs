//! Translating a destination vector into an ordered burn sequence.

use nalgebra::Vector3;

const ZERO_VELOCITY_EPSILON: f64 = 1e-9;

/// One constant-acceleration burn within a [`NavigationPlan`].
#[derive(Debug, Clone)]
pub struct NavStage {
    pub acceleration: Vector3<f64>,
    pub ticks: f64,
    pub description: String,
}

impl NavStage {
    fn new(acceleration: Vector3<f64>, ticks: f64, description: impl Into<String>) -> Self {
        Self {
            acceleration,
            ticks,
            description: description.into(),
        }
    }
}

/// An ordered sequence of burns computed for one order, plus the cursor
/// tracking which stage is currently active.
#[derive(Debug, Clone)]
pub struct NavigationPlan {
    pub stages: Vec<NavStage>,
    pub total_ticks: f64,
    /// `-1` means "not started", matching the spec's own sentinel so that
    /// advancing the cursor is always a uniform `+= 1`.
    pub current_index: i64,
}

impl NavigationPlan {
    pub fn new(stages: Vec<NavStage>) -> Self {
        let total_ticks = stages.iter().map(|s| s.ticks).sum();
        Self {
            stages,
            total_ticks,
            current_index: -1,
        }
    }

    pub fn started(&self) -> bool {
        self.current_index >= 0
    }

    pub fn ended(&self) -> bool {
        self.current_index >= self.stages.len() as i64
    }

    pub fn in_progress(&self) -> bool {
        self.started() && !self.ended()
    }

    pub fn current_stage(&self) -> Option<&NavStage> {
        if self.in_progress() {
            self.stages.get(self.current_index as usize)
        } else {
            None
        }
    }

    pub fn is_last_stage(&self) -> bool {
        self.current_index as usize + 1 >= self.stages.len()
    }

    pub fn increment_stage(&mut self) {
        self.current_index += 1;
    }
}

/// Build the "naive fastest" stage list for covering `target_vector`
/// (relative to the ship's current position) starting from velocity `v0`
/// with maximum acceleration magnitude `thrust`.
pub fn compute_naive_fastest(target_vector: Vector3<f64>, thrust: f64, v0: Vector3<f64>) -> Vec<NavStage> {
    let mut stages = Vec::new();
    let mut remaining = target_vector;

    let v0_norm = v0.norm();
    if v0_norm > ZERO_VELOCITY_EPSILON {
        let rest_cancel_accel = -(v0 / v0_norm) * thrust;
        let rest_cancel_ticks = v0_norm / thrust;
        let drift = 0.5 * rest_cancel_accel * rest_cancel_ticks * rest_cancel_ticks + v0 * rest_cancel_ticks;
        remaining -= drift;
        stages.push(NavStage::new(rest_cancel_accel, rest_cancel_ticks, "rest-cancel"));
    }

    let distance = remaining.norm();
    if distance > ZERO_VELOCITY_EPSILON {
        let direction = remaining / distance;
        let burn_ticks = (distance / thrust).sqrt();
        stages.push(NavStage::new(direction * thrust, burn_ticks, "departure"));
        stages.push(NavStage::new(-direction * thrust, burn_ticks, "brake"));
    }

    stages.push(NavStage::new(Vector3::zeros(), 0.0, "cutoff"));
    stages
}

/// Build the stage list for an `order_break`: cancel whatever velocity the
/// ship has and stop, with no correction for the position drift incurred
/// while braking (unlike [`compute_naive_fastest`], which treats that
/// drift as part of the remaining distance to a destination).
pub fn compute_break(effective_thrust: f64, v0: Vector3<f64>) -> Vec<NavStage> {
    let mut stages = Vec::new();
    let v0_norm = v0.norm();
    if v0_norm > ZERO_VELOCITY_EPSILON {
        let accel = -(v0 / v0_norm) * effective_thrust;
        let ticks = v0_norm / effective_thrust;
        stages.push(NavStage::new(accel, ticks, "rest-cancel"));
    }
    stages.push(NavStage::new(Vector3::zeros(), 0.0, "cutoff"));
    stages
}
