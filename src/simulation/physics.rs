//! Struct-of-arrays physics engine.
//!
//! Holds per-object state as parallel arrays (value, first derivative,
//! second derivative) indexed directly by dense object id, and integrates
//! them with a fixed-order Euler step. This is a deliberate departure from
//! an entity-component-system: the simulator addresses state by `oid`
//! directly rather than querying components per entity.

use nalgebra::Vector3;
use std::collections::HashMap;

/// One tracked quantity's value, first derivative, and second derivative,
/// each a dense `Vec` indexed by object id.
#[derive(Debug, Clone, Default)]
struct Stat {
    value: Vec<Vector3<f64>>,
    first_derivative: Vec<Vector3<f64>>,
    second_derivative: Vec<Vector3<f64>>,
}

impl Stat {
    fn new() -> Self {
        Self::default()
    }

    fn push_zero_row(&mut self) {
        self.value.push(Vector3::zeros());
        self.first_derivative.push(Vector3::zeros());
        self.second_derivative.push(Vector3::zeros());
    }
}

/// Struct-of-arrays physics state for a set of named vector stats (in
/// practice only `"position"` is used, per the data model).
#[derive(Debug, Clone, Default)]
pub struct Engine {
    stats: HashMap<String, Stat>,
    object_count: usize,
}

impl Engine {
    /// Create an engine tracking the given stat names.
    pub fn new(stat_names: &[&str]) -> Self {
        let mut stats = HashMap::new();
        for name in stat_names {
            stats.insert(name.to_string(), Stat::new());
        }
        Self {
            stats,
            object_count: 0,
        }
    }

    /// Number of objects currently tracked.
    pub fn object_count(&self) -> usize {
        self.object_count
    }

    /// Read-only view of a stat's value row.
    pub fn get_stat(&self, stat_name: &str) -> &[Vector3<f64>] {
        &self.stats[stat_name].value
    }

    /// Mutable view of a stat's value row.
    pub fn get_stat_mut(&mut self, stat_name: &str) -> &mut [Vector3<f64>] {
        &mut self.stats.get_mut(stat_name).unwrap().value
    }

    /// Read-only view of a stat's first derivative row.
    pub fn get_derivative(&self, stat_name: &str) -> &[Vector3<f64>] {
        &self.stats[stat_name].first_derivative
    }

    /// Mutable view of a stat's first derivative row.
    pub fn get_derivative_mut(&mut self, stat_name: &str) -> &mut [Vector3<f64>] {
        &mut self.stats.get_mut(stat_name).unwrap().first_derivative
    }

    /// Read-only view of a stat's second derivative row.
    pub fn get_derivative_second(&self, stat_name: &str) -> &[Vector3<f64>] {
        &self.stats[stat_name].second_derivative
    }

    /// Mutable view of a stat's second derivative row.
    pub fn get_derivative_second_mut(&mut self, stat_name: &str) -> &mut [Vector3<f64>] {
        &mut self.stats.get_mut(stat_name).unwrap().second_derivative
    }

    /// Advance every tracked stat by `dt`: first derivative integrates
    /// into value, then second derivative integrates into first
    /// derivative, in that fixed order.
    pub fn tick(&mut self, dt: f64) {
        for stat in self.stats.values_mut() {
            for i in 0..stat.value.len() {
                stat.value[i] += stat.first_derivative[i] * dt;
            }
            for i in 0..stat.first_derivative.len() {
                stat.first_derivative[i] += stat.second_derivative[i] * dt;
            }
        }
    }

    /// Grow every stat by `count` zero-initialized rows.
    pub fn add_objects(&mut self, count: usize) {
        self.object_count += count;
        for stat in self.stats.values_mut() {
            for _ in 0..count {
                stat.push_zero_row();
            }
            debug_assert_eq!(stat.value.len(), self.object_count);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn engine() -> Engine {
        Engine::new(&["position"])
    }

    #[test]
    fn add_objects_grows_all_rows_in_lockstep() {
        let mut e = engine();
        e.add_objects(3);
        assert_eq!(e.object_count(), 3);
        assert_eq!(e.get_stat("position").len(), 3);
        assert_eq!(e.get_derivative("position").len(), 3);
        assert_eq!(e.get_derivative_second("position").len(), 3);
    }

    #[test]
    fn tick_applies_first_then_second_derivative_in_order() {
        let mut e = engine();
        e.add_objects(1);
        e.get_derivative_mut("position")[0] = Vector3::new(1.0, 0.0, 0.0);
        e.get_derivative_second_mut("position")[0] = Vector3::new(0.0, 1.0, 0.0);
        e.tick(2.0);
        // Position should reflect the *old* velocity (1,0,0) * dt, not a
        // velocity that has already picked up this tick's acceleration.
        assert_eq!(e.get_stat("position")[0], Vector3::new(2.0, 0.0, 0.0));
        assert_eq!(e.get_derivative("position")[0], Vector3::new(1.0, 2.0, 0.0));
    }

    #[test]
    fn tick_is_a_noop_with_zero_objects() {
        let mut e = engine();
        e.tick(5.0);
        assert_eq!(e.object_count(), 0);
    }

    #[test]
    fn writes_through_mutable_view_affect_state() {
        let mut e = engine();
        e.add_objects(2);
        e.get_stat_mut("position")[1] = Vector3::new(9.0, 9.0, 9.0);
        assert_eq!(e.get_stat("position")[1], Vector3::new(9.0, 9.0, 9.0));
        assert_eq!(e.get_stat("position")[0], Vector3::zeros());
    }
}
