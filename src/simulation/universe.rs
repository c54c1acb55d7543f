//! The simulated universe: object registry, physics, event scheduling, and
//! the wall-clock-driven autosim loop.

use std::time::Instant;

use nalgebra::Vector3;
use rand::Rng;
use rand_distr::{Distribution, Normal};

use crate::config::Settings;
use crate::error::{Result, StarhelmError};
use crate::feedback::{RingBuffer, CONSOLE_CAPACITY, FEEDBACK_CAPACITY};
use crate::simulation::admiral::{Admiral, Agent, Player};
use crate::simulation::event_queue::{EventCallback, EventQueue, EventUid};
use crate::simulation::object::{Object, ObjectKind, Oid, ShipId};
use crate::simulation::physics::Engine;
use crate::simulation::ship::{FleetId, Ship};

/// Minimum separation between consecutive event-boundary stops in
/// `do_until_event`, preventing an infinite loop on a zero-tick event.
const EVENT_EPSILON: f64 = 1e-5;

/// The single stat name the physics engine tracks: position, with its
/// first and second derivatives standing in for velocity and acceleration.
const POSITION_STAT: &str = "position";

pub struct Universe {
    engine: Engine,
    events: EventQueue<Universe>,
    objects: Vec<Object>,
    ships: Vec<Ship>,
    admirals: Vec<Box<dyn Admiral>>,
    current_tick: f64,
    /// Ticks simulated per real second when autosim is running; zero or
    /// negative pauses the autosim loop (`update`'s wall-clock driver
    /// never advances with a non-positive rate).
    auto_simrate: f64,
    last_update_instant: Option<Instant>,
    pub feedback: RingBuffer<String>,
    pub console: RingBuffer<String>,
    pub settings: Settings,
}

impl Universe {
    /// An empty universe with no objects, events, or admirals.
    pub fn new(settings: Settings) -> Self {
        let auto_simrate = settings.default_simrate;
        Self {
            engine: Engine::new(&[POSITION_STAT]),
            events: EventQueue::new(),
            objects: Vec::new(),
            ships: Vec::new(),
            admirals: Vec::new(),
            current_tick: 0.0,
            auto_simrate,
            last_update_instant: None,
            feedback: RingBuffer::new(FEEDBACK_CAPACITY),
            console: RingBuffer::new(CONSOLE_CAPACITY),
            settings,
        }
    }

    /// Build a fresh universe and populate it: a central SMBH, a
    /// Gaussian-sampled count of stars and rocks scattered at their
    /// configured offsets, and the configured number of computer-controlled
    /// fleets with their ships scattered near the SMBH.
    pub fn genesis(settings: Settings) -> Self {
        let mut universe = Universe::new(settings);
        universe.add_object(ObjectKind::Smbh, '@', "white", "Sagittarius A*");

        let star_count = sample_gaussian_count(&mut rand::rng(), universe.settings.spawn_rate.star);
        for i in 0..star_count {
            let oid = universe.add_object(ObjectKind::Star, '*', "yellow", format!("Star {i}"));
            let offset = random_point_on_sphere(universe.settings.spawn_offset.star);
            universe.set_position_of(oid, offset);
        }

        let rock_count = sample_gaussian_count(&mut rand::rng(), universe.settings.spawn_rate.rock);
        for i in 0..rock_count {
            let oid = universe.add_object(ObjectKind::Rock, '.', "gray", format!("Rock {i}"));
            let offset = random_point_on_sphere(universe.settings.spawn_offset.rock);
            universe.set_position_of(oid, offset);
        }

        let computer_players = universe.settings.computer_players;
        for i in 0..computer_players {
            universe.add_agent(format!("Agent {i}"));
        }

        universe
    }

    // -- object registry -------------------------------------------------

    /// Register a new, non-ship object and give it a zeroed position row.
    pub fn add_object(&mut self, kind: ObjectKind, icon: char, color: impl Into<String>, name: impl Into<String>) -> Oid {
        debug_assert!(!matches!(kind, ObjectKind::Ship(_)), "use add_ship for ships");
        let oid = self.objects.len();
        self.objects.push(Object::new(oid, kind, icon, color, name));
        self.engine.add_objects(1);
        oid
    }

    /// Register a new ship: an `Object` tagged `ObjectKind::Ship` plus the
    /// ship-specific state row it points at.
    pub fn add_ship(&mut self, thrust: f64, fid: FleetId, icon: char, color: impl Into<String>, name: impl Into<String>) -> Oid {
        let ship_id: ShipId = self.ships.len();
        let oid = self.objects.len();
        self.objects.push(Object::new(oid, ObjectKind::Ship(ship_id), icon, color, name));
        self.engine.add_objects(1);
        self.ships.push(Ship::new(oid, thrust, fid));
        oid
    }

    /// Register a human-controlled fleet with no ships of its own yet.
    pub fn add_player(&mut self, name: impl Into<String>) -> FleetId {
        let fid = FleetId::new();
        self.admirals.push(Box::new(Player::new(fid, name)));
        fid
    }

    /// Register a computer-controlled fleet with a single scout ship that
    /// immediately sets off toward a random celestial body.
    pub fn add_agent(&mut self, name: impl Into<String>) -> FleetId {
        let fid = FleetId::new();
        let oid = self.add_ship(1.0, fid, 'A', "red", name.into());
        self.admirals.push(Box::new(Agent::new(fid, vec![oid])));
        if let Some(target) = self.random_celestial_oid() {
            let _ = self.order_fly(oid, target, false, false);
        }
        fid
    }

    pub fn object(&self, oid: Oid) -> &Object {
        &self.objects[oid]
    }

    pub fn objects(&self) -> &[Object] {
        &self.objects
    }

    pub fn is_oid(&self, oid: Oid) -> bool {
        oid < self.objects.len()
    }

    pub(crate) fn ship(&self, oid: Oid) -> &Ship {
        let ship_id = self.objects[oid].kind.ship_id().expect("oid is not a ship");
        &self.ships[ship_id]
    }

    pub(crate) fn ship_mut(&mut self, oid: Oid) -> &mut Ship {
        let ship_id = self.objects[oid].kind.ship_id().expect("oid is not a ship");
        &mut self.ships[ship_id]
    }

    pub fn ship_has_navigation(&self, oid: Oid) -> bool {
        self.ship(oid).navigation.is_some()
    }

    /// Pick a random non-ship celestial body, if any exist.
    pub fn random_celestial_oid(&self) -> Option<Oid> {
        let candidates: Vec<Oid> = self
            .objects
            .iter()
            .filter(|o| !matches!(o.kind, ObjectKind::Ship(_)))
            .map(|o| o.oid)
            .collect();
        if candidates.is_empty() {
            return None;
        }
        let index = rand::rng().random_range(0..candidates.len());
        Some(candidates[index])
    }

    // -- physics accessors -------------------------------------------------

    pub fn position_of(&self, oid: Oid) -> Vector3<f64> {
        self.engine.get_stat(POSITION_STAT)[oid]
    }

    pub fn velocity_of(&self, oid: Oid) -> Vector3<f64> {
        self.engine.get_derivative(POSITION_STAT)[oid]
    }

    pub fn acceleration_of(&self, oid: Oid) -> Vector3<f64> {
        self.engine.get_derivative_second(POSITION_STAT)[oid]
    }

    pub fn set_position_of(&mut self, oid: Oid, position: Vector3<f64>) {
        self.engine.get_stat_mut(POSITION_STAT)[oid] = position;
    }

    pub fn set_velocity_of(&mut self, oid: Oid, velocity: Vector3<f64>) {
        self.engine.get_derivative_mut(POSITION_STAT)[oid] = velocity;
    }

    pub fn set_acceleration_of(&mut self, oid: Oid, acceleration: Vector3<f64>) {
        self.engine.get_derivative_second_mut(POSITION_STAT)[oid] = acceleration;
    }

    // -- event scheduling --------------------------------------------------

    pub fn current_tick(&self) -> f64 {
        self.current_tick
    }

    /// Schedule `callback` to run against this universe at `tick`.
    pub fn schedule<F>(&mut self, tick: f64, uid: Option<EventUid>, callback: F, description: impl Into<String>) -> EventUid
    where
        F: FnOnce(&mut Universe, f64) + Send + 'static,
    {
        let boxed: EventCallback<Universe> = Box::new(callback);
        self.events.add(tick, boxed, description, uid)
    }

    /// Advance the simulation by `dt` ticks: integrate physics up to each
    /// due event in turn, run the event, then integrate any remainder once
    /// the horizon is reached. `dt` must be positive.
    pub fn do_ticks(&mut self, dt: f64) -> Result<()> {
        if dt <= 0.0 {
            return Err(StarhelmError::InvalidArgument(format!("do_ticks requires dt > 0, got {dt}")));
        }
        let horizon = self.current_tick + dt;
        loop {
            let due = matches!(self.events.peek_next(), Some(event) if event.tick <= horizon);
            if !due {
                break;
            }
            let event = self.events.pop_next(horizon).expect("peeked due event");
            let elapsed = event.tick - self.current_tick;
            if elapsed > 0.0 {
                self.engine.tick(elapsed);
            }
            self.current_tick = event.tick;
            (event.callback)(self, event.tick);
        }
        let remainder = horizon - self.current_tick;
        if remainder > 0.0 {
            self.engine.tick(remainder);
        }
        self.current_tick = horizon;
        Ok(())
    }

    /// Advance just far enough to run the next pending event, or do
    /// nothing if the queue is empty.
    pub fn do_next_event(&mut self) -> Result<()> {
        match self.events.peek_next() {
            Some(event) => {
                let dt = (event.tick - self.current_tick).max(EVENT_EPSILON);
                self.do_ticks(dt)
            }
            None => Ok(()),
        }
    }

    /// Advance to just short of the next pending event's tick, without
    /// firing it, or by `max_ticks` if that falls first.
    pub fn do_until_event(&mut self, max_ticks: f64) -> Result<()> {
        match self.events.peek_next() {
            Some(event) => {
                let until_event = (event.tick - self.current_tick - EVENT_EPSILON).max(0.0);
                self.do_ticks(until_event.min(max_ticks))
            }
            None => self.do_ticks(max_ticks),
        }
    }

    /// Toggle the autosim loop on or off without changing its configured
    /// rate.
    pub fn toggle_autosim(&mut self) {
        self.auto_simrate = -self.auto_simrate;
        self.last_update_instant = None;
    }

    pub fn set_simrate(&mut self, ticks_per_second: f64) {
        self.auto_simrate = ticks_per_second;
    }

    pub fn simrate(&self) -> f64 {
        self.auto_simrate
    }

    pub fn is_autosim_running(&self) -> bool {
        self.auto_simrate > 0.0
    }

    /// Drive the autosim loop from wall-clock time: if running, compute
    /// the ticks owed since the last call and advance the simulation by
    /// them. A no-op while paused.
    pub fn update(&mut self) -> Result<()> {
        if !self.is_autosim_running() {
            self.last_update_instant = None;
            return Ok(());
        }
        let now = Instant::now();
        let elapsed_seconds = match self.last_update_instant {
            Some(previous) => now.duration_since(previous).as_secs_f64(),
            None => 0.0,
        };
        self.last_update_instant = Some(now);
        let dt = elapsed_seconds * self.auto_simrate;
        if dt > 0.0 {
            self.do_ticks(dt)?;
        }
        Ok(())
    }

    // -- arrival notification ----------------------------------------------

    /// Called when a ship's navigation plan runs its last stage. Looks up
    /// the ship's admiral and, unless the ship is mid-patrol (which manages
    /// its own re-ordering), lets the admiral decide what happens next.
    pub(crate) fn notify_ship_arrived(&mut self, oid: Oid) {
        let fid = self.ship(oid).fid;
        let index = self.admirals.iter().position(|a| a.fid() == fid);
        let Some(index) = index else { return };
        let mut admiral = self.admirals.remove(index);
        admiral.on_ship_arrived(self, oid);
        self.admirals.insert(index, admiral);
    }
}

fn sample_gaussian_count(rng: &mut impl Rng, rate: crate::config::SpawnRate) -> usize {
    let normal = Normal::new(rate.mean, rate.stddev).expect("spawn rate stddev must be finite and positive");
    normal.sample(rng).max(0.0).round() as usize
}

fn random_point_on_sphere(radius: f64) -> Vector3<f64> {
    let mut rng = rand::rng();
    loop {
        let candidate = Vector3::new(
            rng.random_range(-1.0..1.0),
            rng.random_range(-1.0..1.0),
            rng.random_range(-1.0..1.0),
        );
        let norm = candidate.norm();
        if norm > 1e-9 {
            return candidate * (radius / norm);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::simulation::object::ObjectKind;

    fn test_universe() -> Universe {
        Universe::new(Settings::default())
    }

    #[test]
    fn add_object_grows_engine_and_object_list_together() {
        let mut u = test_universe();
        let oid = u.add_object(ObjectKind::Star, '*', "yellow", "Sol");
        assert_eq!(oid, 0);
        assert_eq!(u.position_of(oid), Vector3::zeros());
        assert_eq!(u.objects().len(), 1);
    }

    #[test]
    fn do_ticks_rejects_nonpositive_dt() {
        let mut u = test_universe();
        assert!(u.do_ticks(0.0).is_err());
        assert!(u.do_ticks(-1.0).is_err());
    }

    #[test]
    fn do_ticks_advances_current_tick_by_exactly_dt() {
        let mut u = test_universe();
        u.do_ticks(5.0).unwrap();
        assert!((u.current_tick() - 5.0).abs() < 1e-12);
        u.do_ticks(2.5).unwrap();
        assert!((u.current_tick() - 7.5).abs() < 1e-12);
    }

    #[test]
    fn scheduled_events_fire_in_tick_order_and_stop_tick_exactly_on_them() {
        let mut u = test_universe();
        let oid = u.add_object(ObjectKind::Rock, '.', "gray", "Rock");
        u.schedule(10.0, None, move |universe, tick| {
            universe.console.push(format!("fired at {tick}"));
            let _ = oid;
        }, "test event");
        u.do_ticks(15.0).unwrap();
        assert!((u.current_tick() - 15.0).abs() < 1e-12);
        assert_eq!(u.console.iter().next().unwrap(), "fired at 10");
    }

    #[test]
    fn toggle_autosim_flips_sign_without_changing_magnitude() {
        let mut u = test_universe();
        u.set_simrate(50.0);
        assert!(u.is_autosim_running());
        u.toggle_autosim();
        assert!(!u.is_autosim_running());
        assert!((u.simrate() + 50.0).abs() < 1e-12);
    }

    #[test]
    fn random_celestial_oid_never_returns_a_ship() {
        let mut u = test_universe();
        u.add_object(ObjectKind::Star, '*', "yellow", "Sol");
        let fid = FleetId::new();
        u.add_ship(1.0, fid, 'S', "blue", "Scout");
        for _ in 0..20 {
            let oid = u.random_celestial_oid().unwrap();
            assert!(!matches!(u.object(oid).kind, ObjectKind::Ship(_)));
        }
    }
}
