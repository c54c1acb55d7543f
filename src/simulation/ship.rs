//! Ships, cockpits, and the orders that drive them.
//!
//! Orders are implemented as methods on [`crate::simulation::universe::Universe`]
//! rather than on `Ship` directly: a ship's order needs to read other
//! objects' positions, write the physics engine, and schedule events, all
//! of which live on `Universe`. Rather than give `Ship` a back-reference to
//! its owning `Universe` (the cyclic ownership the design notes call out),
//! every order takes the ship's `Oid` and operates through `&mut Universe`.

use nalgebra::Vector3;
use rand::Rng;
use uuid::Uuid;

use crate::camera::Camera;
use crate::error::{Result, StarhelmError};
use crate::simulation::event_queue::EventUid;
use crate::simulation::navigation::{compute_break, compute_naive_fastest, NavigationPlan};
use crate::simulation::object::Oid;
use crate::simulation::universe::Universe;

/// Default burn magnitude applied by `order_break`/`order_engine_burn` when
/// no explicit throttle is given.
pub const FULL_THROTTLE: f64 = 1.0;

/// The random perturbation applied to a flight's target so that two ships
/// ordered to the same destination don't arrive at the exact same point.
const ARRIVAL_PERTURBATION: f64 = 100.0;

/// Dwell time (in ticks) a patrolling ship waits at each stop before
/// departing for the next one, matching the original's `+ 200` literal.
pub const PATROL_DWELL: f64 = 200.0;

/// An opaque identifier for a fleet/admiral, generalized from the
/// original's plain integer `fid` to a `Uuid` in keeping with this crate's
/// (and its teacher's) pervasive use of `Uuid` for entity identifiers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FleetId(pub Uuid);

impl FleetId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for FleetId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for FleetId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A cyclic sequence of patrol waypoints, carrying the uid of the order
/// that created it so a stale, already-superseded patrol loop doesn't
/// keep rescheduling itself after a newer order takes over the ship.
#[derive(Debug, Clone)]
pub struct PatrolCycle {
    targets: Vec<Oid>,
    next_index: usize,
    pub uid: EventUid,
}

impl PatrolCycle {
    pub fn new(targets: Vec<Oid>, uid: EventUid) -> Self {
        Self {
            targets,
            next_index: 0,
            uid,
        }
    }

    /// The next waypoint in the cycle; wraps around indefinitely.
    pub fn next(&mut self) -> Oid {
        let oid = self.targets[self.next_index];
        self.next_index = (self.next_index + 1) % self.targets.len();
        oid
    }
}

/// Display/camera settings owned by a ship, generalized from the
/// original's per-ship `Cockpit`. Follow/track callbacks capture only an
/// `Oid`, resolved against the `Universe` at call time rather than held as
/// a reference, so a `Cockpit` never borrows its owning ship's universe.
#[derive(Debug)]
pub struct Cockpit {
    pub camera: Camera,
    /// 0 = off, 1 = oid only, 2 = oid + name, 3 = oid + name + distance,
    /// matching the original's 4-valued `toggle_labels` cycle.
    pub show_labels: u8,
    last_draw_hash: Option<u64>,
}

impl Default for Cockpit {
    fn default() -> Self {
        Self {
            camera: Camera::new(),
            show_labels: 0,
            last_draw_hash: None,
        }
    }
}

impl Cockpit {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn follow(&mut self, oid: Option<Oid>) {
        self.camera.follow(oid.map(|oid| -> crate::camera::FollowFn {
            Box::new(move |universe: &Universe| universe.position_of(oid))
        }));
    }

    pub fn track(&mut self, oid: Option<Oid>) {
        self.camera.track(oid.map(|oid| -> crate::camera::TrackFn {
            Box::new(move |universe: &Universe| universe.position_of(oid))
        }));
    }

    /// Smoothly swivel to look at `oid` over `duration_ticks`, per the
    /// camera's adjustable sigmoid.
    pub fn look(&mut self, universe: &Universe, oid: Oid, duration_ticks: f64, smooth: f64) {
        self.camera.swivel_to_point(universe.position_of(oid), duration_ticks, smooth);
    }

    pub fn snaplook(&mut self, universe: &Universe, oid: Oid) {
        self.camera.look_at_point(universe.position_of(oid));
    }

    pub fn look_prograde(&mut self, velocity: Vector3<f64>) {
        self.camera.look_at_point(velocity * 1e10);
    }

    pub fn look_retrograde(&mut self, velocity: Vector3<f64>) {
        self.camera.look_at_point(-velocity * 1e10);
    }

    pub fn toggle_labels(&mut self) {
        self.show_labels = (self.show_labels + 1) % 4;
    }

    /// Render this cockpit's view of `universe` at `size`, returning `None`
    /// if the underlying state hasn't changed since the previous call.
    pub fn draw(&mut self, universe: &Universe, ship_oid: Oid, size: (u16, u16)) -> Option<String> {
        self.camera.update(universe);
        let hash = self.state_hash(universe, size);
        if self.last_draw_hash == Some(hash) {
            return None;
        }
        self.last_draw_hash = Some(hash);
        match crate::charmap::draw_ship_view(&self.camera, self.show_labels, universe, ship_oid, size) {
            Ok(text) => Some(text),
            Err(StarhelmError::CharmapTooSmall { .. }) => Some("window too small".to_string()),
            Err(_) => Some("render error".to_string()),
        }
    }

    fn state_hash(&self, universe: &Universe, size: (u16, u16)) -> u64 {
        use std::hash::{Hash, Hasher};
        let mut hasher = std::collections::hash_map::DefaultHasher::new();
        universe.current_tick().to_bits().hash(&mut hasher);
        size.hash(&mut hasher);
        self.show_labels.hash(&mut hasher);
        self.camera.position.x.to_bits().hash(&mut hasher);
        self.camera.position.y.to_bits().hash(&mut hasher);
        self.camera.position.z.to_bits().hash(&mut hasher);
        for component in self.camera.rotation.coords.iter() {
            component.to_bits().hash(&mut hasher);
        }
        self.camera.zoom().to_bits().hash(&mut hasher);
        self.camera.is_following().hash(&mut hasher);
        self.camera.is_tracking().hash(&mut hasher);
        hasher.finish()
    }
}

/// A powered ship: the spec's `Object` extended with thrust, fleet
/// ownership, the active order's uid, a navigation plan, an optional
/// patrol cycle, and a cockpit.
#[derive(Debug)]
pub struct Ship {
    pub oid: Oid,
    pub thrust: f64,
    pub fid: FleetId,
    pub current_order_uid: Option<EventUid>,
    pub navigation: Option<NavigationPlan>,
    pub patrol_cycle: Option<PatrolCycle>,
    pub cockpit: Cockpit,
}

impl Ship {
    pub fn new(oid: Oid, thrust: f64, fid: FleetId) -> Self {
        Self {
            oid,
            thrust,
            fid,
            current_order_uid: None,
            navigation: None,
            patrol_cycle: None,
            cockpit: Cockpit::new(),
        }
    }
}

impl Universe {
    /// Supersede any order in progress on `oid`: invalidate its uid,
    /// navigation, and patrol cycle, then optionally issue an
    /// `order_break` to cancel remaining velocity.
    pub fn order_cancel(&mut self, oid: Oid, apply_break: bool) -> Result<()> {
        self.invalidate_current_order(oid);
        if apply_break {
            self.order_break(oid, FULL_THROTTLE)?;
        }
        Ok(())
    }

    fn invalidate_current_order(&mut self, oid: Oid) {
        let ship = self.ship_mut(oid);
        ship.current_order_uid = None;
        ship.navigation = None;
        ship.patrol_cycle = None;
    }

    /// Bring the ship to rest without correcting for drift incurred while
    /// braking: a single rest-cancel stage, then cutoff.
    pub fn order_break(&mut self, oid: Oid, throttle: f64) -> Result<()> {
        if !(0.0 < throttle && throttle <= 1.0) {
            return Err(StarhelmError::InvalidArgument(format!(
                "throttle must be in (0, 1], got {throttle}"
            )));
        }
        let thrust = self.ship(oid).thrust;
        if thrust <= 0.0 {
            log::debug!("oid {oid} ignoring order_break: no thrust");
            return Ok(());
        }
        let v0 = self.velocity_of(oid);
        let stages = compute_break(thrust * throttle, v0);
        self.navigate(oid, stages, None)
    }

    /// Fly to `target_oid`, applying a random perturbation so ships
    /// converging on the same target don't arrive at the exact same point.
    pub fn order_fly(&mut self, oid: Oid, target_oid: Oid, look: bool, track: bool) -> Result<()> {
        self.order_fly_impl(oid, target_oid, look, track, None)
    }

    fn order_fly_impl(
        &mut self,
        oid: Oid,
        target_oid: Oid,
        look: bool,
        track: bool,
        reuse_uid: Option<EventUid>,
    ) -> Result<()> {
        if !self.is_oid(target_oid) {
            return Err(StarhelmError::InvalidArgument(format!("invalid target oid: {target_oid}")));
        }
        let thrust = self.ship(oid).thrust;
        if thrust <= 0.0 {
            log::debug!("oid {oid} ignoring order_fly: no thrust");
            return Ok(());
        }
        if look {
            let target_pos = self.position_of(target_oid);
            self.ship_mut(oid).cockpit.camera.look_at_point(target_pos);
        }
        if track {
            self.ship_mut(oid).cockpit.track(Some(target_oid));
        }
        let offset = random_offset(ARRIVAL_PERTURBATION);
        let target_vector = (self.position_of(target_oid) + offset) - self.position_of(oid);
        let v0 = self.velocity_of(oid);
        let stages = compute_naive_fastest(target_vector, thrust, v0);
        self.navigate(oid, stages, reuse_uid)
    }

    /// Directly set the acceleration row to `thrust * throttle` along
    /// `vector`, with no scheduled cutoff. Supersedes any navigation plan.
    pub fn order_engine_burn(&mut self, oid: Oid, vector: Vector3<f64>, throttle: f64) -> Result<()> {
        if !(0.0 < throttle && throttle <= 1.0) {
            return Err(StarhelmError::InvalidArgument(format!(
                "throttle must be in (0, 1], got {throttle}"
            )));
        }
        let magnitude = vector.norm();
        if magnitude == 0.0 {
            log::warn!("oid {oid} tried to engine burn without direction");
            return Ok(());
        }
        self.invalidate_current_order(oid);
        let thrust = self.ship(oid).thrust;
        let accel = vector * (thrust * throttle / magnitude);
        self.set_acceleration_of(oid, accel);
        Ok(())
    }

    /// Zero acceleration immediately. Supersedes any navigation plan.
    pub fn order_engine_cut(&mut self, oid: Oid) {
        self.invalidate_current_order(oid);
        self.set_acceleration_of(oid, Vector3::zeros());
    }

    /// Cycle through `target_oids`, flying to each in turn and dwelling
    /// for [`PATROL_DWELL`] ticks before departing for the next.
    pub fn order_patrol(&mut self, oid: Oid, target_oids: Vec<Oid>, look: bool, track: bool) -> Result<()> {
        if target_oids.is_empty() {
            return Err(StarhelmError::InvalidArgument("order_patrol requires at least one target".into()));
        }
        for target in &target_oids {
            if !self.is_oid(*target) {
                return Err(StarhelmError::InvalidArgument(format!("invalid patrol target oid: {target}")));
            }
        }
        let uid = crate::simulation::event_queue::new_event_uid();
        {
            let ship = self.ship_mut(oid);
            ship.patrol_cycle = Some(PatrolCycle::new(target_oids, uid));
        }
        self.patrol_step(oid, uid, look, track);
        Ok(())
    }

    fn patrol_step(&mut self, oid: Oid, uid: EventUid, look: bool, track: bool) {
        let still_current = matches!(&self.ship(oid).patrol_cycle, Some(pc) if pc.uid == uid);
        if !still_current {
            return;
        }
        let target = self.ship_mut(oid).patrol_cycle.as_mut().expect("checked above").next();
        if self.order_fly_impl(oid, target, look, track, Some(uid)).is_err() {
            return;
        }
        let arrival_ticks = self
            .ship(oid)
            .navigation
            .as_ref()
            .map(|nav| nav.total_ticks)
            .unwrap_or(0.0);
        let dwell_tick = self.current_tick() + arrival_ticks + PATROL_DWELL;
        self.schedule(dwell_tick, Some(uid), move |universe, _fire_tick| {
            universe.patrol_step(oid, uid, look, track);
        }, format!("oid {oid} patrol dwell"));
    }

    /// Build a fresh `NavigationPlan` from `stages`, install it as the
    /// ship's active order, and fire off its first stage.
    fn navigate(&mut self, oid: Oid, stages: Vec<crate::simulation::navigation::NavStage>, reuse_uid: Option<EventUid>) -> Result<()> {
        let uid = reuse_uid.unwrap_or_else(crate::simulation::event_queue::new_event_uid);
        {
            let ship = self.ship_mut(oid);
            ship.navigation = Some(NavigationPlan::new(stages));
            ship.current_order_uid = Some(uid);
            if reuse_uid.is_none() {
                ship.patrol_cycle = None;
            }
        }
        self.do_next_navstage(oid, uid);
        Ok(())
    }

    /// Advance the ship's navigation by one stage: apply its acceleration,
    /// and either schedule the next stage or, if this was the last one,
    /// clear the navigation and notify the owning admiral of arrival.
    /// A no-op if `uid` no longer matches the ship's current order (the
    /// order it belonged to has since been superseded).
    fn do_next_navstage(&mut self, oid: Oid, uid: EventUid) {
        let still_current = self.ship(oid).current_order_uid == Some(uid);
        if !still_current {
            log::debug!("oid {oid} ignoring stale navstage callback for uid {uid}");
            return;
        }
        debug_assert!(
            !self
                .ship(oid)
                .navigation
                .as_ref()
                .map(|n| n.ended())
                .unwrap_or(true),
            "do_next_navstage called on an already-ended navigation"
        );
        self.ship_mut(oid).navigation.as_mut().unwrap().increment_stage();
        let thrust = self.ship(oid).thrust;
        let (accel, ticks, is_last) = {
            let nav = self.ship(oid).navigation.as_ref().unwrap();
            let stage = nav.current_stage().expect("just incremented onto a stage");
            (clamp_to_magnitude(stage.acceleration, thrust), stage.ticks, nav.is_last_stage())
        };
        self.set_acceleration_of(oid, accel);
        if !is_last {
            let next_tick = self.current_tick() + ticks;
            self.schedule(next_tick, Some(uid), move |universe, _fire_tick| {
                universe.do_next_navstage(oid, uid);
            }, format!("oid {oid} navigation stage"));
        } else {
            self.ship_mut(oid).navigation.as_mut().unwrap().increment_stage();
            let patrolling = self.ship(oid).patrol_cycle.is_some();
            self.ship_mut(oid).navigation = None;
            if !patrolling {
                self.notify_ship_arrived(oid);
            }
        }
    }
}

/// Clamp a vector's magnitude to at most `max_magnitude`, preserving its
/// direction.
fn clamp_to_magnitude(v: Vector3<f64>, max_magnitude: f64) -> Vector3<f64> {
    let magnitude = v.norm();
    if magnitude > max_magnitude && magnitude > 0.0 {
        v * (max_magnitude / magnitude)
    } else {
        v
    }
}

/// A random offset vector of the given magnitude, uniformly distributed in
/// direction.
fn random_offset(magnitude: f64) -> Vector3<f64> {
    let mut rng = rand::rng();
    let direction = Vector3::new(
        rng.random_range(-1.0..1.0),
        rng.random_range(-1.0..1.0),
        rng.random_range(-1.0..1.0),
    );
    let norm = direction.norm();
    if norm < 1e-9 {
        return Vector3::zeros();
    }
    direction * (magnitude / norm)
}
