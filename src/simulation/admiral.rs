//! Fleet commanders: the human [`Player`] and the computer-controlled
//! [`Agent`], both driven through the [`Admiral`] trait.

use crate::simulation::object::Oid;
use crate::simulation::ship::FleetId;
use crate::simulation::universe::Universe;

/// Something that owns a fleet and reacts to its ships' navigation
/// arriving. Dispatched through [`Universe::notify_ship_arrived`], which
/// temporarily removes the admiral from the universe's registry so this
/// trait's `&mut self` methods can take `&mut Universe` too without
/// aliasing the same universe twice.
pub trait Admiral: std::fmt::Debug {
    fn fid(&self) -> FleetId;
    fn name(&self) -> &str;
    fn ship_oids(&self) -> &[Oid];

    /// Called whenever one of this admiral's ships finishes a navigation
    /// plan and isn't mid-patrol. The default does nothing, leaving the
    /// ship coasting at rest.
    fn on_ship_arrived(&mut self, _universe: &mut Universe, _oid: Oid) {}
}

/// A human-controlled fleet. Orders are issued externally through command
/// dispatch rather than by this admiral reacting to arrivals.
#[derive(Debug)]
pub struct Player {
    fid: FleetId,
    name: String,
    ship_oids: Vec<Oid>,
}

impl Player {
    pub fn new(fid: FleetId, name: impl Into<String>) -> Self {
        Self {
            fid,
            name: name.into(),
            ship_oids: Vec::new(),
        }
    }

    pub fn add_ship(&mut self, oid: Oid) {
        self.ship_oids.push(oid);
    }
}

impl Admiral for Player {
    fn fid(&self) -> FleetId {
        self.fid
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn ship_oids(&self) -> &[Oid] {
        &self.ship_oids
    }
}

/// A computer-controlled fleet that wanders between random celestial
/// bodies, issuing a fresh `order_fly` every time a ship arrives.
#[derive(Debug)]
pub struct Agent {
    fid: FleetId,
    ship_oids: Vec<Oid>,
}

impl Agent {
    pub fn new(fid: FleetId, ship_oids: Vec<Oid>) -> Self {
        Self { fid, ship_oids }
    }
}

impl Admiral for Agent {
    fn fid(&self) -> FleetId {
        self.fid
    }

    fn name(&self) -> &str {
        "Agent"
    }

    fn ship_oids(&self) -> &[Oid] {
        &self.ship_oids
    }

    fn on_ship_arrived(&mut self, universe: &mut Universe, oid: Oid) {
        if let Some(target) = universe.random_celestial_oid() {
            if let Err(err) = universe.order_fly(oid, target, false, false) {
                log::warn!("agent failed to issue follow-up order for oid {oid}: {err}");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Settings;
    use crate::simulation::object::ObjectKind;

    #[test]
    fn agent_reorders_a_ship_on_arrival() {
        let mut universe = Universe::new(Settings::default());
        universe.add_object(ObjectKind::Star, '*', "yellow", "Sol");
        let fid = FleetId::new();
        let oid = universe.add_ship(1.0, fid, 'A', "red", "Scout");
        let mut agent = Agent::new(fid, vec![oid]);
        agent.on_ship_arrived(&mut universe, oid);
        assert!(universe.ship_has_navigation(oid));
    }

    #[test]
    fn player_has_no_default_reaction_to_arrival() {
        let universe_settings = Settings::default();
        let mut universe = Universe::new(universe_settings);
        let fid = FleetId::new();
        let oid = universe.add_ship(1.0, fid, 'P', "blue", "Flagship");
        let mut player = Player::new(fid, "Admiral Rolt");
        player.add_ship(oid);
        player.on_ship_arrived(&mut universe, oid);
        assert!(!universe.ship_has_navigation(oid));
    }
}
