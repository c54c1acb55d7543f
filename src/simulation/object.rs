//! The dense object registry.
//!
//! Every simulated body — SMBH, star, rock, or ship — has a row in the
//! physics engine's position/velocity/acceleration arrays, reached through
//! its `Oid`. Ship-specific state (thrust, navigation, cockpit, ...) lives
//! in the universe's separate ship storage, keyed by `ShipId`, so that a
//! rock costs nothing more than its `Object` record.

/// A dense, never-reused index into the engine's state arrays and the
/// universe's object list.
pub type Oid = usize;

/// An index into the universe's ship-specific storage.
pub type ShipId = usize;

/// What kind of body an object is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ObjectKind {
    Smbh,
    Star,
    Rock,
    Ship(ShipId),
}

impl ObjectKind {
    /// The ship id this object's kind carries, if it is a ship.
    pub fn ship_id(&self) -> Option<ShipId> {
        match self {
            ObjectKind::Ship(id) => Some(*id),
            _ => None,
        }
    }
}

/// A simulated body: identity, display, and its kind tag. Position,
/// velocity, and acceleration live in the engine, not here.
#[derive(Debug, Clone)]
pub struct Object {
    pub oid: Oid,
    pub kind: ObjectKind,
    pub icon: char,
    pub color: String,
    pub name: String,
    pub label: String,
}

impl Object {
    pub fn new(oid: Oid, kind: ObjectKind, icon: char, color: impl Into<String>, name: impl Into<String>) -> Self {
        let name = name.into();
        Self {
            oid,
            kind,
            icon,
            color: color.into(),
            label: name.clone(),
            name,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ship_id_extracts_only_for_ship_kind() {
        assert_eq!(ObjectKind::Ship(3).ship_id(), Some(3));
        assert_eq!(ObjectKind::Rock.ship_id(), None);
    }

    #[test]
    fn new_defaults_label_to_name() {
        let o = Object::new(0, ObjectKind::Star, '*', "yellow", "Sol");
        assert_eq!(o.label, "Sol");
    }
}
