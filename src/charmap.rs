//! 3D-to-character projection: pixel projection, label placement,
//! crosshairs, and the status bar line.

use nalgebra::{UnitQuaternion, Vector3};

use crate::camera::Camera;
use crate::error::{Result, StarhelmError};
use crate::markup::{escape, wrap_tag};
use crate::math::{latlong_single, unit_axis_points, Quat};
use crate::simulation::object::{ObjectKind, Oid};
use crate::simulation::universe::Universe;

/// Smallest width/height a [`CharMap`] can be constructed with.
pub const MINIMUM_DIMENSION: u16 = 3;

/// Smallest number of free cells a fallback label placement requires.
const MIN_LABEL_FALLBACK_SIZE: usize = 4;

const PROGRADE_SCALE: f64 = 1e10;
const PROGRADE_EPSILON: f64 = 1e-9;

/// A single cell in the character grid. `Whitespace` marks a space written
/// as part of a label, protecting it from being overwritten the way a
/// never-written `Empty` cell can be.
#[derive(Debug, Clone, PartialEq)]
enum Cell {
    Empty,
    Char(char, Option<String>),
    Whitespace,
}

impl Cell {
    fn is_empty(&self) -> bool {
        matches!(self, Cell::Empty)
    }

    fn render(&self) -> String {
        match self {
            Cell::Empty | Cell::Whitespace => " ".to_string(),
            Cell::Char(c, Some(tag)) => wrap_tag(tag, &c.to_string()),
            Cell::Char(c, None) => c.to_string(),
        }
    }
}

/// The subset of camera state a charmap needs to project points and draw
/// its status bar, captured by value so the charmap never borrows the
/// live camera.
#[derive(Debug, Clone, Copy)]
pub struct CameraSnapshot {
    pub position: Vector3<f64>,
    pub rotation: UnitQuaternion<f64>,
    pub zoom: f64,
    pub is_following: bool,
    pub is_tracking: bool,
}

impl CameraSnapshot {
    pub fn from_camera(camera: &Camera) -> Self {
        Self {
            position: camera.position,
            rotation: camera.rotation,
            zoom: camera.zoom(),
            is_following: camera.is_following(),
            is_tracking: camera.is_tracking(),
        }
    }
}

/// A character grid produced by projecting world points through a camera.
pub struct CharMap {
    width: u16,
    height: u16,
    show_bar: bool,
    aspect_ratio: f64,
    camera: CameraSnapshot,
    cells: Vec<Vec<Cell>>,
}

impl CharMap {
    /// Construct an empty charmap. `show_bar` reserves the bottom row for
    /// the status line; the remaining drawable area must still be at
    /// least `3x3`.
    pub fn new(camera: CameraSnapshot, size: (u16, u16), show_bar: bool, aspect_ratio: f64) -> Result<Self> {
        let (width, height) = size;
        let drawable_height = if show_bar { height.saturating_sub(1) } else { height };
        if width < MINIMUM_DIMENSION || drawable_height < MINIMUM_DIMENSION {
            return Err(StarhelmError::CharmapTooSmall { width, height });
        }
        let cells = vec![vec![Cell::Empty; width as usize]; drawable_height as usize];
        Ok(Self {
            width,
            height: drawable_height,
            show_bar,
            aspect_ratio,
            camera,
            cells,
        })
    }

    fn row_in_bounds(&self, y: i32) -> bool {
        y >= 0 && (y as usize) < self.cells.len()
    }

    fn cell_in_bounds(&self, x: i32, y: i32) -> bool {
        self.row_in_bounds(y) && x >= 0 && (x as usize) < self.width as usize
    }

    fn is_empty(&self, x: i32, y: i32) -> bool {
        self.cell_in_bounds(x, y) && self.cells[y as usize][x as usize].is_empty()
    }

    /// Project `points` into pixel space, discarding any that land off the
    /// visible grid or exactly at the camera's own position. Returns
    /// `(batch_index, x, y)` triples.
    pub fn project(&self, points: &[Vector3<f64>]) -> Vec<(usize, i32, i32)> {
        let quat = Quat(self.camera.rotation);
        let mut out = Vec::new();
        for (i, point) in points.iter().enumerate() {
            if *point == self.camera.position {
                continue;
            }
            let relative = quat.rotate_vector(point - self.camera.position);
            let (longitude, latitude) = latlong_single(relative);
            let x = longitude * self.camera.zoom;
            let y = latitude * self.aspect_ratio * self.camera.zoom;
            let y = -y;
            let x = x + (self.width as i32 / 2) as f64;
            let y = y + (self.cells.len() as i32 / 2) as f64;
            let (rx, ry) = (x.round() as i32, y.round() as i32);
            if rx < 0 || rx as usize >= self.width as usize - 1 || ry < 0 || ry as usize >= self.cells.len() - 1 {
                continue;
            }
            out.push((i, rx, ry));
        }
        out
    }

    fn write_char(&mut self, x: i32, y: i32, ch: char, tag: Option<&str>) {
        if !self.cell_in_bounds(x, y) {
            return;
        }
        let cell = &mut self.cells[y as usize][x as usize];
        if !cell.is_empty() {
            return;
        }
        *cell = if ch == ' ' {
            Cell::Whitespace
        } else {
            Cell::Char(ch, tag.map(str::to_string))
        };
    }

    fn empty_run(&self, x: i32, y: i32) -> usize {
        if !self.row_in_bounds(y) {
            return 0;
        }
        let row = &self.cells[y as usize];
        let mut count = 0;
        let mut cx = x;
        while cx >= 0 && (cx as usize) < row.len() && row[cx as usize].is_empty() {
            count += 1;
            cx += 1;
        }
        count
    }

    fn write_label_text(&mut self, x: i32, y: i32, text: &str, tag: Option<&str>) {
        let mut cx = x;
        for ch in text.chars() {
            self.write_char(cx, y, ch, tag);
            cx += 1;
        }
    }

    /// Place `text` anchored one cell to the right of (x, y): rows
    /// `{y, y+1, y-1}` in that order, then falling back to whichever of
    /// `{y-1, y, y+1}` has the most room, only if that room is at least
    /// [`MIN_LABEL_FALLBACK_SIZE`] (truncating the label to fit).
    fn write_label(&mut self, x: i32, y: i32, text: &str, tag: Option<&str>) {
        if text.is_empty() {
            return;
        }
        let start = x + 1;
        let length = text.chars().count();
        for dy in [0, 1, -1] {
            let row = y + dy;
            if self.row_in_bounds(row) && self.empty_run(start, row) >= length {
                self.write_label_text(start, row, text, tag);
                return;
            }
        }
        let mut best_dy = -1;
        let mut best_room = 0usize;
        for dy in [-1, 0, 1] {
            let room = self.empty_run(start, y + dy);
            if room > best_room {
                best_room = room;
                best_dy = dy;
            }
        }
        if best_room >= MIN_LABEL_FALLBACK_SIZE {
            let truncated: String = text.chars().take(best_room).collect();
            self.write_label_text(start, y + best_dy, &truncated, tag);
        }
    }

    /// Project and draw a single object: its icon, then each `(text, tag)`
    /// label in turn (multiple labels stack, e.g. name then distance).
    /// Returns whether the point was visible at all.
    pub fn add_object(&mut self, point: Vector3<f64>, icon: char, tag: Option<&str>, labels: &[(String, Option<String>)]) -> bool {
        let projected = self.project(std::slice::from_ref(&point));
        let Some(&(_, x, y)) = projected.first() else {
            return false;
        };
        self.write_char(x, y, icon, tag);
        for (text, label_tag) in labels {
            self.write_label(x, y, &escape(text), label_tag.as_deref());
        }
        true
    }

    /// Vectorized form of [`add_object`](Self::add_object): `icons`,
    /// `tags`, and `labels` are parallel to `points`.
    pub fn add_objects(
        &mut self,
        points: &[Vector3<f64>],
        icons: &[char],
        tags: &[Option<&str>],
        labels: &[Vec<(String, Option<String>)>],
    ) {
        for projected in self.project(points) {
            let (i, x, y) = projected;
            self.write_char(x, y, icons[i], tags[i]);
            for (text, label_tag) in &labels[i] {
                self.write_label(x, y, &escape(text), label_tag.as_deref());
            }
        }
    }

    /// Draw a crosshair around `point` (or the grid center if `None`),
    /// choosing the straight (`│ │ ─ ─`) or diagonal (`\ \ / /`) arm set
    /// by whichever has more empty neighbor cells; ties favor diagonal.
    pub fn add_crosshair(&mut self, point: Option<Vector3<f64>>, color: &str) {
        let (cx, cy) = match point {
            Some(p) => match self.project(std::slice::from_ref(&p)).first() {
                Some(&(_, x, y)) => (x, y),
                None => (self.width as i32 / 2, self.height as i32 / 2),
            },
            None => (self.width as i32 / 2, self.height as i32 / 2),
        };
        let straight = [(cx, cy - 1, '│'), (cx, cy + 1, '│'), (cx - 1, cy, '─'), (cx + 1, cy, '─')];
        let diagonal = [(cx - 1, cy - 1, '\\'), (cx + 1, cy + 1, '\\'), (cx - 1, cy + 1, '/'), (cx + 1, cy - 1, '/')];
        let straight_empty = straight.iter().filter(|(x, y, _)| self.is_empty(*x, *y)).count();
        let diagonal_empty = diagonal.iter().filter(|(x, y, _)| self.is_empty(*x, *y)).count();
        let chosen = if diagonal_empty >= straight_empty { &diagonal[..] } else { &straight[..] };
        for (x, y, ch) in chosen {
            self.write_char(*x, *y, *ch, Some(color));
        }
    }

    /// Draw prograde (`×`, green) and retrograde (`+`, red) markers at
    /// `velocity * 1e10` / `-velocity * 1e10`, each with a label and
    /// crosshair, if the ship is moving at all.
    pub fn add_prograde_retrograde(&mut self, velocity: Vector3<f64>) {
        if velocity.norm() <= PROGRADE_EPSILON {
            return;
        }
        let prograde = velocity * PROGRADE_SCALE;
        let retrograde = -velocity * PROGRADE_SCALE;
        self.add_object(prograde, '×', Some("green"), &[("PROGRADE".to_string(), Some("green".to_string()))]);
        self.add_crosshair(Some(prograde), "green");
        self.add_object(retrograde, '+', Some("red"), &[("RETROGRADE".to_string(), Some("red".to_string()))]);
        self.add_crosshair(Some(retrograde), "red");
    }

    /// Draw the six world axes at large distance, labeled X+/X-/Y+/Y-/Z+/Z-.
    pub fn add_projection_axes(&mut self) {
        const LABELS: [&str; 6] = ["X+", "X-", "Y+", "Y-", "Z+", "Z-"];
        for (point, label) in unit_axis_points().into_iter().zip(LABELS) {
            self.add_object(point, '╬', Some("white"), &[(label.to_string(), Some("white".to_string()))]);
        }
    }

    /// Join the grid into a single string; if `show_bar` was requested,
    /// append a final status line.
    pub fn draw(&self) -> String {
        let mut rows: Vec<String> = self
            .cells
            .iter()
            .map(|row| row.iter().map(Cell::render).collect::<String>())
            .collect();
        if self.show_bar {
            rows.push(self.status_bar());
        }
        rows.join("\n")
    }

    fn status_bar(&self) -> String {
        let (lon, lat) = latlong_single(Quat(self.camera.rotation).inverse().rotate_vector(Vector3::x()));
        let follow = if self.camera.is_following { "F" } else { "-" };
        let track = if self.camera.is_tracking { "T" } else { "-" };
        format!(
            "[{follow}{track}] lat/long: {:.1}/{:.1} zoom: {:.2}x pos: ({:.1}, {:.1}, {:.1}) {}x{}",
            lat, lon, self.camera.zoom, self.camera.position.x, self.camera.position.y, self.camera.position.z, self.width, self.height
        )
    }
}

/// Render a ship's cockpit view: every other object in the universe
/// projected and labeled per `show_labels`, the velocity prograde/
/// retrograde markers, the six world axes, and a crosshair at center.
pub fn draw_ship_view(camera: &Camera, show_labels: u8, universe: &Universe, ship_oid: Oid, size: (u16, u16)) -> Result<String> {
    let snapshot = CameraSnapshot::from_camera(camera);
    let aspect_ratio = universe.settings.aspect_ratio();
    let mut map = CharMap::new(snapshot, size, true, aspect_ratio)?;

    for object in universe.objects() {
        if object.oid == ship_oid {
            continue;
        }
        let point = universe.position_of(object.oid);
        let labels = label_set_for(show_labels, universe, object.oid, &object.label);
        map.add_object(point, object.icon, Some(object.color.as_str()), &labels);
    }

    map.add_prograde_retrograde(universe.velocity_of(ship_oid));
    map.add_projection_axes();
    map.add_crosshair(None, &universe.settings.crosshair_color);
    Ok(map.draw())
}

fn label_set_for(show_labels: u8, universe: &Universe, oid: Oid, label: &str) -> Vec<(String, Option<String>)> {
    match show_labels {
        0 => Vec::new(),
        1 => vec![(oid.to_string(), None)],
        2 => vec![(label.to_string(), None)],
        _ => {
            let distance = universe.position_of(oid).norm();
            vec![(label.to_string(), None), (format!("{distance:.0}"), Some("gray".to_string()))]
        }
    }
}

impl Universe {
    /// Whether `oid` refers to a ship, used by renderers that need to
    /// filter the object list.
    pub fn is_ship(&self, oid: Oid) -> bool {
        matches!(self.object(oid).kind, ObjectKind::Ship(_))
    }
}
