//! The command registry: `spec.md` §9's "explicit `Controller` value with
//! typed `register(name, fn, spec)` and `dispatch(name, args)` methods"
//! replacing the original's duck-typed attribute lookup with concrete
//! function objects held in a `HashMap`.

use std::collections::HashMap;

use crate::command::argspec::{ArgSpec, Value};
use crate::error::{Result, StarhelmError};
use crate::simulation::universe::Universe;

/// A registered command's concrete handler: given the universe, the
/// parsed positional values, and the parsed flags, produce a feedback
/// string or an error.
pub type Handler = Box<dyn Fn(&mut Universe, &[Value], &HashMap<String, Value>) -> Result<String>>;

struct Command {
    spec: ArgSpec,
    handler: Handler,
}

/// A registry mapping command name to `(ArgSpec, Handler)`, plus a single
/// level of alias expansion (`spec.md` §6/§9). `dispatch` splits an input
/// line on `&&` (and its HTML-escaped form) into statements and runs each
/// in turn; a statement that fails does not prevent the remaining
/// statements on the same line from running, matching §7's "propagated
/// as a single error kind to the dispatcher" rather than treated as
/// fatal.
#[derive(Default)]
pub struct Controller {
    commands: HashMap<String, Command>,
    aliases: HashMap<String, String>,
}

impl Controller {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the alias table (typically the config's `custom_commands`
    /// map) wholesale.
    pub fn set_aliases(&mut self, aliases: HashMap<String, String>) {
        self.aliases = aliases;
    }

    /// Register `name` with its docstring-declared `spec` and concrete
    /// `handler`. Re-registering an already-registered name is rejected,
    /// mirroring the original controller's `register_command`.
    pub fn register(&mut self, name: impl Into<String>, spec: &str, handler: Handler) -> Result<()> {
        let name = name.into();
        if self.commands.contains_key(&name) {
            return Err(StarhelmError::InvalidArgument(format!("command already registered: {name}")));
        }
        let spec = ArgSpec::parse_spec(spec)?;
        log::info!("registered command {name} ({})", spec.usage());
        self.commands.insert(name, Command { spec, handler });
        Ok(())
    }

    /// The registered command names, for help/browse surfaces.
    pub fn commands(&self) -> Vec<&str> {
        self.commands.keys().map(String::as_str).collect()
    }

    pub fn usage(&self, name: &str) -> Option<String> {
        self.commands.get(name).map(|c| format!("{} {}", name, c.spec.usage()))
    }

    /// Run every `&&`-separated statement in `line` against `universe`,
    /// returning one result per statement in order.
    pub fn dispatch(&self, universe: &mut Universe, line: &str) -> Vec<Result<String>> {
        split_statements(line)
            .into_iter()
            .map(|statement| self.dispatch_statement(universe, &statement))
            .collect()
    }

    fn dispatch_statement(&self, universe: &mut Universe, statement: &str) -> Result<String> {
        let statement = statement.trim();
        if statement.is_empty() {
            return Ok(String::new());
        }
        let resolved = self.resolve_alias(statement);
        let mut tokens = resolved.split_whitespace();
        let name = tokens.next().unwrap_or("");
        let rest: Vec<&str> = tokens.collect();

        let command = self.commands.get(name).ok_or_else(|| {
            log::warn!("unknown command: {name}");
            StarhelmError::UnknownCommand(name.to_string())
        })?;
        let (positionals, flags) = command.spec.parse(&rest)?;
        (command.handler)(universe, &positionals, &flags)
    }

    /// Expand `statement`'s leading command name through the alias table
    /// exactly once; an alias target is used verbatim and is never itself
    /// re-expanded, bounding recursion depth at 1 per `spec.md` §9.
    fn resolve_alias<'a>(&self, statement: &'a str) -> std::borrow::Cow<'a, str> {
        let name = statement.split_whitespace().next().unwrap_or("");
        match self.aliases.get(name) {
            Some(expansion) => std::borrow::Cow::Owned(expansion.clone()),
            None => std::borrow::Cow::Borrowed(statement),
        }
    }
}

/// Split an input line into individual command statements on `&&`,
/// recognizing both the literal token and the HTML-escaped `&amp;&amp;`
/// a browser-style text field may submit.
fn split_statements(line: &str) -> Vec<String> {
    let normalized = line.replace("&amp;&amp;", "&&");
    normalized.split("&&").map(|s| s.trim().to_string()).collect()
}

fn arg_oid(positionals: &[Value], index: usize) -> Result<crate::simulation::object::Oid> {
    positionals
        .get(index)
        .and_then(Value::as_f64)
        .map(|v| v as usize)
        .ok_or_else(|| StarhelmError::InvalidArgument(format!("expected an oid at position {index}")))
}

fn flag_throttle(flags: &HashMap<String, Value>) -> f64 {
    flags.get("throttle").and_then(Value::as_f64).unwrap_or(1.0)
}

fn flag_bool(flags: &HashMap<String, Value>, name: &str) -> bool {
    flags.get(name).and_then(Value::as_bool).unwrap_or(false)
}

/// Register the simulation-scheduling and ship-order commands every
/// `starhelm` session needs, mirroring the original's
/// `Universe.register_commands`/`Ship`'s order methods collected under one
/// registry rather than scattered across per-object `register_commands`
/// calls.
pub fn register_core_commands(controller: &mut Controller) -> Result<()> {
    controller.register(
        "sim.toggle",
        "Toggle the autosim loop on or off without changing its rate.",
        Box::new(|universe, _pos, _flags| {
            universe.toggle_autosim();
            Ok(format!("autosim rate is now {}", universe.simrate()))
        }),
    )?;
    controller.register(
        "sim.rate",
        "Set the autosim rate.\nRATE ticks simulated per real second",
        Box::new(|universe, pos, _flags| {
            let rate = pos.first().and_then(Value::as_f64).ok_or_else(|| StarhelmError::InvalidArgument("sim.rate requires RATE".into()))?;
            universe.set_simrate(rate);
            Ok(format!("simrate set to {rate}"))
        }),
    )?;
    controller.register(
        "sim.tick",
        "Advance the simulation by a number of ticks.\nDT ticks to advance",
        Box::new(|universe, pos, _flags| {
            let dt = pos.first().and_then(Value::as_f64).ok_or_else(|| StarhelmError::InvalidArgument("sim.tick requires DT".into()))?;
            universe.do_ticks(dt)?;
            Ok(format!("tick {}", universe.current_tick()))
        }),
    )?;
    controller.register(
        "sim.next_event",
        "Advance just far enough to run the next scheduled event.",
        Box::new(|universe, _pos, _flags| {
            universe.do_next_event()?;
            Ok(format!("tick {}", universe.current_tick()))
        }),
    )?;
    controller.register(
        "sim.until_event",
        "Advance up to MAX ticks, stopping early if an event fires first.\nMAX the tick budget",
        Box::new(|universe, pos, _flags| {
            let max = pos.first().and_then(Value::as_f64).ok_or_else(|| StarhelmError::InvalidArgument("sim.until_event requires MAX".into()))?;
            universe.do_until_event(max)?;
            Ok(format!("tick {}", universe.current_tick()))
        }),
    )?;
    controller.register(
        "fly",
        "Fly a ship to a target.\nOID the ship's oid\nTARGET the target oid\n-+l LOOK orient the camera at the target on departure\n-+t TRACK track the target continuously",
        Box::new(|universe, pos, flags| {
            let oid = arg_oid(pos, 0)?;
            let target = arg_oid(pos, 1)?;
            universe.order_fly(oid, target, flag_bool(flags, "look"), flag_bool(flags, "track"))?;
            Ok(format!("oid {oid} flying to {target}"))
        }),
    )?;
    controller.register(
        "break",
        "Cancel a ship's remaining velocity.\nOID the ship's oid\n-+t THROTTLE braking throttle in (0, 1]",
        Box::new(|universe, pos, flags| {
            let oid = arg_oid(pos, 0)?;
            universe.order_break(oid, flag_throttle(flags))?;
            Ok(format!("oid {oid} braking"))
        }),
    )?;
    controller.register(
        "cancel",
        "Cancel a ship's current order.\nOID the ship's oid\n-+b BRAKE also brake to a stop",
        Box::new(|universe, pos, flags| {
            let oid = arg_oid(pos, 0)?;
            universe.order_cancel(oid, flag_bool(flags, "brake"))?;
            Ok(format!("oid {oid} order cancelled"))
        }),
    )?;
    controller.register(
        "burn",
        "Directly burn a ship's engine along a vector.\nOID the ship's oid\nVX x component of the burn direction\nVY y component\nVZ z component\n-+t THROTTLE burn throttle in (0, 1]",
        Box::new(|universe, pos, flags| {
            let oid = arg_oid(pos, 0)?;
            let vx = pos.get(1).and_then(Value::as_f64).ok_or_else(|| StarhelmError::InvalidArgument("burn requires VX".into()))?;
            let vy = pos.get(2).and_then(Value::as_f64).ok_or_else(|| StarhelmError::InvalidArgument("burn requires VY".into()))?;
            let vz = pos.get(3).and_then(Value::as_f64).ok_or_else(|| StarhelmError::InvalidArgument("burn requires VZ".into()))?;
            universe.order_engine_burn(oid, nalgebra::Vector3::new(vx, vy, vz), flag_throttle(flags))?;
            Ok(format!("oid {oid} burning engine"))
        }),
    )?;
    controller.register(
        "cut",
        "Cut a ship's engine immediately.\nOID the ship's oid",
        Box::new(|universe, pos, _flags| {
            let oid = arg_oid(pos, 0)?;
            universe.order_engine_cut(oid);
            Ok(format!("oid {oid} engine cut"))
        }),
    )?;
    controller.register(
        "patrol",
        "Patrol a cyclic list of targets.\nOID the ship's oid\n--w WAYPOINTS target oids to cycle through\n-+l LOOK orient the camera at each stop\n-+t TRACK track each stop",
        Box::new(|universe, pos, flags| {
            let oid = arg_oid(pos, 0)?;
            let waypoints = match flags.get("waypoints") {
                Some(Value::List(values)) => values.iter().filter_map(Value::as_f64).map(|v| v as usize).collect(),
                _ => return Err(StarhelmError::InvalidArgument("patrol requires --w WAYPOINTS".into())),
            };
            universe.order_patrol(oid, waypoints, flag_bool(flags, "look"), flag_bool(flags, "track"))?;
            Ok(format!("oid {oid} patrolling"))
        }),
    )?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Settings;

    fn test_universe() -> Universe {
        Universe::new(Settings::default())
    }

    fn echo_handler() -> Handler {
        Box::new(|_universe, positionals, flags| {
            Ok(format!("{positionals:?} {flags:?}"))
        })
    }

    #[test]
    fn dispatch_runs_a_registered_command() {
        let mut controller = Controller::new();
        controller.register("echo", "Echo something.\nTEXT the text to echo", echo_handler()).unwrap();
        let mut universe = test_universe();
        let results = controller.dispatch(&mut universe, "echo hello");
        assert_eq!(results.len(), 1);
        assert!(results[0].is_ok());
    }

    #[test]
    fn unknown_command_is_an_error_but_not_a_panic() {
        let controller = Controller::new();
        let mut universe = test_universe();
        let results = controller.dispatch(&mut universe, "nonexistent");
        assert!(matches!(results[0], Err(StarhelmError::UnknownCommand(_))));
    }

    #[test]
    fn double_ampersand_splits_into_independent_statements() {
        let mut controller = Controller::new();
        controller.register("echo", "Echo something.\nTEXT the text to echo", echo_handler()).unwrap();
        let mut universe = test_universe();
        let results = controller.dispatch(&mut universe, "echo one && echo two");
        assert_eq!(results.len(), 2);
        assert!(results[0].is_ok());
        assert!(results[1].is_ok());
    }

    #[test]
    fn html_escaped_ampersands_split_statements_too() {
        let mut controller = Controller::new();
        controller.register("echo", "Echo something.\nTEXT the text to echo", echo_handler()).unwrap();
        let mut universe = test_universe();
        let results = controller.dispatch(&mut universe, "echo one &amp;&amp; echo two");
        assert_eq!(results.len(), 2);
    }

    #[test]
    fn a_failing_statement_does_not_prevent_the_next_one_from_running() {
        let mut controller = Controller::new();
        controller.register("echo", "Echo something.\nTEXT the text to echo", echo_handler()).unwrap();
        let mut universe = test_universe();
        let results = controller.dispatch(&mut universe, "bogus && echo two");
        assert!(results[0].is_err());
        assert!(results[1].is_ok());
    }

    #[test]
    fn alias_expands_to_its_target_statement() {
        let mut controller = Controller::new();
        controller.register("echo", "Echo something.\nTEXT the text to echo", echo_handler()).unwrap();
        let mut aliases = HashMap::new();
        aliases.insert("e".to_string(), "echo aliased".to_string());
        controller.set_aliases(aliases);
        let mut universe = test_universe();
        let results = controller.dispatch(&mut universe, "e");
        assert!(results[0].is_ok());
        assert_eq!(results[0].as_ref().unwrap(), "[Str(\"aliased\")] {}");
    }

    #[test]
    fn registering_the_same_name_twice_is_rejected() {
        let mut controller = Controller::new();
        controller.register("echo", "Echo something.\nTEXT the text to echo", echo_handler()).unwrap();
        let second = controller.register("echo", "Echo something.\nTEXT the text to echo", echo_handler());
        assert!(second.is_err());
    }

    #[test]
    fn core_commands_register_without_collision() {
        let mut controller = Controller::new();
        register_core_commands(&mut controller).unwrap();
        assert!(controller.commands().contains(&"fly"));
        assert!(controller.commands().contains(&"sim.tick"));
    }

    #[test]
    fn sim_tick_advances_the_clock() {
        let mut controller = Controller::new();
        register_core_commands(&mut controller).unwrap();
        let mut universe = test_universe();
        let results = controller.dispatch(&mut universe, "sim.tick 5");
        assert!(results[0].is_ok());
        assert_eq!(universe.current_tick(), 5.0);
    }

    #[test]
    fn fly_dispatches_an_order_to_the_named_ship() {
        let mut controller = Controller::new();
        register_core_commands(&mut controller).unwrap();
        let mut universe = test_universe();
        let ship_oid = universe.add_ship(1.0, crate::simulation::ship::FleetId::new(), 'S', "cyan", "Flagship");
        let target_oid = universe.add_object(crate::simulation::object::ObjectKind::Rock, 'r', "gray", "Rock");
        let results = controller.dispatch(&mut universe, &format!("fly {ship_oid} {target_oid}"));
        assert!(results[0].is_ok(), "{:?}", results[0]);
        assert!(universe.ship_has_navigation(ship_oid));
    }

    #[test]
    fn cut_requires_an_oid() {
        let mut controller = Controller::new();
        register_core_commands(&mut controller).unwrap();
        let mut universe = test_universe();
        let results = controller.dispatch(&mut universe, "cut");
        assert!(results[0].is_err());
    }
}
