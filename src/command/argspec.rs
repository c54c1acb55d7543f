//! Docstring-declared argument specs for the command dispatcher.
//!
//! A spec is written the way the original's `ArgSpec` docstrings were:
//! a description line, then one line per argument. Positional lines are
//! `VARNAME description`; flag lines declare a single-value flag (`-f
//! VARNAME description`), a variadic one (`--f VARNAME description`), an
//! optional single-value one (`-+f VARNAME description`), or a catch-all
//! for unrecognized flags (`**NAME description`).

use std::collections::HashMap;

use crate::error::{Result, StarhelmError};

/// A parsed command-line token: numeric tokens are coerced to `Int` or
/// `Float`, a flag with no trailing value becomes `Bool(true)`, and a
/// variadic flag's values collect into `List`.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Int(i64),
    Float(f64),
    Str(String),
    Bool(bool),
    List(Vec<Value>),
}

impl Value {
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Str(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Int(i) => Some(*i as f64),
            Value::Float(f) => Some(*f),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }
}

#[derive(Debug, Clone)]
struct PositionalArg {
    name: String,
    description: String,
}

#[derive(Debug, Clone)]
struct FlagArg {
    /// The exact runtime token this flag is invoked with, e.g. `-f` or
    /// `--f`, lowercased.
    token: String,
    name: String,
    description: String,
    variadic: bool,
    #[allow(dead_code)]
    optional: bool,
}

/// A parsed argument specification, built once per command at registration
/// time and reused for every dispatch.
#[derive(Debug, Clone)]
pub struct ArgSpec {
    description: String,
    positionals: Vec<PositionalArg>,
    flags: HashMap<String, FlagArg>,
    collect_unknown: Option<String>,
}

impl ArgSpec {
    /// Parse a spec from its docstring form. Positional lines must all
    /// precede flag lines.
    pub fn parse_spec(docstring: &str) -> Result<Self> {
        let lines: Vec<&str> = docstring.lines().map(str::trim).filter(|l| !l.is_empty()).collect();
        let mut iter = lines.into_iter();
        let description = iter.next().unwrap_or("").to_string();

        let mut positionals = Vec::new();
        let mut flags = HashMap::new();
        let mut collect_unknown = None;
        let mut seen_flag = false;

        for line in iter {
            if let Some(rest) = line.strip_prefix("**") {
                let (name, description) = split_name_and_description(rest)?;
                collect_unknown = Some(name.to_lowercase());
                let _ = description;
                seen_flag = true;
                continue;
            }
            if line.starts_with('-') {
                seen_flag = true;
                let flag = parse_flag_line(line)?;
                flags.insert(flag.token.clone(), flag);
                continue;
            }
            if seen_flag {
                return Err(StarhelmError::SpecParse(format!(
                    "positional argument declared after a flag argument: {line}"
                )));
            }
            let (name, description) = split_name_and_description(line)?;
            positionals.push(PositionalArg {
                name: name.to_uppercase(),
                description: description.to_string(),
            });
        }

        Ok(Self {
            description,
            positionals,
            flags,
            collect_unknown,
        })
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    /// One-line summary of the accepted argument shape, e.g. `TARGET -f
    /// THROTTLE --v V1 V2 ...`, used for help/error text.
    pub fn usage(&self) -> String {
        let mut parts: Vec<String> = self.positionals.iter().map(|p| p.name.clone()).collect();
        let mut flag_tokens: Vec<&FlagArg> = self.flags.values().collect();
        flag_tokens.sort_by(|a, b| a.token.cmp(&b.token));
        for flag in flag_tokens {
            if flag.variadic {
                parts.push(format!("{} {} ...", flag.token, flag.name));
            } else {
                parts.push(format!("{} {}", flag.token, flag.name));
            }
        }
        parts.join(" ")
    }

    /// Parse `tokens` against this spec: positionals first, then flags.
    pub fn parse(&self, tokens: &[&str]) -> Result<(Vec<Value>, HashMap<String, Value>)> {
        let mut cursor = 0;
        let mut positionals = Vec::new();
        while cursor < tokens.len() && !looks_like_flag(tokens[cursor]) {
            positionals.push(try_number(tokens[cursor]));
            cursor += 1;
        }

        if positionals.len() < self.positionals.len() {
            let missing: Vec<&str> = self.positionals[positionals.len()..].iter().map(|p| p.name.as_str()).collect();
            return Err(StarhelmError::SpecParse(format!(
                "missing positional arguments: {} (usage: {})",
                missing.join(", "),
                self.usage()
            )));
        }
        if positionals.len() > self.positionals.len() {
            return Err(StarhelmError::SpecParse(format!(
                "unexpected positional arguments (usage: {})",
                self.usage()
            )));
        }

        let mut flags = HashMap::new();
        while cursor < tokens.len() {
            let raw = tokens[cursor];
            if !looks_like_flag(raw) {
                return Err(StarhelmError::SpecParse(format!("unexpected argument: {raw}")));
            }
            let lowered = raw.to_lowercase();
            cursor += 1;

            match self.flags.get(&lowered) {
                Some(flag) if flag.variadic => {
                    let mut values = Vec::new();
                    while cursor < tokens.len() && !looks_like_flag(tokens[cursor]) {
                        values.push(try_number(tokens[cursor]));
                        cursor += 1;
                    }
                    flags.insert(flag.name.to_lowercase(), Value::List(values));
                }
                Some(flag) => {
                    let value = if cursor < tokens.len() && !looks_like_flag(tokens[cursor]) {
                        let v = try_number(tokens[cursor]);
                        cursor += 1;
                        v
                    } else {
                        Value::Bool(true)
                    };
                    flags.insert(flag.name.to_lowercase(), value);
                }
                None => match &self.collect_unknown {
                    Some(_) => {
                        let key = lowered.trim_start_matches('-').to_string();
                        let value = if cursor < tokens.len() && !looks_like_flag(tokens[cursor]) {
                            let v = try_number(tokens[cursor]);
                            cursor += 1;
                            v
                        } else {
                            Value::Bool(true)
                        };
                        flags.insert(key, value);
                    }
                    None => {
                        return Err(StarhelmError::SpecParse(format!(
                            "unexpected flag: {raw} (usage: {})",
                            self.usage()
                        )));
                    }
                },
            }
        }

        Ok((positionals, flags))
    }
}

fn split_name_and_description(line: &str) -> Result<(&str, &str)> {
    let mut parts = line.splitn(2, char::is_whitespace);
    let name = parts.next().filter(|s| !s.is_empty());
    let description = parts.next().unwrap_or("").trim();
    match name {
        Some(name) => Ok((name, description)),
        None => Err(StarhelmError::SpecParse(format!("argument line missing a name: {line}"))),
    }
}

fn parse_flag_line(line: &str) -> Result<FlagArg> {
    let (variadic, optional, body) = if let Some(rest) = line.strip_prefix("--") {
        (true, false, rest)
    } else if let Some(rest) = line.strip_prefix("-+") {
        (false, true, rest)
    } else if let Some(rest) = line.strip_prefix('-') {
        (false, false, rest)
    } else {
        return Err(StarhelmError::SpecParse(format!("not a flag line: {line}")));
    };
    let mut words = body.splitn(3, char::is_whitespace);
    let letter = words.next().filter(|s| !s.is_empty());
    let name = words.next().filter(|s| !s.is_empty());
    let description = words.next().unwrap_or("").trim().to_string();
    let (letter, name) = match (letter, name) {
        (Some(letter), Some(name)) => (letter, name),
        _ => return Err(StarhelmError::SpecParse(format!("malformed flag line: {line}"))),
    };
    let token = if variadic { format!("--{}", letter.to_lowercase()) } else { format!("-{}", letter.to_lowercase()) };
    Ok(FlagArg {
        token,
        name: name.to_uppercase(),
        description,
        variadic,
        optional,
    })
}

/// A token is a flag if it starts with `-` and is not itself a negative
/// number (so `order_break -5` still parses `-5` as a positional value).
fn looks_like_flag(token: &str) -> bool {
    token.starts_with('-') && !token[1..].chars().next().is_some_and(|c| c.is_ascii_digit())
}

/// Coerce `token` to `Int`, then `Float`, falling back to `Str`.
fn try_number(token: &str) -> Value {
    if let Ok(i) = token.parse::<i64>() {
        return Value::Int(i);
    }
    if let Ok(f) = token.parse::<f64>() {
        return Value::Float(f);
    }
    Value::Str(token.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_positionals_and_a_single_value_flag() {
        let spec = ArgSpec::parse_spec("Fly to a target.\nTARGET the destination oid\n-t THROTTLE burn throttle").unwrap();
        let (pos, opt) = spec.parse(&["7", "-t", "0.5"]).unwrap();
        assert_eq!(pos, vec![Value::Int(7)]);
        assert_eq!(opt.get("throttle"), Some(&Value::Float(0.5)));
    }

    #[test]
    fn variadic_flag_collects_until_next_flag() {
        let spec = ArgSpec::parse_spec("Patrol some targets.\n--w WAYPOINTS patrol stops").unwrap();
        let (_, opt) = spec.parse(&["--w", "1", "2", "3"]).unwrap();
        assert_eq!(opt.get("waypoints"), Some(&Value::List(vec![Value::Int(1), Value::Int(2), Value::Int(3)])));
    }

    #[test]
    fn flag_without_trailing_value_defaults_to_true() {
        let spec = ArgSpec::parse_spec("Toggle something.\n-l LOOK whether to look at it").unwrap();
        let (_, opt) = spec.parse(&["-l"]).unwrap();
        assert_eq!(opt.get("look"), Some(&Value::Bool(true)));
    }

    #[test]
    fn missing_positional_is_a_spec_error() {
        let spec = ArgSpec::parse_spec("Needs one arg.\nTARGET the target").unwrap();
        assert!(matches!(spec.parse(&[]), Err(StarhelmError::SpecParse(_))));
    }

    #[test]
    fn unknown_flag_is_rejected_without_a_catch_all() {
        let spec = ArgSpec::parse_spec("No flags here.\nTARGET the target").unwrap();
        assert!(matches!(spec.parse(&["1", "-x"]), Err(StarhelmError::SpecParse(_))));
    }

    #[test]
    fn catch_all_collects_unknown_flags() {
        let spec = ArgSpec::parse_spec("Has a catch-all.\nTARGET the target\n**EXTRA any other flags").unwrap();
        let (_, opt) = spec.parse(&["1", "-x", "9"]).unwrap();
        assert_eq!(opt.get("x"), Some(&Value::Int(9)));
    }

    #[test]
    fn negative_number_positional_is_not_mistaken_for_a_flag() {
        let spec = ArgSpec::parse_spec("Break with throttle.\nTHROTTLE the braking throttle").unwrap();
        let (pos, _) = spec.parse(&["-5"]).unwrap();
        assert_eq!(pos, vec![Value::Int(-5)]);
    }
}
