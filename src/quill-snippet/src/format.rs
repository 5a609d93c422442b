//! Value formatting shared by result records and console arguments.
//!
//! Formatting never raises on the value itself: anything that cannot be
//! rendered (cycles, broken iteration) collapses to the `[object]`
//! placeholder. A table reached a second time through another path is also
//! shown as `[object]`, so shared subtables cost one rendering each.
//!
//! Rendering writes top-down into one buffer and stops as soon as the
//! character budget is spent. Inside a run the VM's deadline is checked
//! while walking, since none of this work reaches the instruction hook.

use std::collections::{HashMap, HashSet};
use std::time::Instant;

use mlua::{Lua, Table, Value};
use once_cell::unsync::OnceCell;
use thiserror::Error;

use crate::lua::RunClock;

/// Character budget for object renderings before truncation.
pub const OBJECT_CHAR_BUDGET: usize = 500;

/// Sequences up to this length render in full.
const INLINE_ARRAY_MAX: usize = 10;

/// Elements shown for longer sequences.
const ARRAY_PREVIEW: usize = 5;

/// Tables nested deeper than this render as `[object]`.
const MAX_DEPTH: usize = 64;

/// The deadline is checked every this many visited values.
const DEADLINE_CHECK_INTERVAL: usize = 64;

/// Members scanned per global table when naming functions.
const LIBRARY_SCAN_LIMIT: usize = 256;

const OPAQUE: &str = "[object]";

/// The run's deadline passed while a value was being formatted.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
#[error("deadline exceeded while formatting a value")]
pub struct DeadlineExceeded;

/// Formats a value as a top-level console argument or result.
pub fn format_value(lua: &Lua, value: &Value) -> Result<String, DeadlineExceeded> {
    ValueFormatter::new(lua).format(value)
}

/// Formats each value and joins them with one space.
pub fn format_values(lua: &Lua, values: &[Value]) -> Result<String, DeadlineExceeded> {
    let formatter = ValueFormatter::new(lua);
    let parts = values
        .iter()
        .map(|v| formatter.format(v))
        .collect::<Result<Vec<_>, _>>()?;
    Ok(parts.join(" "))
}

/// Formats the text of a `result` record.
pub fn format_result(lua: &Lua, value: &Value) -> Result<String, DeadlineExceeded> {
    Ok(format!("→ {}", format_value(lua, value)?))
}

/// Why a walk stopped early.
enum Stop {
    /// The value cannot be rendered at all.
    Opaque,
    /// The character budget is spent.
    Full,
    Deadline,
}

/// Output buffer and bookkeeping for one rendering.
struct Walk {
    out: String,
    chars: usize,
    limit: Option<usize>,
    deadline: Option<Instant>,
    steps: usize,
    visiting: Vec<usize>,
    seen: HashSet<usize>,
}

impl Walk {
    fn new(limit: Option<usize>, deadline: Option<Instant>) -> Self {
        Self {
            out: String::new(),
            chars: 0,
            limit,
            deadline,
            steps: 0,
            visiting: Vec::new(),
            seen: HashSet::new(),
        }
    }

    fn push(&mut self, text: &str) -> Result<(), Stop> {
        self.out.push_str(text);
        self.chars += text.chars().count();
        if self.limit.is_some_and(|limit| self.chars > limit) {
            return Err(Stop::Full);
        }
        Ok(())
    }

    fn tick(&mut self) -> Result<(), Stop> {
        if self.steps % DEADLINE_CHECK_INTERVAL == 0
            && self.deadline.is_some_and(|d| Instant::now() >= d)
        {
            return Err(Stop::Deadline);
        }
        self.steps += 1;
        Ok(())
    }

    /// Output cut to the budget, followed by `...`.
    fn truncated(self) -> String {
        let keep = self.limit.unwrap_or(self.chars);
        match self.out.char_indices().nth(keep) {
            Some((idx, _)) => format!("{}...", &self.out[..idx]),
            None => format!("{}...", self.out),
        }
    }
}

/// Formatter bound to one VM.
///
/// Global function names are resolved on first use; the deadline comes from
/// the run clock when the VM belongs to a sandboxed run.
pub(crate) struct ValueFormatter<'lua> {
    lua: &'lua Lua,
    function_names: OnceCell<HashMap<usize, String>>,
    deadline: Option<Instant>,
}

impl<'lua> ValueFormatter<'lua> {
    pub(crate) fn new(lua: &'lua Lua) -> Self {
        Self {
            lua,
            function_names: OnceCell::new(),
            deadline: lua.app_data_ref::<RunClock>().map(|clock| clock.deadline()),
        }
    }

    /// Top-level rendering: strings verbatim, tables capped.
    pub(crate) fn format(&self, value: &Value) -> Result<String, DeadlineExceeded> {
        if let Value::String(s) = value {
            return Ok(s.to_string_lossy().to_string());
        }
        let limit = matches!(value, Value::Table(_)).then_some(OBJECT_CHAR_BUDGET);
        self.render(value, limit)
    }

    /// Rendering as an element of a container: strings are quoted.
    pub(crate) fn format_nested(&self, value: &Value) -> Result<String, DeadlineExceeded> {
        self.render(value, None)
    }

    fn render(&self, value: &Value, limit: Option<usize>) -> Result<String, DeadlineExceeded> {
        let mut walk = Walk::new(limit, self.deadline);
        match self.write(&mut walk, value, 0) {
            Ok(()) => Ok(walk.out),
            Err(Stop::Full) => Ok(walk.truncated()),
            Err(Stop::Opaque) => Ok(OPAQUE.to_string()),
            Err(Stop::Deadline) => Err(DeadlineExceeded),
        }
    }

    fn write(&self, walk: &mut Walk, value: &Value, depth: usize) -> Result<(), Stop> {
        walk.tick()?;
        match value {
            Value::Nil => walk.push("nil"),
            Value::Boolean(b) => walk.push(if *b { "true" } else { "false" }),
            Value::Integer(i) => walk.push(&i.to_string()),
            Value::Number(n) => walk.push(&format_number(*n)),
            Value::String(s) => walk.push(&quote(&s.to_string_lossy())),
            Value::Function(_) => {
                let names = self
                    .function_names
                    .get_or_init(|| collect_function_names(self.lua));
                let name = names
                    .get(&(value.to_pointer() as usize))
                    .map_or("anonymous", String::as_str);
                walk.push(&format!("[Function: {name}]"))
            }
            Value::Table(table) => {
                let ptr = value.to_pointer() as usize;
                if walk.visiting.contains(&ptr) {
                    return Err(Stop::Opaque);
                }
                if depth >= MAX_DEPTH || !walk.seen.insert(ptr) {
                    return walk.push(OPAQUE);
                }
                walk.visiting.push(ptr);
                let written = self.write_table(walk, table, depth);
                walk.visiting.pop();
                written
            }
            Value::LightUserData(ud) if ud.0.is_null() => walk.push("null"),
            Value::LightUserData(_) | Value::UserData(_) => walk.push("[userdata]"),
            Value::Thread(_) => walk.push("[thread]"),
            Value::Error(err) => walk.push(&err.to_string()),
            _ => Err(Stop::Opaque),
        }
    }

    fn write_table(&self, walk: &mut Walk, table: &Table, depth: usize) -> Result<(), Stop> {
        let mut entries = Vec::new();
        for pair in table.clone().pairs::<Value, Value>() {
            walk.tick()?;
            entries.push(pair.map_err(|_| Stop::Opaque)?);
        }
        if entries.is_empty() {
            return walk.push("{}");
        }

        if is_sequence(table, &entries) {
            entries.sort_by_key(|(k, _)| match k {
                Value::Integer(i) => *i,
                _ => 0,
            });
            let len = entries.len();
            let (open, close, shown) = if len > INLINE_ARRAY_MAX {
                (format!("[Array({len}): "), ", ...]", ARRAY_PREVIEW)
            } else {
                ("[".to_string(), "]", len)
            };
            walk.push(&open)?;
            for (i, (_, item)) in entries[..shown].iter().enumerate() {
                if i > 0 {
                    walk.push(", ")?;
                }
                self.write(walk, item, depth + 1)?;
            }
            return walk.push(close);
        }

        let mut fields = Vec::with_capacity(entries.len());
        for (key, val) in entries {
            let label = match &key {
                Value::String(s) => s.to_string_lossy().to_string(),
                other => self.detached(walk, other, depth + 1)?,
            };
            fields.push((label, val));
        }
        fields.sort_by(|a, b| a.0.cmp(&b.0));

        let inner = "  ".repeat(depth + 1);
        walk.push("{\n")?;
        for (i, (label, val)) in fields.iter().enumerate() {
            if i > 0 {
                walk.push(",\n")?;
            }
            walk.push(&inner)?;
            walk.push(&quote(label))?;
            walk.push(": ")?;
            self.write(walk, val, depth + 1)?;
        }
        walk.push("\n")?;
        walk.push(&"  ".repeat(depth))?;
        walk.push("}")
    }

    /// Renders a key on its own, outside the budgeted output.
    fn detached(&self, walk: &mut Walk, key: &Value, depth: usize) -> Result<String, Stop> {
        let out = std::mem::take(&mut walk.out);
        let chars = std::mem::replace(&mut walk.chars, 0);
        let limit = walk.limit.take();
        let written = self.write(walk, key, depth);
        let label = std::mem::replace(&mut walk.out, out);
        walk.chars = chars;
        walk.limit = limit;
        written.map(|()| label)
    }
}

/// Keys are exactly `1..=n` and `n` is the table's border.
fn is_sequence(table: &Table, entries: &[(Value, Value)]) -> bool {
    let len = table.raw_len();
    len == entries.len()
        && entries
            .iter()
            .all(|(k, _)| matches!(k, Value::Integer(i) if *i >= 1 && (*i as usize) <= len))
}

fn format_number(n: f64) -> String {
    if n.is_nan() {
        "nan".to_string()
    } else if n.is_infinite() {
        let sign = if n > 0.0 { "" } else { "-" };
        format!("{sign}inf")
    } else if n.fract() == 0.0 && n.abs() < 1e15 {
        format!("{n:.0}")
    } else {
        n.to_string()
    }
}

fn quote(s: &str) -> String {
    serde_json::to_string(s).unwrap_or_else(|_| format!("\"{s}\""))
}

/// Maps function pointers to the global (or `lib.member`) name they are bound to.
fn collect_function_names(lua: &Lua) -> HashMap<usize, String> {
    let mut nested = HashMap::new();
    let mut top = HashMap::new();
    let globals = lua.globals();
    for pair in globals.clone().pairs::<Value, Value>() {
        let Ok((Value::String(name), value)) = pair else {
            continue;
        };
        let name = name.to_string_lossy().to_string();
        match &value {
            Value::Function(_) => {
                top.insert(value.to_pointer() as usize, name);
            }
            Value::Table(lib) if name != "_G" => {
                for member in lib.clone().pairs::<Value, Value>().take(LIBRARY_SCAN_LIMIT) {
                    if let Ok((Value::String(member), f @ Value::Function(_))) = member {
                        nested.insert(
                            f.to_pointer() as usize,
                            format!("{name}.{}", member.to_string_lossy()),
                        );
                    }
                }
            }
            _ => {}
        }
    }
    nested.extend(top);
    nested
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::time::Duration;

    fn eval(lua: &Lua, src: &str) -> Value {
        lua.load(src).eval::<Value>().unwrap()
    }

    fn show(lua: &Lua, src: &str) -> String {
        format_value(lua, &eval(lua, src)).unwrap()
    }

    #[test]
    fn test_scalars() {
        let lua = Lua::new();
        assert_eq!(format_value(&lua, &Value::Nil).unwrap(), "nil");
        assert_eq!(show(&lua, "2.0"), "2");
        assert_eq!(show(&lua, "0.5"), "0.5");
        assert_eq!(show(&lua, "true"), "true");
        assert_eq!(show(&lua, "'hi'"), "hi");
    }

    #[test]
    fn test_arrays() {
        let lua = Lua::new();
        assert_eq!(show(&lua, "{1, 'a', true}"), r#"[1, "a", true]"#);
        assert_eq!(
            show(&lua, "{1,2,3,4,5,6,7,8,9,10,11,12}"),
            "[Array(12): 1, 2, 3, 4, 5, ...]"
        );
        assert_eq!(show(&lua, "{}"), "{}");
    }

    #[test]
    fn test_objects_sorted_and_indented() {
        let lua = Lua::new();
        let text = show(&lua, "{b = 2, a = {x = 'y'}}");
        assert_eq!(text, "{\n  \"a\": {\n    \"x\": \"y\"\n  },\n  \"b\": 2\n}");
    }

    #[test]
    fn test_object_budget() {
        let lua = Lua::new();
        let text = show(&lua, "local t = {} for i = 1, 200 do t['k' .. i] = i end return t");
        assert!(text.ends_with("..."));
        assert_eq!(text.chars().count(), OBJECT_CHAR_BUDGET + 3);
    }

    #[test]
    fn test_cycle_is_opaque() {
        let lua = Lua::new();
        assert_eq!(show(&lua, "local t = {} t.self = t return t"), "[object]");
    }

    #[test]
    fn test_shared_subtable_rendered_once() {
        let lua = Lua::new();
        assert_eq!(
            show(&lua, "local p = {1} return {a = p, b = p}"),
            "{\n  \"a\": [1],\n  \"b\": [object]\n}"
        );
    }

    #[test]
    fn test_doubling_tree_stops_at_budget() {
        let lua = Lua::new();
        let value = eval(&lua, "local t = {} for i = 1, 40 do t = {a = t, b = t} end return t");

        let text = format_value(&lua, &value).unwrap();
        assert!(text.ends_with("..."));
        assert_eq!(text.chars().count(), OBJECT_CHAR_BUDGET + 3);

        let nested = ValueFormatter::new(&lua).format_nested(&value).unwrap();
        assert_eq!(nested.matches("[object]").count(), 40);
    }

    #[test]
    fn test_deep_nesting_is_cut() {
        let lua = Lua::new();
        let value = eval(&lua, "local t = {} for i = 1, 10000 do t = {t} end return t");
        let nested = ValueFormatter::new(&lua).format_nested(&value).unwrap();
        assert!(nested.ends_with(&format!("[object]{}", "]".repeat(MAX_DEPTH))));
    }

    #[test]
    fn test_expired_deadline_stops_formatting() {
        let lua = Lua::new();
        let started = Instant::now() - Duration::from_secs(1);
        lua.set_app_data(RunClock::new(started, Duration::from_millis(10)));
        let value = eval(&lua, "{1, 2, 3}");
        assert_eq!(format_value(&lua, &value), Err(DeadlineExceeded));
        assert_eq!(format_value(&lua, &Value::Integer(1)), Err(DeadlineExceeded));
    }

    #[test]
    fn test_function_names() {
        let lua = Lua::new();
        lua.load("function greet() end").exec().unwrap();
        assert_eq!(show(&lua, "greet"), "[Function: greet]");
        assert_eq!(show(&lua, "function() end"), "[Function: anonymous]");
        assert_eq!(show(&lua, "math.floor"), "[Function: math.floor]");
    }

    #[test]
    fn test_result_prefix() {
        let lua = Lua::new();
        assert_eq!(format_result(&lua, &Value::Integer(2)).unwrap(), "→ 2");
    }
}
