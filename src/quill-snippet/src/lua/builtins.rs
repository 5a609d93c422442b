//! Pure built-ins: `json` and `date`.

use std::fmt::Write as _;
use std::time::Instant;

use chrono::format::{Item, StrftimeItems};
use chrono::{DateTime, SecondsFormat, Utc};
use mlua::{Error, Lua, LuaSerdeExt, SerializeOptions, Value};

use super::{RunClock, deadline_error};

/// Expanded values `json.encode` accepts; shared subtables count once per path.
pub(crate) const JSON_NODE_LIMIT: usize = 100_000;

/// Deepest table nesting `json.encode` accepts.
pub(crate) const JSON_MAX_DEPTH: usize = 128;

/// The deadline is checked every this many counted values.
const DEADLINE_CHECK_INTERVAL: usize = 1_024;

/// Installs `json.encode` / `json.decode`.
pub(crate) fn install_json(lua: &Lua) -> mlua::Result<()> {
    let json = lua.create_table()?;

    json.set(
        "encode",
        lua.create_function(|lua, value: Value| {
            check_encodable(lua, &value)?;
            let decoded: serde_json::Value = lua.from_value(value)?;
            serde_json::to_string(&decoded)
                .map_err(|e| Error::runtime(format!("json.encode: {e}")))
        })?,
    )?;

    json.set(
        "decode",
        lua.create_function(|lua, text: String| {
            let parsed: serde_json::Value = serde_json::from_str(&text)
                .map_err(|e| Error::runtime(format!("json.decode: {e}")))?;
            let options = SerializeOptions::new()
                .serialize_none_to_null(false)
                .serialize_unit_to_null(false);
            lua.to_value_with(&parsed, options)
        })?,
    )?;

    lua.globals().set("json", json)
}

/// Walks `value` as the serializer would, bounding its size and time.
///
/// Cycles are left for the serializer to report.
fn check_encodable(lua: &Lua, value: &Value) -> mlua::Result<()> {
    let deadline = lua.app_data_ref::<RunClock>().map(|clock| clock.deadline());
    let mut counter = NodeCounter {
        nodes: 0,
        deadline,
        visiting: Vec::new(),
    };
    counter.visit(value).map_err(|stop| match stop {
        CountStop::TooLarge => Error::runtime(format!(
            "json.encode: value has more than {JSON_NODE_LIMIT} elements"
        )),
        CountStop::TooDeep => Error::runtime(format!(
            "json.encode: value is nested deeper than {JSON_MAX_DEPTH} levels"
        )),
        CountStop::Deadline => deadline_error(lua),
        CountStop::Lua(err) => err,
    })
}

enum CountStop {
    TooLarge,
    TooDeep,
    Deadline,
    Lua(Error),
}

struct NodeCounter {
    nodes: usize,
    deadline: Option<Instant>,
    visiting: Vec<usize>,
}

impl NodeCounter {
    fn visit(&mut self, value: &Value) -> Result<(), CountStop> {
        if self.nodes % DEADLINE_CHECK_INTERVAL == 0
            && self.deadline.is_some_and(|d| Instant::now() >= d)
        {
            return Err(CountStop::Deadline);
        }
        self.nodes += 1;
        if self.nodes > JSON_NODE_LIMIT {
            return Err(CountStop::TooLarge);
        }

        let Value::Table(table) = value else {
            return Ok(());
        };
        let ptr = value.to_pointer() as usize;
        if self.visiting.contains(&ptr) {
            return Ok(());
        }
        if self.visiting.len() >= JSON_MAX_DEPTH {
            return Err(CountStop::TooDeep);
        }
        self.visiting.push(ptr);
        for pair in table.clone().pairs::<Value, Value>() {
            let (key, item) = pair.map_err(CountStop::Lua)?;
            self.visit(&key)?;
            self.visit(&item)?;
        }
        self.visiting.pop();
        Ok(())
    }
}

/// Installs `date.now`, `date.iso` and `date.format`.
pub(crate) fn install_date(lua: &Lua) -> mlua::Result<()> {
    let date = lua.create_table()?;

    date.set(
        "now",
        lua.create_function(|_, ()| Ok(Utc::now().timestamp_millis()))?,
    )?;

    date.set(
        "iso",
        lua.create_function(|_, millis: Option<i64>| {
            Ok(timestamp(millis)?.to_rfc3339_opts(SecondsFormat::Millis, true))
        })?,
    )?;

    date.set(
        "format",
        lua.create_function(|_, (pattern, millis): (String, Option<i64>)| {
            format_timestamp(&pattern, timestamp(millis)?)
        })?,
    )?;

    lua.globals().set("date", date)
}

fn timestamp(millis: Option<i64>) -> mlua::Result<DateTime<Utc>> {
    match millis {
        None => Ok(Utc::now()),
        Some(ms) => DateTime::from_timestamp_millis(ms)
            .ok_or_else(|| Error::runtime(format!("date: timestamp {ms} is out of range"))),
    }
}

/// strftime-style formatting that reports bad patterns instead of panicking.
fn format_timestamp(pattern: &str, at: DateTime<Utc>) -> mlua::Result<String> {
    if StrftimeItems::new(pattern).any(|item| matches!(item, Item::Error)) {
        return Err(Error::runtime(format!(
            "date.format: invalid format string '{pattern}'"
        )));
    }
    let mut out = String::new();
    write!(out, "{}", at.format_with_items(StrftimeItems::new(pattern)))
        .map_err(|_| Error::runtime("date.format: formatting failed"))?;
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_json_encode_rejects_exploding_tables() {
        let lua = Lua::new();
        install_json(&lua).unwrap();
        let err = lua
            .load("local t = {} for i = 1, 40 do t = {a = t, b = t} end return json.encode(t)")
            .exec()
            .unwrap_err();
        assert!(err.to_string().contains("more than 100000 elements"), "{err}");
    }

    #[test]
    fn test_json_encode_rejects_deep_nesting() {
        let lua = Lua::new();
        install_json(&lua).unwrap();
        let err = lua
            .load("local t = {} for i = 1, 1000 do t = {t} end return json.encode(t)")
            .exec()
            .unwrap_err();
        assert!(err.to_string().contains("deeper than 128 levels"), "{err}");
    }

    #[test]
    fn test_json_encode_shared_leaf_is_fine() {
        let lua = Lua::new();
        install_json(&lua).unwrap();
        let text: String = lua
            .load("local p = {1} return json.encode({a = p, b = p})")
            .eval()
            .unwrap();
        assert_eq!(text, r#"{"a":[1],"b":[1]}"#);
    }

    #[test]
    fn test_format_timestamp() {
        let at = DateTime::from_timestamp_millis(0).unwrap();
        assert_eq!(format_timestamp("%Y-%m-%d", at).unwrap(), "1970-01-01");
        assert!(format_timestamp("%Q", at).is_err());
    }
}
