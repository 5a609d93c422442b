//! The `console` capability.
//!
//! Every method appends [`OutputRecord`]s to the run's record log; nothing
//! reaches real I/O.

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;
use std::time::Instant;

use mlua::{Function, Lua, Table, Value, Variadic};

use super::deadline_error;
use crate::format::{ValueFormatter, format_values};
use crate::result::{OutputKind, OutputRecord};

/// Records collected during one run.
pub(crate) type RecordLog = Rc<RefCell<Vec<OutputRecord>>>;

const DEFAULT_TIMER: &str = "default";
const INDEX_HEADER: &str = "(index)";
const VALUES_HEADER: &str = "Values";

/// Installs `console` and its `print` alias into the globals.
pub(crate) fn install(lua: &Lua, records: &RecordLog) -> mlua::Result<()> {
    let console = lua.create_table()?;

    for (name, kind) in [
        ("log", OutputKind::Log),
        ("info", OutputKind::Info),
        ("warn", OutputKind::Warn),
        ("error", OutputKind::Error),
    ] {
        let records = Rc::clone(records);
        let method = lua.create_function(move |lua, args: Variadic<Value>| {
            let text = format_values(lua, &args).map_err(|_| deadline_error(lua))?;
            records.borrow_mut().push(OutputRecord::new(kind, text));
            Ok(())
        })?;
        console.set(name, method)?;
    }

    let log = Rc::clone(records);
    console.set(
        "assert",
        lua.create_function(move |lua, (condition, rest): (Value, Variadic<Value>)| {
            if is_truthy(&condition) {
                return Ok(());
            }
            let text = if rest.is_empty() {
                "Assertion failed".to_string()
            } else {
                let detail = format_values(lua, &rest).map_err(|_| deadline_error(lua))?;
                format!("Assertion failed: {detail}")
            };
            log.borrow_mut().push(OutputRecord::error(text));
            Ok(())
        })?,
    )?;

    let log = Rc::clone(records);
    console.set(
        "clear",
        lua.create_function(move |_, ()| {
            let mut records = log.borrow_mut();
            records.clear();
            records.push(OutputRecord::info("Console was cleared"));
            Ok(())
        })?,
    )?;

    let log = Rc::clone(records);
    console.set(
        "trace",
        lua.create_function(move |lua, args: Variadic<Value>| {
            let text = if args.is_empty() {
                "Trace".to_string()
            } else {
                let detail = format_values(lua, &args).map_err(|_| deadline_error(lua))?;
                format!("Trace: {detail}")
            };
            log.borrow_mut().push(OutputRecord::log(text));
            Ok(())
        })?,
    )?;

    let log = Rc::clone(records);
    console.set(
        "table",
        lua.create_function(move |lua, value: Value| {
            let text = match &value {
                Value::Table(rows) => render_table(lua, rows)?,
                other => ValueFormatter::new(lua)
                    .format(other)
                    .map_err(|_| deadline_error(lua))?,
            };
            log.borrow_mut().push(OutputRecord::log(text));
            Ok(())
        })?,
    )?;

    install_timers(lua, &console, records)?;

    let print: Function = console.get("log")?;
    let globals = lua.globals();
    globals.set("console", console)?;
    globals.set("print", print)?;
    Ok(())
}

fn install_timers(lua: &Lua, console: &Table, records: &RecordLog) -> mlua::Result<()> {
    let timers: Rc<RefCell<HashMap<String, Instant>>> = Rc::default();

    let (started, log) = (Rc::clone(&timers), Rc::clone(records));
    console.set(
        "time",
        lua.create_function(move |_, label: Option<String>| {
            let label = label.unwrap_or_else(|| DEFAULT_TIMER.to_string());
            let mut started = started.borrow_mut();
            if started.contains_key(&label) {
                log.borrow_mut()
                    .push(OutputRecord::warn(format!("Timer '{label}' already exists")));
            } else {
                started.insert(label, Instant::now());
            }
            Ok(())
        })?,
    )?;

    let (started, log) = (timers, Rc::clone(records));
    console.set(
        "timeEnd",
        lua.create_function(move |_, label: Option<String>| {
            let label = label.unwrap_or_else(|| DEFAULT_TIMER.to_string());
            let record = match started.borrow_mut().remove(&label) {
                Some(at) => OutputRecord::info(format!("{label}: {}ms", at.elapsed().as_millis())),
                None => OutputRecord::warn(format!("Timer '{label}' does not exist")),
            };
            log.borrow_mut().push(record);
            Ok(())
        })?,
    )?;
    Ok(())
}

fn is_truthy(value: &Value) -> bool {
    !matches!(value, Value::Nil | Value::Boolean(false))
}

/// Renders rows as a pipe grid with an `(index)` column.
///
/// Table rows contribute their keys as columns; scalar rows go to `Values`.
fn render_table(lua: &Lua, rows: &Table) -> mlua::Result<String> {
    let formatter = ValueFormatter::new(lua);

    let mut entries = Vec::new();
    for pair in rows.clone().pairs::<Value, Value>() {
        entries.push(pair?);
    }
    entries.sort_by(|a, b| key_order(&a.0).cmp(&key_order(&b.0)));

    let mut columns: Vec<String> = Vec::new();
    let mut has_values = false;
    let mut parsed: Vec<(String, HashMap<String, String>)> = Vec::with_capacity(entries.len());

    for (key, row) in &entries {
        let index = key_label(lua, &formatter, key)?;
        let mut cells = HashMap::new();
        match row {
            Value::Table(fields) => {
                let mut row_entries = Vec::new();
                for pair in fields.clone().pairs::<Value, Value>() {
                    row_entries.push(pair?);
                }
                row_entries.sort_by(|a, b| key_order(&a.0).cmp(&key_order(&b.0)));
                for (field, value) in row_entries {
                    let column = key_label(lua, &formatter, &field)?;
                    if !columns.contains(&column) {
                        columns.push(column.clone());
                    }
                    let cell = formatter
                        .format_nested(&value)
                        .map_err(|_| deadline_error(lua))?;
                    cells.insert(column, cell);
                }
            }
            scalar => {
                has_values = true;
                let cell = formatter
                    .format_nested(scalar)
                    .map_err(|_| deadline_error(lua))?;
                cells.insert(VALUES_HEADER.to_string(), cell);
            }
        }
        parsed.push((index, cells));
    }
    if has_values {
        columns.push(VALUES_HEADER.to_string());
    }

    let mut header = vec![INDEX_HEADER.to_string()];
    header.extend(columns.iter().cloned());
    let grid: Vec<Vec<String>> = parsed
        .into_iter()
        .map(|(index, mut cells)| {
            let mut line = vec![index];
            line.extend(columns.iter().map(|c| cells.remove(c).unwrap_or_default()));
            line
        })
        .collect();

    let widths: Vec<usize> = (0..header.len())
        .map(|i| {
            grid.iter()
                .map(|row| row[i].chars().count())
                .chain(std::iter::once(header[i].chars().count()))
                .max()
                .unwrap_or(0)
        })
        .collect();

    let format_row = |cells: &[String]| {
        let padded = cells
            .iter()
            .zip(&widths)
            .map(|(cell, width)| {
                let pad = width - cell.chars().count();
                format!(" {cell}{} ", " ".repeat(pad))
            })
            .collect::<Vec<_>>();
        format!("|{}|", padded.join("|"))
    };

    let separator = widths
        .iter()
        .map(|w| "-".repeat(w + 2))
        .collect::<Vec<_>>()
        .join("|");

    let mut lines = vec![format_row(&header), format!("|{separator}|")];
    lines.extend(grid.iter().map(|row| format_row(row)));
    Ok(lines.join("\n"))
}

/// Integer keys first in numeric order, then everything else by label.
fn key_order(key: &Value) -> (u8, i64, String) {
    match key {
        Value::Integer(i) => (0, *i, String::new()),
        Value::String(s) => (1, 0, s.to_string_lossy().to_string()),
        _ => (2, 0, String::new()),
    }
}

fn key_label(lua: &Lua, formatter: &ValueFormatter, key: &Value) -> mlua::Result<String> {
    match key {
        Value::String(s) => Ok(s.to_string_lossy().to_string()),
        other => formatter
            .format_nested(other)
            .map_err(|_| deadline_error(lua)),
    }
}
