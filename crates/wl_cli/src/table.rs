//! Table rendering for command output.

use comfy_table::{Cell, Row, Table};
use serde_json::{Map, Value};

pub(crate) const EMPTY: &str = "                   ";
pub(crate) const UTF8_FULL: &str = "││──├──┤     ──╭╮╰╯";

pub(crate) fn list(header: Row, rows: Vec<Row>) -> String {
    let mut table = Table::new();
    table.load_preset(UTF8_FULL);
    table.set_header(header);
    table.add_rows(rows);

    table.trim_fmt()
}

/// A list as an array of objects keyed by the header cells.
pub(crate) fn list_json(header: &Row, rows: Vec<Row>) -> Value {
    let keys = header
        .cell_iter()
        .map(|cell| cell.content().to_lowercase())
        .collect::<Vec<_>>();

    rows.into_iter()
        .map(|row| {
            keys.iter()
                .cloned()
                .zip(row.cell_iter().map(|cell| Value::String(cell.content())))
                .collect::<Map<_, _>>()
                .into()
        })
        .collect::<Vec<Value>>()
        .into()
}

pub(crate) fn details(title: Option<&str>, rows: Vec<Row>) -> String {
    let mut buf = String::new();

    if let Some(title) = title {
        buf.push_str(title);
        buf.push_str("\n\n");
    }

    let mut table = Table::new();
    table.load_preset(EMPTY);
    table.add_rows(rows);
    buf.push_str(&table.trim_fmt());

    buf
}

pub(crate) fn details_json(title: Option<&str>, rows: Vec<Row>) -> Value {
    let mut details = Map::new();
    for row in rows {
        let mut iter = row.cell_iter();
        let Some(key) = iter.next().map(Cell::content) else {
            continue;
        };

        let value = iter.next().map(Cell::content).unwrap_or_default();
        details.insert(key, value.into());
    }

    serde_json::json!({
        "title": title,
        "details": details,
    })
}
