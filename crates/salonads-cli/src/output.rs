use colored::Colorize;
use serde_json::Value;
use tabled::builder::Builder;
use tabled::settings::Style;

use crate::cli::OutputFormat;

/// Preferred listing columns, in display order.
const COLUMNS: &[&str] = &[
    "id",
    "title",
    "name",
    "salon_name",
    "status",
    "is_active",
    "start_date",
    "end_date",
];

const FALLBACK_COLUMNS: usize = 5;

pub fn print_value(value: &Value, format: OutputFormat) {
    match format {
        OutputFormat::Json => println!("{}", to_pretty(value)),
        OutputFormat::Table => print_as_table(value),
    }
}

pub fn print_success(msg: &str) {
    println!("{} {}", "✓".green(), msg);
}

pub fn print_error(msg: &str) {
    eprintln!("{} {}", "✗".red(), msg);
}

fn to_pretty(value: &Value) -> String {
    serde_json::to_string_pretty(value).unwrap_or_else(|_| value.to_string())
}

/// The rows of a listing: a bare array, or the `data`/`salons` array of a
/// page.
fn rows(value: &Value) -> Option<&Vec<Value>> {
    value.as_array().or_else(|| {
        ["data", "salons"]
            .iter()
            .find_map(|key| value.get(*key).and_then(Value::as_array))
    })
}

fn columns(first: &Value) -> Vec<String> {
    let Some(obj) = first.as_object() else {
        return vec!["value".to_string()];
    };
    let preferred: Vec<String> = COLUMNS
        .iter()
        .filter(|c| obj.contains_key(**c))
        .map(|c| (*c).to_string())
        .collect();
    if preferred.is_empty() {
        obj.keys().take(FALLBACK_COLUMNS).cloned().collect()
    } else {
        preferred
    }
}

fn cell(value: Option<&Value>) -> String {
    match value {
        None | Some(Value::Null) => "-".to_string(),
        Some(Value::String(s)) => s.clone(),
        Some(other) => other.to_string(),
    }
}

pub fn render_table(value: &Value) -> Option<String> {
    let rows = rows(value)?;
    let first = rows.first()?;
    let columns = columns(first);

    let mut builder = Builder::default();
    builder.push_record(columns.iter().map(String::as_str));
    for row in rows {
        if row.is_object() {
            builder.push_record(columns.iter().map(|c| cell(row.get(c))));
        } else {
            builder.push_record([cell(Some(row))]);
        }
    }
    Some(builder.build().with(Style::rounded()).to_string())
}

fn print_as_table(value: &Value) {
    if let Some(table) = render_table(value) {
        println!("{table}");
        let total = value
            .get("total")
            .or_else(|| value.pointer("/pagination/totalItems"))
            .and_then(Value::as_u64);
        if let Some(total) = total {
            println!("Total: {total}");
        }
        return;
    }
    if rows(value).is_some_and(Vec::is_empty) {
        println!("Nothing found.");
        return;
    }
    match value.as_object() {
        Some(obj) => {
            let mut builder = Builder::default();
            builder.push_record(["Field", "Value"]);
            for (key, field) in obj {
                builder.push_record([key.clone(), cell(Some(field))]);
            }
            println!("{}", builder.build().with(Style::rounded()));
        }
        None => println!("{}", to_pretty(value)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_listing_uses_known_columns() {
        let table = render_table(&json!([
            {"id": 1, "title": "Summer color", "status": "Running", "views": 12},
            {"id": 2, "title": "Perm event", "status": null},
        ]))
        .unwrap();

        assert!(table.contains("title"));
        assert!(table.contains("Summer color"));
        assert!(!table.contains("views"));
        assert!(table.contains('-'));
    }

    #[test]
    fn test_paged_listing_reads_data() {
        let table = render_table(&json!({"data": [{"id": 9, "name": "Hair Lab"}], "total": 1}));
        assert!(table.unwrap().contains("Hair Lab"));

        let directory = render_table(&json!({
            "salons": [{"id": 3, "name": "Blow Studio"}],
            "pagination": {"totalItems": 1, "totalPages": 1}
        }));
        assert!(directory.unwrap().contains("Blow Studio"));
    }

    #[test]
    fn test_empty_or_scalar_is_not_a_table() {
        assert!(render_table(&json!([])).is_none());
        assert!(render_table(&json!({"message": "ok"})).is_none());
    }
}
