pub mod ads;
pub mod auth;
pub mod salons;

use std::fs;
use std::io::{self, Read};

use anyhow::{Context, Result};
use serde_json::Value;

/// Splits `key=value` arguments; a bare key gets an empty value.
pub fn parse_params(raw: &[String]) -> Vec<(String, String)> {
    raw.iter()
        .map(|p| match p.split_once('=') {
            Some((k, v)) => (k.to_string(), v.to_string()),
            None => (p.clone(), String::new()),
        })
        .collect()
}

/// JSON body from a file, or stdin when no file is given.
pub fn read_body(file: Option<&str>) -> Result<Value> {
    let content = match file {
        Some(path) => {
            fs::read_to_string(path).with_context(|| format!("Failed to read file: {path}"))?
        }
        None => {
            let mut buf = String::new();
            io::stdin()
                .read_to_string(&mut buf)
                .context("Failed to read from stdin")?;
            buf
        }
    };
    serde_json::from_str(&content).context("Invalid JSON")
}
