#![allow(dead_code)]

use std::fs;
use std::path::{Path, PathBuf};
use anyhow::Result;

pub fn create_test_jsonl(dir: &Path, filename: &str, content: &str) -> Result<PathBuf> {
    let file_path = dir.join(filename);
    fs::write(&file_path, content)?;
    Ok(file_path)
}

/// One well-formed event line, without the trailing newline
pub fn event_line(id: &str, product: &str, timestamp_ms: u64, action: &str) -> String {
    format!(
        r#"{{"event_id":"{}","source":"{}","timestamp":{},"type":"{}"}}"#,
        id, product, timestamp_ms, action
    )
}

/// Realistic log: rotating products and actions, with every fifth event
/// repeated and a malformed line every seventh position when requested
pub fn realistic_log(events: usize, include_malformed: bool) -> String {
    const PRODUCTS: [&str; 3] = ["product-a", "product-b", "product-c"];
    const ACTIONS: [&str; 5] = ["view", "launch", "purchase", "user_interaction", "metric"];

    let mut content = String::new();
    for i in 0..events {
        let line = event_line(
            &format!("evt-{}", i),
            PRODUCTS[i % PRODUCTS.len()],
            1_700_000_000_000 + (i as u64) * 60_000,
            ACTIONS[i % ACTIONS.len()],
        );
        content.push_str(&line);
        content.push('\n');

        if i % 5 == 0 {
            content.push_str(&line);
            content.push('\n');
        }
        if include_malformed && i % 7 == 3 {
            content.push_str("{broken json line that should be skipped}\n");
        }
    }
    content
}
