//! Output formatting utilities.
//!
//! Pretty printing for CLI commands.

use coffer_vm::Receipt;
use colored::Colorize;
use serde_json::Value;
use tabled::{Table, Tabled};

/// Print success message.
pub fn print_success(msg: &str) {
    println!("{}", format!("✓ {}", msg).green());
}

/// Print error message.
pub fn print_error(msg: &str) {
    eprintln!("{}", format!("✗ {}", msg).red());
}

/// Print warning message.
pub fn print_warning(msg: &str) {
    println!("{}", format!("⚠ {}", msg).yellow());
}

/// Print info message.
pub fn print_info(msg: &str) {
    println!("{}", format!("ℹ {}", msg).blue());
}

/// Render a state value for display; strings lose their JSON quotes.
pub fn format_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => "None".to_string(),
        other => other.to_string(),
    }
}

/// Shorten a transaction hash to `abcd1234…ef56`.
pub fn format_hash_short(hash: &str) -> String {
    if hash.len() > 16 {
        format!("{}…{}", &hash[..8], &hash[hash.len() - 4..])
    } else {
        hash.to_string()
    }
}

/// Print transaction receipt.
pub fn print_receipt(receipt: &Receipt) {
    println!("{}", "Transaction Receipt".bold());
    println!("{}", "=".repeat(50));
    println!("Hash:      {}", format_hash_short(&receipt.hash).bright_cyan());
    println!(
        "Call:      {}.{} by {}",
        receipt.contract, receipt.function, receipt.signer
    );

    match &receipt.result {
        Ok(value) => {
            println!("Status:    {}", "Success".green());
            if !value.is_null() {
                println!("Result:    {}", format_value(value).bright_green());
            }
        }
        Err(e) => {
            println!("Status:    {}", "Failed".red());
            println!("Error:     {}", e.to_string().red());
        }
    }

    if !receipt.events.is_empty() {
        println!("Events:");
        for event in &receipt.events {
            println!("  {}.{} {}", event.contract, event.event.bright_magenta(), event.data);
        }
    }

    if !receipt.writes.is_empty() {
        println!("Writes:");
        for (key, value) in &receipt.writes {
            println!("  {} = {}", key.bright_yellow(), format_value(value));
        }
    }
}

#[derive(Tabled)]
struct StateRow {
    key: String,
    value: String,
}

/// Build a key/value table.
pub fn state_table(rows: &[(String, Value)]) -> Table {
    let rows: Vec<StateRow> = rows
        .iter()
        .map(|(key, value)| StateRow {
            key: key.clone(),
            value: format_value(value),
        })
        .collect();
    Table::new(rows)
}
