// Line-oriented prompt helpers for the command loop.
//
// Every prompt accepts an empty line as "take the default", re-asks on
// malformed input and reports EOF as `None` so the loop can wind down.

use std::io::{self, BufRead, Write};
use std::str::FromStr;

use partedit_core::Guid;

/// Reads one trimmed line from stdin; `None` on EOF.
fn read_line() -> io::Result<Option<String>> {
    let mut buf = String::new();
    let n = io::stdin().lock().read_line(&mut buf)?;
    if n == 0 {
        return Ok(None);
    }
    Ok(Some(buf.trim().to_string()))
}

fn show(prompt: &str) -> io::Result<()> {
    print!("{prompt}");
    io::stdout().flush()
}

/// Single-character command prompt. Empty lines re-prompt.
pub fn read_command(prompt: &str) -> io::Result<Option<char>> {
    loop {
        show(prompt)?;
        let Some(line) = read_line()? else {
            return Ok(None);
        };
        let mut chars = line.chars();
        match (chars.next(), chars.next()) {
            (Some(c), None) => return Ok(Some(c)),
            (None, _) => continue,
            _ => println!("Expected a single command letter"),
        }
    }
}

/// Numeric prompt with an inclusive range and a default.
pub fn read_number(label: &str, min: u64, max: u64, default: u64) -> io::Result<Option<u64>> {
    loop {
        show(&format!("{label} ({min}-{max}, default {default}): "))?;
        let Some(line) = read_line()? else {
            return Ok(None);
        };
        if line.is_empty() {
            return Ok(Some(default));
        }
        match line.parse::<u64>() {
            Ok(value) if (min..=max).contains(&value) => return Ok(Some(value)),
            Ok(_) => println!("Value out of range"),
            Err(_) => println!("Invalid value"),
        }
    }
}

/// Hex byte prompt for MBR partition types. Accepts an optional 0x prefix.
pub fn read_hex_byte(label: &str, default: u8) -> io::Result<Option<u8>> {
    loop {
        show(&format!("{label} (hex, default {default:02X}): "))?;
        let Some(line) = read_line()? else {
            return Ok(None);
        };
        if line.is_empty() {
            return Ok(Some(default));
        }
        match parse_hex_byte(&line) {
            Some(value) => return Ok(Some(value)),
            None => println!("Invalid type byte"),
        }
    }
}

/// GUID prompt for GPT partition types.
pub fn read_guid(label: &str, default: Guid) -> io::Result<Option<Guid>> {
    loop {
        show(&format!("{label} (default {default}): "))?;
        let Some(line) = read_line()? else {
            return Ok(None);
        };
        if line.is_empty() {
            return Ok(Some(default));
        }
        match Guid::from_str(&line) {
            Ok(guid) => return Ok(Some(guid)),
            Err(err) => println!("{err}"),
        }
    }
}

pub fn parse_hex_byte(s: &str) -> Option<u8> {
    let digits = s
        .strip_prefix("0x")
        .or_else(|| s.strip_prefix("0X"))
        .unwrap_or(s);
    u8::from_str_radix(digits, 16).ok()
}
