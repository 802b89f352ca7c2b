//! Amounts are carried as integer paisa. The formatted rupee string is what
//! gets signed and sent to the gateway, so formatting and parsing must be
//! exact inverses.

use anyhow::{anyhow, Result};

pub fn format_rupees(amount_paisa: i64) -> String {
    if amount_paisa % 100 == 0 {
        (amount_paisa / 100).to_string()
    } else {
        format!("{}.{:02}", amount_paisa / 100, (amount_paisa % 100).abs())
    }
}

pub fn parse_rupees(value: &str) -> Result<i64> {
    let mut parts = value.splitn(2, '.');
    let whole = parts.next().unwrap_or_default();
    let rupees: i64 = whole
        .parse()
        .map_err(|_| anyhow!("invalid rupee amount: {value}"))?;

    let paisa = match parts.next() {
        None | Some("") => 0,
        Some(frac) => {
            if frac.len() > 2 || !frac.chars().all(|c| c.is_ascii_digit()) {
                return Err(anyhow!("invalid paisa fraction: {value}"));
            }
            let mut n: i64 = frac.parse().map_err(|_| anyhow!("invalid paisa fraction: {value}"))?;
            if frac.len() == 1 {
                n *= 10;
            }
            n
        }
    };

    if rupees < 0 {
        return Err(anyhow!("negative amount: {value}"));
    }

    Ok(rupees * 100 + paisa)
}
