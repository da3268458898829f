//! Keyspace section field parsing.
//!
//! Lines look like `db0:keys=120,expires=30,avg_ttl=0,subexpiry=0`. The first
//! two sub-fields decide whether the line is accepted; up to two more are
//! tolerated, and `avg_ttl` is picked up when one of them carries it.

use tracing::debug;

/// Key counts for one logical database.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct KeyspaceEntry {
    pub keys_total: f64,
    pub keys_expiring: f64,
    /// Average TTL in milliseconds, 0 when not reported.
    pub avg_ttl: f64,
}

/// Parse one keyspace field.
///
/// Fail-closed: returns `None` on any deviation from the expected shape,
/// never a partial entry.
pub fn parse_keyspace(key: &str, value: &str) -> Option<KeyspaceEntry> {
    if !key.starts_with("db") {
        debug!(%key, "keyspace key does not start with 'db'");
        return None;
    }

    let parts: Vec<&str> = value.split(',').collect();
    if !(2..=4).contains(&parts.len()) {
        debug!(%key, %value, parts = parts.len(), "keyspace value has unexpected sub-field count");
        return None;
    }

    let keys_total = sub_field_value(parts[0]);
    let keys_expiring = sub_field_value(parts[1]);
    match (keys_total, keys_expiring) {
        (Some(keys_total), Some(keys_expiring)) => Some(KeyspaceEntry {
            keys_total,
            keys_expiring,
            avg_ttl: avg_ttl(&parts[2..]),
        }),
        _ => {
            debug!(%key, %value, "keyspace sub-field is not name=number");
            None
        }
    }
}

fn avg_ttl(extra: &[&str]) -> f64 {
    extra
        .iter()
        .find_map(|part| part.strip_prefix("avg_ttl="))
        .and_then(|v| v.parse().ok())
        .unwrap_or(0.0)
}

/// `name=number` → number.
fn sub_field_value(part: &str) -> Option<f64> {
    let pieces: Vec<&str> = part.split('=').collect();
    if pieces.len() != 2 {
        return None;
    }
    pieces[1].parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(keys_total: f64, keys_expiring: f64) -> Option<KeyspaceEntry> {
        with_ttl(keys_total, keys_expiring, 0.0)
    }

    fn with_ttl(keys_total: f64, keys_expiring: f64, avg_ttl: f64) -> Option<KeyspaceEntry> {
        Some(KeyspaceEntry {
            keys_total,
            keys_expiring,
            avg_ttl,
        })
    }

    #[test]
    fn accepts_two_to_four_sub_fields() {
        assert_eq!(parse_keyspace("db0", "keys=120,expires=30"), entry(120.0, 30.0));
        assert_eq!(
            parse_keyspace("db0", "keys=120,expires=30,avg_ttl=0"),
            entry(120.0, 30.0)
        );
        assert_eq!(
            parse_keyspace("db3", "keys=1,expires=0,avg_ttl=5,subexpiry=0"),
            with_ttl(1.0, 0.0, 5.0)
        );
    }

    #[test]
    fn rejects_one_or_five_sub_fields() {
        assert_eq!(parse_keyspace("db0", "keys=120"), None);
        assert_eq!(parse_keyspace("db0", "keys=1,expires=2,a=3,b=4,c=5"), None);
    }

    #[test]
    fn rejects_non_db_keys() {
        assert_eq!(parse_keyspace("rdb0", "keys=1,expires=2"), None);
        assert_eq!(parse_keyspace("keys", "keys=1,expires=2"), None);
    }

    #[test]
    fn rejects_malformed_sub_fields() {
        assert_eq!(parse_keyspace("db2", "garbage"), None);
        assert_eq!(parse_keyspace("db2", "keys,expires=1"), None);
        assert_eq!(parse_keyspace("db2", "keys=1=2,expires=1"), None);
        assert_eq!(parse_keyspace("db2", "keys=abc,expires=1"), None);
        assert_eq!(parse_keyspace("db2", "keys=1,expires="), None);
    }

    #[test]
    fn sub_field_names_are_not_checked() {
        // Position decides meaning, not the name before '='.
        assert_eq!(parse_keyspace("db0", "a=4,b=2"), entry(4.0, 2.0));
    }

    #[test]
    fn avg_ttl_is_optional() {
        assert_eq!(
            parse_keyspace("db0", "keys=4,expires=2,avg_ttl=1500"),
            with_ttl(4.0, 2.0, 1500.0)
        );
        assert_eq!(
            parse_keyspace("db0", "keys=4,expires=2,subexpiry=0,avg_ttl=7"),
            with_ttl(4.0, 2.0, 7.0)
        );
        // A bad avg_ttl does not reject the line.
        assert_eq!(parse_keyspace("db0", "keys=4,expires=2,avg_ttl=x"), entry(4.0, 2.0));
    }
}
