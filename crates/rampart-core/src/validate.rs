// ── Client-side checks ──
//
// Everything here runs before a request is built. A failure is a
// `CoreError::Validation` or `CoreError::ConfirmationMismatch` and costs no
// network round trip.

use rampart_api::RuleSpec;

use crate::error::CoreError;

/// The word a user must type to confirm a destructive action.
pub const CONFIRM_WORD: &str = "yes";

/// Check a whitelist address is a dotted-quad IPv4 and return it trimmed.
///
/// Each octet is one to three decimal digits no greater than 255. Leading
/// zeros are accepted and kept: the server keys entries by the exact
/// string, so `010.0.0.1` must go out as typed.
pub fn validate_whitelist_ip(input: &str) -> Result<&str, CoreError> {
    let invalid =
        || CoreError::validation("ip_address", format!("'{input}' is not a valid IPv4 address (e.g., 192.168.1.1)"));

    let trimmed = input.trim();
    let mut parts = trimmed.split('.');
    for _ in 0..4 {
        let part = parts.next().ok_or_else(invalid)?;
        if part.is_empty() || part.len() > 3 || !part.bytes().all(|b| b.is_ascii_digit()) {
            return Err(invalid());
        }
        part.parse::<u8>().map_err(|_| invalid())?;
    }
    if parts.next().is_some() {
        return Err(invalid());
    }
    Ok(trimmed)
}

/// Reject rule specs the server would refuse anyway.
pub fn validate_rule(spec: &RuleSpec) -> Result<(), CoreError> {
    if spec.host.trim().is_empty() {
        return Err(CoreError::validation("host", "Host is required"));
    }
    Ok(())
}

/// Check a typed confirmation for `action`. Case-insensitive, surrounding
/// whitespace ignored.
pub fn confirm(action: &str, typed: &str) -> Result<(), CoreError> {
    if typed.trim().eq_ignore_ascii_case(CONFIRM_WORD) {
        Ok(())
    } else {
        Err(CoreError::ConfirmationMismatch {
            action: action.to_owned(),
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use rampart_api::{Direction, RuleAction, RuleProtocol};

    #[test]
    fn accepts_dotted_quads() {
        assert_eq!(validate_whitelist_ip("192.168.1.1").unwrap(), "192.168.1.1");
        assert_eq!(validate_whitelist_ip(" 10.0.0.255 ").unwrap(), "10.0.0.255");
        assert_eq!(validate_whitelist_ip("0.0.0.0").unwrap(), "0.0.0.0");
    }

    #[test]
    fn keeps_leading_zeros_as_typed() {
        assert_eq!(validate_whitelist_ip("010.0.0.1").unwrap(), "010.0.0.1");
        assert_eq!(validate_whitelist_ip(" 192.168.001.010\n").unwrap(), "192.168.001.010");
    }

    #[test]
    fn rejects_out_of_range_and_malformed() {
        for bad in [
            "999.1.1.1",
            "256.0.0.1",
            "1.2.3",
            "1.2.3.4.5",
            "1..3.4",
            "a.b.c.d",
            "1.2.3.4/24",
            "0001.2.3.4",
            "+1.2.3.4",
            "",
        ] {
            let err = validate_whitelist_ip(bad).unwrap_err();
            assert!(
                matches!(err, CoreError::Validation { ref field, .. } if field == "ip_address"),
                "{bad:?} should be rejected, got {err:?}"
            );
        }
    }

    #[test]
    fn confirmation_is_case_insensitive() {
        assert!(confirm("clear logs", "yes").is_ok());
        assert!(confirm("clear logs", "YES").is_ok());
        assert!(confirm("clear logs", " Yes\n").is_ok());
        assert!(matches!(
            confirm("clear logs", "y"),
            Err(CoreError::ConfirmationMismatch { .. })
        ));
        assert!(confirm("clear logs", "").is_err());
    }

    #[test]
    fn rule_requires_host() {
        let mut spec = RuleSpec {
            action: RuleAction::Allow,
            direction: Direction::In,
            protocol: RuleProtocol::Tcp,
            port: 443,
            host: "  ".into(),
        };
        assert!(validate_rule(&spec).is_err());
        spec.host = "0.0.0.0".into();
        assert!(validate_rule(&spec).is_ok());
    }
}
