//! Field sanitization and shape checks shared by capture validation and
//! downstream cleaning.

/// Strip control characters (optionally) and trim whitespace, returning
/// `None` when nothing remains.
pub fn sanitize(value: &str, strip_control: bool) -> Option<String> {
    let filtered = if strip_control {
        value.chars().filter(|c| !c.is_control()).collect::<String>()
    } else {
        value.to_string()
    };
    let trimmed = filtered.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

/// Minimal email shape check: one `@` with a non-empty local part and a
/// dot somewhere in the domain. Deliberately loose — the CRM is the source
/// of truth and this only has to reject garbage, not enforce RFC 5321.
pub fn is_email_like(value: &str) -> bool {
    let Some((local, domain)) = value.split_once('@') else {
        return false;
    };
    !local.is_empty() && domain.contains('.') && !domain.starts_with('.') && !domain.ends_with('.')
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sanitize_strips_control_and_trims() {
        assert_eq!(
            sanitize("  Jane\u{0007} Smith\n", true),
            Some("Jane Smith".to_string())
        );
        assert_eq!(sanitize("   ", true), None);
        assert_eq!(sanitize("", true), None);
        assert_eq!(
            sanitize(" keep\u{0007} ", false),
            Some("keep\u{0007}".to_string())
        );
    }

    #[test]
    fn email_shape_accepts_ordinary_addresses() {
        assert!(is_email_like("jane@test.com"));
        assert!(is_email_like("j.smith+tag@sub.example.co"));
    }

    #[test]
    fn email_shape_rejects_garbage() {
        assert!(!is_email_like("not-an-email"));
        assert!(!is_email_like("@test.com"));
        assert!(!is_email_like("jane@nodot"));
        assert!(!is_email_like("jane@.com"));
        assert!(!is_email_like("jane@test."));
    }
}
