//! # Discount Resolver
//!
//! Decides whether a promocode found at checkout may be used.
//!
//! ## Policy
//! ```text
//! promocode absent ─────────────────────────────► NoCode
//! promocode present ─► lookup ─┬─ not found ────► Rejected(NotFound)
//!                              ├─ is_active = 0 ─► Rejected(Inactive)
//!                              ├─ expires ≤ now ─► Rejected(Expired)
//!                              └─ otherwise ─────► Usable(discount)
//! ```
//!
//! A rejected code degrades to full price; it never fails checkout.
//! The caller logs the rejection.

use chrono::{DateTime, Utc};

use crate::types::Discount;

/// Why a promocode could not be used.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DiscountRejection {
    NotFound,
    Inactive,
    Expired,
}

impl DiscountRejection {
    pub const fn as_str(&self) -> &'static str {
        match self {
            DiscountRejection::NotFound => "not_found",
            DiscountRejection::Inactive => "inactive",
            DiscountRejection::Expired => "expired",
        }
    }
}

/// Outcome of resolving a promocode.
#[derive(Debug, Clone, PartialEq)]
pub enum DiscountResolution {
    NoCode,
    Usable(Discount),
    Rejected {
        code: String,
        reason: DiscountRejection,
    },
}

impl DiscountResolution {
    /// The discount to price with, if any.
    pub fn usable(&self) -> Option<&Discount> {
        match self {
            DiscountResolution::Usable(d) => Some(d),
            _ => None,
        }
    }
}

/// Trims a client-supplied code; blank codes count as absent.
pub fn normalize_code(code: Option<&str>) -> Option<String> {
    code.map(str::trim)
        .filter(|c| !c.is_empty())
        .map(str::to_string)
}

/// Applies the usability rules to the record found for `code`.
pub fn resolve(
    code: Option<&str>,
    found: Option<Discount>,
    now: DateTime<Utc>,
) -> DiscountResolution {
    let Some(code) = normalize_code(code) else {
        return DiscountResolution::NoCode;
    };

    match found {
        None => DiscountResolution::Rejected {
            code,
            reason: DiscountRejection::NotFound,
        },
        Some(d) if !d.is_active => DiscountResolution::Rejected {
            code,
            reason: DiscountRejection::Inactive,
        },
        Some(d) if now >= d.expires_at => DiscountResolution::Rejected {
            code,
            reason: DiscountRejection::Expired,
        },
        Some(d) => DiscountResolution::Usable(d),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::DiscountKind;
    use chrono::Duration;

    fn discount(now: DateTime<Utc>) -> Discount {
        Discount {
            id: "d1".to_string(),
            promocode: "WELCOME10".to_string(),
            kind: DiscountKind::Percentage,
            value: 1000,
            is_active: true,
            expires_at: now + Duration::days(30),
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn test_no_code() {
        let now = Utc::now();
        assert_eq!(resolve(None, None, now), DiscountResolution::NoCode);
        assert_eq!(resolve(Some("   "), None, now), DiscountResolution::NoCode);
    }

    #[test]
    fn test_usable() {
        let now = Utc::now();
        let res = resolve(Some("WELCOME10"), Some(discount(now)), now);
        assert_eq!(res.usable().map(|d| d.value), Some(1000));
    }

    #[test]
    fn test_rejections_degrade() {
        let now = Utc::now();

        let res = resolve(Some(" NOPE "), None, now);
        assert_eq!(
            res,
            DiscountResolution::Rejected {
                code: "NOPE".to_string(),
                reason: DiscountRejection::NotFound
            }
        );
        assert!(res.usable().is_none());

        let mut inactive = discount(now);
        inactive.is_active = false;
        assert!(matches!(
            resolve(Some("WELCOME10"), Some(inactive), now),
            DiscountResolution::Rejected { reason: DiscountRejection::Inactive, .. }
        ));

        let mut expired = discount(now);
        expired.expires_at = now;
        assert!(matches!(
            resolve(Some("WELCOME10"), Some(expired), now),
            DiscountResolution::Rejected { reason: DiscountRejection::Expired, .. }
        ));
    }
}
