//! # Validation Module
//!
//! Input validation rules shared by every write path.
//!
//! ## Validation Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Validation Layers                                  │
//! │                                                                         │
//! │  Layer 1: HTTP extractor (axum Json)                                   │
//! │  └── Shape and type checks (deserialization)                           │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 2: THIS MODULE                                                  │
//! │  └── Field rules, collected into ValidationErrors                      │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 3: Database (SQLite)                                            │
//! │  └── NOT NULL / UNIQUE / CHECK / foreign key constraints               │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Single-field validators return `ValidationResult<()>`. Composite ones
//! (address, registration) return every failure at once.

use crate::error::{ValidationError, ValidationErrors};
use crate::money::BPS_SCALE;
use crate::types::Address;
use crate::{MAX_AMOUNT_CENTS, MAX_CART_LINES, MAX_ITEM_QUANTITY, MAX_STOCK_COUNT};

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

// =============================================================================
// Helpers
// =============================================================================

fn required_len(field: &str, value: &str, min: usize, max: usize) -> ValidationResult<()> {
    let value = value.trim();

    if value.is_empty() {
        return Err(ValidationError::Required {
            field: field.to_string(),
        });
    }

    let len = value.chars().count();
    if len < min {
        return Err(ValidationError::TooShort {
            field: field.to_string(),
            min,
        });
    }
    if len > max {
        return Err(ValidationError::TooLong {
            field: field.to_string(),
            max,
        });
    }

    Ok(())
}

// =============================================================================
// Catalog Validators
// =============================================================================

/// Validates a SKU.
///
/// ## Rules
/// - 1 to 50 characters
/// - Letters, numbers, hyphens, underscores
///
/// ```rust
/// use meridian_core::validation::validate_sku;
///
/// assert!(validate_sku("LAMP-001").is_ok());
/// assert!(validate_sku("").is_err());
/// assert!(validate_sku("bad sku").is_err());
/// ```
pub fn validate_sku(sku: &str) -> ValidationResult<()> {
    required_len("sku", sku, 1, 50)?;

    if !sku
        .trim()
        .chars()
        .all(|c| c.is_alphanumeric() || c == '-' || c == '_')
    {
        return Err(ValidationError::InvalidFormat {
            field: "sku".to_string(),
            reason: "must contain only letters, numbers, hyphens, and underscores".to_string(),
        });
    }

    Ok(())
}

pub fn validate_product_title(title: &str) -> ValidationResult<()> {
    required_len("title", title, 1, 200)
}

/// Descriptions are optional but capped at 200 characters.
pub fn validate_description(description: Option<&str>) -> ValidationResult<()> {
    match description {
        Some(d) if d.chars().count() > 200 => Err(ValidationError::TooLong {
            field: "description".to_string(),
            max: 200,
        }),
        _ => Ok(()),
    }
}

pub fn validate_category_name(name: &str) -> ValidationResult<()> {
    required_len("name", name, 2, 60)
}

/// Validates a search query and returns it trimmed.
pub fn validate_search_query(query: &str) -> ValidationResult<String> {
    let query = query.trim();

    if query.len() > 100 {
        return Err(ValidationError::TooLong {
            field: "search".to_string(),
            max: 100,
        });
    }

    Ok(query.to_string())
}

// =============================================================================
// Numeric Validators
// =============================================================================

/// Validates a line quantity: `1..=MAX_ITEM_QUANTITY`.
pub fn validate_quantity(qty: i64) -> ValidationResult<()> {
    if qty <= 0 {
        return Err(ValidationError::MustBePositive {
            field: "quantity".to_string(),
        });
    }

    if qty > MAX_ITEM_QUANTITY {
        return Err(ValidationError::OutOfRange {
            field: "quantity".to_string(),
            min: 1,
            max: MAX_ITEM_QUANTITY,
        });
    }

    Ok(())
}

/// Validates an amount in cents: `0..=MAX_AMOUNT_CENTS`.
pub fn validate_amount(field: &str, cents: i64) -> ValidationResult<()> {
    validate_bounded(field, cents, MAX_AMOUNT_CENTS)
}

pub fn validate_stock_count(count: i64) -> ValidationResult<()> {
    validate_bounded("count_in_stock", count, MAX_STOCK_COUNT)
}

fn validate_bounded(field: &str, value: i64, max: i64) -> ValidationResult<()> {
    if value < 0 {
        return Err(ValidationError::Negative {
            field: field.to_string(),
        });
    }
    if value > max {
        return Err(ValidationError::OutOfRange {
            field: field.to_string(),
            min: 0,
            max,
        });
    }
    Ok(())
}

pub fn validate_cart_size(lines: usize) -> ValidationResult<()> {
    if lines > MAX_CART_LINES {
        return Err(ValidationError::OutOfRange {
            field: "lines".to_string(),
            min: 0,
            max: MAX_CART_LINES as i64,
        });
    }
    Ok(())
}

// =============================================================================
// Discount Validators
// =============================================================================

/// Promocodes: 3 to 32 characters, letters, digits, `-` and `_`.
pub fn validate_promocode(code: &str) -> ValidationResult<()> {
    required_len("promocode", code, 3, 32)?;

    if !code
        .trim()
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
    {
        return Err(ValidationError::InvalidFormat {
            field: "promocode".to_string(),
            reason: "must contain only letters, numbers, hyphens, and underscores".to_string(),
        });
    }

    Ok(())
}

/// Percentage discounts are 1 bp to 100%.
pub fn validate_percentage_bps(bps: i64) -> ValidationResult<()> {
    if !(1..=BPS_SCALE).contains(&bps) {
        return Err(ValidationError::OutOfRange {
            field: "value".to_string(),
            min: 1,
            max: BPS_SCALE,
        });
    }
    Ok(())
}

// =============================================================================
// Location Validators
// =============================================================================

pub fn validate_country(country: &str) -> ValidationResult<()> {
    required_len("country", country, 2, 100)
}

pub fn validate_region(region: &str) -> ValidationResult<()> {
    required_len("region", region, 1, 100)
}

/// Validates every address field and reports all failures.
pub fn validate_address(address: &Address) -> Result<(), ValidationErrors> {
    let mut errors = ValidationErrors::new();
    errors.check(required_len("line1", &address.line1, 1, 200));
    if let Some(line2) = &address.line2 {
        if line2.chars().count() > 200 {
            errors.push(ValidationError::TooLong {
                field: "line2".to_string(),
                max: 200,
            });
        }
    }
    errors.check(required_len("city", &address.city, 1, 100));
    errors.check(validate_country(&address.country));
    errors.check(validate_region(&address.region));
    errors.into_result()
}

// =============================================================================
// Account Validators
// =============================================================================

/// Loose structural check: one `@`, non-empty local part, dotted domain.
pub fn validate_email(email: &str) -> ValidationResult<()> {
    let email = email.trim();
    if email.is_empty() {
        return Err(ValidationError::Required {
            field: "email".to_string(),
        });
    }

    let invalid = || ValidationError::InvalidFormat {
        field: "email".to_string(),
        reason: "must be a valid email address".to_string(),
    };

    let (local, domain) = email.split_once('@').ok_or_else(invalid)?;
    if local.is_empty()
        || domain.contains('@')
        || !domain.contains('.')
        || domain.starts_with('.')
        || domain.ends_with('.')
        || email.chars().any(char::is_whitespace)
    {
        return Err(invalid());
    }

    Ok(())
}

/// At least 8 characters with an uppercase, a lowercase and a digit.
pub fn validate_password(password: &str) -> ValidationResult<()> {
    if password.is_empty() {
        return Err(ValidationError::Required {
            field: "password".to_string(),
        });
    }
    if password.chars().count() < 8 {
        return Err(ValidationError::TooShort {
            field: "password".to_string(),
            min: 8,
        });
    }
    if !(password.chars().any(|c| c.is_ascii_uppercase())
        && password.chars().any(|c| c.is_ascii_lowercase())
        && password.chars().any(|c| c.is_ascii_digit()))
    {
        return Err(ValidationError::InvalidFormat {
            field: "password".to_string(),
            reason: "must include an uppercase letter, a lowercase letter, and a number"
                .to_string(),
        });
    }
    Ok(())
}

/// Alphanumeric, 3 to 30 characters.
pub fn validate_username(username: &str) -> ValidationResult<()> {
    required_len("username", username, 3, 30)?;
    if !username.trim().chars().all(|c| c.is_ascii_alphanumeric()) {
        return Err(ValidationError::InvalidFormat {
            field: "username".to_string(),
            reason: "must only contain alphanumeric characters".to_string(),
        });
    }
    Ok(())
}

pub fn validate_full_name(name: &str) -> ValidationResult<()> {
    required_len("full_name", name, 3, 60)
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn address() -> Address {
        Address {
            line1: "12 Harbour Road".to_string(),
            line2: None,
            city: "Lagos".to_string(),
            country: "Nigeria".to_string(),
            region: "Lagos".to_string(),
        }
    }

    #[test]
    fn test_validate_sku() {
        assert!(validate_sku("LAMP-001").is_ok());
        assert!(validate_sku("lamp_01").is_ok());
        assert!(validate_sku("").is_err());
        assert!(validate_sku("   ").is_err());
        assert!(validate_sku(&"A".repeat(51)).is_err());
        assert!(validate_sku("LAMP 001").is_err());
    }

    #[test]
    fn test_validate_quantity() {
        assert!(validate_quantity(1).is_ok());
        assert!(validate_quantity(MAX_ITEM_QUANTITY).is_ok());
        assert!(matches!(
            validate_quantity(0),
            Err(ValidationError::MustBePositive { .. })
        ));
        assert!(validate_quantity(-3).is_err());
        assert!(matches!(
            validate_quantity(MAX_ITEM_QUANTITY + 1),
            Err(ValidationError::OutOfRange { .. })
        ));
    }

    #[test]
    fn test_validate_amount() {
        assert!(validate_amount("price_cents", 0).is_ok());
        assert!(validate_amount("price_cents", 1999).is_ok());
        assert!(validate_amount("price_cents", -1).is_err());
        assert!(validate_amount("price_cents", MAX_AMOUNT_CENTS).is_ok());
        assert!(matches!(
            validate_amount("rate_cents", MAX_AMOUNT_CENTS + 1),
            Err(ValidationError::OutOfRange { .. })
        ));
        assert!(validate_amount("price_cents", i64::MAX / 500).is_err());
    }

    #[test]
    fn test_largest_valid_cart_fits_in_cents() {
        let line = MAX_AMOUNT_CENTS.checked_mul(MAX_ITEM_QUANTITY).unwrap();
        let cart = line.checked_mul(MAX_CART_LINES as i64).unwrap();
        assert!(cart.checked_add(MAX_AMOUNT_CENTS).is_some());
        assert!(validate_stock_count(MAX_STOCK_COUNT).is_ok());
        assert!(validate_stock_count(MAX_STOCK_COUNT + 1).is_err());
    }

    #[test]
    fn test_validate_promocode() {
        assert!(validate_promocode("SAVE20").is_ok());
        assert!(validate_promocode("black-friday_24").is_ok());
        assert!(validate_promocode("AB").is_err());
        assert!(validate_promocode("SAVE 20").is_err());
    }

    #[test]
    fn test_validate_percentage_bps() {
        assert!(validate_percentage_bps(2000).is_ok());
        assert!(validate_percentage_bps(10_000).is_ok());
        assert!(validate_percentage_bps(0).is_err());
        assert!(validate_percentage_bps(10_001).is_err());
    }

    #[test]
    fn test_validate_address_ok() {
        assert!(validate_address(&address()).is_ok());
    }

    #[test]
    fn test_validate_address_itemizes_failures() {
        let mut addr = address();
        addr.line1 = " ".to_string();
        addr.country = "N".to_string();
        addr.region = String::new();

        let errors = validate_address(&addr).unwrap_err();
        assert_eq!(
            errors.messages(),
            vec![
                "line1 is required".to_string(),
                "country must be at least 2 characters".to_string(),
                "region is required".to_string(),
            ]
        );
    }

    #[test]
    fn test_validate_email() {
        assert!(validate_email("ada@example.com").is_ok());
        assert!(validate_email("").is_err());
        assert!(validate_email("ada.example.com").is_err());
        assert!(validate_email("ada@localhost").is_err());
        assert!(validate_email("a@b@c.com").is_err());
        assert!(validate_email("ada @example.com").is_err());
    }

    #[test]
    fn test_validate_password() {
        assert!(validate_password("Secret123").is_ok());
        assert!(matches!(
            validate_password("Sh0rt"),
            Err(ValidationError::TooShort { .. })
        ));
        assert!(matches!(
            validate_password("alllowercase1"),
            Err(ValidationError::InvalidFormat { .. })
        ));
    }

    #[test]
    fn test_validate_username() {
        assert!(validate_username("ada99").is_ok());
        assert!(validate_username("ad").is_err());
        assert!(validate_username("ada_lovelace").is_err());
    }
}
