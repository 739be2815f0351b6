//! Delivery address validation for checkout.
//!
//! Failures are keyed by the wire field name so the frontend can surface
//! them inline next to the offending input.

use std::collections::BTreeMap;

use crate::models::DeliveryAddress;

pub type ValidationErrors = BTreeMap<String, String>;

const UAE_MOBILE_PREFIXES: [&str; 6] = ["50", "52", "54", "55", "56", "58"];

/// Strip HTML tags from free-text input. Whitespace is preserved; trimming
/// happens during final validation.
pub fn sanitize_input(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    let mut in_tag = false;
    for c in input.chars() {
        match c {
            '<' => in_tag = true,
            '>' if in_tag => in_tag = false,
            _ if !in_tag => out.push(c),
            _ => {}
        }
    }
    out
}

fn is_valid_name(name: &str) -> bool {
    name.chars()
        .all(|c| c.is_alphabetic() || c == ' ' || c == '-' || c == '\'')
}

fn is_valid_location(location: &str) -> bool {
    location
        .chars()
        .all(|c| c.is_alphabetic() || c == ' ' || c == '-')
}

fn is_valid_email(email: &str) -> bool {
    let Some((local, domain)) = email.split_once('@') else {
        return false;
    };
    let clean = |s: &str| !s.is_empty() && !s.contains(|c: char| c.is_whitespace() || c == '@');
    let Some((host, tld)) = domain.rsplit_once('.') else {
        return false;
    };
    clean(local) && clean(host) && clean(tld)
}

fn is_valid_zip(zip: &str) -> bool {
    (3..=10).contains(&zip.chars().count())
        && zip
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == ' ' || c == '-')
}

/// Phone numbers must carry a country code; UAE numbers additionally get
/// prefix and length checks. Returns the user-facing message on failure.
fn validate_phone(phone: &str) -> Result<(), String> {
    let cleaned: String = phone
        .chars()
        .filter(|c| !matches!(c, ' ' | '-' | '(' | ')'))
        .collect();
    let digits: String = cleaned.chars().filter(char::is_ascii_digit).collect();

    if !cleaned.starts_with('+') {
        return Err("Phone number must include country code (e.g., +971 for UAE)".into());
    }

    if cleaned.starts_with("+971") {
        let uae_number = digits.get(3..).unwrap_or("");
        if uae_number.len() != 9 {
            return Err(
                "UAE phone number must have 9 digits after +971 (e.g., +971 50 123 4567)".into(),
            );
        }
        let prefix = &uae_number[..2];
        if !UAE_MOBILE_PREFIXES.contains(&prefix) {
            return Err(
                "Invalid UAE mobile number prefix. Should start with 50, 52, 54, 55, 56, or 58"
                    .into(),
            );
        }
        return Ok(());
    }

    if digits.len() < 10 || digits.len() > 15 {
        return Err("Phone number must be 10-15 digits including country code".into());
    }

    Ok(())
}

/// Validate every checkout field; an empty map means the address is good to
/// submit.
pub fn validate_delivery_address(address: &DeliveryAddress) -> ValidationErrors {
    let mut errors = ValidationErrors::new();
    let mut fail = |field: &str, message: &str| {
        errors.insert(field.to_string(), message.to_string());
    };

    let full_name = address.full_name.trim();
    if full_name.is_empty() {
        fail("fullName", "Full name is required");
    } else if full_name.chars().count() < 2 {
        fail("fullName", "Full name must be at least 2 characters");
    } else if full_name.chars().count() > 100 {
        fail("fullName", "Full name must not exceed 100 characters");
    } else if !is_valid_name(full_name) {
        fail(
            "fullName",
            "Full name can only contain letters, spaces, hyphens, and apostrophes",
        );
    }

    let phone = address.phone_number.trim();
    if phone.is_empty() {
        fail("phoneNumber", "Phone number is required");
    } else if let Err(message) = validate_phone(phone) {
        fail("phoneNumber", &message);
    }

    let email = address.email.trim();
    if email.is_empty() {
        fail("email", "Email address is required");
    } else if !is_valid_email(email) {
        fail("email", "Please enter a valid email address");
    } else if email.len() > 255 {
        fail("email", "Email address is too long");
    }

    let line1 = address.address_line1.trim();
    if line1.is_empty() {
        fail("addressLine1", "Address is required");
    } else if line1.chars().count() < 5 {
        fail("addressLine1", "Address must be at least 5 characters");
    } else if line1.chars().count() > 200 {
        fail("addressLine1", "Address must not exceed 200 characters");
    }

    if address.address_line2.trim().chars().count() > 200 {
        fail("addressLine2", "Address line 2 must not exceed 200 characters");
    }

    let city = address.city.trim();
    if city.is_empty() {
        fail("city", "City is required");
    } else if city.chars().count() < 2 {
        fail("city", "City must be at least 2 characters");
    } else if city.chars().count() > 100 {
        fail("city", "City must not exceed 100 characters");
    } else if !is_valid_location(city) {
        fail("city", "City can only contain letters, spaces, and hyphens");
    }

    let state = address.state.trim();
    if state.is_empty() {
        fail("state", "State/Province is required");
    } else if state.chars().count() < 2 {
        fail("state", "State must be at least 2 characters");
    } else if state.chars().count() > 100 {
        fail("state", "State must not exceed 100 characters");
    } else if !is_valid_location(state) {
        fail("state", "State can only contain letters, spaces, and hyphens");
    }

    let zip = address.zip_code.trim();
    if zip.is_empty() {
        fail("zipCode", "ZIP/Postal code is required");
    } else if !is_valid_zip(zip) {
        fail("zipCode", "Please enter a valid ZIP/Postal code (3-10 characters)");
    }

    if address.country.trim().is_empty() {
        fail("country", "Country is required");
    }

    errors
}

pub fn is_address_valid(address: &DeliveryAddress) -> bool {
    validate_delivery_address(address).is_empty()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn good_address() -> DeliveryAddress {
        DeliveryAddress {
            full_name: "Amira Haddad".into(),
            phone_number: "+971 50 123 4567".into(),
            email: "amira@example.com".into(),
            address_line1: "Villa 12, Palm Street".into(),
            address_line2: String::new(),
            city: "Dubai".into(),
            state: "Dubai".into(),
            zip_code: "00000".into(),
            country: "United Arab Emirates".into(),
        }
    }

    #[test]
    fn a_complete_address_passes() {
        assert!(is_address_valid(&good_address()));
    }

    #[test]
    fn missing_required_fields_are_all_reported() {
        let errors = validate_delivery_address(&DeliveryAddress::default());
        for field in [
            "fullName",
            "phoneNumber",
            "email",
            "addressLine1",
            "city",
            "state",
            "zipCode",
            "country",
        ] {
            assert!(errors.contains_key(field), "expected error for {field}");
        }
        assert!(!errors.contains_key("addressLine2"));
    }

    #[test]
    fn phone_without_country_code_is_rejected() {
        let mut address = good_address();
        address.phone_number = "050 123 4567".into();
        let errors = validate_delivery_address(&address);
        assert!(errors["phoneNumber"].contains("country code"));
    }

    #[test]
    fn uae_numbers_check_prefix_and_length() {
        let mut address = good_address();
        address.phone_number = "+971 49 123 4567".into();
        let errors = validate_delivery_address(&address);
        assert!(errors["phoneNumber"].contains("prefix"));

        address.phone_number = "+971 50 123 456".into();
        let errors = validate_delivery_address(&address);
        assert!(errors["phoneNumber"].contains("9 digits"));
    }

    #[test]
    fn international_numbers_need_ten_to_fifteen_digits() {
        let mut address = good_address();
        address.phone_number = "+44 7911 123456".into();
        assert!(is_address_valid(&address));

        address.phone_number = "+44 123".into();
        let errors = validate_delivery_address(&address);
        assert!(errors["phoneNumber"].contains("10-15 digits"));
    }

    #[test]
    fn malformed_emails_are_rejected() {
        let mut address = good_address();
        for bad in ["plain", "no@tld", "two@@example.com", "sp ace@example.com"] {
            address.email = bad.into();
            let errors = validate_delivery_address(&address);
            assert!(errors.contains_key("email"), "{bad} should fail");
        }
    }

    #[test]
    fn zip_codes_accept_international_formats() {
        let mut address = good_address();
        for ok in ["00000", "SW1A 1AA", "12345-678"] {
            address.zip_code = ok.into();
            assert!(is_address_valid(&address), "{ok} should pass");
        }
        address.zip_code = "12".into();
        assert!(!is_address_valid(&address));
    }

    #[test]
    fn sanitize_strips_html_but_keeps_spacing() {
        assert_eq!(sanitize_input("Jane <b>Doe</b>"), "Jane Doe");
        assert_eq!(
            sanitize_input("<script>alert('x')</script> hello "),
            "alert('x') hello "
        );
    }
}
