use chrono::NaiveDate;
use regex::Regex;
use std::sync::LazyLock;

use super::auth_service::{AuthError, RegisterRequest};

static EMAIL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").expect("valid email regex"));

static PHONE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\d{4}-\d{3}-\d{4}$").expect("valid phone regex"));

static BIRTHDATE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\d{2}/\d{2}/\d{4}$").expect("valid birthdate regex"));

static POSTCODE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^([A-Z][0-9] [0-9][A-Z]{2}|[A-Z][0-9]{2} [0-9][A-Z]{2}|[A-Z]{2}[0-9] [0-9][A-Z]{2})$")
        .expect("valid postcode regex")
});

const NAME_FORBIDDEN: &str = "*?!'^+%&/()=}][{$#@<>";

pub fn validate_email(email: &str) -> Result<&str, AuthError> {
    let email = email.trim();
    if email.len() > 100 || !EMAIL.is_match(email) {
        return Err(AuthError::Validation(format!("Invalid email address: {email}")));
    }
    Ok(email)
}

pub fn validate_name<'a>(field: &str, name: &'a str) -> Result<&'a str, AuthError> {
    let name = name.trim();
    if name.is_empty() {
        return Err(AuthError::Validation(format!("{field} cannot be empty")));
    }

    if let Some(c) = name.chars().find(|c| NAME_FORBIDDEN.contains(*c)) {
        return Err(AuthError::Validation(format!(
            "{field} must not contain the character '{c}'"
        )));
    }

    Ok(name)
}

pub fn validate_phone(phone: &str) -> Result<&str, AuthError> {
    let phone = phone.trim();
    if !PHONE.is_match(phone) {
        return Err(AuthError::Validation(
            "Phone must have the form XXXX-XXX-XXXX".to_string(),
        ));
    }
    Ok(phone)
}

pub fn validate_birthdate(birthdate: &str) -> Result<&str, AuthError> {
    let birthdate = birthdate.trim();
    if !BIRTHDATE.is_match(birthdate) {
        return Err(AuthError::Validation(
            "Date of birth must have the form DD/MM/YYYY".to_string(),
        ));
    }

    NaiveDate::parse_from_str(birthdate, "%d/%m/%Y").map_err(|_| {
        AuthError::Validation(format!("Date of birth is not a calendar date: {birthdate}"))
    })?;

    Ok(birthdate)
}

pub fn validate_postcode(postcode: &str) -> Result<&str, AuthError> {
    let postcode = postcode.trim();
    if !POSTCODE.is_match(postcode) {
        return Err(AuthError::Validation(format!("Invalid postcode: {postcode}")));
    }
    Ok(postcode)
}

pub fn validate_password(password: &str) -> Result<&str, AuthError> {
    let length = password.chars().count();
    if !(6..=12).contains(&length) {
        return Err(AuthError::Validation(
            "Password must be between 6 and 12 characters".to_string(),
        ));
    }

    let has_digit = password.chars().any(|c| c.is_ascii_digit());
    let has_lower = password.chars().any(char::is_lowercase);
    let has_upper = password.chars().any(char::is_uppercase);
    let has_special = password.chars().any(|c| !c.is_alphanumeric() && !c.is_whitespace());

    if !(has_digit && has_lower && has_upper && has_special) {
        return Err(AuthError::Validation(
            "Password must contain at least 1 digit, 1 lowercase, 1 uppercase and 1 special character"
                .to_string(),
        ));
    }

    Ok(password)
}

/// Checks every registration field and returns the request with trimmed values.
pub fn validate_registration(request: &RegisterRequest) -> Result<RegisterRequest, AuthError> {
    let email = validate_email(&request.email)?;
    let firstname = validate_name("First name", &request.firstname)?;
    let lastname = validate_name("Last name", &request.lastname)?;
    let phone = validate_phone(&request.phone)?;
    let birthdate = validate_birthdate(&request.birthdate)?;
    let postcode = validate_postcode(&request.postcode)?;
    let password = validate_password(&request.password)?;

    if request.password != request.confirm_password {
        return Err(AuthError::Validation("Both password fields must be equal".to_string()));
    }

    Ok(RegisterRequest {
        email: email.to_string(),
        password: password.to_string(),
        confirm_password: password.to_string(),
        firstname: firstname.to_string(),
        lastname: lastname.to_string(),
        phone: phone.to_string(),
        birthdate: birthdate.to_string(),
        postcode: postcode.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request() -> RegisterRequest {
        RegisterRequest {
            email: "bob@example.com".to_string(),
            password: "Passw0rd!".to_string(),
            confirm_password: "Passw0rd!".to_string(),
            firstname: "Bob".to_string(),
            lastname: "Smith".to_string(),
            phone: "0191-222-3333".to_string(),
            birthdate: "01/02/1990".to_string(),
            postcode: "NE1 4SP".to_string(),
        }
    }

    #[test]
    fn test_validate_registration_accepts_good_form() {
        let validated = validate_registration(&RegisterRequest {
            email: "  bob@example.com ".to_string(),
            ..request()
        })
        .unwrap();
        assert_eq!(validated.email, "bob@example.com");
    }

    #[test]
    fn test_validate_email() {
        assert!(validate_email("a@b.co").is_ok());
        assert!(validate_email("no-at-sign.com").is_err());
        assert!(validate_email("two@@example.com").is_err());
        assert!(validate_email("").is_err());
    }

    #[test]
    fn test_validate_name() {
        assert!(validate_name("First name", "Anne-Marie").is_ok());
        assert!(validate_name("First name", "Bob!").is_err());
        assert!(validate_name("First name", "<script>").is_err());
        assert!(validate_name("First name", "   ").is_err());
    }

    #[test]
    fn test_validate_phone() {
        assert!(validate_phone("0191-123-4567").is_ok());
        assert!(validate_phone("01911234567").is_err());
        assert!(validate_phone("0191-1234-567").is_err());
    }

    #[test]
    fn test_validate_birthdate() {
        assert!(validate_birthdate("11/11/2000").is_ok());
        assert!(validate_birthdate("31/12/1999").is_ok());
        assert!(validate_birthdate("32/01/2000").is_err());
        assert!(validate_birthdate("01/13/2000").is_err());
        assert!(validate_birthdate("2000-01-01").is_err());
        assert!(validate_birthdate("1/2/2000").is_err());
    }

    #[test]
    fn test_validate_birthdate_checks_calendar() {
        assert!(validate_birthdate("29/02/2000").is_ok());
        assert!(validate_birthdate("15/06/1875").is_ok());
        assert!(validate_birthdate("31/02/2000").is_err());
        assert!(validate_birthdate("29/02/2001").is_err());
        assert!(validate_birthdate("31/04/1990").is_err());
        assert!(validate_birthdate("00/01/2000").is_err());
    }

    #[test]
    fn test_validate_postcode() {
        assert!(validate_postcode("M1 1AE").is_ok());
        assert!(validate_postcode("B33 8TH").is_ok());
        assert!(validate_postcode("NE1 4SP").is_ok());
        assert!(validate_postcode("ne1 4sp").is_err());
        assert!(validate_postcode("NE14SP").is_err());
        assert!(validate_postcode("SW1A 1AA").is_err());
    }

    #[test]
    fn test_validate_password() {
        assert!(validate_password("Admin1!").is_ok());
        assert!(validate_password("Ab1!").is_err());
        assert!(validate_password("Abcdefghijk1!").is_err());
        assert!(validate_password("admin1!").is_err());
        assert!(validate_password("ADMIN1!").is_err());
        assert!(validate_password("Admin!!").is_err());
        assert!(validate_password("Admin11").is_err());
    }

    #[test]
    fn test_password_confirmation_must_match() {
        let err = validate_registration(&RegisterRequest {
            confirm_password: "Passw0rd?".to_string(),
            ..request()
        })
        .unwrap_err();
        assert!(matches!(err, AuthError::Validation(_)));
    }
}
