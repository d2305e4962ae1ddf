use crate::error::{OtpError, Result};

/// Basic email address check before handing a destination to a mail provider
pub fn validate_email(email: &str) -> Result<()> {
    if email.is_empty() {
        return Err(OtpError::InvalidDestination("Email is empty".to_string()));
    }

    let Some((local, domain)) = email.split_once('@') else {
        return Err(OtpError::InvalidDestination(
            "Email must contain @".to_string(),
        ));
    };

    if local.is_empty() || domain.is_empty() {
        return Err(OtpError::InvalidDestination(
            "Email parts cannot be empty".to_string(),
        ));
    }

    if domain.contains('@') {
        return Err(OtpError::InvalidDestination("Invalid email format".to_string()));
    }

    if !domain.contains('.') || domain.starts_with('.') || domain.ends_with('.') {
        return Err(OtpError::InvalidDestination(
            "Domain must contain a dot".to_string(),
        ));
    }

    if email.chars().any(|c| c.is_whitespace() || c == '<' || c == '>') {
        return Err(OtpError::InvalidDestination(
            "Email contains forbidden characters".to_string(),
        ));
    }

    Ok(())
}
