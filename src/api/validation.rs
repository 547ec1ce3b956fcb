use super::ApiError;

pub fn validate_email(email: &str) -> Result<&str, ApiError> {
    let trimmed = email.trim();
    if trimmed.is_empty() {
        return Err(ApiError::validation("Email cannot be empty"));
    }

    if trimmed.len() > 254 {
        return Err(ApiError::validation("Email must be 254 characters or less"));
    }

    let Some((local, domain)) = trimmed.split_once('@') else {
        return Err(ApiError::validation(format!("Invalid email: {trimmed}")));
    };

    if local.is_empty() || domain.is_empty() || !domain.contains('.') {
        return Err(ApiError::validation(format!("Invalid email: {trimmed}")));
    }

    Ok(trimmed)
}

pub fn validate_username(username: &str) -> Result<&str, ApiError> {
    if username.len() < 3 {
        return Err(ApiError::validation(
            "Username must be at least 3 characters",
        ));
    }

    if username.len() > 32 {
        return Err(ApiError::validation("Username must be 32 characters or less"));
    }

    if !username
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
    {
        return Err(ApiError::validation(
            "Username can only contain letters, numbers, hyphens, and underscores",
        ));
    }

    Ok(username)
}

pub fn validate_password(password: &str) -> Result<&str, ApiError> {
    if password.len() < 8 {
        return Err(ApiError::validation(
            "Password must be at least 8 characters",
        ));
    }

    if password.len() > 128 {
        return Err(ApiError::validation(
            "Password must be 128 characters or less",
        ));
    }

    Ok(password)
}

pub fn validate_title(title: &str) -> Result<&str, ApiError> {
    let trimmed = title.trim();
    if trimmed.is_empty() {
        return Err(ApiError::validation("Title cannot be empty"));
    }

    if trimmed.len() > 128 {
        return Err(ApiError::validation("Title must be 128 characters or less"));
    }

    Ok(trimmed)
}

pub fn validate_url(url: &str) -> Result<&str, ApiError> {
    if url.len() > 2048 {
        return Err(ApiError::validation("URL must be 2048 characters or less"));
    }

    let parsed = url::Url::parse(url)
        .map_err(|_| ApiError::validation(format!("Invalid URL: {url}")))?;

    if parsed.scheme() != "http" && parsed.scheme() != "https" {
        return Err(ApiError::validation("URL must use http or https"));
    }

    Ok(url)
}

pub fn validate_bookmark_id(id: i32) -> Result<i32, ApiError> {
    if id <= 0 {
        return Err(ApiError::validation(format!(
            "Invalid bookmark ID: {id}. ID must be a positive integer"
        )));
    }
    Ok(id)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_email() {
        assert!(validate_email("user@example.com").is_ok());
        assert!(validate_email("  padded@example.com  ").is_ok());
        assert!(validate_email("").is_err());
        assert!(validate_email("no-at-sign").is_err());
        assert!(validate_email("user@nodot").is_err());
        assert!(validate_email("@example.com").is_err());
    }

    #[test]
    fn test_validate_username() {
        assert!(validate_username("alice").is_ok());
        assert!(validate_username("user_42").is_ok());
        assert!(validate_username("with-hyphen").is_ok());
        assert!(validate_username("ab").is_err());
        assert!(validate_username("a".repeat(33).as_str()).is_err());
        assert!(validate_username("bad name").is_err());
        assert!(validate_username("bad@name").is_err());
    }

    #[test]
    fn test_validate_password() {
        assert!(validate_password("longenough").is_ok());
        assert!(validate_password("short").is_err());
        assert!(validate_password("p".repeat(129).as_str()).is_err());
    }

    #[test]
    fn test_validate_title() {
        assert!(validate_title("My bookmark").is_ok());
        assert_eq!(validate_title("  trimmed  ").unwrap(), "trimmed");
        assert!(validate_title("").is_err());
        assert!(validate_title("   ").is_err());
        assert!(validate_title("t".repeat(129).as_str()).is_err());
    }

    #[test]
    fn test_validate_url() {
        assert!(validate_url("https://example.com/page").is_ok());
        assert!(validate_url("http://localhost:8080").is_ok());
        assert!(validate_url("ftp://example.com").is_err());
        assert!(validate_url("not a url").is_err());
    }

    #[test]
    fn test_validate_bookmark_id() {
        assert!(validate_bookmark_id(1).is_ok());
        assert!(validate_bookmark_id(0).is_err());
        assert!(validate_bookmark_id(-5).is_err());
    }
}
