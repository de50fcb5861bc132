use regex::Regex;

pub fn validate_email(email: &str) -> bool {
    let re = Regex::new(r"^[a-zA-Z0-9._%+-]+@[a-zA-Z0-9.-]+\.[a-zA-Z]{2,}$").unwrap();
    re.is_match(email)
}

pub fn validate_username(username: &str) -> bool {
    let re = Regex::new(r"^[a-zA-Z0-9_.-]{3,30}$").unwrap();
    re.is_match(username)
}

pub fn validate_password(password: &str) -> bool {
    password.len() >= 8
}

/// Ratings are whole numbers on a 1-10 scale.
pub fn validate_rating(rating: i32) -> bool {
    (1..=10).contains(&rating)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_plain_email() {
        assert!(validate_email("jane.doe@example.com"));
        assert!(!validate_email("jane.doe@example"));
        assert!(!validate_email("not-an-email"));
    }

    #[test]
    fn username_length_and_charset() {
        assert!(validate_username("jane_doe"));
        assert!(validate_username("j.d-99"));
        assert!(!validate_username("jd"));
        assert!(!validate_username("jane doe"));
    }

    #[test]
    fn password_minimum_length() {
        assert!(validate_password("longenough"));
        assert!(!validate_password("short"));
    }

    #[test]
    fn rating_bounds_are_inclusive() {
        assert!(validate_rating(1));
        assert!(validate_rating(10));
        assert!(!validate_rating(0));
        assert!(!validate_rating(11));
    }
}
