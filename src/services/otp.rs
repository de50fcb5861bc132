use mongodb::bson::DateTime;
use rand::Rng;

pub struct OtpService;

impl OtpService {
    /// Draws a 6-digit code, uniform over 100000-999999. The RNG is passed
    /// in so production code can use `OsRng` while tests use a seeded one.
    pub fn generate_code<R: Rng + ?Sized>(rng: &mut R) -> String {
        rng.gen_range(100_000..=999_999).to_string()
    }

    /// Pure verdict over the stored code state. Fails when no code is
    /// pending, on mismatch, or once the window has elapsed (the boundary
    /// itself counts as expired). Never mutates; the caller clears the
    /// stored code after a successful check so it cannot be replayed.
    pub fn verify(
        stored: Option<&str>,
        issued_at: Option<DateTime>,
        submitted: &str,
        now: DateTime,
        ttl_minutes: i64,
    ) -> bool {
        let (Some(code), Some(issued_at)) = (stored, issued_at) else {
            return false;
        };
        if code != submitted {
            return false;
        }
        now.timestamp_millis() - issued_at.timestamp_millis() < ttl_minutes * 60_000
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    const TTL: i64 = 10;

    fn at(millis: i64) -> DateTime {
        DateTime::from_millis(millis)
    }

    #[test]
    fn generated_codes_are_six_digits() {
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..1000 {
            let code = OtpService::generate_code(&mut rng);
            assert_eq!(code.len(), 6);
            let n: u32 = code.parse().unwrap();
            assert!((100_000..=999_999).contains(&n));
        }
    }

    #[test]
    fn correct_code_within_window_succeeds() {
        assert!(OtpService::verify(
            Some("123456"),
            Some(at(0)),
            "123456",
            at(60_000),
            TTL
        ));
    }

    #[test]
    fn wrong_code_fails() {
        assert!(!OtpService::verify(
            Some("123456"),
            Some(at(0)),
            "654321",
            at(60_000),
            TTL
        ));
    }

    #[test]
    fn no_pending_code_fails() {
        assert!(!OtpService::verify(None, None, "123456", at(0), TTL));
    }

    #[test]
    fn window_boundary_is_exclusive() {
        let window = TTL * 60_000;
        assert!(OtpService::verify(
            Some("123456"),
            Some(at(0)),
            "123456",
            at(window - 1),
            TTL
        ));
        assert!(!OtpService::verify(
            Some("123456"),
            Some(at(0)),
            "123456",
            at(window),
            TTL
        ));
        assert!(!OtpService::verify(
            Some("123456"),
            Some(at(0)),
            "123456",
            at(window + 1),
            TTL
        ));
    }

    #[test]
    fn cleared_code_cannot_be_replayed() {
        // First check passes, caller clears the stored state, second check
        // with the same submission must fail.
        assert!(OtpService::verify(
            Some("123456"),
            Some(at(0)),
            "123456",
            at(1_000),
            TTL
        ));
        assert!(!OtpService::verify(None, None, "123456", at(2_000), TTL));
    }
}
