pub mod email;
pub mod jwt;
pub mod otp;
pub mod ratings;

pub use email::EmailService;
pub use jwt::JwtService;
pub use otp::OtpService;
