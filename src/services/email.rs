use lettre::{
    Message, SmtpTransport, Transport,
    message::{Mailbox, header::ContentType},
    transport::smtp::authentication::Credentials,
};
use log::{error, info, warn};

/// Delivery is fire-and-forget: failures are logged and never surfaced to
/// the request that triggered them.
pub struct EmailService;

impl EmailService {
    pub async fn send_otp_email(email: &str, username: &str, otp: &str, purpose: &str) -> bool {
        match Self::try_send_otp(email, username, otp, purpose).await {
            Ok(_) => {
                info!("{} code emailed to {}", purpose, email);
                true
            }
            Err(e) => {
                error!("Failed to send {} code to {}: {}", purpose, email, e);
                false
            }
        }
    }

    async fn try_send_otp(
        email: &str,
        username: &str,
        otp: &str,
        purpose: &str,
    ) -> Result<(), Box<dyn std::error::Error>> {
        let mail_user = crate::config::Config::mail_user();
        let mail_password = crate::config::Config::mail_password();

        if mail_user.is_empty() || mail_password.is_empty() {
            warn!("Email credentials not configured. Skipping email send.");
            return Err("Email not configured".into());
        }

        let from_mailbox: Mailbox = crate::config::Config::mail_from().parse()?;
        let to_mailbox: Mailbox = email.parse()?;

        let ttl = crate::config::Config::otp_ttl_minutes();
        let email_body = format!(
            r#"
            <!DOCTYPE html>
            <html>
            <body>
                <p>Hello {},</p>
                <p>Your {} verification code is:</p>
                <h2 style="letter-spacing: 5px;">{}</h2>
                <p>It expires in {} minutes. Never share this code with anyone.</p>
                <p>If you didn't request this code, please ignore this email.</p>
                <p>Best regards,<br><strong>The Docdex Team</strong></p>
            </body>
            </html>
            "#,
            username, purpose, otp, ttl
        );

        let email_message = Message::builder()
            .from(from_mailbox)
            .to(to_mailbox)
            .subject(format!("{} Verification Code", purpose))
            .header(ContentType::TEXT_HTML)
            .body(email_body)?;

        let creds = Credentials::new(mail_user, mail_password);
        let mailer = SmtpTransport::relay(&crate::config::Config::mail_host())?
            .credentials(creds)
            .build();

        mailer.send(&email_message)?;
        Ok(())
    }
}
