/// SMTP transport
use super::{EmailConfig, EmailError, EmailResult};
use lettre::message::{header::ContentType, Mailbox, MultiPart, SinglePart};
use lettre::transport::smtp::authentication::Credentials;
use lettre::{Message, SmtpTransport, Transport};

pub async fn send_email(
    config: &EmailConfig,
    to: &str,
    subject: &str,
    body_text: &str,
    body_html: Option<&str>,
) -> EmailResult<()> {
    let message = build_message(config, to, subject, body_text, body_html)?;
    let mailer = build_transport(config)?;

    mailer.send(&message)?;
    log::info!("Email \"{}\" sent to {}", subject, to);

    Ok(())
}

/// Plain text, or text plus HTML as multipart/alternative.
pub fn build_message(
    config: &EmailConfig,
    to: &str,
    subject: &str,
    body_text: &str,
    body_html: Option<&str>,
) -> EmailResult<Message> {
    let from: Mailbox = format!("{} <{}>", config.from_name, config.from_address)
        .parse()
        .map_err(|e| EmailError::ConfigError(format!("Invalid from address: {}", e)))?;
    let to: Mailbox = to
        .parse()
        .map_err(|e| EmailError::ConfigError(format!("Invalid recipient {}: {}", to, e)))?;

    let builder = Message::builder().from(from).to(to).subject(subject);
    let text = SinglePart::builder()
        .header(ContentType::TEXT_PLAIN)
        .body(body_text.to_string());

    let message = match body_html {
        Some(html) => builder.multipart(
            MultiPart::alternative().singlepart(text).singlepart(
                SinglePart::builder()
                    .header(ContentType::TEXT_HTML)
                    .body(html.to_string()),
            ),
        )?,
        None => builder.singlepart(text)?,
    };

    Ok(message)
}

fn build_transport(config: &EmailConfig) -> EmailResult<SmtpTransport> {
    let builder = if config.smtp_tls {
        SmtpTransport::relay(&config.smtp_host)?
    } else {
        SmtpTransport::builder_dangerous(&config.smtp_host)
    };
    let builder = builder.port(config.smtp_port);

    // Local relays usually accept mail without authentication.
    let builder = if config.smtp_username.is_empty() {
        builder
    } else {
        builder.credentials(Credentials::new(
            config.smtp_username.clone(),
            config.smtp_password.clone(),
        ))
    };

    Ok(builder.build())
}
