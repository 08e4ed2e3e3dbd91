/// Email bodies.
use super::{send_email, EmailConfig, EmailResult};
use crate::app_config::SiteConfig;
use chrono::NaiveDateTime;

/// `{base_url}/{invite_path}/{token}` with stray slashes removed.
pub fn invitation_link(base_url: &str, invite_path: &str, token: &str) -> String {
    format!(
        "{}/{}/{}",
        base_url.trim_end_matches('/'),
        invite_path.trim_matches('/'),
        token
    )
}

pub async fn send_survey_invitation_email(
    email: &EmailConfig,
    site: &SiteConfig,
    to: &str,
    survey_title: &str,
    token: &str,
    expires_at: Option<NaiveDateTime>,
) -> EmailResult<()> {
    let link = invitation_link(&site.base_url, &site.invite_path, token);
    let expiry_line = match expires_at {
        Some(at) => format!("This invitation expires on {} UTC.", at.format("%Y-%m-%d %H:%M")),
        None => "This invitation does not expire.".to_string(),
    };

    let body_text = format!(
        r#"Hello,

You have been invited to take part in "{title}".

Open the link below to respond:
{link}

{expiry}
The link can be used once.

---
{site}
"#,
        title = survey_title,
        link = link,
        expiry = expiry_line,
        site = site.name,
    );

    let body_html = format!(
        r#"<!DOCTYPE html>
<html>
<head>
    <meta charset="utf-8">
    <title>Survey invitation</title>
</head>
<body style="font-family: Arial, sans-serif; line-height: 1.6; color: #333;">
    <div style="max-width: 600px; margin: 0 auto; padding: 20px;">
        <h2>You're invited</h2>
        <p>You have been invited to take part in <strong>{title}</strong>.</p>
        <p style="margin: 30px 0;">
            <a href="{link}"
               style="background-color: #007bff; color: white; padding: 12px 24px;
                      text-decoration: none; border-radius: 4px; display: inline-block;">
                Respond now
            </a>
        </p>
        <p>Or copy and paste this link into your browser:</p>
        <p style="word-break: break-all; color: #007bff;">{link}</p>
        <p><strong>{expiry}</strong> The link can be used once.</p>
        <hr style="margin: 30px 0; border: none; border-top: 1px solid #ddd;">
        <p style="color: #666; font-size: 0.9em;">{site}</p>
    </div>
</body>
</html>"#,
        title = html_escape(survey_title),
        link = link,
        expiry = expiry_line,
        site = html_escape(&site.name),
    );

    let subject = format!("You're invited: {}", survey_title);
    send_email(email, to, &subject, &body_text, Some(&body_html)).await
}

fn html_escape(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for c in input.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}
