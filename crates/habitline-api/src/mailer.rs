use anyhow::Context;
use serde::Serialize;
use tracing::info;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Mail {
    pub to: String,
    pub subject: String,
    pub html: String,
}

impl Mail {
    pub fn reminder(to: &str, username: &str, habit_name: &str) -> Self {
        Self {
            to: to.to_string(),
            subject: format!("Reminder: {} is not done yet", habit_name),
            html: format!(
                "<h2>Hi {},</h2>\
                 <p>Your habit <strong>{}</strong> is not done yet today.</p>\
                 <p>Check it in before midnight to keep your streak going.</p>",
                escape_html(username),
                escape_html(habit_name),
            ),
        }
    }

    pub fn verification(to: &str, code: &str) -> Self {
        Self {
            to: to.to_string(),
            subject: "Verify your email".to_string(),
            html: format!(
                "<p>Your verification code is <strong>{}</strong>.</p>\
                 <p>It expires in 5 minutes.</p>",
                escape_html(code),
            ),
        }
    }
}

/// Outbound mail. Delivery itself belongs to an external relay; without one
/// configured, mails only go to the log.
#[derive(Clone)]
pub enum Mailer {
    Log,
    Relay {
        client: reqwest::Client,
        url: String,
        from: String,
    },
    #[cfg(test)]
    Memory(std::sync::Arc<std::sync::Mutex<Vec<Mail>>>),
}

#[derive(Serialize)]
struct RelayPayload<'a> {
    from: &'a str,
    #[serde(flatten)]
    mail: &'a Mail,
}

impl Mailer {
    pub fn relay(url: impl Into<String>, from: impl Into<String>) -> Self {
        Mailer::Relay {
            client: reqwest::Client::new(),
            url: url.into(),
            from: from.into(),
        }
    }

    pub async fn send(&self, mail: &Mail) -> anyhow::Result<()> {
        match self {
            Mailer::Log => {
                info!(to = %mail.to, subject = %mail.subject, "Mail not delivered (no relay configured)");
                Ok(())
            }
            Mailer::Relay { client, url, from } => {
                client
                    .post(url)
                    .json(&RelayPayload { from, mail })
                    .send()
                    .await
                    .with_context(|| format!("Mail relay {} unreachable", url))?
                    .error_for_status()
                    .context("Mail relay rejected message")?;
                info!(to = %mail.to, subject = %mail.subject, "Mail handed to relay");
                Ok(())
            }
            #[cfg(test)]
            Mailer::Memory(outbox) => {
                outbox
                    .lock()
                    .map_err(|e| anyhow::anyhow!("Outbox lock poisoned: {}", e))?
                    .push(mail.clone());
                Ok(())
            }
        }
    }
}

fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            other => out.push(other),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reminder_escapes_user_text() {
        let mail = Mail::reminder("ada@example.com", "ada", "<b>Read</b> & write");
        assert!(mail.html.contains("&lt;b&gt;Read&lt;/b&gt; &amp; write"));
        assert!(!mail.html.contains("<b>Read"));
        assert_eq!(mail.subject, "Reminder: <b>Read</b> & write is not done yet");
    }

    #[test]
    fn verification_carries_the_code() {
        let mail = Mail::verification("ada@example.com", "123456");
        assert_eq!(mail.to, "ada@example.com");
        assert!(mail.html.contains("123456"));
    }

    #[test]
    fn relay_payload_is_flat() {
        let mail = Mail::verification("ada@example.com", "123456");
        let json = serde_json::to_value(RelayPayload { from: "noreply@habitline.app", mail: &mail }).unwrap();
        assert_eq!(json["from"], "noreply@habitline.app");
        assert_eq!(json["to"], "ada@example.com");
        assert!(json["html"].as_str().is_some());
    }

    #[tokio::test]
    async fn log_mailer_always_succeeds() {
        Mailer::Log
            .send(&Mail::verification("ada@example.com", "123456"))
            .await
            .unwrap();
    }
}
