//! Organizer notification for new submissions, sent via SMTP.

use async_trait::async_trait;
use lettre::message::header::ContentType;
use lettre::message::Mailbox;
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};
use uuid::Uuid;

use kongre_core::EmailConfig;

/// What the organizer is told about a new submission
#[derive(Debug, Clone, PartialEq)]
pub struct SubmissionNotice {
    pub submission_id: Uuid,
    pub full_name: String,
    pub email: String,
    pub phone: Option<String>,
    pub university: String,
    pub title: String,
    pub file_url: String,
    pub ip: Option<String>,
    pub user_agent: Option<String>,
}

#[derive(Debug, thiserror::Error)]
pub enum NotifyError {
    #[error("Failed to build message: {0}")]
    Message(String),

    #[error("Delivery failed: {0}")]
    Transport(String),
}

#[async_trait]
pub trait Notifier: Send + Sync {
    async fn notify_submission(&self, notice: &SubmissionNotice) -> Result<(), NotifyError>;
}

/// Notifier delivering to the single organizer mailbox
#[derive(Clone)]
pub struct SmtpNotifier {
    mailer: AsyncSmtpTransport<Tokio1Executor>,
    from: Mailbox,
    to: Mailbox,
}

impl SmtpNotifier {
    /// Create the notifier from config. Returns `None` when notifications are disabled.
    pub fn from_config(config: &EmailConfig) -> anyhow::Result<Option<Self>> {
        if !config.enabled {
            tracing::debug!("Submission notifications disabled (NOTIFICATIONS_ENABLED=false)");
            return Ok(None);
        }
        let host = config
            .smtp_host
            .as_deref()
            .ok_or_else(|| anyhow::anyhow!("SMTP_HOST must be set"))?;
        let from: Mailbox = config
            .from_email
            .as_deref()
            .unwrap_or_default()
            .parse()
            .map_err(|e| anyhow::anyhow!("Invalid FROM_EMAIL: {}", e))?;
        let to: Mailbox = config
            .organizer_email
            .as_deref()
            .unwrap_or_default()
            .parse()
            .map_err(|e| anyhow::anyhow!("Invalid ORGANIZER_EMAIL: {}", e))?;

        let builder = if config.smtp_tls {
            AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(host)?
        } else {
            AsyncSmtpTransport::<Tokio1Executor>::builder_dangerous(host)
        };
        let builder = builder.port(config.smtp_port);
        let builder = match (&config.smtp_user, &config.smtp_password) {
            (Some(user), Some(password)) => {
                builder.credentials(Credentials::new(user.clone(), password.clone()))
            }
            _ => builder,
        };

        tracing::info!(
            host = %host,
            port = config.smtp_port,
            tls = config.smtp_tls,
            "Submission notifier initialized"
        );

        Ok(Some(Self {
            mailer: builder.build(),
            from,
            to,
        }))
    }
}

#[async_trait]
impl Notifier for SmtpNotifier {
    #[tracing::instrument(skip(self, notice), fields(submission_id = %notice.submission_id))]
    async fn notify_submission(&self, notice: &SubmissionNotice) -> Result<(), NotifyError> {
        let message = Message::builder()
            .from(self.from.clone())
            .to(self.to.clone())
            .subject(subject(notice))
            .header(ContentType::TEXT_HTML)
            .body(render_html(notice))
            .map_err(|e| NotifyError::Message(e.to_string()))?;

        self.mailer
            .send(message)
            .await
            .map_err(|e| NotifyError::Transport(e.to_string()))?;
        tracing::info!("Submission notification sent");
        Ok(())
    }
}

pub fn subject(notice: &SubmissionNotice) -> String {
    // Subjects are a single line.
    let title: String = notice.title.chars().filter(|c| !c.is_control()).collect();
    format!("Yeni başvuru: {}", title)
}

/// Fixed HTML body. Every interpolated value is escaped.
pub fn render_html(notice: &SubmissionNotice) -> String {
    let mut html = String::from("<h3>Yeni Başvuru</h3>\n");
    let mut row = |label: &str, value: &str| {
        html.push_str(&format!(
            "<p><b>{}:</b> {}</p>\n",
            label,
            html_escape::encode_safe(value)
        ));
    };
    row("Ad Soyad", &notice.full_name);
    row("E-posta", &notice.email);
    row("Tel", notice.phone.as_deref().unwrap_or("-"));
    row("Üniversite", &notice.university);
    row("Başlık", &notice.title);

    let url = html_escape::encode_double_quoted_attribute(&notice.file_url);
    html.push_str(&format!(
        "<p><b>Dosya:</b> <a href=\"{}\">{}</a></p>\n",
        url, url
    ));
    if let Some(ip) = &notice.ip {
        html.push_str(&format!("<p><b>IP:</b> {}</p>\n", html_escape::encode_safe(ip)));
    }
    if let Some(ua) = &notice.user_agent {
        html.push_str(&format!("<p><b>UA:</b> {}</p>\n", html_escape::encode_safe(ua)));
    }
    html
}
