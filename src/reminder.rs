//! SMS medicine reminders.

use std::future::Future;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::config::SmsConfig;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ReminderError {
    #[error("{0} is required")]
    MissingField(&'static str),
}

/// A validated reminder, ready to send.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Reminder {
    pub phone: String,
    pub body: String,
}

impl Reminder {
    /// Validate the fields and compose the message text. The phone number gets
    /// a leading `+` if it lacks one.
    pub fn new(phone: &str, medicine: &str, time: &str) -> Result<Self, ReminderError> {
        let (phone, medicine, time) = (phone.trim(), medicine.trim(), time.trim());
        if phone.is_empty() {
            return Err(ReminderError::MissingField("phone"));
        }
        if medicine.is_empty() {
            return Err(ReminderError::MissingField("medicine"));
        }
        if time.is_empty() {
            return Err(ReminderError::MissingField("time"));
        }

        let phone = if phone.starts_with('+') {
            phone.to_string()
        } else {
            format!("+{phone}")
        };

        Ok(Self {
            phone,
            body: format!("Reminder: Take your medicine '{medicine}' at {time}."),
        })
    }
}

/// Delivers text messages. Returns the provider's message id.
pub trait SmsSender: Send + Sync {
    fn send(&self, to: &str, body: &str) -> impl Future<Output = Result<String>> + Send;
}

/// Twilio REST API sender.
#[derive(Debug, Clone)]
pub struct TwilioSender {
    http: reqwest::Client,
    config: SmsConfig,
}

#[derive(Debug, Deserialize)]
struct TwilioMessage {
    sid: String,
}

impl TwilioSender {
    pub fn new(config: SmsConfig) -> Result<Self> {
        anyhow::ensure!(
            config.is_configured(),
            "SMS is not configured: set TWILIO_ACCOUNT_SID, TWILIO_AUTH_TOKEN and TWILIO_PHONE"
        );
        let http = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(15))
            .build()
            .context("failed to build HTTP client")?;
        Ok(Self { http, config })
    }

    fn messages_url(&self) -> String {
        format!(
            "{}/Accounts/{}/Messages.json",
            self.config.api_base.trim_end_matches('/'),
            self.config.account_sid
        )
    }
}

impl SmsSender for TwilioSender {
    async fn send(&self, to: &str, body: &str) -> Result<String> {
        let response = self
            .http
            .post(self.messages_url())
            .basic_auth(&self.config.account_sid, Some(&self.config.auth_token))
            .form(&[("To", to), ("From", self.config.from_phone.as_str()), ("Body", body)])
            .send()
            .await
            .context("SMS request failed")?;

        let status = response.status();
        if !status.is_success() {
            let detail = response.text().await.unwrap_or_default();
            anyhow::bail!("SMS provider returned HTTP {status}: {detail}");
        }

        let message: TwilioMessage = response.json().await.context("invalid SMS provider response")?;
        tracing::info!(sid = %message.sid, "SMS sent");
        Ok(message.sid)
    }
}

/// Validate, then send through `sender`.
pub async fn send_reminder<S: SmsSender>(
    sender: &S,
    phone: &str,
    medicine: &str,
    time: &str,
) -> Result<String> {
    let reminder = Reminder::new(phone, medicine, time)?;
    sender.send(&reminder.phone, &reminder.body).await
}
