//! SMS medicine reminders.

use axum::extract::State;
use axum::{Form, Json};
use serde::{Deserialize, Serialize};

use crate::api::error::ApiError;
use crate::api::AppState;
use crate::reminder::{Reminder, SmsSender};

#[derive(Debug, Deserialize)]
pub struct ReminderForm {
    #[serde(default)]
    pub phone: String,
    #[serde(default)]
    pub medicine: String,
    #[serde(default)]
    pub time: String,
}

#[derive(Serialize)]
pub struct ReminderResponse {
    pub status: &'static str,
    pub to: String,
    pub sid: String,
}

/// `POST /reminders`
pub async fn send(
    State(state): State<AppState>,
    Form(form): Form<ReminderForm>,
) -> Result<Json<ReminderResponse>, ApiError> {
    let reminder = Reminder::new(&form.phone, &form.medicine, &form.time)?;

    let Some(sender) = state.sms.as_ref() else {
        return Err(ApiError::Unavailable(
            "SMS reminders are not configured".into(),
        ));
    };

    let sid = sender
        .send(&reminder.phone, &reminder.body)
        .await
        .map_err(|e| ApiError::Upstream(format!("{e:#}")))?;

    Ok(Json(ReminderResponse {
        status: "sent",
        to: reminder.phone,
        sid,
    }))
}
