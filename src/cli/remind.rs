//! CLI `remind` command.

use anyhow::Result;

use crate::config::MedwiseConfig;
use crate::reminder::{send_reminder, TwilioSender};

pub async fn remind(config: &MedwiseConfig, phone: &str, medicine: &str, time: &str) -> Result<()> {
    let sender = TwilioSender::new(config.sms.clone())?;
    let sid = send_reminder(&sender, phone, medicine, time).await?;
    println!("Reminder sent (SID {sid}).");
    Ok(())
}
