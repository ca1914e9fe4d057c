pub mod accounts;
pub mod health;
pub mod inventory;
pub mod medicines;
pub mod predict;
pub mod reminders;
