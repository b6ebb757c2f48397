pub mod chat;
pub mod doctor;
pub mod preferences;
