pub mod analytics;
pub mod chat;
pub mod contact;
pub mod oauth;
pub mod session;
