use serde::{Deserialize, Serialize};
use validator::Validate;

/// Body of `POST /api/contact`.
#[derive(Debug, Clone, Default, Deserialize, Serialize, Validate)]
pub struct ContactRequest {
    #[serde(default)]
    #[validate(length(min = 1, message = "Name is required"))]
    pub name: String,
    #[serde(default)]
    #[validate(email(message = "Invalid email address"))]
    pub email: String,
    #[serde(default)]
    pub company: Option<String>,
    #[serde(default)]
    #[validate(length(min = 1, message = "Message is required"))]
    pub message: String,
    #[serde(default)]
    pub subject: Option<String>,
}

impl ContactRequest {
    pub fn email_subject(&self) -> String {
        match self.subject.as_deref().filter(|s| !s.trim().is_empty()) {
            Some(subject) => format!("{} - {}", subject, self.name),
            None => format!("New Contact Form Submission from {}", self.name),
        }
    }

    /// Plain-text e-mail body.
    pub fn email_text(&self) -> String {
        let mut text = format!("Name: {}\nEmail: {}\n", self.name, self.email);
        if let Some(company) = self.company.as_deref().filter(|c| !c.trim().is_empty()) {
            text.push_str(&format!("Company: {}\n", company));
        }
        text.push_str(&format!("\nMessage:\n{}\n\nReply to: {}\n", self.message, self.email));
        text
    }
}
