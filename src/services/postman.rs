// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Outgoing email through an HTTP mail relay.

use std::collections::HashMap;

use async_trait::async_trait;
use serde::Serialize;

use crate::config::PostmanConfig;

/// Templates known to the postman, keyed by name.
const TEMPLATES: &[(&str, &str)] = &[(
    "signup",
    "<p>Hi there,</p>\
     <p>You're off the waitlist! TruStory Beta is ready for you.</p>\
     <p><a href=\"{{signup_link}}\">Sign up here</a> to get started.</p>\
     <p>See you inside,<br>The TruStory team</p>",
)];

#[derive(Debug, thiserror::Error)]
pub enum PostmanError {
    #[error("Unknown template: {0}")]
    UnknownTemplate(String),

    #[error("Template {template} is missing variable {name}")]
    MissingVariable { template: String, name: String },

    #[error(transparent)]
    Http(#[from] reqwest::Error),

    #[error("Mail relay returned {status}: {body}")]
    Relay { status: u16, body: String },
}

/// An email ready to send.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Message {
    pub to: Vec<String>,
    pub subject: String,
    /// HTML body
    pub body: String,
}

#[derive(Serialize)]
struct RelayRequest<'a> {
    from: &'a str,
    to: &'a [String],
    subject: &'a str,
    html: &'a str,
}

/// Mail relay client.
#[derive(Clone)]
pub struct Postman {
    http: reqwest::Client,
    relay_url: String,
    sender: String,
}

impl Postman {
    pub fn new(http: reqwest::Client, config: &PostmanConfig) -> Self {
        Self {
            http,
            relay_url: config.relay_url.clone(),
            sender: config.sender.clone(),
        }
    }
}

/// Something that delivers email.
#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send(&self, message: &Message) -> Result<(), PostmanError>;
}

#[async_trait]
impl Mailer for Postman {
    async fn send(&self, message: &Message) -> Result<(), PostmanError> {
        let response = self
            .http
            .post(&self.relay_url)
            .json(&RelayRequest {
                from: &self.sender,
                to: &message.to,
                subject: &message.subject,
                html: &message.body,
            })
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(PostmanError::Relay {
                status: status.as_u16(),
                body,
            });
        }

        tracing::info!(recipients = message.to.len(), subject = %message.subject, "Email sent");
        Ok(())
    }
}

/// Render template `name`, substituting `{{var}}` placeholders.
pub fn render_template(name: &str, vars: &HashMap<&str, String>) -> Result<String, PostmanError> {
    let (_, template) = TEMPLATES
        .iter()
        .find(|(n, _)| *n == name)
        .ok_or_else(|| PostmanError::UnknownTemplate(name.to_string()))?;

    let mut out = String::with_capacity(template.len());
    let mut rest = *template;
    while let Some(start) = rest.find("{{") {
        out.push_str(&rest[..start]);
        let after = &rest[start + 2..];
        let Some(end) = after.find("}}") else {
            out.push_str(&rest[start..]);
            rest = "";
            break;
        };
        let key = after[..end].trim();
        let value = vars.get(key).ok_or_else(|| PostmanError::MissingVariable {
            template: name.to_string(),
            name: key.to_string(),
        })?;
        out.push_str(value);
        rest = &after[end + 2..];
    }
    out.push_str(rest);
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_signup() {
        let vars = HashMap::from([("signup_link", "https://example.com/join".to_string())]);
        let html = render_template("signup", &vars).unwrap();
        assert!(html.contains("<a href=\"https://example.com/join\">"));
        assert!(!html.contains("{{"));
    }

    #[test]
    fn test_render_missing_variable() {
        let err = render_template("signup", &HashMap::new()).unwrap_err();
        assert!(matches!(err, PostmanError::MissingVariable { .. }));
    }

    #[test]
    fn test_unknown_template() {
        let err = render_template("nope", &HashMap::new()).unwrap_err();
        assert!(matches!(err, PostmanError::UnknownTemplate(_)));
    }
}
