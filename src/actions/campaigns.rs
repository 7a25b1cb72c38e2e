// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Email campaigns.

use std::collections::HashMap;

use crate::services::postman::{render_template, Mailer, Message, PostmanError};

/// A batch of emails, one per recipient.
pub trait Campaign {
    fn name(&self) -> &str;
    fn recipients(&self) -> Vec<String>;
    fn message(&self, recipient: &str) -> Result<Message, PostmanError>;
}

/// Tells waitlisted people they can sign up.
pub struct WaitlistApprovalCampaign {
    pub recipients: Vec<String>,
    pub signup_link: String,
}

impl Campaign for WaitlistApprovalCampaign {
    fn name(&self) -> &str {
        "waitlist-approval"
    }

    fn recipients(&self) -> Vec<String> {
        self.recipients.clone()
    }

    fn message(&self, recipient: &str) -> Result<Message, PostmanError> {
        let vars = HashMap::from([("signup_link", self.signup_link.clone())]);
        Ok(Message {
            to: vec![recipient.to_string()],
            subject: "Getting you started with TruStory Beta".to_string(),
            body: render_template("signup", &vars)?,
        })
    }
}

#[derive(Debug, Default, PartialEq)]
pub struct CampaignReport {
    pub sent: usize,
    pub failed: usize,
}

/// Send a campaign. A failed recipient is logged and skipped.
pub async fn run_campaign(mailer: &dyn Mailer, campaign: &dyn Campaign) -> CampaignReport {
    let mut report = CampaignReport::default();
    for recipient in campaign.recipients() {
        let result = match campaign.message(&recipient) {
            Ok(message) => mailer.send(&message).await,
            Err(e) => Err(e),
        };
        match result {
            Ok(()) => report.sent += 1,
            Err(e) => {
                tracing::warn!(campaign = campaign.name(), %recipient, error = %e, "Email failed");
                report.failed += 1;
            }
        }
    }
    tracing::info!(
        campaign = campaign.name(),
        sent = report.sent,
        failed = report.failed,
        "Campaign finished"
    );
    report
}
