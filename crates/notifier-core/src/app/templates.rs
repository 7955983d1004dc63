//! Email templates.
//!
//! Every interpolated value goes through [`escape`]; names and module titles
//! are user-entered.

use std::num::NonZeroU32;

use chrono::{DateTime, Utc};

use crate::domain::{CourseOffering, Facilitator};
use crate::ports::OutboundEmail;

pub const SUBMISSION_SUBJECT: &str = "Activity Log Submitted - Course Management Platform";
pub const REMINDER_SUBJECT: &str = "Reminder: Weekly Activity Log Due - Course Management Platform";
pub const OVERDUE_SUBJECT: &str = "URGENT: Overdue Activity Log - Course Management Platform";

const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Subject and body, not yet addressed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rendered {
    pub subject: String,
    pub html: String,
}

impl Rendered {
    pub fn to(self, address: &str) -> OutboundEmail {
        OutboundEmail {
            to: address.to_string(),
            subject: self.subject,
            html: self.html,
        }
    }
}

pub fn escape(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for ch in raw.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            other => out.push(other),
        }
    }
    out
}

fn item(label: &str, value: &str) -> String {
    format!("    <li><strong>{label}:</strong> {}</li>\n", escape(value))
}

fn offering_items(offering: &CourseOffering, week_number: u32) -> String {
    [
        item("Module", &offering.module.name),
        item("Class", &offering.class.name),
        item("Week", &week_number.to_string()),
    ]
    .concat()
}

/// To the manager: a facilitator filed their weekly log.
pub fn submission_notice(
    facilitator: &Facilitator,
    offering: &CourseOffering,
    week_number: u32,
    submitted_at: DateTime<Utc>,
) -> Rendered {
    let html = format!(
        "<h2>Activity Log Submission Notification</h2>\n\
         <p>Hello Manager,</p>\n\
         <p>A facilitator has submitted their weekly activity log:</p>\n\
         <ul>\n{}{}{}{}</ul>\n\
         <p>Please review the submission in the Course Management Platform.</p>\n\
         <p>Best regards,<br>Course Management System</p>\n",
        item("Facilitator", &facilitator.name),
        item("Email", &facilitator.email),
        offering_items(offering, week_number),
        item(
            "Submission Time",
            &submitted_at.format(TIMESTAMP_FORMAT).to_string()
        ),
    );
    Rendered {
        subject: SUBMISSION_SUBJECT.to_string(),
        html,
    }
}

/// To the facilitator: this week's log is still missing.
pub fn due_soon_reminder(
    facilitator: &Facilitator,
    offering: &CourseOffering,
    week_number: u32,
    deadline: DateTime<Utc>,
) -> Rendered {
    let html = format!(
        "<h2>Weekly Activity Log Reminder</h2>\n\
         <p>Hello {},</p>\n\
         <p>This is a friendly reminder that your weekly activity log is due:</p>\n\
         <ul>\n{}{}</ul>\n\
         <p>Please submit your activity log as soon as possible to avoid any delays.</p>\n\
         <p>If you have already submitted your log, please disregard this reminder.</p>\n\
         <p>Best regards,<br>Course Management System</p>\n",
        escape(&facilitator.name),
        offering_items(offering, week_number),
        item("Deadline", &deadline.format(TIMESTAMP_FORMAT).to_string()),
    );
    Rendered {
        subject: REMINDER_SUBJECT.to_string(),
        html,
    }
}

/// To the manager: a log is overdue.
pub fn overdue_alert(
    facilitator: &Facilitator,
    offering: &CourseOffering,
    week_number: u32,
    days_overdue: NonZeroU32,
) -> Rendered {
    let html = format!(
        "<h2>Overdue Activity Log Alert</h2>\n\
         <p>Hello Manager,</p>\n\
         <p>A facilitator has not submitted their weekly activity log and it is now overdue:</p>\n\
         <ul>\n{}{}{}{}</ul>\n\
         <p>Please follow up with the facilitator immediately.</p>\n\
         <p>Best regards,<br>Course Management System</p>\n",
        item("Facilitator", &facilitator.name),
        item("Email", &facilitator.email),
        offering_items(offering, week_number),
        item("Days Overdue", &days_overdue.to_string()),
    );
    Rendered {
        subject: OVERDUE_SUBJECT.to_string(),
        html,
    }
}
