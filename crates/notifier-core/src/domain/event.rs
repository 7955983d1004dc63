//! NotificationEvent - キューを流れる作業単位
//!
//! Wire format is JSON, internally tagged by `type`. The tag strings and the
//! camelCase field names are what request handlers already push, so they must
//! not be renamed.

use std::fmt;
use std::num::NonZeroU32;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::errors::CodecError;
use super::ids::{CourseOfferingId, FacilitatorId};

/// A facilitator filed the weekly log for one offering.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActivityLogSubmitted {
    pub facilitator_id: FacilitatorId,
    pub course_offering_id: CourseOfferingId,
    pub week_number: u32,
}

/// The weekly log for `week_number` is missing; `deadline` is the end of that week.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FacilitatorReminder {
    pub facilitator_id: FacilitatorId,
    pub course_offering_id: CourseOfferingId,
    pub week_number: u32,
    pub deadline: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OverdueEscalation {
    pub facilitator_id: FacilitatorId,
    pub course_offering_id: CourseOfferingId,
    pub week_number: u32,
    pub days_overdue: NonZeroU32,
}

/// One queued notification.
///
/// Any tag not listed here decodes to [`NotificationEvent::Unknown`] rather
/// than failing, so a newer producer can never wedge an older worker.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum NotificationEvent {
    #[serde(rename = "activity_log_submitted")]
    ActivityLogSubmitted(ActivityLogSubmitted),

    #[serde(rename = "reminder_facilitator")]
    FacilitatorReminder(FacilitatorReminder),

    #[serde(rename = "overdue_notification")]
    OverdueEscalation(OverdueEscalation),

    #[serde(other)]
    Unknown,
}

/// Kind of an event, for logging and metrics labels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    ActivityLogSubmitted,
    FacilitatorReminder,
    OverdueEscalation,
    Unknown,
}

impl EventKind {
    /// The wire tag.
    pub fn as_str(&self) -> &'static str {
        match self {
            EventKind::ActivityLogSubmitted => "activity_log_submitted",
            EventKind::FacilitatorReminder => "reminder_facilitator",
            EventKind::OverdueEscalation => "overdue_notification",
            EventKind::Unknown => "unknown",
        }
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl NotificationEvent {
    pub fn activity_log_submitted(
        facilitator_id: FacilitatorId,
        course_offering_id: CourseOfferingId,
        week_number: u32,
    ) -> Self {
        Self::ActivityLogSubmitted(ActivityLogSubmitted {
            facilitator_id,
            course_offering_id,
            week_number,
        })
    }

    pub fn facilitator_reminder(
        facilitator_id: FacilitatorId,
        course_offering_id: CourseOfferingId,
        week_number: u32,
        deadline: DateTime<Utc>,
    ) -> Self {
        Self::FacilitatorReminder(FacilitatorReminder {
            facilitator_id,
            course_offering_id,
            week_number,
            deadline,
        })
    }

    pub fn overdue_escalation(
        facilitator_id: FacilitatorId,
        course_offering_id: CourseOfferingId,
        week_number: u32,
        days_overdue: NonZeroU32,
    ) -> Self {
        Self::OverdueEscalation(OverdueEscalation {
            facilitator_id,
            course_offering_id,
            week_number,
            days_overdue,
        })
    }

    pub fn kind(&self) -> EventKind {
        match self {
            NotificationEvent::ActivityLogSubmitted(_) => EventKind::ActivityLogSubmitted,
            NotificationEvent::FacilitatorReminder(_) => EventKind::FacilitatorReminder,
            NotificationEvent::OverdueEscalation(_) => EventKind::OverdueEscalation,
            NotificationEvent::Unknown => EventKind::Unknown,
        }
    }

    /// `(facilitator, offering, week)` for every known kind.
    pub fn subject(&self) -> Option<(FacilitatorId, CourseOfferingId, u32)> {
        match self {
            NotificationEvent::ActivityLogSubmitted(e) => {
                Some((e.facilitator_id, e.course_offering_id, e.week_number))
            }
            NotificationEvent::FacilitatorReminder(e) => {
                Some((e.facilitator_id, e.course_offering_id, e.week_number))
            }
            NotificationEvent::OverdueEscalation(e) => {
                Some((e.facilitator_id, e.course_offering_id, e.week_number))
            }
            NotificationEvent::Unknown => None,
        }
    }

    pub fn encode(&self) -> Result<String, CodecError> {
        Ok(serde_json::to_string(self)?)
    }

    pub fn decode(raw: &str) -> Result<Self, CodecError> {
        Ok(serde_json::from_str(raw)?)
    }
}
