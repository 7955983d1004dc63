//! Read models returned by the persistence collaborator.
//!
//! Only the columns the pipeline needs are projected; the CRUD side owns the
//! full rows.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::ids::{ActivityTrackerId, ClassId, CourseOfferingId, FacilitatorId, ModuleId};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Facilitator {
    pub id: FacilitatorId,
    pub name: String,
    pub email: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModuleSummary {
    pub id: ModuleId,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassSummary {
    pub id: ClassId,
    pub name: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OfferingStatus {
    Active,
    Inactive,
    Completed,
}

impl OfferingStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            OfferingStatus::Active => "active",
            OfferingStatus::Inactive => "inactive",
            OfferingStatus::Completed => "completed",
        }
    }
}

impl fmt::Display for OfferingStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, thiserror::Error)]
#[error("unknown offering status: {0}")]
pub struct UnknownStatus(pub String);

impl FromStr for OfferingStatus {
    type Err = UnknownStatus;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "active" => Ok(OfferingStatus::Active),
            "inactive" => Ok(OfferingStatus::Inactive),
            "completed" => Ok(OfferingStatus::Completed),
            other => Err(UnknownStatus(other.to_string())),
        }
    }
}

/// A course offering joined with its module and class.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CourseOffering {
    pub id: CourseOfferingId,
    pub facilitator_id: FacilitatorId,
    pub module: ModuleSummary,
    pub class: ClassSummary,
    pub status: OfferingStatus,
}

impl CourseOffering {
    pub fn is_active(&self) -> bool {
        self.status == OfferingStatus::Active
    }
}

/// One weekly activity-tracker log. Unique per `(course_offering_id, week_number)`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActivityTracker {
    pub id: ActivityTrackerId,
    pub course_offering_id: CourseOfferingId,
    pub week_number: u32,
    pub submitted_at: Option<DateTime<Utc>>,
}
