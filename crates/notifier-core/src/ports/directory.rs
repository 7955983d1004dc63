//! Directory port - 読み取り専用の参照（facilitator / course offering / activity tracker）

use async_trait::async_trait;

use crate::domain::{
    ActivityTracker, CourseOffering, CourseOfferingId, Facilitator, FacilitatorId,
};

#[derive(Debug, thiserror::Error)]
pub enum DirectoryError {
    #[error("directory unavailable: {0}")]
    Unavailable(String),

    #[error("directory query failed: {0}")]
    Query(String),
}

/// Read-only lookups against the course platform's relational store.
///
/// `Ok(None)` means the row does not exist (for example it was deleted after
/// the event was enqueued); that is not an error.
#[async_trait]
pub trait Directory: Send + Sync {
    async fn find_facilitator(
        &self,
        id: FacilitatorId,
    ) -> Result<Option<Facilitator>, DirectoryError>;

    async fn find_course_offering_with_module_and_class(
        &self,
        id: CourseOfferingId,
    ) -> Result<Option<CourseOffering>, DirectoryError>;

    async fn find_active_course_offerings(&self) -> Result<Vec<CourseOffering>, DirectoryError>;

    async fn find_activity_tracker_for(
        &self,
        offering: CourseOfferingId,
        week_number: u32,
    ) -> Result<Option<ActivityTracker>, DirectoryError>;
}
