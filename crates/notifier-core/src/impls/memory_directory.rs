//! MemoryDirectory - テスト・開発用の参照先
//!
//! Rows are inserted through the helper methods below. `set_unavailable`
//! makes every lookup fail, which is how tests simulate a database outage.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{PoisonError, RwLock};

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::domain::{
    ActivityTracker, ActivityTrackerId, ClassId, ClassSummary, CourseOffering, CourseOfferingId,
    Facilitator, FacilitatorId, ModuleId, ModuleSummary, OfferingStatus,
};
use crate::ports::{Directory, DirectoryError};

#[derive(Debug, Default)]
struct State {
    facilitators: HashMap<FacilitatorId, Facilitator>,
    /// 挿入順を保つ（find_active_course_offerings の結果順を決定的にする）
    offerings: Vec<CourseOffering>,
    trackers: HashMap<(CourseOfferingId, u32), ActivityTracker>,
}

#[derive(Debug, Default)]
pub struct MemoryDirectory {
    state: RwLock<State>,
    unavailable: AtomicBool,
}

impl MemoryDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_facilitator(&self, name: &str, email: &str) -> Facilitator {
        let facilitator = Facilitator {
            id: FacilitatorId::random(),
            name: name.to_string(),
            email: email.to_string(),
        };
        let mut state = self.state.write().unwrap_or_else(PoisonError::into_inner);
        state
            .facilitators
            .insert(facilitator.id, facilitator.clone());
        facilitator
    }

    pub fn add_offering(
        &self,
        facilitator: FacilitatorId,
        module_name: &str,
        class_name: &str,
        status: OfferingStatus,
    ) -> CourseOffering {
        let offering = CourseOffering {
            id: CourseOfferingId::random(),
            facilitator_id: facilitator,
            module: ModuleSummary {
                id: ModuleId::random(),
                name: module_name.to_string(),
            },
            class: ClassSummary {
                id: ClassId::random(),
                name: class_name.to_string(),
            },
            status,
        };
        let mut state = self.state.write().unwrap_or_else(PoisonError::into_inner);
        state.offerings.push(offering.clone());
        offering
    }

    /// Files the weekly log for `(offering, week_number)`, replacing any earlier one.
    pub fn record_activity(
        &self,
        offering: CourseOfferingId,
        week_number: u32,
        submitted_at: DateTime<Utc>,
    ) -> ActivityTracker {
        let tracker = ActivityTracker {
            id: ActivityTrackerId::random(),
            course_offering_id: offering,
            week_number,
            submitted_at: Some(submitted_at),
        };
        let mut state = self.state.write().unwrap_or_else(PoisonError::into_inner);
        state
            .trackers
            .insert((offering, week_number), tracker.clone());
        tracker
    }

    pub fn remove_facilitator(&self, id: FacilitatorId) {
        let mut state = self.state.write().unwrap_or_else(PoisonError::into_inner);
        state.facilitators.remove(&id);
    }

    pub fn remove_offering(&self, id: CourseOfferingId) {
        let mut state = self.state.write().unwrap_or_else(PoisonError::into_inner);
        state.offerings.retain(|o| o.id != id);
    }

    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    fn read(&self) -> Result<std::sync::RwLockReadGuard<'_, State>, DirectoryError> {
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(DirectoryError::Unavailable(
                "memory directory marked unavailable".to_string(),
            ));
        }
        Ok(self.state.read().unwrap_or_else(PoisonError::into_inner))
    }
}

#[async_trait]
impl Directory for MemoryDirectory {
    async fn find_facilitator(
        &self,
        id: FacilitatorId,
    ) -> Result<Option<Facilitator>, DirectoryError> {
        Ok(self.read()?.facilitators.get(&id).cloned())
    }

    async fn find_course_offering_with_module_and_class(
        &self,
        id: CourseOfferingId,
    ) -> Result<Option<CourseOffering>, DirectoryError> {
        Ok(self.read()?.offerings.iter().find(|o| o.id == id).cloned())
    }

    async fn find_active_course_offerings(&self) -> Result<Vec<CourseOffering>, DirectoryError> {
        Ok(self
            .read()?
            .offerings
            .iter()
            .filter(|o| o.is_active())
            .cloned()
            .collect())
    }

    async fn find_activity_tracker_for(
        &self,
        offering: CourseOfferingId,
        week_number: u32,
    ) -> Result<Option<ActivityTracker>, DirectoryError> {
        Ok(self.read()?.trackers.get(&(offering, week_number)).cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn active_offerings_exclude_other_statuses() {
        let dir = MemoryDirectory::new();
        let f = dir.add_facilitator("Avery Lee", "avery@example.com");
        let active = dir.add_offering(f.id, "Databases", "C1", OfferingStatus::Active);
        dir.add_offering(f.id, "Networks", "C2", OfferingStatus::Completed);
        dir.add_offering(f.id, "Compilers", "C3", OfferingStatus::Inactive);

        let found = dir.find_active_course_offerings().await.unwrap();
        assert_eq!(found, vec![active]);
    }

    #[tokio::test]
    async fn removed_rows_resolve_to_none() {
        let dir = MemoryDirectory::new();
        let f = dir.add_facilitator("Avery Lee", "avery@example.com");
        let o = dir.add_offering(f.id, "Databases", "C1", OfferingStatus::Active);

        dir.remove_facilitator(f.id);
        dir.remove_offering(o.id);

        assert_eq!(dir.find_facilitator(f.id).await.unwrap(), None);
        assert_eq!(
            dir.find_course_offering_with_module_and_class(o.id).await.unwrap(),
            None
        );
    }

    #[tokio::test]
    async fn tracker_lookup_is_per_week() {
        let dir = MemoryDirectory::new();
        let f = dir.add_facilitator("Avery Lee", "avery@example.com");
        let o = dir.add_offering(f.id, "Databases", "C1", OfferingStatus::Active);
        dir.record_activity(o.id, 4, Utc::now());

        assert!(dir.find_activity_tracker_for(o.id, 4).await.unwrap().is_some());
        assert!(dir.find_activity_tracker_for(o.id, 5).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn unavailable_directory_fails_every_lookup() {
        let dir = MemoryDirectory::new();
        dir.set_unavailable(true);

        let err = dir.find_active_course_offerings().await.unwrap_err();
        assert!(matches!(err, DirectoryError::Unavailable(_)));
    }
}
