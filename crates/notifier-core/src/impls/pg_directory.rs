//! PgDirectory - PostgreSQL 上の参照実装
//!
//! The CRUD service owns the schema. Its tables use camelCase column names,
//! hence the quoted identifiers.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgPool};
use tracing::debug;
use uuid::Uuid;

use crate::domain::{
    ActivityTracker, ClassSummary, CourseOffering, CourseOfferingId, Facilitator, FacilitatorId,
    ModuleSummary, OfferingStatus,
};
use crate::ports::{Directory, DirectoryError};

const OFFERING_SELECT: &str = r#"
    SELECT co.id,
           co."facilitatorId" AS facilitator_id,
           co.status::text    AS status,
           m.id               AS module_id,
           m.name             AS module_name,
           c.id               AS class_id,
           c.name             AS class_name
    FROM course_offerings co
    JOIN modules m ON m.id = co."moduleId"
    JOIN classes c ON c.id = co."classId"
"#;

#[derive(Debug, FromRow)]
struct FacilitatorRow {
    id: Uuid,
    name: String,
    email: String,
}

#[derive(Debug, FromRow)]
struct OfferingRow {
    id: Uuid,
    facilitator_id: Uuid,
    status: String,
    module_id: Uuid,
    module_name: String,
    class_id: Uuid,
    class_name: String,
}

impl TryFrom<OfferingRow> for CourseOffering {
    type Error = DirectoryError;

    fn try_from(row: OfferingRow) -> Result<Self, Self::Error> {
        let status: OfferingStatus = row
            .status
            .parse()
            .map_err(|e| DirectoryError::Query(format!("offering {}: {e}", row.id)))?;
        Ok(CourseOffering {
            id: row.id.into(),
            facilitator_id: row.facilitator_id.into(),
            module: ModuleSummary {
                id: row.module_id.into(),
                name: row.module_name,
            },
            class: ClassSummary {
                id: row.class_id.into(),
                name: row.class_name,
            },
            status,
        })
    }
}

#[derive(Debug, FromRow)]
struct TrackerRow {
    id: Uuid,
    course_offering_id: Uuid,
    week_number: i32,
    submitted_at: Option<DateTime<Utc>>,
}

fn map_sqlx_error(e: sqlx::Error) -> DirectoryError {
    match e {
        sqlx::Error::Io(_) | sqlx::Error::PoolTimedOut | sqlx::Error::PoolClosed => {
            DirectoryError::Unavailable(e.to_string())
        }
        other => DirectoryError::Query(other.to_string()),
    }
}

#[derive(Debug, Clone)]
pub struct PgDirectory {
    pool: PgPool,
}

impl PgDirectory {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl Directory for PgDirectory {
    async fn find_facilitator(
        &self,
        id: FacilitatorId,
    ) -> Result<Option<Facilitator>, DirectoryError> {
        let row: Option<FacilitatorRow> =
            sqlx::query_as("SELECT id, name, email FROM facilitators WHERE id = $1")
                .bind(id.as_uuid())
                .fetch_optional(&self.pool)
                .await
                .map_err(map_sqlx_error)?;

        Ok(row.map(|r| Facilitator {
            id: r.id.into(),
            name: r.name,
            email: r.email,
        }))
    }

    async fn find_course_offering_with_module_and_class(
        &self,
        id: CourseOfferingId,
    ) -> Result<Option<CourseOffering>, DirectoryError> {
        let sql = format!("{OFFERING_SELECT} WHERE co.id = $1");
        let row: Option<OfferingRow> = sqlx::query_as(&sql)
            .bind(id.as_uuid())
            .fetch_optional(&self.pool)
            .await
            .map_err(map_sqlx_error)?;

        row.map(CourseOffering::try_from).transpose()
    }

    async fn find_active_course_offerings(&self) -> Result<Vec<CourseOffering>, DirectoryError> {
        let sql = format!(r#"{OFFERING_SELECT} WHERE co.status = 'active' ORDER BY co."createdAt""#);
        let rows: Vec<OfferingRow> = sqlx::query_as(&sql)
            .fetch_all(&self.pool)
            .await
            .map_err(map_sqlx_error)?;
        debug!(count = rows.len(), "loaded active course offerings");

        rows.into_iter().map(CourseOffering::try_from).collect()
    }

    async fn find_activity_tracker_for(
        &self,
        offering: CourseOfferingId,
        week_number: u32,
    ) -> Result<Option<ActivityTracker>, DirectoryError> {
        let week = i32::try_from(week_number)
            .map_err(|_| DirectoryError::Query(format!("week {week_number} out of range")))?;

        let row: Option<TrackerRow> = sqlx::query_as(
            r#"
            SELECT id,
                   "allocationId"   AS course_offering_id,
                   "weekNumber"     AS week_number,
                   "submissionDate" AS submitted_at
            FROM activity_trackers
            WHERE "allocationId" = $1 AND "weekNumber" = $2
            LIMIT 1
            "#,
        )
        .bind(offering.as_uuid())
        .bind(week)
        .fetch_optional(&self.pool)
        .await
        .map_err(map_sqlx_error)?;

        row.map(|r| {
            let week_number = u32::try_from(r.week_number).map_err(|_| {
                DirectoryError::Query(format!("tracker {} has week {}", r.id, r.week_number))
            })?;
            Ok(ActivityTracker {
                id: r.id.into(),
                course_offering_id: r.course_offering_id.into(),
                week_number,
                submitted_at: r.submitted_at,
            })
        })
        .transpose()
    }
}
