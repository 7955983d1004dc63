//! Domain model (events, ids, read models, week window, errors).

pub mod errors;
pub mod event;
pub mod ids;
pub mod records;
pub mod week;

pub use self::errors::{CodecError, ErrorKind, NotifyError};
pub use self::event::{
    ActivityLogSubmitted, EventKind, FacilitatorReminder, NotificationEvent, OverdueEscalation,
};
pub use self::ids::{ActivityTrackerId, ClassId, CourseOfferingId, FacilitatorId, Id, ModuleId};
pub use self::records::{
    ActivityTracker, ClassSummary, CourseOffering, Facilitator, ModuleSummary, OfferingStatus,
};
pub use self::week::WeekWindow;
