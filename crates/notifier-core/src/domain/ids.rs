//! Domain identifiers (strongly-typed IDs).
//!
//! 全ての行は UUID 主キーを持つので、`Id<T>` は `Uuid` を包むだけの薄い型です。
//! `T` は PhantomData のマーカーで、`FacilitatorId` と `CourseOfferingId` を
//! コンパイル時に取り違えられないようにします。

use serde::{Deserialize, Serialize};
use std::fmt;
use std::marker::PhantomData;
use std::str::FromStr;
use uuid::Uuid;

/// IdMarker は各 ID 型のマーカー trait
///
/// Display で使うプレフィックス（"facilitator-", "offering-" など）を提供します。
pub trait IdMarker: Send + Sync + 'static {
    fn prefix() -> &'static str;
}

/// Generic UUID-backed identifier.
///
/// Serialized as the bare UUID string so the wire format stays compatible with
/// what request handlers already send (`"facilitatorId": "<uuid>"`).
#[repr(transparent)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Id<T: IdMarker> {
    uuid: Uuid,
    #[serde(skip)]
    _marker: PhantomData<T>,
}

impl<T: IdMarker> Id<T> {
    pub fn from_uuid(uuid: Uuid) -> Self {
        Self {
            uuid,
            _marker: PhantomData,
        }
    }

    /// Random v4 id. Only seeders and tests mint ids; production rows come
    /// from the database.
    pub fn random() -> Self {
        Self::from_uuid(Uuid::new_v4())
    }

    pub fn as_uuid(&self) -> Uuid {
        self.uuid
    }
}

impl<T: IdMarker> From<Uuid> for Id<T> {
    fn from(uuid: Uuid) -> Self {
        Self::from_uuid(uuid)
    }
}

impl<T: IdMarker> fmt::Display for Id<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", T::prefix(), self.uuid)
    }
}

/// Accepts both the bare UUID and the prefixed `Display` form.
impl<T: IdMarker> FromStr for Id<T> {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let raw = s.strip_prefix(T::prefix()).unwrap_or(s);
        Uuid::parse_str(raw).map(Self::from_uuid)
    }
}

// ========================================
// マーカー型の定義
// ========================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Facilitator {}

impl IdMarker for Facilitator {
    fn prefix() -> &'static str {
        "facilitator-"
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum CourseOffering {}

impl IdMarker for CourseOffering {
    fn prefix() -> &'static str {
        "offering-"
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Module {}

impl IdMarker for Module {
    fn prefix() -> &'static str {
        "module-"
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Class {}

impl IdMarker for Class {
    fn prefix() -> &'static str {
        "class-"
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ActivityTracker {}

impl IdMarker for ActivityTracker {
    fn prefix() -> &'static str {
        "tracker-"
    }
}

// ========================================
// Type Alias
// ========================================

/// Identifier of a facilitator account.
pub type FacilitatorId = Id<Facilitator>;

/// Identifier of a course offering (module × class × facilitator × term).
pub type CourseOfferingId = Id<CourseOffering>;

pub type ModuleId = Id<Module>;

pub type ClassId = Id<Class>;

/// Identifier of one weekly activity-tracker log.
pub type ActivityTrackerId = Id<ActivityTracker>;
