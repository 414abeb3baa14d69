//! Reader assignments: which meter reader visits which consumer.

use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use crate::{EngineError, util::db_enum};

db_enum! {
    /// Progress of an assignment. Only moves forward.
    pub enum AssignmentStatus ("assignment status") {
        Assigned => "assigned",
        Ongoing => "ongoing",
        Completed => "completed",
    }
}

impl AssignmentStatus {
    pub fn is_active(self) -> bool {
        self != Self::Completed
    }

    /// Stored values of the statuses that still count as active.
    pub(crate) fn active_values() -> Vec<&'static str> {
        Self::ALL
            .iter()
            .copied()
            .filter(|status| status.is_active())
            .map(Self::as_str)
            .collect()
    }

    /// `assigned → ongoing → completed`, skipping `ongoing` is allowed.
    pub fn can_transition_to(self, next: Self) -> bool {
        matches!(
            (self, next),
            (Self::Assigned, Self::Ongoing)
                | (Self::Assigned, Self::Completed)
                | (Self::Ongoing, Self::Completed)
        )
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Assignment {
    pub id: String,
    pub reader_id: String,
    pub consumer_id: String,
    pub status: AssignmentStatus,
    pub assigned_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
}

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "meter_reader_assignments")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub reader_id: String,
    pub consumer_id: String,
    pub status: String,
    pub assigned_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "crate::staff::meter_readers::Entity",
        from = "Column::ReaderId",
        to = "crate::staff::meter_readers::Column::Id",
        on_update = "NoAction",
        on_delete = "Cascade"
    )]
    Reader,
    #[sea_orm(
        belongs_to = "super::consumers::Entity",
        from = "Column::ConsumerId",
        to = "super::consumers::Column::Id",
        on_update = "NoAction",
        on_delete = "Cascade"
    )]
    Consumer,
}

impl ActiveModelBehavior for ActiveModel {}

impl TryFrom<Model> for Assignment {
    type Error = EngineError;

    fn try_from(model: Model) -> Result<Self, Self::Error> {
        Ok(Self {
            status: AssignmentStatus::try_from(model.status.as_str())?,
            id: model.id,
            reader_id: model.reader_id,
            consumer_id: model.consumer_id,
            assigned_at: model.assigned_at,
            completed_at: model.completed_at,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::AssignmentStatus::*;

    #[test]
    fn status_only_moves_forward() {
        assert!(Assigned.can_transition_to(Ongoing));
        assert!(Assigned.can_transition_to(Completed));
        assert!(Ongoing.can_transition_to(Completed));

        assert!(!Ongoing.can_transition_to(Assigned));
        assert!(!Completed.can_transition_to(Ongoing));
        assert!(!Completed.can_transition_to(Completed));
        assert!(!Assigned.can_transition_to(Assigned));
    }

    #[test]
    fn completed_is_not_active() {
        assert!(Assigned.is_active());
        assert!(Ongoing.is_active());
        assert!(!Completed.is_active());
    }
}
