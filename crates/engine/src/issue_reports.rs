//! Maintenance tickets (leaks, broken meters, billing complaints).

use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use crate::{EngineError, util::db_enum};

db_enum! {
    pub enum IssueStatus ("issue status") {
        Open => "open",
        InProgress => "in_progress",
        Resolved => "resolved",
    }
}

db_enum! {
    pub enum IssuePriority ("issue priority") {
        Low => "low",
        Medium => "medium",
        High => "high",
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct IssueReport {
    pub id: String,
    pub reported_by: String,
    pub consumer_id: Option<String>,
    pub issue_type: String,
    pub description: String,
    pub priority: IssuePriority,
    pub status: IssueStatus,
    pub created_at: DateTime<Utc>,
    pub resolved_at: Option<DateTime<Utc>>,
}

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "issue_report")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub reported_by: String,
    pub consumer_id: Option<String>,
    pub issue_type: String,
    pub description: String,
    pub priority: String,
    pub status: String,
    pub created_at: DateTime<Utc>,
    pub resolved_at: Option<DateTime<Utc>>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

impl TryFrom<Model> for IssueReport {
    type Error = EngineError;

    fn try_from(model: Model) -> Result<Self, Self::Error> {
        Ok(Self {
            priority: IssuePriority::try_from(model.priority.as_str())?,
            status: IssueStatus::try_from(model.status.as_str())?,
            id: model.id,
            reported_by: model.reported_by,
            consumer_id: model.consumer_id,
            issue_type: model.issue_type,
            description: model.description,
            created_at: model.created_at,
            resolved_at: model.resolved_at,
        })
    }
}
