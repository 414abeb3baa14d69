use chrono::Utc;
use sea_orm::{ActiveValue, QueryFilter, QueryOrder, TransactionTrait, prelude::*};

use crate::{
    Account, EngineError, IssuePriority, IssueReport, IssueStatus, ResultEngine, Role,
    issue_reports,
    util::{new_id, normalize_optional_text, normalize_required},
};

use super::{Engine, with_tx};

/// Input for a new issue report.
#[derive(Clone, Debug)]
pub struct NewIssue {
    /// Free-form category, e.g. "leak" or "broken meter".
    pub issue_type: String,
    pub description: String,
    pub priority: IssuePriority,
    /// Ignored for consumers, whose own profile is attached instead.
    pub consumer_id: Option<String>,
}

impl Engine {
    pub async fn create_issue(&self, actor: &Account, new: NewIssue) -> ResultEngine<IssueReport> {
        let issue_type = normalize_required(&new.issue_type, "issue type")?;
        let description = normalize_required(&new.description, "description")?;

        let issue = with_tx!(self, |db_tx| {
            let consumer_id = if actor.role == Role::Consumer {
                Some(self.require_own_consumer(&db_tx, actor).await?.id)
            } else if let Some(id) = normalize_optional_text(new.consumer_id.as_deref()) {
                Some(self.load_consumer(&db_tx, &id).await?.id)
            } else {
                None
            };

            let model = issue_reports::ActiveModel {
                id: ActiveValue::Set(new_id()),
                reported_by: ActiveValue::Set(actor.id.clone()),
                consumer_id: ActiveValue::Set(consumer_id),
                issue_type: ActiveValue::Set(issue_type),
                description: ActiveValue::Set(description),
                priority: ActiveValue::Set(new.priority.as_str().to_string()),
                status: ActiveValue::Set(IssueStatus::Open.as_str().to_string()),
                created_at: ActiveValue::Set(Utc::now()),
                resolved_at: ActiveValue::Set(None),
            }
            .insert(&db_tx)
            .await?;
            IssueReport::try_from(model)
        })?;

        tracing::info!(issue_id = %issue.id, priority = %issue.priority, "issue reported");
        Ok(issue)
    }

    /// Lists issues, newest first. Admins see every issue, everyone else the
    /// issues they reported.
    pub async fn list_issues(
        &self,
        actor: &Account,
        status: Option<IssueStatus>,
    ) -> ResultEngine<Vec<IssueReport>> {
        let mut query =
            issue_reports::Entity::find().order_by_desc(issue_reports::Column::CreatedAt);
        if !actor.is_admin() {
            query = query.filter(issue_reports::Column::ReportedBy.eq(actor.id.clone()));
        }
        if let Some(status) = status {
            query = query.filter(issue_reports::Column::Status.eq(status.as_str()));
        }

        query
            .all(&self.database)
            .await?
            .into_iter()
            .map(IssueReport::try_from)
            .collect()
    }

    pub async fn update_issue_status(
        &self,
        actor: &Account,
        issue_id: &str,
        status: IssueStatus,
    ) -> ResultEngine<IssueReport> {
        actor.require_role(&[Role::Admin])?;

        with_tx!(self, |db_tx| {
            let model = issue_reports::Entity::find_by_id(issue_id.to_string())
                .one(&db_tx)
                .await?
                .ok_or_else(|| EngineError::KeyNotFound("issue not exists".to_string()))?;

            let resolved_at = match status {
                IssueStatus::Resolved => model.resolved_at.or(Some(Utc::now())),
                IssueStatus::Open | IssueStatus::InProgress => None,
            };

            let mut active: issue_reports::ActiveModel = model.into();
            active.status = ActiveValue::Set(status.as_str().to_string());
            active.resolved_at = ActiveValue::Set(resolved_at);
            IssueReport::try_from(active.update(&db_tx).await?)
        })
    }
}
