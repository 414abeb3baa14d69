use chrono::Utc;
use sea_orm::{ActiveValue, QueryFilter, QueryOrder, TransactionTrait, prelude::*};

use crate::{
    Account, Assignment, AssignmentStatus, EngineError, ResultEngine, Role, assignments,
    consumers, util::new_id,
};

use super::{Engine, with_tx};

/// Filters for [`Engine::list_assignments`].
#[derive(Clone, Debug, Default)]
pub struct AssignmentFilter {
    pub reader_id: Option<String>,
    pub status: Option<AssignmentStatus>,
}

impl Engine {
    /// Links each consumer to a meter reader.
    ///
    /// Fails with `ExistingKey` if any consumer already has an assignment that
    /// is not completed; in that case nothing is stored.
    pub async fn assign_reader(
        &self,
        actor: &Account,
        reader_id: &str,
        consumer_ids: &[String],
    ) -> ResultEngine<Vec<Assignment>> {
        actor.require_role(&[Role::Admin])?;
        if consumer_ids.is_empty() {
            return Err(EngineError::InvalidInput(
                "at least one consumer is required".to_string(),
            ));
        }

        let assigned = with_tx!(self, |db_tx| {
            let reader = self.require_meter_reader(&db_tx, reader_id).await?;
            let now = Utc::now();

            let mut assigned = Vec::with_capacity(consumer_ids.len());
            for consumer_id in consumer_ids {
                consumers::Entity::find_by_id(consumer_id.clone())
                    .one(&db_tx)
                    .await?
                    .ok_or_else(|| {
                        EngineError::KeyNotFound(format!("consumer {consumer_id} not exists"))
                    })?;

                let busy = assignments::Entity::find()
                    .filter(assignments::Column::ConsumerId.eq(consumer_id.clone()))
                    .filter(assignments::Column::Status.is_in(AssignmentStatus::active_values()))
                    .one(&db_tx)
                    .await?
                    .is_some();
                if busy {
                    return Err(EngineError::ExistingKey(format!(
                        "consumer {consumer_id} already has an active assignment"
                    )));
                }

                let model = assignments::ActiveModel {
                    id: ActiveValue::Set(new_id()),
                    reader_id: ActiveValue::Set(reader.id.clone()),
                    consumer_id: ActiveValue::Set(consumer_id.clone()),
                    status: ActiveValue::Set(AssignmentStatus::Assigned.as_str().to_string()),
                    assigned_at: ActiveValue::Set(now),
                    completed_at: ActiveValue::Set(None),
                }
                .insert(&db_tx)
                .await?;
                assigned.push(Assignment::try_from(model)?);
            }
            Ok::<_, EngineError>(assigned)
        })?;

        tracing::info!(reader_id, count = assigned.len(), "consumers assigned");
        Ok(assigned)
    }

    pub async fn update_assignment_status(
        &self,
        actor: &Account,
        assignment_id: &str,
        status: AssignmentStatus,
    ) -> ResultEngine<Assignment> {
        actor.require_role(&[Role::Admin, Role::MeterReader])?;

        with_tx!(self, |db_tx| {
            let model = assignments::Entity::find_by_id(assignment_id.to_string())
                .one(&db_tx)
                .await?
                .ok_or_else(|| EngineError::KeyNotFound("assignment not exists".to_string()))?;

            if actor.role == Role::MeterReader {
                let own = self
                    .meter_reader_of_account(&db_tx, &actor.id)
                    .await?
                    .is_some_and(|reader| reader.id == model.reader_id);
                if !own {
                    return Err(EngineError::Forbidden(
                        "assignment belongs to another meter reader".to_string(),
                    ));
                }
            }

            let current = AssignmentStatus::try_from(model.status.as_str())?;
            if !current.can_transition_to(status) {
                return Err(EngineError::InvalidStatus(format!(
                    "cannot move assignment from {current} to {status}"
                )));
            }

            let mut active: assignments::ActiveModel = model.into();
            active.status = ActiveValue::Set(status.as_str().to_string());
            if status == AssignmentStatus::Completed {
                active.completed_at = ActiveValue::Set(Some(Utc::now()));
            }
            Assignment::try_from(active.update(&db_tx).await?)
        })
    }

    /// Lists assignments. Meter readers only ever see their own.
    pub async fn list_assignments(
        &self,
        actor: &Account,
        filter: AssignmentFilter,
    ) -> ResultEngine<Vec<Assignment>> {
        actor.require_role(&[Role::Admin, Role::MeterReader])?;

        let reader_id = if actor.role == Role::MeterReader {
            let reader = self
                .meter_reader_of_account(&self.database, &actor.id)
                .await?
                .ok_or_else(|| {
                    EngineError::KeyNotFound("meter reader profile not exists".to_string())
                })?;
            Some(reader.id)
        } else {
            filter.reader_id
        };

        let mut query = assignments::Entity::find().order_by_desc(assignments::Column::AssignedAt);
        if let Some(reader_id) = reader_id {
            query = query.filter(assignments::Column::ReaderId.eq(reader_id));
        }
        if let Some(status) = filter.status {
            query = query.filter(assignments::Column::Status.eq(status.as_str()));
        }

        query
            .all(&self.database)
            .await?
            .into_iter()
            .map(Assignment::try_from)
            .collect()
    }
}
