use chrono::Utc;
use sea_orm::{ActiveValue, QueryFilter, QueryOrder, TransactionTrait, prelude::*};

use crate::{
    Account, Billing, EngineError, Payment, PaymentStatus, ResultEngine, Role, billings,
    payments,
    util::{new_id, normalize_optional_text},
};

use super::{Engine, with_tx};

impl Engine {
    /// Records a payment against a billing and updates its running total and
    /// status.
    ///
    /// `amount` is in minor units and may not exceed the outstanding balance.
    pub async fn record_payment(
        &self,
        actor: &Account,
        billing_id: &str,
        amount: i64,
        reference: Option<&str>,
    ) -> ResultEngine<(Billing, Payment)> {
        actor.require_role(&[Role::Admin, Role::Cashier])?;
        if amount <= 0 {
            return Err(EngineError::InvalidAmount(format!(
                "payment amount must be > 0, got {amount}"
            )));
        }

        let (billing, payment) = with_tx!(self, |db_tx| {
            let model = self.require_billing_model(&db_tx, billing_id).await?;
            let billing = Billing::try_from(model.clone())?;
            if billing.payment_status == PaymentStatus::Paid {
                return Err(EngineError::InvalidStatus(
                    "billing is already paid".to_string(),
                ));
            }
            let outstanding = billing.outstanding();
            if amount > outstanding {
                return Err(EngineError::InvalidAmount(format!(
                    "payment of {amount} exceeds outstanding balance {outstanding}"
                )));
            }

            let cashier_id = match actor.role {
                Role::Cashier => self
                    .cashier_of_account(&db_tx, &actor.id)
                    .await?
                    .map(|cashier| cashier.id),
                _ => None,
            };
            let now = Utc::now();

            let payment = payments::ActiveModel {
                id: ActiveValue::Set(new_id()),
                billing_id: ActiveValue::Set(billing.id.clone()),
                cashier_id: ActiveValue::Set(cashier_id),
                amount: ActiveValue::Set(amount),
                reference: ActiveValue::Set(normalize_optional_text(reference)),
                paid_at: ActiveValue::Set(now),
            }
            .insert(&db_tx)
            .await?;

            let amount_paid = billing.amount_paid + amount;
            let status = billing
                .payment_status
                .after_payment(amount_paid, billing.total_amount_due());

            let mut active: billings::ActiveModel = model.into();
            active.amount_paid = ActiveValue::Set(amount_paid);
            active.payment_status = ActiveValue::Set(status.as_str().to_string());
            if status == PaymentStatus::Paid {
                active.payment_date = ActiveValue::Set(Some(now));
            }
            let billing = Billing::try_from(active.update(&db_tx).await?)?;
            Ok::<_, EngineError>((billing, Payment::from(payment)))
        })?;

        tracing::info!(
            billing_id = %billing.id,
            amount,
            status = %billing.payment_status,
            "payment recorded"
        );
        Ok((billing, payment))
    }

    /// Payments of a billing, oldest first.
    pub async fn list_payments(
        &self,
        actor: &Account,
        billing_id: &str,
    ) -> ResultEngine<Vec<Payment>> {
        // Enforces ownership for consumers.
        let billing = self.billing(actor, billing_id).await?;

        Ok(payments::Entity::find()
            .filter(payments::Column::BillingId.eq(billing.id))
            .order_by_asc(payments::Column::PaidAt)
            .all(&self.database)
            .await?
            .into_iter()
            .map(Payment::from)
            .collect())
    }
}
