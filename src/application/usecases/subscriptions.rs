use std::sync::Arc;

use chrono::{DateTime, Months, Utc};
use thiserror::Error;
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::{
    application::account_locks::AccountLocks,
    config::config_model::Plans,
    domain::{
        entities::{
            accounts::{AccountEntity, InsertAccountEntity},
            payments::InsertPaymentEntity,
        },
        repositories::{
            accounts::AccountRepository, billing_gateway::BillingGateway,
            payments::PaymentLedgerRepository,
        },
        value_objects::{
            accounts::{CommitOutcome, ProUpgrade, TierTransition},
            billing_gateway::{ChargeRequest, IssuedBillingKey},
            enums::{payment_statuses::PaymentStatus, subscription_tiers::SubscriptionTier},
            subscriptions::{AckDto, ConfirmSubscriptionModel, SubscriptionSnapshot},
        },
    },
};

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SubscriptionError {
    #[error("account not found")]
    NotFound,
    #[error("caller identity is missing or unverified")]
    Unauthorized,
    #[error("invalid request: {0}")]
    InvalidRequest(String),
    #[error("billing key could not be issued")]
    BillingKeyIssueFailed,
    #[error("first payment failed")]
    FirstPaymentFailed,
    #[error("payment was taken but the subscription could not be recorded")]
    DbUpdateFailed,
    #[error("account or ledger lookup failed")]
    DbError,
    #[error("order id was already used by another payment")]
    OrderConflict,
    #[error("account was modified concurrently; retry the request")]
    Conflict,
    #[error("no units left in the current period")]
    InsufficientQuota,
    #[error("no active subscription")]
    NotActive,
    #[error("subscription is already scheduled for cancellation")]
    AlreadyCanceled,
    #[error("subscription is already active")]
    AlreadyActive,
    #[error("billing period has ended; confirm a new payment to subscribe again")]
    CannotReactivateExpired,
}

impl SubscriptionError {
    /// Stable machine-readable code reported alongside the message.
    pub fn code(&self) -> &'static str {
        match self {
            SubscriptionError::NotFound => "NOT_FOUND",
            SubscriptionError::Unauthorized => "UNAUTHORIZED",
            SubscriptionError::InvalidRequest(_) => "INVALID_REQUEST",
            SubscriptionError::BillingKeyIssueFailed => "BILLING_KEY_ISSUE_FAILED",
            SubscriptionError::FirstPaymentFailed => "FIRST_PAYMENT_FAILED",
            SubscriptionError::DbUpdateFailed => "DB_UPDATE_FAILED",
            SubscriptionError::DbError => "DB_ERROR",
            SubscriptionError::OrderConflict => "ORDER_CONFLICT",
            SubscriptionError::Conflict => "CONFLICT",
            SubscriptionError::InsufficientQuota => "INSUFFICIENT_QUOTA",
            SubscriptionError::NotActive => "NOT_ACTIVE",
            SubscriptionError::AlreadyCanceled => "ALREADY_CANCELED",
            SubscriptionError::AlreadyActive => "ALREADY_ACTIVE",
            SubscriptionError::CannotReactivateExpired => "CANNOT_REACTIVATE_EXPIRED",
        }
    }
}

pub type UseCaseResult<T> = std::result::Result<T, SubscriptionError>;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExpirySweepResult {
    pub scanned: usize,
    pub expired: usize,
    pub skipped: usize,
    pub failed: usize,
}

/// The only component allowed to move an account between tiers.
#[derive(Clone)]
pub struct SubscriptionUseCase {
    account_repo: Arc<dyn AccountRepository + Send + Sync>,
    payment_repo: Arc<dyn PaymentLedgerRepository + Send + Sync>,
    billing_gateway: Arc<dyn BillingGateway + Send + Sync>,
    locks: Arc<AccountLocks>,
    plans: Plans,
}

impl SubscriptionUseCase {
    pub fn new(
        account_repo: Arc<dyn AccountRepository + Send + Sync>,
        payment_repo: Arc<dyn PaymentLedgerRepository + Send + Sync>,
        billing_gateway: Arc<dyn BillingGateway + Send + Sync>,
        locks: Arc<AccountLocks>,
        plans: Plans,
    ) -> Self {
        Self {
            account_repo,
            payment_repo,
            billing_gateway,
            locks,
            plans,
        }
    }

    /// Creates a free account if none exists yet and returns its snapshot.
    pub async fn provision(&self, account_id: Uuid) -> UseCaseResult<SubscriptionSnapshot> {
        let created = self
            .account_repo
            .insert_if_absent(InsertAccountEntity::free(account_id, self.plans.free_units))
            .await
            .map_err(|err| {
                error!(
                    %account_id,
                    db_error = ?err,
                    "subscriptions: failed to provision account"
                );
                SubscriptionError::DbError
            })?;

        if created {
            info!(%account_id, "subscriptions: free account provisioned");
        }

        let account = self.load_account(account_id).await?;
        Ok(account.into())
    }

    pub async fn status(&self, account_id: Uuid) -> UseCaseResult<SubscriptionSnapshot> {
        let account = self.load_account(account_id).await?;
        Ok(account.into())
    }

    /// Turns a one-time authorization into a paid subscription, charging at most once per
    /// order id.
    pub async fn confirm(
        &self,
        account_id: Uuid,
        order: ConfirmSubscriptionModel,
    ) -> UseCaseResult<SubscriptionSnapshot> {
        let ConfirmSubscriptionModel {
            order_id,
            customer_key,
            auth_key,
        } = order;

        for (field, value) in [
            ("orderId", &order_id),
            ("customerKey", &customer_key),
            ("authKey", &auth_key),
        ] {
            if value.trim().is_empty() {
                warn!(%account_id, field, "subscriptions: confirm rejected, empty field");
                return Err(SubscriptionError::InvalidRequest(format!(
                    "{field} must not be empty"
                )));
            }
        }

        info!(%account_id, %order_id, "subscriptions: confirm requested");

        // Runs to completion even if the caller is dropped.
        let usecase = self.clone();
        let settlement = tokio::spawn(async move {
            usecase
                .settle_confirmation(account_id, order_id, customer_key, auth_key)
                .await
        });

        match settlement.await {
            Ok(result) => result,
            Err(err) if err.is_panic() => std::panic::resume_unwind(err.into_panic()),
            Err(err) => {
                error!(
                    %account_id,
                    error = ?err,
                    "subscriptions: confirm task cancelled, manual reconciliation required"
                );
                Err(SubscriptionError::DbUpdateFailed)
            }
        }
    }

    async fn settle_confirmation(
        &self,
        account_id: Uuid,
        order_id: String,
        customer_key: String,
        auth_key: String,
    ) -> UseCaseResult<SubscriptionSnapshot> {
        let _guard = self.locks.lock(account_id).await;
        let account = self.load_account(account_id).await?;

        match self.payment_repo.find_by_order_id(&order_id).await {
            Ok(Some(record)) => {
                let done = PaymentStatus::from_str(&record.status) == Some(PaymentStatus::Done);
                if record.account_id != account_id || !done {
                    warn!(
                        %account_id,
                        %order_id,
                        owner = %record.account_id,
                        status = %record.status,
                        "subscriptions: order id already recorded for a different payment"
                    );
                    return Err(SubscriptionError::OrderConflict);
                }

                info!(
                    %account_id,
                    %order_id,
                    "subscriptions: duplicate confirmation, returning current snapshot"
                );
                return Ok(account.into());
            }
            Ok(None) => {}
            Err(err) => {
                error!(
                    %account_id,
                    %order_id,
                    db_error = ?err,
                    "subscriptions: ledger lookup failed, refusing to charge"
                );
                return Err(SubscriptionError::DbError);
            }
        }

        let now = Utc::now();
        let current_tier = account.subscription_tier();
        match current_tier {
            SubscriptionTier::Pro => {
                warn!(%account_id, %order_id, "subscriptions: confirm on active subscription");
                return Err(SubscriptionError::AlreadyActive);
            }
            SubscriptionTier::PendingCancel if account.period_active_at(now) => {
                warn!(
                    %account_id,
                    %order_id,
                    "subscriptions: confirm on unexpired pending cancellation, reactivate instead"
                );
                return Err(SubscriptionError::AlreadyActive);
            }
            _ => {}
        }

        let period_end = self.period_end_from(now)?;

        let billing_key = match self
            .billing_gateway
            .issue_billing_key(&auth_key, &customer_key)
            .await
        {
            Ok(IssuedBillingKey {
                billing_key: Some(key),
            }) if !key.trim().is_empty() => key,
            Ok(_) => {
                error!(
                    %account_id,
                    %order_id,
                    "subscriptions: gateway returned no billing key"
                );
                return Err(SubscriptionError::BillingKeyIssueFailed);
            }
            Err(err) => {
                error!(
                    %account_id,
                    %order_id,
                    error = ?err,
                    "subscriptions: billing key issuance failed"
                );
                return Err(SubscriptionError::BillingKeyIssueFailed);
            }
        };

        info!(%account_id, %order_id, "subscriptions: billing key issued");

        let charge = ChargeRequest {
            billing_key: billing_key.clone(),
            customer_key: customer_key.clone(),
            amount: self.plans.pro_price,
            order_id: order_id.clone(),
            order_name: self.plans.pro_order_name.clone(),
        };

        let receipt = match self.billing_gateway.charge(charge).await {
            Ok(receipt) if receipt.is_done() => receipt,
            Ok(receipt) => {
                warn!(
                    %account_id,
                    %order_id,
                    status = %receipt.status,
                    "subscriptions: first payment not settled"
                );
                self.revoke_quietly(account_id, &billing_key, "first payment failed")
                    .await;
                return Err(SubscriptionError::FirstPaymentFailed);
            }
            Err(err) => {
                error!(
                    %account_id,
                    %order_id,
                    error = ?err,
                    "subscriptions: first payment request failed"
                );
                self.revoke_quietly(account_id, &billing_key, "first payment failed")
                    .await;
                return Err(SubscriptionError::FirstPaymentFailed);
            }
        };

        info!(
            %account_id,
            %order_id,
            charge_key = %receipt.charge_key,
            "subscriptions: first payment settled"
        );

        let upgrade = ProUpgrade {
            expected_tier: current_tier,
            billing_key: billing_key.clone(),
            customer_key,
            remaining_units: self.plans.pro_units,
            billing_period_start: now,
            billing_period_end: period_end,
        };
        let payment = InsertPaymentEntity {
            order_id: order_id.clone(),
            account_id,
            charge_key: receipt.charge_key.clone(),
            order_name: self.plans.pro_order_name.clone(),
            amount: self.plans.pro_price,
            status: PaymentStatus::Done.to_string(),
            method: receipt.method.clone(),
        };

        let committed = match self
            .account_repo
            .commit_confirmation(account_id, upgrade, payment)
            .await
        {
            Ok(CommitOutcome::Committed(account)) => account,
            Ok(outcome) => {
                // Money moved but nothing was granted; reconciliation has to pick this up.
                error!(
                    %account_id,
                    %order_id,
                    charge_key = %receipt.charge_key,
                    outcome = ?outcome,
                    "subscriptions: commit rejected after successful charge"
                );
                self.revoke_quietly(account_id, &billing_key, "commit rejected")
                    .await;
                return Err(SubscriptionError::DbUpdateFailed);
            }
            Err(err) => {
                error!(
                    %account_id,
                    %order_id,
                    charge_key = %receipt.charge_key,
                    db_error = ?err,
                    "subscriptions: commit failed after successful charge"
                );
                self.revoke_quietly(account_id, &billing_key, "commit failed")
                    .await;
                return Err(SubscriptionError::DbUpdateFailed);
            }
        };

        if let Some(previous_key) = account.billing_key.as_deref() {
            if previous_key != billing_key {
                self.revoke_quietly(account_id, previous_key, "billing key replaced")
                    .await;
            }
        }

        info!(
            %account_id,
            %order_id,
            remaining_units = committed.remaining_units,
            "subscriptions: subscription confirmed"
        );

        Ok(committed.into())
    }

    /// Schedules cancellation at period end. The billing key stays valid until then.
    pub async fn cancel(&self, account_id: Uuid) -> UseCaseResult<AckDto> {
        let _guard = self.locks.lock(account_id).await;
        let account = self.load_account(account_id).await?;

        match account.subscription_tier() {
            SubscriptionTier::Pro => {}
            SubscriptionTier::Free => {
                warn!(%account_id, "subscriptions: cancel on free account");
                return Err(SubscriptionError::NotActive);
            }
            SubscriptionTier::PendingCancel => {
                warn!(%account_id, "subscriptions: cancel already scheduled");
                return Err(SubscriptionError::AlreadyCanceled);
            }
        }

        self.transition(account_id, TierTransition::Cancel).await?;
        info!(%account_id, "subscriptions: cancellation scheduled at period end");
        Ok(AckDto::ok())
    }

    pub async fn reactivate(&self, account_id: Uuid) -> UseCaseResult<AckDto> {
        let _guard = self.locks.lock(account_id).await;
        let account = self.load_account(account_id).await?;

        match account.subscription_tier() {
            SubscriptionTier::PendingCancel => {}
            SubscriptionTier::Pro => {
                warn!(%account_id, "subscriptions: reactivate on active subscription");
                return Err(SubscriptionError::AlreadyActive);
            }
            SubscriptionTier::Free => {
                warn!(%account_id, "subscriptions: reactivate on free account");
                return Err(SubscriptionError::NotActive);
            }
        }

        let now = Utc::now();
        if !account.period_active_at(now) {
            warn!(
                %account_id,
                billing_period_end = ?account.billing_period_end,
                "subscriptions: reactivate after period end"
            );
            return Err(SubscriptionError::CannotReactivateExpired);
        }

        self.transition(account_id, TierTransition::Reactivate { now })
            .await?;
        info!(%account_id, "subscriptions: subscription reactivated");
        Ok(AckDto::ok())
    }

    /// Moves lapsed `pending_cancel` accounts back to `free` and revokes their billing keys.
    pub async fn expire_lapsed(
        &self,
        now: DateTime<Utc>,
        batch_size: i64,
    ) -> UseCaseResult<ExpirySweepResult> {
        let candidates = self
            .account_repo
            .list_lapsed_pending_cancel(now, batch_size.max(1))
            .await
            .map_err(|err| {
                error!(db_error = ?err, "subscriptions: failed to list lapsed accounts");
                SubscriptionError::DbError
            })?;

        let mut result = ExpirySweepResult {
            scanned: candidates.len(),
            ..Default::default()
        };

        for account in candidates {
            let account_id = account.id;
            let _guard = self.locks.lock(account_id).await;

            let transition = TierTransition::Expire {
                now,
                free_units: self.plans.free_units,
            };
            match self
                .account_repo
                .apply_transition(account_id, transition)
                .await
            {
                Ok(Some(_)) => {
                    result.expired += 1;
                    info!(%account_id, "subscriptions: lapsed subscription expired to free");
                    if let Some(billing_key) = account.billing_key.as_deref() {
                        self.revoke_quietly(account_id, billing_key, "period expired")
                            .await;
                    }
                }
                Ok(None) => {
                    // Reactivated or re-confirmed since the listing.
                    result.skipped += 1;
                }
                Err(err) => {
                    result.failed += 1;
                    error!(
                        %account_id,
                        db_error = ?err,
                        "subscriptions: failed to expire lapsed subscription"
                    );
                }
            }
        }

        Ok(result)
    }

    async fn load_account(&self, account_id: Uuid) -> UseCaseResult<AccountEntity> {
        self.account_repo
            .find_active_by_id(account_id)
            .await
            .map_err(|err| {
                error!(
                    %account_id,
                    db_error = ?err,
                    "subscriptions: failed to load account"
                );
                SubscriptionError::DbError
            })?
            .ok_or_else(|| {
                warn!(%account_id, "subscriptions: account not found");
                SubscriptionError::NotFound
            })
    }

    async fn transition(
        &self,
        account_id: Uuid,
        transition: TierTransition,
    ) -> UseCaseResult<AccountEntity> {
        self.account_repo
            .apply_transition(account_id, transition)
            .await
            .map_err(|err| {
                error!(
                    %account_id,
                    transition = ?transition,
                    db_error = ?err,
                    "subscriptions: tier transition failed"
                );
                SubscriptionError::DbError
            })?
            .ok_or_else(|| {
                warn!(
                    %account_id,
                    transition = ?transition,
                    "subscriptions: account changed before transition applied"
                );
                SubscriptionError::Conflict
            })
    }

    fn period_end_from(&self, start: DateTime<Utc>) -> UseCaseResult<DateTime<Utc>> {
        start
            .checked_add_months(Months::new(self.plans.billing_period_months))
            .ok_or_else(|| {
                error!(%start, "subscriptions: billing period end out of range");
                SubscriptionError::InvalidRequest("billing period out of range".to_string())
            })
    }

    /// Compensation only: a failed revoke is logged and never replaces the caller's error.
    async fn revoke_quietly(&self, account_id: Uuid, billing_key: &str, reason: &'static str) {
        match self.billing_gateway.revoke_billing_key(billing_key).await {
            Ok(()) => info!(%account_id, reason, "subscriptions: billing key revoked"),
            Err(err) => error!(
                %account_id,
                reason,
                error = ?err,
                "subscriptions: billing key revocation failed, manual reconciliation required"
            ),
        }
    }
}
