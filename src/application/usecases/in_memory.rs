//! Process-local fakes for the store and gateway seams, with the same conditional-write
//! semantics as the postgres repositories.

use std::{
    collections::HashMap,
    sync::{
        Mutex, MutexGuard,
        atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering},
    },
    time::Duration,
};

use anyhow::{Result, anyhow};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::domain::{
    entities::{
        accounts::{AccountEntity, InsertAccountEntity},
        payments::{InsertPaymentEntity, PaymentEntity},
    },
    repositories::{
        accounts::AccountRepository, billing_gateway::BillingGateway,
        payments::PaymentLedgerRepository,
    },
    value_objects::{
        accounts::{CommitOutcome, ProUpgrade, TierTransition},
        billing_gateway::{ChargeReceipt, ChargeRequest, IssuedBillingKey},
        enums::subscription_tiers::SubscriptionTier,
        quota::ConsumedUnit,
    },
};

#[derive(Default)]
struct StoreState {
    accounts: HashMap<Uuid, AccountEntity>,
    payments: Vec<PaymentEntity>,
}

#[derive(Default)]
pub struct InMemoryStore {
    state: Mutex<StoreState>,
    commit_delay_ms: AtomicU64,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> MutexGuard<'_, StoreState> {
        self.state.lock().unwrap()
    }

    pub fn account(&self, account_id: Uuid) -> Option<AccountEntity> {
        self.state().accounts.get(&account_id).cloned()
    }

    pub fn payments(&self) -> Vec<PaymentEntity> {
        self.state().payments.clone()
    }

    pub fn set_remaining_units(&self, account_id: Uuid, units: i32) {
        if let Some(account) = self.state().accounts.get_mut(&account_id) {
            account.remaining_units = units;
        }
    }

    /// Stalls every `commit_confirmation` for `delay` before it touches the state.
    pub fn delay_commits(&self, delay: Duration) {
        self.commit_delay_ms
            .store(delay.as_millis() as u64, Ordering::SeqCst);
    }

    /// Moves the period end into the past, standing in for the passage of time.
    pub fn lapse_period(&self, account_id: Uuid) {
        if let Some(account) = self.state().accounts.get_mut(&account_id) {
            if account.billing_period_end.is_some() {
                account.billing_period_end = Some(Utc::now() - chrono::Duration::seconds(1));
            }
        }
    }
}

#[async_trait]
impl AccountRepository for InMemoryStore {
    async fn find_active_by_id(&self, account_id: Uuid) -> Result<Option<AccountEntity>> {
        Ok(self
            .state()
            .accounts
            .get(&account_id)
            .filter(|account| account.deleted_at.is_none())
            .cloned())
    }

    async fn insert_if_absent(&self, account: InsertAccountEntity) -> Result<bool> {
        let mut state = self.state();
        if state.accounts.contains_key(&account.id) {
            return Ok(false);
        }
        let now = Utc::now();
        state.accounts.insert(
            account.id,
            AccountEntity {
                id: account.id,
                tier: account.tier,
                remaining_units: account.remaining_units,
                billing_key: None,
                customer_key: None,
                billing_period_start: None,
                billing_period_end: None,
                cancel_at_period_end: account.cancel_at_period_end,
                created_at: now,
                updated_at: now,
                deleted_at: None,
            },
        );
        Ok(true)
    }

    async fn apply_transition(
        &self,
        account_id: Uuid,
        transition: TierTransition,
    ) -> Result<Option<AccountEntity>> {
        let mut state = self.state();
        let Some(account) = state
            .accounts
            .get_mut(&account_id)
            .filter(|account| account.deleted_at.is_none())
        else {
            return Ok(None);
        };
        if account.subscription_tier() != transition.from_tier() {
            return Ok(None);
        }

        match transition {
            TierTransition::Cancel => {
                account.cancel_at_period_end = true;
            }
            TierTransition::Reactivate { now } => {
                if !account.period_active_at(now) {
                    return Ok(None);
                }
                account.cancel_at_period_end = false;
            }
            TierTransition::Expire { now, free_units } => {
                if account.period_active_at(now) {
                    return Ok(None);
                }
                account.billing_key = None;
                account.customer_key = None;
                account.billing_period_start = None;
                account.billing_period_end = None;
                account.cancel_at_period_end = false;
                account.remaining_units = account.remaining_units.min(free_units);
            }
        }
        account.tier = transition.to_tier().to_string();
        account.updated_at = Utc::now();
        Ok(Some(account.clone()))
    }

    async fn commit_confirmation(
        &self,
        account_id: Uuid,
        upgrade: ProUpgrade,
        payment: InsertPaymentEntity,
    ) -> Result<CommitOutcome> {
        let delay_ms = self.commit_delay_ms.load(Ordering::SeqCst);
        if delay_ms > 0 {
            tokio::time::sleep(Duration::from_millis(delay_ms)).await;
        }

        let mut state = self.state();
        if state
            .payments
            .iter()
            .any(|existing| existing.order_id == payment.order_id)
        {
            return Ok(CommitOutcome::DuplicateOrder);
        }
        let Some(account) = state
            .accounts
            .get_mut(&account_id)
            .filter(|account| account.deleted_at.is_none())
        else {
            return Ok(CommitOutcome::AccountChanged);
        };
        if account.subscription_tier() != upgrade.expected_tier {
            return Ok(CommitOutcome::AccountChanged);
        }

        let now = Utc::now();
        account.tier = SubscriptionTier::Pro.to_string();
        account.billing_key = Some(upgrade.billing_key);
        account.customer_key = Some(upgrade.customer_key);
        account.remaining_units = upgrade.remaining_units;
        account.billing_period_start = Some(upgrade.billing_period_start);
        account.billing_period_end = Some(upgrade.billing_period_end);
        account.cancel_at_period_end = false;
        account.updated_at = now;
        let committed = account.clone();

        state.payments.push(PaymentEntity {
            id: Uuid::new_v4(),
            order_id: payment.order_id,
            account_id: payment.account_id,
            charge_key: payment.charge_key,
            order_name: payment.order_name,
            amount: payment.amount,
            status: payment.status,
            method: payment.method,
            created_at: now,
            updated_at: now,
        });

        Ok(CommitOutcome::Committed(committed))
    }

    async fn consume_unit(&self, account_id: Uuid) -> Result<Option<ConsumedUnit>> {
        let mut state = self.state();
        let Some(account) = state
            .accounts
            .get_mut(&account_id)
            .filter(|account| account.deleted_at.is_none() && account.remaining_units > 0)
        else {
            return Ok(None);
        };
        account.remaining_units -= 1;
        Ok(Some(ConsumedUnit {
            remaining_units: account.remaining_units,
            tier: account.subscription_tier(),
        }))
    }

    async fn list_lapsed_pending_cancel(
        &self,
        now: DateTime<Utc>,
        limit: i64,
    ) -> Result<Vec<AccountEntity>> {
        Ok(self
            .state()
            .accounts
            .values()
            .filter(|account| {
                account.deleted_at.is_none()
                    && account.subscription_tier() == SubscriptionTier::PendingCancel
                    && !account.period_active_at(now)
            })
            .take(usize::try_from(limit).unwrap_or(0))
            .cloned()
            .collect())
    }
}

#[async_trait]
impl PaymentLedgerRepository for InMemoryStore {
    async fn find_by_order_id(&self, order_id: &str) -> Result<Option<PaymentEntity>> {
        Ok(self
            .state()
            .payments
            .iter()
            .find(|payment| payment.order_id == order_id)
            .cloned())
    }

    async fn list_since(
        &self,
        account_id: Uuid,
        since: DateTime<Utc>,
    ) -> Result<Vec<PaymentEntity>> {
        let mut payments: Vec<PaymentEntity> = self
            .state()
            .payments
            .iter()
            .filter(|payment| payment.account_id == account_id && payment.created_at >= since)
            .cloned()
            .collect();
        payments.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(payments)
    }
}

/// Gateway stub issuing `bk1`, `bk2`, ... and counting every call.
#[derive(Default)]
pub struct StubGateway {
    issued: AtomicUsize,
    charges: AtomicUsize,
    decline_charges: AtomicBool,
    revoked: Mutex<Vec<String>>,
}

impl StubGateway {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn decline_charges(&self, decline: bool) {
        self.decline_charges.store(decline, Ordering::SeqCst);
    }

    pub fn issued(&self) -> usize {
        self.issued.load(Ordering::SeqCst)
    }

    pub fn charges(&self) -> usize {
        self.charges.load(Ordering::SeqCst)
    }

    pub fn revoked(&self) -> Vec<String> {
        self.revoked.lock().unwrap().clone()
    }
}

#[async_trait]
impl BillingGateway for StubGateway {
    async fn issue_billing_key(
        &self,
        auth_key: &str,
        _customer_key: &str,
    ) -> Result<IssuedBillingKey> {
        if auth_key.is_empty() {
            return Err(anyhow!("missing auth key"));
        }
        let n = self.issued.fetch_add(1, Ordering::SeqCst) + 1;
        Ok(IssuedBillingKey {
            billing_key: Some(format!("bk{n}")),
        })
    }

    async fn charge(&self, request: ChargeRequest) -> Result<ChargeReceipt> {
        let n = self.charges.fetch_add(1, Ordering::SeqCst) + 1;
        // Let concurrent confirmations overlap inside the gateway call.
        tokio::task::yield_now().await;
        let status = if self.decline_charges.load(Ordering::SeqCst) {
            "ABORTED"
        } else {
            "DONE"
        };
        Ok(ChargeReceipt {
            charge_key: format!("ck{n}-{}", request.order_id),
            status: status.to_string(),
            method: Some("card".to_string()),
        })
    }

    async fn revoke_billing_key(&self, billing_key: &str) -> Result<()> {
        self.revoked.lock().unwrap().push(billing_key.to_string());
        Ok(())
    }
}
