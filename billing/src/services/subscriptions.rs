//! Subscription lifecycle operations backed by an in-memory store.
//!
//! One current subscription per user. The store is concurrency-safe so the
//! service can sit behind any number of mediated tasks at once.

use chrono::{Duration, Utc};
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use rust_decimal::Decimal;
use tracing::info;
use uuid::Uuid;
use validator::Validate;

use subgate_models::billing::{
    CreateSubscriptionRequest, PlanTier, Subscription, SubscriptionPlan, SubscriptionStatus,
};
use subgate_observability::log_subscription_event;

use crate::errors::ServiceError;

const SERVICE: &str = "billing-service";

const TRIAL_DAYS: i64 = 14;
const BILLING_PERIOD_DAYS: i64 = 30;

pub struct SubscriptionService {
    plans: Vec<SubscriptionPlan>,
    subscriptions: DashMap<Uuid, Subscription>,
}

impl SubscriptionService {
    pub fn new() -> Self {
        Self {
            plans: seed_plan_catalog(),
            subscriptions: DashMap::new(),
        }
    }

    pub async fn list_plans(&self) -> Result<Vec<SubscriptionPlan>, ServiceError> {
        Ok(self
            .plans
            .iter()
            .filter(|plan| plan.is_active)
            .cloned()
            .collect())
    }

    pub async fn create_subscription(
        &self,
        user_id: Uuid,
        request: CreateSubscriptionRequest,
    ) -> Result<Subscription, ServiceError> {
        request.validate()?;

        let plan = self
            .plans
            .iter()
            .find(|plan| plan.id == request.plan_id && plan.is_active)
            .ok_or_else(|| ServiceError::NotFound(format!("Plan {} not found", request.plan_id)))?;

        let now = Utc::now();
        let (status, period_end, trial_window) = if request.trial {
            let end = now + Duration::days(TRIAL_DAYS);
            (SubscriptionStatus::Trialing, end, Some((now, end)))
        } else {
            (
                SubscriptionStatus::Active,
                now + Duration::days(BILLING_PERIOD_DAYS),
                None,
            )
        };

        let subscription = Subscription {
            id: Uuid::new_v4(),
            user_id,
            plan_id: plan.id,
            status,
            current_period_start: now,
            current_period_end: period_end,
            trial_start: trial_window.map(|(start, _)| start),
            trial_end: trial_window.map(|(_, end)| end),
            cancel_at_period_end: false,
            cancelled_at: None,
            metadata: serde_json::json!({
                "plan_tier": plan.tier,
                "coupon_code": request.coupon_code,
            }),
            created_at: now,
            updated_at: now,
        };

        // The entry guard holds the shard lock across the currency check and
        // the insert, so parallel creates for one user cannot both land.
        match self.subscriptions.entry(user_id) {
            Entry::Occupied(existing) if existing.get().is_current() => {
                return Err(ServiceError::Conflict(format!(
                    "User {} already has a current subscription",
                    user_id
                )));
            }
            Entry::Occupied(mut existing) => {
                existing.insert(subscription.clone());
            }
            Entry::Vacant(slot) => {
                slot.insert(subscription.clone());
            }
        }

        info!(
            "✓ Subscription {} created for user {} on plan {}",
            subscription.id, user_id, plan.name
        );
        log_subscription_event(
            SERVICE,
            "subscription_created",
            user_id,
            subscription.id,
            Some(serde_json::json!({ "plan": plan.name, "trial": request.trial })),
        );

        Ok(subscription)
    }

    pub async fn get_subscription(
        &self,
        user_id: Uuid,
    ) -> Result<Option<Subscription>, ServiceError> {
        Ok(self
            .subscriptions
            .get(&user_id)
            .map(|entry| entry.value().clone()))
    }

    pub async fn cancel_subscription(&self, user_id: Uuid) -> Result<Subscription, ServiceError> {
        let mut entry = self.subscriptions.get_mut(&user_id).ok_or_else(|| {
            ServiceError::NotFound(format!("No subscription for user {}", user_id))
        })?;

        let subscription = entry.value_mut();
        if !subscription.is_current() {
            return Err(ServiceError::Conflict(format!(
                "Subscription {} is not active",
                subscription.id
            )));
        }

        let now = Utc::now();
        subscription.status = SubscriptionStatus::Cancelled;
        subscription.cancel_at_period_end = true;
        subscription.cancelled_at = Some(now);
        subscription.updated_at = now;
        let cancelled = subscription.clone();
        drop(entry);

        info!(
            "✓ Subscription {} cancelled for user {}",
            cancelled.id, user_id
        );
        log_subscription_event(SERVICE, "subscription_cancelled", user_id, cancelled.id, None);

        Ok(cancelled)
    }
}

impl Default for SubscriptionService {
    fn default() -> Self {
        Self::new()
    }
}

fn seed_plan_catalog() -> Vec<SubscriptionPlan> {
    let now = Utc::now();
    vec![
        SubscriptionPlan {
            id: Uuid::new_v4(),
            name: "Basic".to_string(),
            description: Some("Basic plan with essential features".to_string()),
            tier: PlanTier::Basic,
            price_monthly: Decimal::new(999, 2),
            price_yearly: Some(Decimal::new(9999, 2)),
            features: serde_json::json!({"support": "basic", "projects": 5}),
            limits: serde_json::json!({"max_projects": 5}),
            is_active: true,
            created_at: now,
            updated_at: now,
        },
        SubscriptionPlan {
            id: Uuid::new_v4(),
            name: "Pro".to_string(),
            description: Some("Professional plan with advanced features".to_string()),
            tier: PlanTier::Pro,
            price_monthly: Decimal::new(1999, 2),
            price_yearly: Some(Decimal::new(19999, 2)),
            features: serde_json::json!({"support": "priority", "projects": "unlimited", "analytics": true}),
            limits: serde_json::json!({"max_projects": null}),
            is_active: true,
            created_at: now,
            updated_at: now,
        },
        SubscriptionPlan {
            id: Uuid::new_v4(),
            name: "Enterprise".to_string(),
            description: Some("Enterprise plan with dedicated support".to_string()),
            tier: PlanTier::Enterprise,
            price_monthly: Decimal::new(4999, 2),
            price_yearly: Some(Decimal::new(49999, 2)),
            features: serde_json::json!({"support": "dedicated", "projects": "unlimited", "sso": true}),
            limits: serde_json::json!({"max_projects": null}),
            is_active: true,
            created_at: now,
            updated_at: now,
        },
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    fn create_request(plan_id: Uuid, trial: bool) -> CreateSubscriptionRequest {
        CreateSubscriptionRequest {
            plan_id,
            trial,
            coupon_code: None,
        }
    }

    async fn first_plan(service: &SubscriptionService) -> SubscriptionPlan {
        service.list_plans().await.unwrap().remove(0)
    }

    #[tokio::test]
    async fn test_create_then_get_then_cancel() {
        let service = SubscriptionService::new();
        let user_id = Uuid::new_v4();
        let plan = first_plan(&service).await;

        let created = service
            .create_subscription(user_id, create_request(plan.id, false))
            .await
            .unwrap();
        assert_eq!(created.status, SubscriptionStatus::Active);
        assert_eq!(created.plan_id, plan.id);
        assert!(created.trial_start.is_none());

        let fetched = service.get_subscription(user_id).await.unwrap().unwrap();
        assert_eq!(fetched.id, created.id);

        let cancelled = service.cancel_subscription(user_id).await.unwrap();
        assert_eq!(cancelled.status, SubscriptionStatus::Cancelled);
        assert!(cancelled.cancel_at_period_end);
        assert!(cancelled.cancelled_at.is_some());
    }

    #[tokio::test]
    async fn test_trial_subscription_gets_trial_window() {
        let service = SubscriptionService::new();
        let plan = first_plan(&service).await;

        let created = service
            .create_subscription(Uuid::new_v4(), create_request(plan.id, true))
            .await
            .unwrap();

        assert_eq!(created.status, SubscriptionStatus::Trialing);
        assert!(created.trial_start.is_some());
        assert_eq!(created.trial_end, Some(created.current_period_end));
    }

    #[tokio::test]
    async fn test_duplicate_subscription_conflicts() {
        let service = SubscriptionService::new();
        let user_id = Uuid::new_v4();
        let plan = first_plan(&service).await;

        service
            .create_subscription(user_id, create_request(plan.id, false))
            .await
            .unwrap();

        let err = service
            .create_subscription(user_id, create_request(plan.id, false))
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::Conflict(_)));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_parallel_creates_for_one_user_keep_one_subscription() {
        let service = Arc::new(SubscriptionService::new());
        let plan = first_plan(&service).await;

        for _ in 0..100 {
            let user_id = Uuid::new_v4();
            let first = tokio::spawn({
                let service = service.clone();
                let request = create_request(plan.id, false);
                async move { service.create_subscription(user_id, request).await }
            });
            let second = tokio::spawn({
                let service = service.clone();
                let request = create_request(plan.id, false);
                async move { service.create_subscription(user_id, request).await }
            });

            let outcomes = [first.await.unwrap(), second.await.unwrap()];
            assert_eq!(outcomes.iter().filter(|result| result.is_ok()).count(), 1);
            assert!(outcomes
                .iter()
                .any(|result| matches!(result, Err(ServiceError::Conflict(_)))));

            let winner = outcomes.into_iter().find_map(|result| result.ok()).unwrap();
            let stored = service.get_subscription(user_id).await.unwrap().unwrap();
            assert_eq!(stored.id, winner.id);
        }
    }

    #[tokio::test]
    async fn test_cancelled_user_can_resubscribe() {
        let service = SubscriptionService::new();
        let user_id = Uuid::new_v4();
        let plan = first_plan(&service).await;

        service
            .create_subscription(user_id, create_request(plan.id, false))
            .await
            .unwrap();
        service.cancel_subscription(user_id).await.unwrap();

        let renewed = service
            .create_subscription(user_id, create_request(plan.id, false))
            .await
            .unwrap();
        assert_eq!(renewed.status, SubscriptionStatus::Active);
    }

    #[tokio::test]
    async fn test_unknown_plan_is_not_found() {
        let service = SubscriptionService::new();

        let err = service
            .create_subscription(Uuid::new_v4(), create_request(Uuid::new_v4(), false))
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_invalid_coupon_is_rejected() {
        let service = SubscriptionService::new();
        let plan = first_plan(&service).await;

        let err = service
            .create_subscription(
                Uuid::new_v4(),
                CreateSubscriptionRequest {
                    plan_id: plan.id,
                    trial: false,
                    coupon_code: Some("ab".to_string()),
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::Validation(_)));
    }

    #[tokio::test]
    async fn test_cancel_without_subscription_is_not_found() {
        let service = SubscriptionService::new();

        let err = service
            .cancel_subscription(Uuid::new_v4())
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_double_cancel_conflicts() {
        let service = SubscriptionService::new();
        let user_id = Uuid::new_v4();
        let plan = first_plan(&service).await;

        service
            .create_subscription(user_id, create_request(plan.id, false))
            .await
            .unwrap();
        service.cancel_subscription(user_id).await.unwrap();

        let err = service.cancel_subscription(user_id).await.unwrap_err();
        assert!(matches!(err, ServiceError::Conflict(_)));
    }

    #[tokio::test]
    async fn test_catalog_lists_only_active_plans() {
        let service = SubscriptionService::new();
        let plans = service.list_plans().await.unwrap();

        assert_eq!(plans.len(), 3);
        assert!(plans.iter().all(|plan| plan.is_active));
    }
}
