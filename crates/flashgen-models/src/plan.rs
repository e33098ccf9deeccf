//! Subscription plans and flashcard limits.

use std::borrow::Cow;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Flashcards allowed without an active subscription.
pub const FREE_TIER_MAX_FLASHCARDS: i64 = 3;

/// Sentinel for "no limit" in [`FlashcardLimits::max_flashcards`].
pub const UNLIMITED: i64 = -1;

/// Plan tier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum PlanTier {
    Free,
    Small,
    Mid,
    Big,
}

impl PlanTier {
    /// Display name, as stored in `user_subscriptions.plan_name`.
    pub fn name(&self) -> &'static str {
        match self {
            PlanTier::Free => "Free",
            PlanTier::Small => "Small",
            PlanTier::Mid => "Mid",
            PlanTier::Big => "Big",
        }
    }

    /// Resolve a stored plan name. Unknown names fall back to the free tier.
    pub fn from_plan_name(name: Option<&str>) -> Self {
        match name {
            Some("Small") => PlanTier::Small,
            Some("Mid") => PlanTier::Mid,
            Some("Big") => PlanTier::Big,
            _ => PlanTier::Free,
        }
    }

    pub fn limits(&self) -> FlashcardLimits {
        match self {
            PlanTier::Free => FlashcardLimits::capped(FREE_TIER_MAX_FLASHCARDS),
            PlanTier::Small => FlashcardLimits::capped(100),
            PlanTier::Mid => FlashcardLimits::capped(500),
            PlanTier::Big => FlashcardLimits::unlimited(),
        }
    }
}

/// Flashcard quota for a user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct FlashcardLimits {
    /// Maximum stored flashcards, or `-1` when unlimited.
    pub max_flashcards: i64,
    pub has_unlimited_flashcards: bool,
}

impl FlashcardLimits {
    pub fn capped(max: i64) -> Self {
        Self {
            max_flashcards: max,
            has_unlimited_flashcards: false,
        }
    }

    pub fn unlimited() -> Self {
        Self {
            max_flashcards: UNLIMITED,
            has_unlimited_flashcards: true,
        }
    }

    /// Whether `additional` more cards fit on top of `used`.
    pub fn allows(&self, used: u64, additional: u64) -> bool {
        if self.has_unlimited_flashcards {
            return true;
        }
        if self.max_flashcards < 0 {
            return false;
        }
        used.saturating_add(additional) <= self.max_flashcards as u64
    }

    /// Remaining cards, `None` when unlimited.
    pub fn remaining(&self, used: u64) -> Option<u64> {
        if self.has_unlimited_flashcards {
            return None;
        }
        Some((self.max_flashcards.max(0) as u64).saturating_sub(used))
    }
}

/// A purchasable plan.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct Plan {
    pub id: &'static str,
    pub name: &'static str,
    pub description: &'static str,
    pub price: &'static str,
    /// LemonSqueezy variant id.
    pub variant_id: Cow<'static, str>,
    pub features: &'static [&'static str],
    pub tier: PlanTier,
}

/// Built-in plan catalog.
pub const PLANS: [Plan; 3] = [
    Plan {
        id: "small",
        name: "Small",
        description: "Basic access for light users",
        price: "$5/mo",
        variant_id: Cow::Borrowed("568246"),
        features: &["Up to 100 flashcards/month", "Basic support"],
        tier: PlanTier::Small,
    },
    Plan {
        id: "mid",
        name: "Mid",
        description: "For regular learners",
        price: "$10/mo",
        variant_id: Cow::Borrowed("568257"),
        features: &["Up to 500 flashcards/month", "Priority support"],
        tier: PlanTier::Mid,
    },
    Plan {
        id: "big",
        name: "Big",
        description: "Unlimited for power users",
        price: "$20/mo",
        variant_id: Cow::Borrowed("568260"),
        features: &["Unlimited flashcards", "Premium support"],
        tier: PlanTier::Big,
    },
];

/// Plan name for a LemonSqueezy variant id in the built-in catalog.
pub fn plan_name_for_variant(variant_id: &str) -> &'static str {
    PlanCatalog::default().plan_name_for_variant(variant_id)
}

/// Plan catalog with optionally overridden variant ids.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, JsonSchema)]
pub struct PlanCatalog {
    plans: Vec<Plan>,
}

impl Default for PlanCatalog {
    fn default() -> Self {
        Self {
            plans: PLANS.to_vec(),
        }
    }
}

impl PlanCatalog {
    /// Replace the variant id of one tier.
    pub fn with_variant(mut self, tier: PlanTier, variant_id: impl Into<String>) -> Self {
        let variant_id = variant_id.into();
        if let Some(plan) = self.plans.iter_mut().find(|p| p.tier == tier) {
            plan.variant_id = Cow::Owned(variant_id);
        }
        self
    }

    pub fn plans(&self) -> &[Plan] {
        &self.plans
    }

    pub fn by_variant(&self, variant_id: &str) -> Option<&Plan> {
        let variant_id = variant_id.trim();
        self.plans.iter().find(|p| p.variant_id == variant_id)
    }

    pub fn plan_name_for_variant(&self, variant_id: &str) -> &'static str {
        self.by_variant(variant_id).map(|p| p.name).unwrap_or("Unknown")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plan_name_for_variant() {
        assert_eq!(plan_name_for_variant("568246"), "Small");
        assert_eq!(plan_name_for_variant("568257"), "Mid");
        assert_eq!(plan_name_for_variant("568260"), "Big");
        assert_eq!(plan_name_for_variant("1"), "Unknown");
        assert_eq!(plan_name_for_variant(""), "Unknown");
    }

    #[test]
    fn test_catalog_variant_override() {
        let catalog = PlanCatalog::default().with_variant(PlanTier::Mid, "999");
        assert_eq!(catalog.plan_name_for_variant("999"), "Mid");
        assert_eq!(catalog.plan_name_for_variant("568257"), "Unknown");
        assert_eq!(catalog.plan_name_for_variant("568246"), "Small");
    }

    #[test]
    fn test_tier_limits() {
        assert_eq!(PlanTier::Free.limits().max_flashcards, 3);
        assert_eq!(PlanTier::Small.limits().max_flashcards, 100);
        assert_eq!(PlanTier::Mid.limits().max_flashcards, 500);
        let big = PlanTier::Big.limits();
        assert_eq!(big.max_flashcards, -1);
        assert!(big.has_unlimited_flashcards);
    }

    #[test]
    fn test_from_plan_name() {
        assert_eq!(PlanTier::from_plan_name(Some("Mid")), PlanTier::Mid);
        assert_eq!(PlanTier::from_plan_name(Some("Unknown")), PlanTier::Free);
        assert_eq!(PlanTier::from_plan_name(None), PlanTier::Free);
    }

    #[test]
    fn test_limits_allows() {
        let free = PlanTier::Free.limits();
        assert!(free.allows(0, 3));
        assert!(free.allows(2, 1));
        assert!(!free.allows(2, 2));
        assert!(!free.allows(3, 1));
        assert_eq!(free.remaining(1), Some(2));
        assert_eq!(free.remaining(10), Some(0));

        let big = PlanTier::Big.limits();
        assert!(big.allows(1_000_000, 1_000));
        assert_eq!(big.remaining(5), None);
    }

    #[test]
    fn test_plan_serialization() {
        let json = serde_json::to_value(&PLANS[0]).unwrap();
        assert_eq!(json["id"], "small");
        assert_eq!(json["variantId"], "568246");
        assert_eq!(json["features"][0], "Up to 100 flashcards/month");
    }
}
