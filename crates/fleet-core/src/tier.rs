//! Subscription tiers and their resource ceilings

use serde::{Deserialize, Serialize};

use crate::model::ResourceRequirements;

/// Subscription tier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Tier {
    Free,
    Pro,
    Team,
    Enterprise,
}

impl Tier {
    /// Parse a tier name, falling back to [`Tier::Free`] for anything unknown
    pub fn parse(name: &str) -> Self {
        match name.trim().to_lowercase().as_str() {
            "pro" => Tier::Pro,
            "team" => Tier::Team,
            "enterprise" => Tier::Enterprise,
            _ => Tier::Free,
        }
    }
}

impl std::fmt::Display for Tier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Tier::Free => write!(f, "free"),
            Tier::Pro => write!(f, "pro"),
            Tier::Team => write!(f, "team"),
            Tier::Enterprise => write!(f, "enterprise"),
        }
    }
}

/// Hard resource ceilings for a tier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserLimits {
    pub tier: Tier,
    pub max_cores: u32,
    pub max_memory_gb: u64,
    pub has_gpu_access: bool,
}

impl UserLimits {
    /// Memory ceiling in megabytes
    pub fn max_memory_mb(&self) -> u64 {
        self.max_memory_gb * 1024
    }
}

/// Ceilings for a tier name. Unknown tiers get the free limits.
pub fn limits_for(tier: &str) -> UserLimits {
    limits_for_tier(Tier::parse(tier))
}

/// Ceilings for a parsed tier
pub fn limits_for_tier(tier: Tier) -> UserLimits {
    let (max_cores, max_memory_gb, has_gpu_access) = match tier {
        Tier::Free => (4, 4, false),
        Tier::Pro => (8, 16, true),
        Tier::Team => (16, 32, true),
        Tier::Enterprise => (64, 128, true),
    };

    UserLimits {
        tier,
        max_cores,
        max_memory_gb,
        has_gpu_access,
    }
}

/// Result of checking a request against tier ceilings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Validation {
    pub valid: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

impl Validation {
    fn ok() -> Self {
        Self {
            valid: true,
            reason: None,
        }
    }

    fn rejected(reason: String) -> Self {
        Self {
            valid: false,
            reason: Some(reason),
        }
    }
}

/// Check `requested` against `limits`.
///
/// Dimensions are checked cores, then memory, then GPU; the first violation
/// is reported.
pub fn validate_resource_request(
    requested: &ResourceRequirements,
    limits: &UserLimits,
) -> Validation {
    if requested.cores > limits.max_cores {
        return Validation::rejected(format!(
            "Your {} plan allows up to {} CPU cores. Upgrade to get more resources.",
            limits.tier, limits.max_cores
        ));
    }

    if requested.memory_gb() > limits.max_memory_gb as f64 {
        return Validation::rejected(format!(
            "Your {} plan allows up to {}GB of memory. Upgrade to get more resources.",
            limits.tier, limits.max_memory_gb
        ));
    }

    if requested.requires_gpu && !limits.has_gpu_access {
        return Validation::rejected(format!(
            "GPU access is not available on the {} plan. Upgrade to run GPU workloads.",
            limits.tier
        ));
    }

    Validation::ok()
}
