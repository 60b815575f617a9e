use crate::{
    error::{SlaError, SlaResult},
    simulator::Capacity,
    types::{Hours, Money},
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

// ── SLA policy ─────────────────────────────────────────────────────

/// SLA target and breach penalty for one priority label.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriorityTier {
    pub priority: String,
    pub target_hours: Hours,
    pub breach_cost: Money,
}

/// The two priority lookup tables (target hours, breach cost).
/// Passed explicitly into every stage so tests and tenants can vary it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SlaPolicy {
    tiers: BTreeMap<String, PriorityTier>,
}

#[derive(Debug, Clone, Deserialize)]
struct SlaPolicyFile {
    tiers: Vec<PriorityTier>,
}

impl SlaPolicy {
    /// Critical 4h/$50, High 12h/$50, Medium 24h/$10, Low 48h/$10.
    pub fn standard() -> Self {
        let tiers = vec![
            PriorityTier {
                priority: "Critical".into(),
                target_hours: 4.0,
                breach_cost: 50.0,
            },
            PriorityTier {
                priority: "High".into(),
                target_hours: 12.0,
                breach_cost: 50.0,
            },
            PriorityTier {
                priority: "Medium".into(),
                target_hours: 24.0,
                breach_cost: 10.0,
            },
            PriorityTier {
                priority: "Low".into(),
                target_hours: 48.0,
                breach_cost: 10.0,
            },
        ];
        Self {
            tiers: tiers.into_iter().map(|t| (t.priority.clone(), t)).collect(),
        }
    }

    pub fn from_tiers(tiers: Vec<PriorityTier>) -> anyhow::Result<Self> {
        if tiers.is_empty() {
            anyhow::bail!("SLA policy must define at least one priority tier");
        }
        let mut map = BTreeMap::new();
        for tier in tiers {
            if !(tier.target_hours > 0.0) {
                anyhow::bail!(
                    "Priority '{}' has non-positive target_hours {}",
                    tier.priority,
                    tier.target_hours
                );
            }
            if !(tier.breach_cost >= 0.0) {
                anyhow::bail!(
                    "Priority '{}' has negative breach_cost {}",
                    tier.priority,
                    tier.breach_cost
                );
            }
            let label = tier.priority.clone();
            if map.insert(label.clone(), tier).is_some() {
                anyhow::bail!("Priority '{label}' is defined twice");
            }
        }
        Ok(Self { tiers: map })
    }

    /// Look up the tier for `priority`. Unknown labels are a hard error:
    /// a silent default would corrupt every downstream cost total.
    pub fn tier(&self, ticket_id: &str, priority: &str) -> SlaResult<&PriorityTier> {
        self.tiers
            .get(priority)
            .ok_or_else(|| SlaError::Configuration {
                ticket_id: ticket_id.to_string(),
                priority: priority.to_string(),
            })
    }

    pub fn priorities(&self) -> impl Iterator<Item = &str> {
        self.tiers.keys().map(String::as_str)
    }

    pub fn tiers(&self) -> impl Iterator<Item = &PriorityTier> {
        self.tiers.values()
    }
}

// ── Triage (capacity simulation) ───────────────────────────────────

/// Capacity as written in config: a count or the label "All".
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CapacitySetting {
    Count(i64),
    Label(String),
}

impl CapacitySetting {
    pub fn resolve(&self) -> SlaResult<Capacity> {
        match self {
            CapacitySetting::Count(n) => Capacity::per_day(*n),
            CapacitySetting::Label(s) => s.parse(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TriageConfig {
    pub daily_capacity: CapacitySetting,
    pub intervention_cost: Money,
}

// ── Watchdog ───────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WatchdogConfig {
    pub active_statuses: Vec<String>,
    pub escalation_priorities: Vec<String>,
    pub escalation_ticket_types: Vec<String>,
}

// ── Diagnostics ────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BottleneckConfig {
    pub quantile: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonitoringConfig {
    pub rolling_window_days: usize,
    pub anomaly_sigma: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScenarioConfig {
    pub name: String,
    #[serde(default)]
    pub priorities: Vec<String>,
    #[serde(default)]
    pub ticket_types: Vec<String>,
    #[serde(default)]
    pub breached_only: bool,
    pub resolution_factor: f64,
}

#[derive(Debug, Clone, Deserialize)]
struct TriageFile {
    triage: TriageConfig,
    watchdog: WatchdogConfig,
    bottleneck: BottleneckConfig,
    monitoring: MonitoringConfig,
    #[serde(default)]
    scenarios: Vec<ScenarioConfig>,
}

// ── Top level ──────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SlaConfig {
    pub policy: SlaPolicy,
    pub triage: TriageConfig,
    pub watchdog: WatchdogConfig,
    pub bottleneck: BottleneckConfig,
    pub monitoring: MonitoringConfig,
    pub scenarios: Vec<ScenarioConfig>,
}

impl SlaConfig {
    /// Load from the data/ directory.
    /// In tests, use SlaConfig::standard().
    pub fn load(data_dir: &str) -> anyhow::Result<Self> {
        let policy_path = format!("{data_dir}/policy/sla_policy.json");
        let policy_content = std::fs::read_to_string(&policy_path)
            .map_err(|e| anyhow::anyhow!("Cannot read {policy_path}: {e}"))?;
        let policy_file: SlaPolicyFile = serde_json::from_str(&policy_content)
            .map_err(|e| anyhow::anyhow!("Cannot parse {policy_path}: {e}"))?;
        let policy = SlaPolicy::from_tiers(policy_file.tiers)?;

        let triage_path = format!("{data_dir}/triage/triage.json");
        let triage_content = std::fs::read_to_string(&triage_path)
            .map_err(|e| anyhow::anyhow!("Cannot read {triage_path}: {e}"))?;
        let triage_file: TriageFile = serde_json::from_str(&triage_content)
            .map_err(|e| anyhow::anyhow!("Cannot parse {triage_path}: {e}"))?;

        let config = Self {
            policy,
            triage: triage_file.triage,
            watchdog: triage_file.watchdog,
            bottleneck: triage_file.bottleneck,
            monitoring: triage_file.monitoring,
            scenarios: triage_file.scenarios,
        };
        config.validate()?;
        log::debug!(
            "Loaded SLA config from {data_dir}: {} tiers, {} scenarios",
            config.policy.tiers.len(),
            config.scenarios.len()
        );
        Ok(config)
    }

    /// Config with hardcoded defaults, matching the shipped data/ files.
    pub fn standard() -> Self {
        Self {
            policy: SlaPolicy::standard(),
            triage: TriageConfig {
                daily_capacity: CapacitySetting::Count(50),
                intervention_cost: 2.0,
            },
            watchdog: WatchdogConfig {
                active_statuses: vec!["Open".into(), "Pending".into()],
                escalation_priorities: vec!["Critical".into(), "High".into()],
                escalation_ticket_types: vec!["Refund request".into()],
            },
            bottleneck: BottleneckConfig { quantile: 0.9 },
            monitoring: MonitoringConfig {
                rolling_window_days: 7,
                anomaly_sigma: 2.0,
            },
            scenarios: vec![
                ScenarioConfig {
                    name: "Triage Optimization".into(),
                    priorities: vec!["Critical".into(), "High".into()],
                    ticket_types: vec![],
                    breached_only: true,
                    resolution_factor: 0.8,
                },
                ScenarioConfig {
                    name: "Refund Focus".into(),
                    priorities: vec![],
                    ticket_types: vec!["Refund request".into()],
                    breached_only: false,
                    resolution_factor: 0.7,
                },
            ],
        }
    }

    fn validate(&self) -> anyhow::Result<()> {
        self.triage.daily_capacity.resolve()?;
        if !(self.triage.intervention_cost >= 0.0) {
            anyhow::bail!(
                "intervention_cost must be non-negative, got {}",
                self.triage.intervention_cost
            );
        }
        let q = self.bottleneck.quantile;
        if !(q > 0.0 && q <= 1.0) {
            anyhow::bail!("bottleneck quantile must be in (0, 1], got {q}");
        }
        if self.monitoring.rolling_window_days == 0 {
            anyhow::bail!("rolling_window_days must be at least 1");
        }
        for scenario in &self.scenarios {
            if !(scenario.resolution_factor >= 0.0) {
                anyhow::bail!(
                    "scenario '{}' has negative resolution_factor {}",
                    scenario.name,
                    scenario.resolution_factor
                );
            }
        }
        Ok(())
    }
}
