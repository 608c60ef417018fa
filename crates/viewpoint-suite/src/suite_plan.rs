use std::collections::HashSet;
use std::path::Path;

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};

use crate::suite_catalog::ConfigTag;
use crate::suite_metadata::{test_body, TestCase};
use crate::suite_registrar::{resolve_strategy, StrategyKind};
use crate::suite_scanner::display_name;

pub const SUITE_PLAN_SCHEMA_VERSION: u32 = 1;

fn suite_plan_schema_version() -> u32 {
    SUITE_PLAN_SCHEMA_VERSION
}

/// One declarative registration entry: an identifier plus the tags to apply
/// and the expected outcome of resolving them.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SuitePlanEntry {
    #[serde(default = "suite_plan_schema_version")]
    pub schema_version: u32,
    pub entry_id: String,
    pub ident: String,
    #[serde(default)]
    pub tags: Vec<String>,
    pub expected_strategy: StrategyKind,
    #[serde(default)]
    pub expected_display_name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SuitePlanFixture {
    pub schema_version: u32,
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub entries: Vec<SuitePlanEntry>,
}

/// Resolved outcome for one plan entry.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct PlanEntryOutcome {
    pub entry_id: String,
    pub ident: String,
    pub display_name: String,
    pub strategy: StrategyKind,
}

#[derive(Debug, Clone, Default, Serialize, PartialEq, Eq)]
pub struct SuitePlanSummary {
    pub discovered_entries: usize,
    pub skip_entries: usize,
    pub device_context_entries: usize,
    pub location_context_entries: usize,
    pub default_entries: usize,
    pub timeline: Vec<PlanEntryOutcome>,
}

pub fn parse_suite_plan_fixture(raw: &str) -> Result<SuitePlanFixture> {
    let fixture = serde_json::from_str::<SuitePlanFixture>(raw)
        .context("failed to parse suite plan fixture")?;
    validate_suite_plan_fixture(&fixture)?;
    Ok(fixture)
}

pub fn load_suite_plan_fixture(path: &Path) -> Result<SuitePlanFixture> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read fixture {}", path.display()))?;
    parse_suite_plan_fixture(&raw).with_context(|| format!("invalid fixture {}", path.display()))
}

pub fn validate_suite_plan_fixture(fixture: &SuitePlanFixture) -> Result<()> {
    if fixture.schema_version != SUITE_PLAN_SCHEMA_VERSION {
        bail!(
            "unsupported suite plan schema version {} (expected {})",
            fixture.schema_version,
            SUITE_PLAN_SCHEMA_VERSION
        );
    }
    if fixture.name.trim().is_empty() {
        bail!("fixture name cannot be empty");
    }
    if fixture.entries.is_empty() {
        bail!("fixture must include at least one entry");
    }

    let mut entry_ids = HashSet::new();
    for (index, entry) in fixture.entries.iter().enumerate() {
        validate_suite_plan_entry(entry, index)?;
        let entry_id = entry.entry_id.trim().to_string();
        if !entry_ids.insert(entry_id.clone()) {
            bail!("fixture contains duplicate entry_id '{}'", entry_id);
        }
    }
    Ok(())
}

fn validate_suite_plan_entry(entry: &SuitePlanEntry, index: usize) -> Result<()> {
    if entry.schema_version != SUITE_PLAN_SCHEMA_VERSION {
        bail!(
            "fixture entry index {} has unsupported schema_version {} (expected {})",
            index,
            entry.schema_version,
            SUITE_PLAN_SCHEMA_VERSION
        );
    }
    if entry.entry_id.trim().is_empty() {
        bail!("fixture entry index {} has empty entry_id", index);
    }
    if entry.ident.trim().is_empty() {
        bail!("fixture entry '{}' has empty ident", entry.entry_id);
    }
    for raw in &entry.tags {
        if ConfigTag::from_keyword(raw).is_none() {
            bail!(
                "fixture entry '{}' uses unknown tag '{}'",
                entry.entry_id,
                raw
            );
        }
    }
    Ok(())
}

/// Applies the entry's tags to a fresh case and resolves its strategy and
/// display name, without touching any framework.
pub fn evaluate_suite_plan_entry(entry: &SuitePlanEntry) -> Result<PlanEntryOutcome> {
    let mut case = TestCase::new(
        entry.ident.trim(),
        test_body(|_fixtures| async { Ok(()) }),
    )
    .with_context(|| format!("plan entry '{}' has an invalid ident", entry.entry_id))?;
    for raw in &entry.tags {
        let tag = ConfigTag::from_keyword(raw).with_context(|| {
            format!("plan entry '{}' uses unknown tag '{}'", entry.entry_id, raw)
        })?;
        case.apply_tag(tag);
    }
    Ok(PlanEntryOutcome {
        entry_id: entry.entry_id.trim().to_string(),
        ident: case.ident().to_string(),
        display_name: display_name(case.ident()),
        strategy: resolve_strategy(case.metadata()).kind(),
    })
}

/// Evaluates every entry and checks it against the fixture's expectations,
/// accumulating a per-strategy summary. The first mismatch fails the run.
pub fn run_suite_plan(fixture: &SuitePlanFixture) -> Result<SuitePlanSummary> {
    validate_suite_plan_fixture(fixture)?;
    let mut summary = SuitePlanSummary {
        discovered_entries: fixture.entries.len(),
        ..SuitePlanSummary::default()
    };

    for entry in &fixture.entries {
        let outcome = evaluate_suite_plan_entry(entry)?;
        if outcome.strategy != entry.expected_strategy {
            bail!(
                "entry '{}' expected strategy {} but resolved {}",
                entry.entry_id,
                entry.expected_strategy,
                outcome.strategy
            );
        }
        let expected_name = entry.expected_display_name.trim();
        if !expected_name.is_empty() && outcome.display_name != expected_name {
            bail!(
                "entry '{}' expected display name '{}' but derived '{}'",
                entry.entry_id,
                expected_name,
                outcome.display_name
            );
        }
        match outcome.strategy {
            StrategyKind::Skip => summary.skip_entries = summary.skip_entries.saturating_add(1),
            StrategyKind::DeviceContext => {
                summary.device_context_entries = summary.device_context_entries.saturating_add(1)
            }
            StrategyKind::LocationContext => {
                summary.location_context_entries =
                    summary.location_context_entries.saturating_add(1)
            }
            StrategyKind::Default => {
                summary.default_entries = summary.default_entries.saturating_add(1)
            }
        }
        summary.timeline.push(outcome);
    }

    Ok(summary)
}
