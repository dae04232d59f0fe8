// Per-run candidate pool selection for each generation mode.
//
// A `GenerationStrategy` is resolved once per batch from the request's
// `GenerationMode` and then asked, for every run, which players and which
// roster bounds that run searches.

use tracing::warn;
use xiforge_core::{AttributeRange, GenerationMode, RosterConstraints};

use super::presets::{find_preset, PresetTemplate};
use crate::error::{EngineError, Result};
use crate::fallback::build_fallback;
use crate::lineup::{Lineup, LineupOrigin};
use crate::optimizer::population::admit_forced;
use crate::scoring::ScoredPlayer;

/// Player sets pinned by a core/hedge/differential request, restricted to
/// ids present in the candidate pool.
#[derive(Debug, Clone, PartialEq)]
pub struct ExposurePlan {
    pub core: Vec<String>,
    pub hedge: Vec<String>,
    pub hedge_percentage: f64,
    pub differential: Vec<String>,
    /// Requested ids that are not in the candidate pool.
    pub unknown: Vec<String>,
}

impl ExposurePlan {
    /// Number of runs that carry the hedge set.
    pub fn hedge_runs(&self, total: usize) -> usize {
        ((total as f64) * self.hedge_percentage / 100.0).floor() as usize
    }

    /// Whether run `run` of `total` carries the hedge set. Hedge runs are
    /// spread evenly across the batch.
    pub fn is_hedge_run(&self, run: usize, total: usize) -> bool {
        if total == 0 {
            return false;
        }
        let h = self.hedge_runs(total).min(total);
        (run + 1) * h / total > run * h / total
    }

    /// Differentials go into the first run, or the first two when the batch
    /// has at least four runs.
    pub fn is_differential_run(&self, run: usize, total: usize) -> bool {
        run == 0 || (run == 1 && total >= 4)
    }
}

/// Candidate pool, bounds, and forced players for one run.
#[derive(Debug, Clone)]
pub struct RunPlan {
    pub pool: Vec<ScoredPlayer>,
    pub constraints: RosterConstraints,
    /// Indices into `pool` placed in every individual.
    pub forced: Vec<usize>,
    pub origin: LineupOrigin,
    pub notes: Vec<String>,
    /// Template bias the search applies to predicted points. `pool` keeps
    /// the scoring model's values.
    pub bias: Option<&'static PresetTemplate>,
}

impl RunPlan {
    fn unchanged(scored: &[ScoredPlayer], constraints: &RosterConstraints) -> Self {
        RunPlan {
            pool: scored.to_vec(),
            constraints: constraints.clone(),
            forced: Vec::new(),
            origin: LineupOrigin::Optimized,
            notes: Vec::new(),
            bias: None,
        }
    }

    /// The pool as the search sees it, index-aligned with `pool`.
    pub fn search_pool(&self) -> Vec<ScoredPlayer> {
        match self.bias {
            Some(preset) => preset.apply(&self.pool),
            None => self.pool.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum GenerationStrategy {
    Plain,
    CoreHedge(ExposurePlan),
    StatisticalFilter { ranges: Vec<AttributeRange> },
    PresetTemplate(&'static PresetTemplate),
}

impl GenerationStrategy {
    /// Resolve a request mode against the candidate pool.
    pub fn resolve(mode: &GenerationMode, scored: &[ScoredPlayer]) -> Result<Self> {
        match mode {
            GenerationMode::Plain => Ok(GenerationStrategy::Plain),
            GenerationMode::CoreHedge {
                core,
                hedge,
                hedge_percentage,
                differential,
            } => {
                if !hedge_percentage.is_finite() || !(0.0..=100.0).contains(hedge_percentage) {
                    return Err(EngineError::InvalidRequest(format!(
                        "hedge_percentage must be within 0-100, got {hedge_percentage}"
                    )));
                }
                let mut unknown = Vec::new();
                let mut known = |ids: &[String]| -> Vec<String> {
                    let mut kept: Vec<String> = Vec::new();
                    for id in ids {
                        if kept.contains(id) {
                            continue;
                        }
                        if scored.iter().any(|sp| &sp.player.id == id) {
                            kept.push(id.clone());
                        } else if !unknown.contains(id) {
                            warn!("pinned player '{}' is not in the eligible pool; ignoring", id);
                            unknown.push(id.clone());
                        }
                    }
                    kept
                };
                let core = known(core);
                // Core membership wins over hedge and differential.
                let hedge: Vec<String> = known(hedge).into_iter().filter(|id| !core.contains(id)).collect();
                let differential: Vec<String> = known(differential)
                    .into_iter()
                    .filter(|id| !core.contains(id) && !hedge.contains(id))
                    .collect();
                Ok(GenerationStrategy::CoreHedge(ExposurePlan {
                    core,
                    hedge,
                    hedge_percentage: *hedge_percentage,
                    differential,
                    unknown,
                }))
            }
            GenerationMode::StatisticalFilter { ranges } => {
                if let Some(bad) = ranges
                    .iter()
                    .find(|r| matches!((r.min, r.max), (Some(lo), Some(hi)) if lo > hi))
                {
                    return Err(EngineError::InvalidRequest(format!(
                        "filter on {:?} has min above max",
                        bad.attribute
                    )));
                }
                Ok(GenerationStrategy::StatisticalFilter { ranges: ranges.clone() })
            }
            GenerationMode::PresetTemplate { template } => find_preset(template)
                .map(GenerationStrategy::PresetTemplate)
                .ok_or_else(|| EngineError::UnknownPreset(template.clone())),
        }
    }

    pub fn label(&self) -> String {
        match self {
            GenerationStrategy::Plain => "plain".into(),
            GenerationStrategy::CoreHedge(_) => "core-hedge".into(),
            GenerationStrategy::StatisticalFilter { .. } => "statistical-filter".into(),
            GenerationStrategy::PresetTemplate(p) => format!("preset {}", p.name),
        }
    }

    /// Decide what run `run` of `total` searches.
    pub fn select_candidate_pool(
        &self,
        run: usize,
        total: usize,
        scored: &[ScoredPlayer],
        constraints: &RosterConstraints,
    ) -> RunPlan {
        match self {
            GenerationStrategy::Plain => RunPlan::unchanged(scored, constraints),
            GenerationStrategy::CoreHedge(plan) => exposure_run(plan, run, total, scored, constraints),
            GenerationStrategy::StatisticalFilter { ranges } => filtered_run(ranges, scored, constraints),
            GenerationStrategy::PresetTemplate(preset) => preset_run(*preset, scored, constraints),
        }
    }

    /// Fold the run plan's origin and notes into a finished lineup.
    pub fn post_process(&self, plan: &RunPlan, mut lineup: Lineup) -> Lineup {
        lineup.origin = lineup.origin.max(plan.origin);
        for note in &plan.notes {
            lineup.annotate(note);
        }
        if let GenerationStrategy::CoreHedge(exposure) = self {
            let missing: Vec<&str> = exposure
                .core
                .iter()
                .filter(|id| !lineup.contains(id))
                .map(|id| id.as_str())
                .collect();
            if !missing.is_empty() {
                lineup.annotate(&format!("core players missing: {}", missing.join(", ")));
            }
        }
        lineup
    }
}

fn exposure_run(
    plan: &ExposurePlan,
    run: usize,
    total: usize,
    scored: &[ScoredPlayer],
    constraints: &RosterConstraints,
) -> RunPlan {
    let hedge_run = plan.is_hedge_run(run, total);
    let differential_run = plan.is_differential_run(run, total);

    let mut wanted: Vec<&str> = plan.core.iter().map(|s| s.as_str()).collect();
    let mut excluded: Vec<&str> = Vec::new();
    let mut notes = Vec::new();
    for (ids, active, label) in [
        (&plan.hedge, hedge_run, "hedge"),
        (&plan.differential, differential_run, "differential"),
    ] {
        if ids.is_empty() {
            continue;
        }
        if active {
            wanted.extend(ids.iter().map(|s| s.as_str()));
            notes.push(format!("{label} run"));
        } else {
            excluded.extend(ids.iter().map(|s| s.as_str()));
        }
    }

    let pool: Vec<ScoredPlayer> = scored
        .iter()
        .filter(|sp| !excluded.contains(&sp.player.id.as_str()))
        .cloned()
        .collect();
    let requested: Vec<usize> = wanted
        .iter()
        .filter_map(|id| pool.iter().position(|sp| sp.player.id == *id))
        .collect();
    let (forced, dropped) = admit_forced(&pool, constraints, &requested);
    if !dropped.is_empty() {
        let names: Vec<&str> = dropped.iter().map(|&i| pool[i].player.id.as_str()).collect();
        warn!(
            "run {}: pinned players {} do not fit one lineup; dropping them",
            run,
            names.join(", ")
        );
        notes.push(format!("dropped infeasible pinned players: {}", names.join(", ")));
    }
    if !plan.unknown.is_empty() {
        notes.push(format!("ignored unknown pinned players: {}", plan.unknown.join(", ")));
    }

    RunPlan {
        pool,
        constraints: constraints.clone(),
        forced,
        origin: LineupOrigin::Optimized,
        notes,
        bias: None,
    }
}

fn filtered_run(ranges: &[AttributeRange], scored: &[ScoredPlayer], constraints: &RosterConstraints) -> RunPlan {
    let filtered: Vec<ScoredPlayer> = scored
        .iter()
        .filter(|sp| ranges.iter().all(|r| r.contains(sp.attribute(r.attribute))))
        .cloned()
        .collect();
    if build_fallback(&filtered, constraints).is_ok() {
        return RunPlan {
            pool: filtered,
            ..RunPlan::unchanged(&[], constraints)
        };
    }
    warn!(
        "statistical filters keep {} of {} players, too few for a legal lineup; relaxing to the full pool",
        filtered.len(),
        scored.len()
    );
    RunPlan {
        origin: LineupOrigin::Relaxed,
        notes: vec![format!(
            "filters kept {} of {} players, relaxed to the unfiltered pool",
            filtered.len(),
            scored.len()
        )],
        ..RunPlan::unchanged(scored, constraints)
    }
}

fn preset_run(
    preset: &'static PresetTemplate,
    scored: &[ScoredPlayer],
    constraints: &RosterConstraints,
) -> RunPlan {
    let pinned = constraints
        .pinned_to(&preset.shape)
        .filter(|pinned| build_fallback(scored, pinned).is_ok());
    let (constraints, note) = match pinned {
        Some(pinned) => (pinned, format!("preset {}", preset.name)),
        None => (
            constraints.clone(),
            format!(
                "preset {} shape {} unavailable, using base role bounds",
                preset.name, preset.shape
            ),
        ),
    };
    RunPlan {
        notes: vec![note],
        bias: Some(preset),
        ..RunPlan::unchanged(scored, &constraints)
    }
}
