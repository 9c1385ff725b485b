//! CRM status vocabularies, transition rules, and pipeline arithmetic.
//!
//! Covers customers, leads, and deals. Deals are what the sales UI calls
//! "opportunities"; there is a single table for both.

use serde::Serialize;

use crate::error::CoreError;
use crate::fields;

pub const MAX_NAME_LENGTH: usize = 200;
pub const MAX_NOTES_LENGTH: usize = 10_000;

// ---------------------------------------------------------------------------
// Customers
// ---------------------------------------------------------------------------

pub const CUSTOMER_ACTIVE: &str = "active";
pub const CUSTOMER_INACTIVE: &str = "inactive";
pub const CUSTOMER_PROSPECT: &str = "prospect";

pub const CUSTOMER_STATUSES: &[&str] = &[CUSTOMER_ACTIVE, CUSTOMER_INACTIVE, CUSTOMER_PROSPECT];

pub fn validate_customer_status(status: &str) -> Result<(), CoreError> {
    fields::one_of("customer status", status, CUSTOMER_STATUSES)
}

// ---------------------------------------------------------------------------
// Leads
// ---------------------------------------------------------------------------

pub const LEAD_NEW: &str = "new";
pub const LEAD_CONTACTED: &str = "contacted";
pub const LEAD_QUALIFIED: &str = "qualified";
pub const LEAD_UNQUALIFIED: &str = "unqualified";
pub const LEAD_CONVERTED: &str = "converted";

pub const LEAD_STATUSES: &[&str] = &[
    LEAD_NEW,
    LEAD_CONTACTED,
    LEAD_QUALIFIED,
    LEAD_UNQUALIFIED,
    LEAD_CONVERTED,
];

/// Statuses a lead may move to from `from`.
///
/// `converted` is terminal and can only be reached through the convert
/// operation, never through a plain update.
pub fn lead_transitions(from: &str) -> &'static [&'static str] {
    match from {
        LEAD_NEW => &[LEAD_CONTACTED, LEAD_QUALIFIED, LEAD_UNQUALIFIED],
        LEAD_CONTACTED => &[LEAD_NEW, LEAD_QUALIFIED, LEAD_UNQUALIFIED],
        LEAD_QUALIFIED => &[LEAD_CONTACTED, LEAD_UNQUALIFIED],
        LEAD_UNQUALIFIED => &[LEAD_CONTACTED, LEAD_QUALIFIED],
        _ => &[],
    }
}

pub fn validate_lead_status(status: &str) -> Result<(), CoreError> {
    fields::one_of("lead status", status, LEAD_STATUSES)
}

pub fn validate_lead_transition(current: &str, next: &str) -> Result<(), CoreError> {
    if current == next {
        return Ok(());
    }
    if next == LEAD_CONVERTED {
        return Err(CoreError::Validation(
            "Leads are converted through the convert endpoint".to_string(),
        ));
    }
    let allowed = lead_transitions(current);
    if allowed.contains(&next) {
        Ok(())
    } else {
        Err(CoreError::Validation(format!(
            "Cannot move lead from '{current}' to '{next}'. Allowed: {allowed:?}"
        )))
    }
}

/// A lead can be converted unless it already was or was disqualified.
pub fn validate_lead_convertible(status: &str) -> Result<(), CoreError> {
    match status {
        LEAD_CONVERTED => Err(CoreError::Conflict(
            "Lead has already been converted".to_string(),
        )),
        LEAD_UNQUALIFIED => Err(CoreError::Validation(
            "Unqualified leads cannot be converted".to_string(),
        )),
        _ => Ok(()),
    }
}

pub fn validate_lead_score(score: i32) -> Result<(), CoreError> {
    fields::percentage("Lead score", score)
}

// ---------------------------------------------------------------------------
// Deals
// ---------------------------------------------------------------------------

pub const STAGE_PROSPECTING: &str = "prospecting";
pub const STAGE_QUALIFICATION: &str = "qualification";
pub const STAGE_PROPOSAL: &str = "proposal";
pub const STAGE_NEGOTIATION: &str = "negotiation";
pub const STAGE_CLOSED_WON: &str = "closed_won";
pub const STAGE_CLOSED_LOST: &str = "closed_lost";

/// All stages in pipeline order.
pub const DEAL_STAGES: &[&str] = &[
    STAGE_PROSPECTING,
    STAGE_QUALIFICATION,
    STAGE_PROPOSAL,
    STAGE_NEGOTIATION,
    STAGE_CLOSED_WON,
    STAGE_CLOSED_LOST,
];

pub fn is_closed_stage(stage: &str) -> bool {
    stage == STAGE_CLOSED_WON || stage == STAGE_CLOSED_LOST
}

pub fn validate_deal_stage(stage: &str) -> Result<(), CoreError> {
    fields::one_of("deal stage", stage, DEAL_STAGES)
}

/// Open deals may move to any stage; closed deals are frozen.
pub fn validate_stage_change(current: &str, next: &str) -> Result<(), CoreError> {
    validate_deal_stage(next)?;
    if current != next && is_closed_stage(current) {
        return Err(CoreError::Validation(format!(
            "Deal is already '{current}' and can no longer change stage"
        )));
    }
    Ok(())
}

/// Default win probability for a stage when the caller does not supply one.
pub fn default_probability(stage: &str) -> i32 {
    match stage {
        STAGE_PROSPECTING => 10,
        STAGE_QUALIFICATION => 25,
        STAGE_PROPOSAL => 50,
        STAGE_NEGOTIATION => 75,
        STAGE_CLOSED_WON => 100,
        _ => 0,
    }
}

pub fn validate_probability(probability: i32) -> Result<(), CoreError> {
    fields::percentage("Probability", probability)
}

pub fn validate_deal_value(value_cents: i64) -> Result<(), CoreError> {
    if value_cents < 0 {
        return Err(CoreError::Validation(
            "Deal value must not be negative".to_string(),
        ));
    }
    Ok(())
}

/// ISO 4217 shape check: three uppercase ASCII letters.
pub fn validate_currency(code: &str) -> Result<(), CoreError> {
    if code.len() == 3 && code.chars().all(|c| c.is_ascii_uppercase()) {
        Ok(())
    } else {
        Err(CoreError::Validation(format!(
            "Currency '{code}' must be a three-letter ISO 4217 code"
        )))
    }
}

// ---------------------------------------------------------------------------
// Pipeline summary
// ---------------------------------------------------------------------------

/// Aggregated values for one stage, as returned by the repository.
#[derive(Debug, Clone)]
pub struct StageTotals {
    pub stage: String,
    pub deal_count: i64,
    pub value_cents: i64,
    /// Sum of `value_cents * probability / 100` for the stage.
    pub weighted_value_cents: i64,
}

#[derive(Debug, Clone, Serialize)]
pub struct PipelineStage {
    pub stage: String,
    pub deal_count: i64,
    pub value_cents: i64,
    pub weighted_value_cents: i64,
}

#[derive(Debug, Clone, Serialize)]
pub struct PipelineSummary {
    pub stages: Vec<PipelineStage>,
    pub open_value_cents: i64,
    pub weighted_open_value_cents: i64,
    pub won_value_cents: i64,
    /// Won / (won + lost) by count, `None` until a deal has closed.
    pub win_rate: Option<f64>,
}

/// Fill in every stage (zero rows included) in pipeline order and total the
/// open, weighted, and won values.
pub fn summarize_pipeline(totals: &[StageTotals]) -> PipelineSummary {
    let stages: Vec<PipelineStage> = DEAL_STAGES
        .iter()
        .map(|stage| {
            let row = totals.iter().find(|t| t.stage == *stage);
            PipelineStage {
                stage: stage.to_string(),
                deal_count: row.map_or(0, |r| r.deal_count),
                value_cents: row.map_or(0, |r| r.value_cents),
                weighted_value_cents: row.map_or(0, |r| r.weighted_value_cents),
            }
        })
        .collect();

    let open: Vec<&PipelineStage> = stages
        .iter()
        .filter(|s| !is_closed_stage(&s.stage))
        .collect();
    let won = stages.iter().find(|s| s.stage == STAGE_CLOSED_WON);
    let lost = stages.iter().find(|s| s.stage == STAGE_CLOSED_LOST);

    let won_count = won.map_or(0, |s| s.deal_count);
    let lost_count = lost.map_or(0, |s| s.deal_count);
    let closed = won_count + lost_count;

    PipelineSummary {
        open_value_cents: open.iter().map(|s| s.value_cents).sum(),
        weighted_open_value_cents: open.iter().map(|s| s.weighted_value_cents).sum(),
        won_value_cents: won.map_or(0, |s| s.value_cents),
        win_rate: (closed > 0).then(|| won_count as f64 / closed as f64),
        stages,
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn customer_status_validation() {
        assert!(validate_customer_status(CUSTOMER_PROSPECT).is_ok());
        assert!(validate_customer_status("vip").is_err());
    }

    #[test]
    fn lead_may_be_qualified_from_new() {
        assert!(validate_lead_transition(LEAD_NEW, LEAD_QUALIFIED).is_ok());
    }

    #[test]
    fn lead_cannot_be_converted_by_update() {
        assert!(validate_lead_transition(LEAD_QUALIFIED, LEAD_CONVERTED).is_err());
    }

    #[test]
    fn converted_lead_is_terminal() {
        assert!(validate_lead_transition(LEAD_CONVERTED, LEAD_NEW).is_err());
        assert!(validate_lead_transition(LEAD_CONVERTED, LEAD_CONVERTED).is_ok());
    }

    #[test]
    fn converting_twice_is_a_conflict() {
        assert!(matches!(
            validate_lead_convertible(LEAD_CONVERTED),
            Err(CoreError::Conflict(_))
        ));
        assert!(validate_lead_convertible(LEAD_UNQUALIFIED).is_err());
        assert!(validate_lead_convertible(LEAD_QUALIFIED).is_ok());
    }

    #[test]
    fn closed_deals_are_frozen() {
        assert!(validate_stage_change(STAGE_PROPOSAL, STAGE_CLOSED_WON).is_ok());
        assert!(validate_stage_change(STAGE_CLOSED_WON, STAGE_NEGOTIATION).is_err());
        assert!(validate_stage_change(STAGE_CLOSED_LOST, STAGE_CLOSED_LOST).is_ok());
        assert!(validate_stage_change(STAGE_PROPOSAL, "won").is_err());
    }

    #[test]
    fn default_probability_rises_through_pipeline() {
        let probs: Vec<i32> = DEAL_STAGES[..5].iter().map(|s| default_probability(s)).collect();
        assert!(probs.windows(2).all(|w| w[0] < w[1]));
        assert_eq!(default_probability(STAGE_CLOSED_LOST), 0);
    }

    #[test]
    fn currency_shape() {
        assert!(validate_currency("EUR").is_ok());
        assert!(validate_currency("eur").is_err());
        assert!(validate_currency("EURO").is_err());
    }

    #[test]
    fn pipeline_summary_fills_missing_stages_and_totals() {
        let totals = vec![
            StageTotals {
                stage: STAGE_PROPOSAL.into(),
                deal_count: 2,
                value_cents: 10_000,
                weighted_value_cents: 5_000,
            },
            StageTotals {
                stage: STAGE_CLOSED_WON.into(),
                deal_count: 3,
                value_cents: 30_000,
                weighted_value_cents: 30_000,
            },
            StageTotals {
                stage: STAGE_CLOSED_LOST.into(),
                deal_count: 1,
                value_cents: 4_000,
                weighted_value_cents: 0,
            },
        ];

        let summary = summarize_pipeline(&totals);
        assert_eq!(summary.stages.len(), DEAL_STAGES.len());
        assert_eq!(summary.stages[0].deal_count, 0);
        assert_eq!(summary.open_value_cents, 10_000);
        assert_eq!(summary.weighted_open_value_cents, 5_000);
        assert_eq!(summary.won_value_cents, 30_000);
        assert_eq!(summary.win_rate, Some(0.75));
    }

    #[test]
    fn win_rate_is_none_without_closed_deals() {
        assert_eq!(summarize_pipeline(&[]).win_rate, None);
    }
}
