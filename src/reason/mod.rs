//! # Reason Engine
//!
//! Maps a decision subject's attributes to an ordered list of human-readable
//! reason strings. Pure and total: no I/O, never fails, missing fields
//! default to zero/empty via the [`Subject`] accessors.
//!
//! The rule table is fixed (not user-configurable) and evaluated in priority
//! order; each rule independently contributes zero or one reason. The output
//! is therefore stable and reproducible for a given subject.

use crate::subject::Subject;

/// Credit scores below this are outright low.
pub const LOW_SCORE_THRESHOLD: f64 = 500.0;

/// Credit scores below this (but not low) are below average.
pub const FAIR_SCORE_THRESHOLD: f64 = 650.0;

/// Debt-to-income percentage above which the leverage rule fires.
pub const HIGH_DTI_PERCENT: f64 = 50.0;

/// Total asset value below which collateral is considered thin.
pub const MIN_COLLATERAL_VALUE: f64 = 500_000.0;

/// Dependent count above which repayment capacity is questioned.
pub const MAX_DEPENDENTS: f64 = 4.0;

/// DTI percentage above which a lower loan amount is suggested.
const SUGGEST_DTI_PERCENT: f64 = 40.0;

/// Asset value below which building collateral is suggested.
const SUGGEST_ASSET_VALUE: f64 = 1_000_000.0;

/// Fallback reason when no rule triggers.
pub const DEFAULT_REASON: &str = "Insufficient financial credentials";

/// Asset-value fields summed for the collateral rule.
const ASSET_FIELDS: &[&str] = &[
    "residential_assets_value",
    "commercial_assets_value",
    "luxury_assets_value",
    "bank_asset_value",
    "assets",
];

/// Debt-to-income ratio as a percentage.
///
/// Income at or below zero is treated as 1 — an explicit contract, not an
/// accident: the ratio rule must fire (loudly) for zero-income subjects
/// rather than divide by zero.
pub fn debt_to_income(subject: &Subject) -> f64 {
    let income = subject.num("income_annum");
    let income = if income <= 0.0 { 1.0 } else { income };
    (subject.num("loan_amount") / income) * 100.0
}

/// Sum of all recognized asset-value fields.
pub fn total_assets(subject: &Subject) -> f64 {
    ASSET_FIELDS.iter().map(|field| subject.num(field)).sum()
}

/// Derive the ordered reason list for an adverse decision.
///
/// Returns at least one entry: if no rule triggers, the single default
/// reason is substituted.
pub fn reasons(subject: &Subject) -> Vec<String> {
    let mut reasons = Vec::new();

    let score = subject.num("cibil_score");
    if score < LOW_SCORE_THRESHOLD {
        reasons.push("Low credit score".to_string());
    } else if score < FAIR_SCORE_THRESHOLD {
        reasons.push("Below-average credit score".to_string());
    }

    let dti = debt_to_income(subject);
    if dti > HIGH_DTI_PERCENT {
        reasons.push(format!("High debt-to-income ratio ({:.1}%)", dti));
    }

    if total_assets(subject) < MIN_COLLATERAL_VALUE {
        reasons.push("Limited asset base for collateral".to_string());
    }

    if subject.flag("self_employed") {
        reasons.push("Self-employment status may indicate income volatility".to_string());
    }

    if subject.num("no_of_dependents") > MAX_DEPENDENTS {
        reasons.push("High number of dependents may affect repayment capacity".to_string());
    }

    if reasons.is_empty() {
        reasons.push(DEFAULT_REASON.to_string());
    }

    reasons
}

/// Join reasons for single-line display.
pub fn render_reasons(reasons: &[String]) -> String {
    reasons.join("; ")
}

/// Per-rule improvement suggestions for the notice body.
///
/// Same purity contract as [`reasons`]; thresholds are deliberately looser
/// than the rejection rules so borderline subjects still get guidance.
pub fn suggestions(subject: &Subject) -> Vec<String> {
    let mut suggestions = Vec::new();

    let score = subject.num("cibil_score");
    if score < FAIR_SCORE_THRESHOLD {
        suggestions.push(format!(
            "Improve your credit score (currently {:.0}; aim for 700+): pay bills on time, \
             reduce credit utilization, clear outstanding debts",
            score
        ));
    }

    if debt_to_income(subject) > SUGGEST_DTI_PERCENT {
        let max_recommended = subject.num("income_annum") * 0.4;
        suggestions.push(format!(
            "Reduce the requested amount (recommended maximum: {:.0}) or increase income sources",
            max_recommended
        ));
    }

    if total_assets(subject) < SUGGEST_ASSET_VALUE {
        suggestions.push(
            "Build your asset base: increase savings, invest in property, accumulate collateral"
                .to_string(),
        );
    }

    if subject.flag("self_employed") {
        suggestions.push(
            "Document income stability: provide 2-3 years of tax returns, bank statements \
             and business registration"
                .to_string(),
        );
    }

    if suggestions.is_empty() {
        suggestions.push(
            "Contact a loan officer for a manual review of your profile".to_string(),
        );
    }

    suggestions
}
