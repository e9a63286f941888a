//! # Notice rendering
//!
//! Builds the human-readable notice (subject line + plain-text body) for an
//! adverse decision. The two call sites share one renderer parameterized by
//! [`DecisionKind`]: a blocked transaction alerts an operator, a rejected
//! loan application addresses the applicant with analysis and suggestions.

use crate::pipeline::DecisionKind;
use crate::reason;
use crate::subject::Subject;

/// A rendered notification message.
#[derive(Debug, Clone, PartialEq)]
pub struct Notice {
    /// Subject line (email subject, SMS lead-in)
    pub subject_line: String,
    /// Plain-text body
    pub body: String,
}

/// Resolve the human-readable name for the decision subject.
pub fn display_name(kind: DecisionKind, subject: &Subject) -> String {
    let name = match kind {
        DecisionKind::Transaction => {
            let customer = subject.text("customer");
            if customer.is_empty() {
                subject.text("sender")
            } else {
                customer
            }
        }
        DecisionKind::LoanApplication => subject.text("applicant_name"),
    };
    if name.is_empty() {
        match kind {
            DecisionKind::Transaction => "unknown party".to_string(),
            DecisionKind::LoanApplication => "Applicant".to_string(),
        }
    } else {
        name.to_string()
    }
}

/// Render the notice for an adverse decision.
pub fn render_notice(
    kind: DecisionKind,
    subject: &Subject,
    reasons: &[String],
    probability: Option<f64>,
) -> Notice {
    match kind {
        DecisionKind::Transaction => render_transaction(subject, reasons, probability),
        DecisionKind::LoanApplication => render_loan(subject, reasons, probability),
    }
}

fn render_transaction(subject: &Subject, reasons: &[String], probability: Option<f64>) -> Notice {
    let mut body = String::new();
    body.push_str("Suspicious transaction detected and blocked.\n\n");
    push_field(&mut body, "Party", &display_name(DecisionKind::Transaction, subject));
    push_field(&mut body, "Amount", &format!("{:.2}", subject.num("amount")));
    push_field(&mut body, "Type", subject.text("type"));
    push_field(&mut body, "From", subject.text("sender"));
    push_field(&mut body, "To", subject.text("receiver"));
    if let Some(p) = probability {
        push_field(&mut body, "Fraud probability", &format!("{:.1}%", p * 100.0));
    }
    body.push('\n');
    body.push_str(&format!("Reasons: {}\n", reason::render_reasons(reasons)));
    body.push_str("\nTake immediate action.\n");

    Notice {
        subject_line: "Fraud Alert - Transaction Blocked".to_string(),
        body,
    }
}

fn render_loan(subject: &Subject, reasons: &[String], probability: Option<f64>) -> Notice {
    let name = display_name(DecisionKind::LoanApplication, subject);
    let mut body = String::new();
    body.push_str(&format!("Dear {},\n\n", name));
    body.push_str(
        "Thank you for applying for a loan. After careful analysis of your \
         financial profile, your application does not meet our approval \
         criteria at this time.\n\nApplication analysis:\n",
    );
    push_field(&mut body, "Annual income", &format!("{:.0}", subject.num("income_annum")));
    push_field(&mut body, "Requested amount", &format!("{:.0}", subject.num("loan_amount")));
    push_field(
        &mut body,
        "Debt-to-income ratio",
        &format!("{:.1}%", reason::debt_to_income(subject)),
    );
    push_field(
        &mut body,
        "Credit score (CIBIL)",
        &format!("{:.0}", subject.num("cibil_score")),
    );
    push_field(&mut body, "Total assets", &format!("{:.0}", reason::total_assets(subject)));
    if let Some(p) = probability {
        push_field(&mut body, "Risk assessment", &format!("{:.1}%", p * 100.0));
    }
    body.push('\n');
    body.push_str(&format!("Reasons: {}\n", reason::render_reasons(reasons)));

    body.push_str("\nHow to improve your application:\n");
    for suggestion in reason::suggestions(subject) {
        body.push_str(&format!("  - {}\n", suggestion));
    }
    body.push_str("\nYou are welcome to reapply once the areas above are addressed.\n");

    Notice {
        subject_line: "Loan Application Status - Requires Review".to_string(),
        body,
    }
}

fn push_field(body: &mut String, label: &str, value: &str) {
    if !value.is_empty() {
        body.push_str(&format!("  {}: {}\n", label, value));
    }
}
