use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use super::{Domain, DomainAdapter};
use crate::models::{FactRow, GroupKey};

/// A billed fee and what has been paid against it, both in minor currency
/// units.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct FeeInvoice {
    #[serde(default)]
    pub source_key: Option<String>,
    pub class_id: String,
    pub class_name: String,
    pub student_id: String,
    pub amount_due_minor: i64,
    pub amount_paid_minor: i64,
    pub updated_at: NaiveDateTime,
}

pub struct FeesAdapter;

impl DomainAdapter for FeesAdapter {
    type Source = FeeInvoice;

    const DOMAIN: Domain = Domain::Fees;

    /// Weighted by amount, not by invoice count. Overpayment and refunds are
    /// clamped so the collected share never leaves `[0, due]`.
    fn to_fact(invoice: &FeeInvoice) -> FactRow {
        let due = invoice.amount_due_minor.max(0);
        let paid = invoice.amount_paid_minor.clamp(0, due);

        FactRow {
            group_key: GroupKey::class(&invoice.class_id),
            group_label: invoice.class_name.clone(),
            numerator: paid as f64,
            denominator: due as f64,
            timestamp: invoice.updated_at,
        }
    }
}
