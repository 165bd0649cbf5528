//! Host transaction schema shared by templates and generated instances.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use uuid::Uuid;

use crate::boundary::iso_date;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum TransactionKind {
    Income,
    #[default]
    Expense,
    Transfer,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum TransactionStatus {
    #[default]
    Planned,
    Confirmed,
    Paid,
    Cancelled,
}

/// Who is performing a generation run; copied into every instance's audit trail.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuditContext {
    pub user_id: String,
}

impl AuditContext {
    pub fn new(user_id: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
        }
    }

    pub fn stamp(&self, at: DateTime<Utc>) -> AuditInfo {
        AuditInfo {
            created_by: Some(self.user_id.clone()),
            created_at: Some(at),
            updated_by: Some(self.user_id.clone()),
            updated_at: Some(at),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "camelCase")]
pub struct AuditInfo {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_by: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_by: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Transaction {
    #[serde(default = "Uuid::new_v4")]
    pub id: Uuid,
    pub description: String,
    pub amount: f64,
    #[serde(default)]
    pub kind: TransactionKind,
    #[serde(default)]
    pub status: TransactionStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub account_id: Option<Uuid>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category_id: Option<Uuid>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub company_id: Option<Uuid>,
    #[serde(with = "iso_date")]
    pub competencia_date: NaiveDate,
    #[serde(with = "iso_date")]
    pub due_date: NaiveDate,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        with = "iso_date::option"
    )]
    pub payment_date: Option<NaiveDate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub recurrence_id: Option<Uuid>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub installment_number: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_installments: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    #[serde(default)]
    pub audit: AuditInfo,
    /// Host-specific fields carried through untouched.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Transaction {
    pub fn new(description: impl Into<String>, amount: f64, date: NaiveDate) -> Self {
        Self {
            id: Uuid::new_v4(),
            description: description.into(),
            amount,
            kind: TransactionKind::default(),
            status: TransactionStatus::Planned,
            account_id: None,
            category_id: None,
            company_id: None,
            competencia_date: date,
            due_date: date,
            payment_date: None,
            recurrence_id: None,
            installment_number: None,
            total_installments: None,
            notes: None,
            audit: AuditInfo::default(),
            extra: Map::new(),
        }
    }

    pub fn with_kind(mut self, kind: TransactionKind) -> Self {
        self.kind = kind;
        self
    }

    pub fn mark_paid(&mut self, payment_date: NaiveDate) {
        self.payment_date = Some(payment_date);
        self.status = TransactionStatus::Paid;
    }

    pub fn is_planned(&self) -> bool {
        self.status == TransactionStatus::Planned
    }

    /// Clones this template into one occurrence of a series.
    ///
    /// The copy gets a fresh id and starts out `planned` whatever the template's
    /// status was; payment data is cleared.
    pub fn instantiate(
        &self,
        recurrence_id: Uuid,
        competencia_date: NaiveDate,
        due_date: NaiveDate,
        installment_number: u32,
        total_installments: u32,
        audit: AuditInfo,
    ) -> Transaction {
        let mut instance = self.clone();
        instance.id = Uuid::new_v4();
        instance.status = TransactionStatus::Planned;
        instance.payment_date = None;
        instance.competencia_date = competencia_date;
        instance.due_date = due_date;
        instance.recurrence_id = Some(recurrence_id);
        instance.installment_number = Some(installment_number);
        instance.total_installments = Some(total_installments);
        instance.audit = audit;
        instance
    }
}

/// A transaction generated from a recurrence rule.
pub type TransactionInstance = Transaction;

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn instantiate_resets_status_and_identity() {
        let mut template = Transaction::new("Rent", 1500.0, date(2025, 1, 10));
        template.mark_paid(date(2025, 1, 10));
        let series = Uuid::new_v4();
        let at = Utc.with_ymd_and_hms(2025, 1, 1, 12, 0, 0).unwrap();

        let instance = template.instantiate(
            series,
            date(2025, 2, 10),
            date(2025, 2, 10),
            2,
            12,
            AuditContext::new("user-1").stamp(at),
        );

        assert_ne!(instance.id, template.id);
        assert_eq!(instance.status, TransactionStatus::Planned);
        assert_eq!(instance.payment_date, None);
        assert_eq!(instance.recurrence_id, Some(series));
        assert_eq!(instance.installment_number, Some(2));
        assert_eq!(instance.total_installments, Some(12));
        assert_eq!(instance.audit.created_by.as_deref(), Some("user-1"));
        assert_eq!(instance.description, "Rent");
        assert_eq!(instance.amount, 1500.0);
    }

    #[test]
    fn unknown_host_fields_survive_roundtrip() {
        let json = r#"{
            "id": "6f1c3f76-2c0b-4f8e-9a51-0d2f4f2b8a10",
            "description": "Internet",
            "amount": 120.5,
            "kind": "expense",
            "status": "confirmed",
            "competenciaDate": "2025-03-05",
            "dueDate": "2025-03-05",
            "costCenter": "OPS-01"
        }"#;
        let txn: Transaction = serde_json::from_str(json).unwrap();
        assert_eq!(txn.status, TransactionStatus::Confirmed);
        assert_eq!(txn.extra.get("costCenter"), Some(&Value::from("OPS-01")));

        let back = serde_json::to_value(&txn).unwrap();
        assert_eq!(back["costCenter"], "OPS-01");
        assert_eq!(back["competenciaDate"], "2025-03-05T00:00:00.000Z");
    }
}
