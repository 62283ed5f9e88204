use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::types::{Money, Percent};

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub enum StudentStatus {
    #[default]
    #[serde(rename = "Ativo")]
    Active,
    #[serde(rename = "Inativo")]
    Inactive,
    #[serde(rename = "Transferido")]
    Transferred,
    #[serde(rename = "Suspenso")]
    Suspended,
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub enum ProfileStatus {
    #[default]
    Normal,
    /// Full exemption from enrollment, renewal and tuition.
    #[serde(rename = "Isento Total")]
    FullyExempt,
    /// Normal fees, but late months are never penalised.
    #[serde(rename = "Sem Multa")]
    NoPenalty,
    /// `discount_percentage` off the fee types listed in `affected_types`.
    #[serde(rename = "Desconto Parcial")]
    PartialDiscount,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum PaymentType {
    #[serde(rename = "Matrícula")]
    Enrollment,
    #[serde(rename = "Renovação")]
    Renewal,
    #[serde(rename = "Mensalidade")]
    Tuition,
    #[serde(rename = "Uniforme")]
    Uniform,
    #[serde(rename = "Material")]
    Material,
    #[serde(rename = "Taxa de Exames")]
    ExamFee,
    #[serde(rename = "Taxa de Transferência")]
    TransferFee,
    #[serde(rename = "Outro", other)]
    Other,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FinancialProfile {
    #[serde(default)]
    pub status: ProfileStatus,
    #[serde(default)]
    pub discount_percentage: Percent,
    #[serde(default)]
    pub affected_types: Vec<PaymentType>,
}

impl FinancialProfile {
    pub fn is_exempt(&self) -> bool {
        self.status == ProfileStatus::FullyExempt
    }

    /// Whether late months attract the penalty surcharge.
    pub fn accrues_penalty(&self) -> bool {
        !matches!(
            self.status,
            ProfileStatus::NoPenalty | ProfileStatus::FullyExempt
        )
    }

    pub fn discounts(&self, payment_type: PaymentType) -> bool {
        self.status == ProfileStatus::PartialDiscount && self.affected_types.contains(&payment_type)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentRecord {
    pub academic_year: i32,
    pub amount: Money,
    #[serde(rename = "type")]
    pub payment_type: PaymentType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date: Option<NaiveDate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// A one-off charge (trip, replacement card, ...) outside the fee schedule.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExtraCharge {
    pub date: NaiveDate,
    pub amount: Money,
    #[serde(default)]
    pub is_paid: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Student {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    pub matriculation_date: NaiveDate,
    #[serde(default)]
    pub desired_class: String,
    #[serde(default)]
    pub status: StudentStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub suspension_date: Option<NaiveDate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub financial_profile: Option<FinancialProfile>,
    #[serde(default)]
    pub payments: Vec<PaymentRecord>,
    #[serde(default)]
    pub extra_charges: Vec<ExtraCharge>,
}

impl Student {
    /// The student's profile, `Normal` when none is recorded.
    pub fn profile(&self) -> FinancialProfile {
        self.financial_profile.clone().unwrap_or_default()
    }

    /// Sum of every payment booked against `academic_year`, whatever its type.
    /// `None` if the sum overflows.
    pub fn total_paid_in(&self, academic_year: i32) -> Option<Money> {
        self.payments
            .iter()
            .filter(|p| p.academic_year == academic_year)
            .try_fold(Decimal::ZERO, |acc, p| acc.checked_add(p.amount))
    }
}
