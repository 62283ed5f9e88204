use serde::{Deserialize, Serialize};

use crate::types::{Money, Percent};

/// Fee overrides for one grade level.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClassFee {
    pub class_level: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub monthly_fee: Option<Money>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub enrollment_fee: Option<Money>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub renewal_fee: Option<Money>,
}

/// School-wide billing configuration as entered by the school's
/// administrator. Optional fields are resolved to concrete values by
/// [`crate::billing::fees::FeeSchedule::resolve`].
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FinancialSettings {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub monthly_fee: Option<Money>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub enrollment_fee: Option<Money>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub renewal_fee: Option<Money>,
    #[serde(default)]
    pub class_specific_fees: Vec<ClassFee>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub monthly_payment_limit_day: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub late_payment_penalty_percent: Option<Percent>,
    #[serde(default = "default_currency")]
    pub currency: String,
}

fn default_currency() -> String {
    "AOA".to_string()
}

impl Default for FinancialSettings {
    fn default() -> Self {
        Self {
            monthly_fee: None,
            enrollment_fee: None,
            renewal_fee: None,
            class_specific_fees: Vec::new(),
            monthly_payment_limit_day: None,
            late_payment_penalty_percent: None,
            currency: default_currency(),
        }
    }
}

impl FinancialSettings {
    pub fn class_fee(&self, class_level: &str) -> Option<&ClassFee> {
        self.class_specific_fees
            .iter()
            .find(|c| c.class_level == class_level)
    }
}
