use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::records::{FinancialProfile, FinancialSettings, PaymentType};
use crate::{types::*, SchoolFinanceError, SchoolFinanceResult};

/// Day of the month after which the current month counts as late when the
/// school has not configured one.
pub const DEFAULT_PAYMENT_LIMIT_DAY: u32 = 10;

const HUNDRED: Decimal = dec!(100);

// ---------------------------------------------------------------------------
// Fee schedule
// ---------------------------------------------------------------------------

/// Fully resolved billing parameters for one student. Every optional setting
/// has been replaced by its concrete value, so the balance calculator never
/// has to decide on a default itself.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeeSchedule {
    pub monthly_fee: Money,
    pub enrollment_fee: Money,
    pub renewal_fee: Money,
    pub payment_limit_day: u32,
    pub late_penalty_percent: Percent,
    /// Grade level whose class-specific fees were applied, if any.
    pub class_level: Option<String>,
}

impl FeeSchedule {
    /// Resolve the schedule for a student enrolled in `class_level`.
    ///
    /// A class-specific entry replaces the school-wide base fees; a fee the
    /// entry leaves out falls back to the school-wide value, and a fee absent
    /// from both is zero.
    pub fn resolve(settings: &FinancialSettings, class_level: &str) -> SchoolFinanceResult<Self> {
        let class_fee = settings.class_fee(class_level);

        let pick = |class: Option<Money>, base: Option<Money>| {
            class.or(base).unwrap_or(Decimal::ZERO)
        };

        let schedule = FeeSchedule {
            monthly_fee: pick(class_fee.and_then(|c| c.monthly_fee), settings.monthly_fee),
            enrollment_fee: pick(
                class_fee.and_then(|c| c.enrollment_fee),
                settings.enrollment_fee,
            ),
            renewal_fee: pick(class_fee.and_then(|c| c.renewal_fee), settings.renewal_fee),
            payment_limit_day: settings
                .monthly_payment_limit_day
                .unwrap_or(DEFAULT_PAYMENT_LIMIT_DAY),
            late_penalty_percent: settings
                .late_payment_penalty_percent
                .unwrap_or(Decimal::ZERO),
            class_level: class_fee.map(|c| c.class_level.clone()),
        };

        schedule.validate()?;
        Ok(schedule)
    }

    fn validate(&self) -> SchoolFinanceResult<()> {
        for (field, value) in [
            ("monthlyFee", self.monthly_fee),
            ("enrollmentFee", self.enrollment_fee),
            ("renewalFee", self.renewal_fee),
        ] {
            if value < Decimal::ZERO {
                return Err(SchoolFinanceError::InvalidInput {
                    field: field.into(),
                    reason: "Fees cannot be negative.".into(),
                });
            }
        }
        if self.late_penalty_percent < Decimal::ZERO {
            return Err(SchoolFinanceError::InvalidInput {
                field: "latePaymentPenaltyPercent".into(),
                reason: "Penalty percentage cannot be negative.".into(),
            });
        }
        Ok(())
    }

    /// Base amount charged for a fee type before any profile adjustment.
    /// Types outside the schedule (uniforms, materials, ...) have no base.
    pub fn base_for(&self, payment_type: PaymentType) -> Option<Money> {
        match payment_type {
            PaymentType::Enrollment => Some(self.enrollment_fee),
            PaymentType::Renewal => Some(self.renewal_fee),
            PaymentType::Tuition => Some(self.monthly_fee),
            _ => None,
        }
    }

    /// Surcharge on `amount` for a late month.
    pub fn late_penalty(&self, amount: Money) -> SchoolFinanceResult<Money> {
        percent_of(amount, self.late_penalty_percent, "late penalty")
    }
}

// ---------------------------------------------------------------------------
// Financial profile adjustment
// ---------------------------------------------------------------------------

/// A fee after the student's financial profile has been applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct EffectiveFee {
    pub base: Money,
    pub discount: Money,
    pub amount: Money,
}

pub fn validate_profile(profile: &FinancialProfile) -> SchoolFinanceResult<()> {
    if profile.discount_percentage < Decimal::ZERO || profile.discount_percentage > HUNDRED {
        return Err(SchoolFinanceError::InvalidInput {
            field: "discountPercentage".into(),
            reason: format!(
                "{} is outside the 0-100 range.",
                profile.discount_percentage
            ),
        });
    }
    Ok(())
}

/// Apply the profile to a base fee: nothing is due under full exemption, a
/// partial discount reduces only the listed fee types, anything else is
/// charged at base.
pub fn effective_fee(
    profile: &FinancialProfile,
    payment_type: PaymentType,
    base: Money,
) -> SchoolFinanceResult<EffectiveFee> {
    let discount = if profile.is_exempt() {
        base
    } else if profile.discounts(payment_type) {
        percent_of(base, profile.discount_percentage, "profile discount")?
    } else {
        Decimal::ZERO
    };

    Ok(EffectiveFee {
        base,
        discount,
        amount: base - discount,
    })
}

fn percent_of(amount: Money, percent: Percent, context: &str) -> SchoolFinanceResult<Money> {
    amount
        .checked_mul(percent)
        .and_then(|v| v.checked_div(HUNDRED))
        .ok_or_else(|| SchoolFinanceError::ArithmeticOverflow {
            context: context.to_string(),
        })
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
