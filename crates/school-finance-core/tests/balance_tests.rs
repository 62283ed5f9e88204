use chrono::NaiveDate;
use pretty_assertions::assert_eq;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use school_finance_core::billing::balance::{
    self, compute_balance, compute_breakdown, BalanceOutcome, BalanceStatus, ObligationKind,
};
use school_finance_core::records::{
    AcademicYear, AcademicYearStatus, ClassFee, ExtraCharge, FinancialProfile, FinancialSettings,
    PaymentRecord, PaymentType, ProfileStatus, Student, StudentStatus,
};

// ===========================================================================
// Fixtures
// ===========================================================================

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

fn year_2024() -> Vec<AcademicYear> {
    vec![
        AcademicYear {
            year: 2023,
            status: AcademicYearStatus::Completed,
            start_month: 2,
            end_month: 11,
        },
        AcademicYear {
            year: 2024,
            status: AcademicYearStatus::InProgress,
            start_month: 2,
            end_month: 11,
        },
    ]
}

fn settings(monthly: Decimal, enrollment: Decimal, renewal: Decimal) -> FinancialSettings {
    FinancialSettings {
        monthly_fee: Some(monthly),
        enrollment_fee: Some(enrollment),
        renewal_fee: Some(renewal),
        ..Default::default()
    }
}

fn student(matriculated: NaiveDate) -> Student {
    Student {
        id: "st-100".into(),
        name: Some("Joana Manuel".into()),
        matriculation_date: matriculated,
        desired_class: "7ª Classe".into(),
        status: StudentStatus::Active,
        suspension_date: None,
        financial_profile: None,
        payments: vec![],
        extra_charges: vec![],
    }
}

fn payment(academic_year: i32, amount: Decimal) -> PaymentRecord {
    PaymentRecord {
        academic_year,
        amount,
        payment_type: PaymentType::Tuition,
        date: None,
        description: None,
    }
}

// ===========================================================================
// Short circuits
// ===========================================================================

#[test]
fn test_no_settings_is_zero() {
    let s = student(date(2022, 3, 1));
    let status = compute_balance(&s, None, &year_2024(), date(2024, 6, 1));
    assert_eq!(status, BalanceStatus::default());
}

#[test]
fn test_no_academic_years_is_zero() {
    let s = student(date(2022, 3, 1));
    let fees = settings(dec!(1000), dec!(2000), dec!(1500));
    let b = compute_breakdown(&s, Some(&fees), &[], date(2024, 6, 1));
    assert_eq!(b.outcome, BalanceOutcome::NoAcademicYear);
    assert_eq!(b.status(), BalanceStatus::default());
}

#[test]
fn test_zero_payments_and_zero_obligations() {
    let s = student(date(2022, 3, 1));
    let fees = FinancialSettings::default();
    let status = compute_balance(&s, Some(&fees), &year_2024(), date(2024, 6, 20));
    assert_eq!(status.balance, Decimal::ZERO);
    assert!(!status.is_debtor);
}

// ===========================================================================
// New-enrollment grace window
// ===========================================================================

#[test]
fn test_enrolled_this_month_without_payments_is_not_debtor() {
    let s = student(date(2024, 5, 3));
    let fees = settings(dec!(50_000), dec!(90_000), dec!(0));
    let b = compute_breakdown(&s, Some(&fees), &year_2024(), date(2024, 5, 20));
    assert_eq!(b.outcome, BalanceOutcome::EnrollmentGrace);
    assert_eq!(b.status(), BalanceStatus::default());
}

#[test]
fn test_grace_ends_once_a_payment_is_recorded() {
    let mut s = student(date(2024, 5, 3));
    s.payments.push(payment(2024, dec!(10_000)));
    let fees = settings(dec!(50_000), dec!(90_000), dec!(0));
    let b = compute_breakdown(&s, Some(&fees), &year_2024(), date(2024, 5, 20));
    assert_eq!(b.outcome, BalanceOutcome::Computed);
    // Enrollment only: tuition starts the month after enrollment.
    assert_eq!(b.total_obligation, dec!(90_000));
    assert_eq!(b.balance, dec!(-80_000));
}

// ===========================================================================
// Reference scenario
// ===========================================================================

#[test]
fn test_new_student_scenario_balance() {
    let s = student(date(2024, 2, 10));
    let fees = settings(dec!(1000), dec!(2000), dec!(0));
    let b = compute_breakdown(&s, Some(&fees), &year_2024(), date(2024, 5, 1));

    assert_eq!(b.total_of(ObligationKind::Enrollment), dec!(2000));
    // Tuition from the month after enrollment up to the reference month.
    assert_eq!(b.charged_months(), vec![3, 4, 5]);
    assert_eq!(b.total_obligation, dec!(5000));
    assert_eq!(b.balance, dec!(-5000));
    assert!(b.is_debtor);
}

#[test]
fn test_payments_increase_balance_exactly() {
    let fees = settings(dec!(1000), dec!(2000), dec!(1500));
    let mut s = student(date(2022, 3, 1));
    s.payments.push(payment(2024, dec!(700)));
    let before = compute_balance(&s, Some(&fees), &year_2024(), date(2024, 7, 12));

    s.payments.push(payment(2024, dec!(123.45)));
    let after = compute_balance(&s, Some(&fees), &year_2024(), date(2024, 7, 12));

    assert_eq!(after.balance - before.balance, dec!(123.45));
}

#[test]
fn test_class_specific_fees_apply() {
    let mut fees = settings(dec!(1000), dec!(2000), dec!(1500));
    fees.class_specific_fees.push(ClassFee {
        class_level: "7ª Classe".into(),
        monthly_fee: Some(dec!(2500)),
        enrollment_fee: None,
        renewal_fee: Some(dec!(3000)),
    });
    let s = student(date(2022, 3, 1));
    let b = compute_breakdown(&s, Some(&fees), &year_2024(), date(2024, 3, 4));
    assert_eq!(b.total_of(ObligationKind::Renewal), dec!(3000));
    assert_eq!(b.total_of(ObligationKind::Tuition), dec!(5000));
}

#[test]
fn test_future_matriculation_adds_no_enrollment_or_renewal() {
    let s = student(date(2025, 1, 20));
    let fees = settings(dec!(1000), dec!(2000), dec!(1500));
    let b = compute_breakdown(&s, Some(&fees), &year_2024(), date(2024, 6, 1));
    assert_eq!(b.outcome, BalanceOutcome::Computed);
    assert!(b
        .lines
        .iter()
        .all(|l| l.kind != ObligationKind::Enrollment && l.kind != ObligationKind::Renewal));
    assert_eq!(b.total_of(ObligationKind::Enrollment), Decimal::ZERO);
    assert_eq!(b.total_of(ObligationKind::Renewal), Decimal::ZERO);
}

// ===========================================================================
// Suspension
// ===========================================================================

#[test]
fn test_suspended_student_accrues_only_until_suspension_month() {
    let mut s = student(date(2022, 3, 1));
    s.status = StudentStatus::Suspended;
    s.suspension_date = Some(date(2024, 6, 15));
    let fees = settings(dec!(1000), dec!(0), dec!(0));
    let b = compute_breakdown(&s, Some(&fees), &year_2024(), date(2024, 9, 1));
    assert_eq!(b.charged_months(), vec![2, 3, 4, 5, 6]);
    assert_eq!(b.total_of(ObligationKind::Tuition), dec!(5000));
}

#[test]
fn test_suspended_in_earlier_year_accrues_no_tuition() {
    let mut s = student(date(2021, 3, 1));
    s.status = StudentStatus::Suspended;
    s.suspension_date = Some(date(2023, 10, 2));
    let fees = settings(dec!(1000), dec!(0), dec!(800));
    let b = compute_breakdown(&s, Some(&fees), &year_2024(), date(2024, 9, 1));
    assert!(b.charged_months().is_empty());
    // Renewal is still due for a non-inactive returning student.
    assert_eq!(b.total_obligation, dec!(800));
}

// ===========================================================================
// Financial profiles
// ===========================================================================

#[test]
fn test_full_exemption_still_owes_extra_charges() {
    let mut s = student(date(2024, 1, 15));
    s.financial_profile = Some(FinancialProfile {
        status: ProfileStatus::FullyExempt,
        ..Default::default()
    });
    s.extra_charges.push(ExtraCharge {
        date: date(2024, 3, 10),
        amount: dec!(300),
        is_paid: false,
        description: Some("Cartão de estudante".into()),
    });
    let mut fees = settings(dec!(1000), dec!(2000), dec!(1500));
    fees.late_payment_penalty_percent = Some(dec!(10));

    let b = compute_breakdown(&s, Some(&fees), &year_2024(), date(2024, 6, 20));
    assert_eq!(b.total_of(ObligationKind::Enrollment), Decimal::ZERO);
    assert_eq!(b.total_of(ObligationKind::Tuition), Decimal::ZERO);
    assert_eq!(b.total_of(ObligationKind::ExtraCharge), dec!(300));
    assert_eq!(b.balance, dec!(-300));
    assert!(b.is_debtor);
}

#[test]
fn test_partial_discount_only_reduces_affected_fee() {
    let mut s = student(date(2024, 1, 15));
    s.financial_profile = Some(FinancialProfile {
        status: ProfileStatus::PartialDiscount,
        discount_percentage: dec!(20),
        affected_types: vec![PaymentType::Tuition],
    });
    let fees = settings(dec!(1000), dec!(2000), dec!(1500));
    let b = compute_breakdown(&s, Some(&fees), &year_2024(), date(2024, 4, 5));

    assert_eq!(b.total_of(ObligationKind::Enrollment), dec!(2000));
    assert_eq!(b.charged_months(), vec![2, 3, 4]);
    assert_eq!(b.total_of(ObligationKind::Tuition), dec!(2400));
    assert_eq!(b.balance, dec!(-4400));
}

// ===========================================================================
// Late penalty
// ===========================================================================

fn single_month_year() -> Vec<AcademicYear> {
    vec![AcademicYear {
        year: 2024,
        status: AcademicYearStatus::InProgress,
        start_month: 5,
        end_month: 11,
    }]
}

fn penalty_settings() -> FinancialSettings {
    FinancialSettings {
        monthly_fee: Some(dec!(1000)),
        monthly_payment_limit_day: Some(10),
        late_payment_penalty_percent: Some(dec!(10)),
        ..Default::default()
    }
}

#[test]
fn test_current_month_penalised_after_limit_day() {
    let s = student(date(2022, 3, 1));
    let b = compute_breakdown(
        &s,
        Some(&penalty_settings()),
        &single_month_year(),
        date(2024, 5, 15),
    );
    assert_eq!(b.charged_months(), vec![5]);
    assert_eq!(b.total_of(ObligationKind::Tuition), dec!(1100));
    assert_eq!(b.lines.last().map(|l| l.penalty), Some(dec!(100)));
}

#[test]
fn test_current_month_not_penalised_before_limit_day() {
    let s = student(date(2022, 3, 1));
    let b = compute_breakdown(
        &s,
        Some(&penalty_settings()),
        &single_month_year(),
        date(2024, 5, 5),
    );
    assert_eq!(b.total_of(ObligationKind::Tuition), dec!(1000));
}

#[test]
fn test_limit_day_zero_makes_current_month_late() {
    let mut fees = penalty_settings();
    fees.monthly_payment_limit_day = Some(0);
    let s = student(date(2022, 3, 1));
    let b = compute_breakdown(&s, Some(&fees), &single_month_year(), date(2024, 5, 1));
    assert_eq!(b.outcome, BalanceOutcome::Computed);
    assert_eq!(b.charged_months(), vec![5]);
    // 1000 + 10% late, due from the first day of the month.
    assert_eq!(b.total_of(ObligationKind::Tuition), dec!(1100));
    assert!(b.is_debtor);
}

#[test]
fn test_returning_student_with_limit_day_zero_is_debtor() {
    let mut fees = settings(dec!(1000), dec!(2000), dec!(1500));
    fees.monthly_payment_limit_day = Some(0);
    fees.late_payment_penalty_percent = Some(dec!(10));
    let s = student(date(2022, 3, 1));
    let b = compute_breakdown(&s, Some(&fees), &year_2024(), date(2024, 4, 5));
    assert_eq!(b.outcome, BalanceOutcome::Computed);
    // Renewal 1500 + Feb, Mar, Apr at 1100 each.
    assert_eq!(b.total_obligation, dec!(4800));
    assert_eq!(b.balance, dec!(-4800));
    assert!(b.is_debtor);
}

#[test]
fn test_no_penalty_profile_is_never_penalised() {
    let mut s = student(date(2022, 3, 1));
    s.financial_profile = Some(FinancialProfile {
        status: ProfileStatus::NoPenalty,
        ..Default::default()
    });
    let b = compute_breakdown(
        &s,
        Some(&penalty_settings()),
        &single_month_year(),
        date(2024, 7, 15),
    );
    assert_eq!(b.charged_months(), vec![5, 6, 7]);
    assert_eq!(b.total_of(ObligationKind::Tuition), dec!(3000));
}

#[test]
fn test_penalty_applies_to_discounted_amount() {
    let mut s = student(date(2022, 3, 1));
    s.financial_profile = Some(FinancialProfile {
        status: ProfileStatus::PartialDiscount,
        discount_percentage: dec!(50),
        affected_types: vec![PaymentType::Tuition],
    });
    let b = compute_breakdown(
        &s,
        Some(&penalty_settings()),
        &single_month_year(),
        date(2024, 6, 1),
    );
    // May: 500 + 10% late; June: 500, limit day not yet passed.
    assert_eq!(b.total_of(ObligationKind::Tuition), dec!(1050));
}

// ===========================================================================
// Debtor threshold
// ===========================================================================

#[test]
fn test_debtor_threshold_is_strict() {
    let fees = settings(dec!(1000), dec!(0), dec!(0));
    let years = single_month_year();

    let mut s = student(date(2022, 3, 1));
    s.payments.push(payment(2024, dec!(950.00)));
    let at_limit = compute_balance(&s, Some(&fees), &years, date(2024, 5, 5));
    assert_eq!(at_limit.balance, dec!(-50.00));
    assert!(!at_limit.is_debtor);

    s.payments[0].amount = dec!(949.99);
    let over = compute_balance(&s, Some(&fees), &years, date(2024, 5, 5));
    assert_eq!(over.balance, dec!(-50.01));
    assert!(over.is_debtor);
}

#[test]
fn test_threshold_constant() {
    assert_eq!(balance::DEBTOR_THRESHOLD, dec!(-50));
}
