use chrono::{Local, NaiveDate};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::time::Instant;
use tracing::{debug, warn};

use crate::billing::balance::{compute_breakdown, BalanceOutcome, DEBTOR_THRESHOLD};
use crate::records::academic_year::active_year;
use crate::records::{AcademicYear, FinancialSettings, Student, StudentStatus};
use crate::{types::*, SchoolFinanceResult};

// ---------------------------------------------------------------------------
// Input / Output types
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SortOrder {
    /// Most indebted first.
    #[default]
    Balance,
    Name,
    /// Keep the order students were supplied in.
    Input,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportOptions {
    #[serde(default)]
    pub only_debtors: bool,
    /// Restrict the listing to these statuses; empty means all.
    #[serde(default)]
    pub statuses: Vec<StudentStatus>,
    #[serde(default)]
    pub sort: SortOrder,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DebtorReportInput {
    pub students: Vec<Student>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub settings: Option<FinancialSettings>,
    #[serde(default)]
    pub academic_years: Vec<AcademicYear>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reference_date: Option<NaiveDate>,
    #[serde(default)]
    pub options: ReportOptions,
}

/// Same envelope as [`DebtorReportInput`] with students left unparsed, so a
/// single malformed record cannot reject the whole listing.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawDebtorReportInput {
    students: Vec<serde_json::Value>,
    #[serde(default)]
    settings: Option<FinancialSettings>,
    #[serde(default)]
    academic_years: Vec<AcademicYear>,
    #[serde(default)]
    reference_date: Option<NaiveDate>,
    #[serde(default)]
    options: ReportOptions,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DebtorRow {
    pub id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    pub desired_class: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<StudentStatus>,
    pub balance: Money,
    pub is_debtor: bool,
    pub outcome: BalanceOutcome,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DebtorReport {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub academic_year: Option<i32>,
    pub currency: String,
    pub student_count: usize,
    pub debtor_count: usize,
    /// Amount owed across all debtors, as a positive figure.
    pub total_outstanding: Money,
    pub rows: Vec<DebtorRow>,
}

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Balance every student and list them for the debtor view.
pub fn debtor_report(
    input: &DebtorReportInput,
) -> SchoolFinanceResult<ComputationOutput<DebtorReport>> {
    let start = Instant::now();
    let entries = input.students.iter().cloned().map(Entry::Parsed).collect();
    build_report(
        entries,
        input.settings.as_ref(),
        &input.academic_years,
        input.reference_date,
        &input.options,
        start,
    )
}

/// Like [`debtor_report`], but takes the raw JSON envelope. Students that do
/// not deserialize are listed with a zero balance and reported in the
/// warnings instead of failing the report.
pub fn debtor_report_from_value(
    value: serde_json::Value,
) -> SchoolFinanceResult<ComputationOutput<DebtorReport>> {
    let start = Instant::now();
    let raw: RawDebtorReportInput = serde_json::from_value(value)?;

    let entries = raw
        .students
        .into_iter()
        .enumerate()
        .map(|(index, value)| {
            let id = value
                .get("id")
                .and_then(|v| v.as_str())
                .map(str::to_string);
            match serde_json::from_value::<Student>(value) {
                Ok(student) => Entry::Parsed(student),
                Err(e) => Entry::Malformed {
                    index,
                    id,
                    reason: e.to_string(),
                },
            }
        })
        .collect();

    build_report(
        entries,
        raw.settings.as_ref(),
        &raw.academic_years,
        raw.reference_date,
        &raw.options,
        start,
    )
}

// ---------------------------------------------------------------------------
// Internal helpers
// ---------------------------------------------------------------------------

enum Entry {
    Parsed(Student),
    Malformed {
        index: usize,
        id: Option<String>,
        reason: String,
    },
}

fn build_report(
    entries: Vec<Entry>,
    settings: Option<&FinancialSettings>,
    academic_years: &[AcademicYear],
    reference_date: Option<NaiveDate>,
    options: &ReportOptions,
    start: Instant,
) -> SchoolFinanceResult<ComputationOutput<DebtorReport>> {
    let mut warnings: Vec<String> = Vec::new();

    let reference_date = reference_date.unwrap_or_else(|| {
        warnings.push("Reference date not supplied; using today's date.".into());
        Local::now().date_naive()
    });
    if settings.is_none() {
        warnings.push("No financial settings configured; all balances are zero.".into());
    }

    let mut rows: Vec<DebtorRow> = Vec::with_capacity(entries.len());
    for entry in entries {
        match entry {
            Entry::Parsed(student) => {
                if !options.statuses.is_empty() && !options.statuses.contains(&student.status) {
                    continue;
                }
                let breakdown =
                    compute_breakdown(&student, settings, academic_years, reference_date);
                if breakdown.outcome == BalanceOutcome::Fallback {
                    warnings.push(format!(
                        "Student '{}': inconsistent record; balance defaulted to zero.",
                        student.id
                    ));
                }
                rows.push(DebtorRow {
                    id: student.id,
                    name: student.name,
                    desired_class: student.desired_class,
                    status: Some(student.status),
                    balance: breakdown.balance,
                    is_debtor: breakdown.is_debtor,
                    outcome: breakdown.outcome,
                });
            }
            Entry::Malformed { index, id, reason } => {
                warn!(index, reason = %reason, "skipping malformed student record");
                let id = id.unwrap_or_else(|| format!("#{index}"));
                warnings.push(format!(
                    "Student record {index} ('{id}') is malformed: {reason}; balance defaulted to zero."
                ));
                if !options.statuses.is_empty() {
                    continue;
                }
                rows.push(DebtorRow {
                    id,
                    name: None,
                    desired_class: String::new(),
                    status: None,
                    balance: Decimal::ZERO,
                    is_debtor: false,
                    outcome: BalanceOutcome::Fallback,
                });
            }
        }
    }

    let student_count = rows.len();
    let debtors: Vec<&DebtorRow> = rows.iter().filter(|r| r.is_debtor).collect();
    let debtor_count = debtors.len();
    let total_outstanding: Money = debtors.iter().map(|r| -r.balance).sum();

    if options.only_debtors {
        rows.retain(|r| r.is_debtor);
    }
    sort_rows(&mut rows, options.sort);

    debug!(
        students = student_count,
        debtors = debtor_count,
        outstanding = %total_outstanding,
        "built debtor report"
    );

    let report = DebtorReport {
        academic_year: active_year(academic_years).map(|y| y.year),
        currency: settings.map(|s| s.currency.clone()).unwrap_or_default(),
        student_count,
        debtor_count,
        total_outstanding,
        rows,
    };

    let elapsed = start.elapsed().as_micros() as u64;
    let assumptions = serde_json::json!({
        "reference_date": reference_date.to_string(),
        "debtor_threshold": DEBTOR_THRESHOLD.to_string(),
        "only_debtors": options.only_debtors,
        "sort": options.sort,
    });

    Ok(with_metadata(
        "Debtor listing: per-student balance for the active academic year",
        &assumptions,
        warnings,
        elapsed,
        report,
    ))
}

fn sort_rows(rows: &mut [DebtorRow], order: SortOrder) {
    match order {
        SortOrder::Balance => {
            rows.sort_by(|a, b| a.balance.cmp(&b.balance).then_with(|| a.id.cmp(&b.id)))
        }
        SortOrder::Name => rows.sort_by(|a, b| {
            let an = a.name.as_deref().unwrap_or(&a.id);
            let bn = b.name.as_deref().unwrap_or(&b.id);
            an.cmp(bn).then_with(|| a.id.cmp(&b.id))
        }),
        SortOrder::Input => {}
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
