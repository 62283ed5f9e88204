use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum AcademicYearStatus {
    #[serde(rename = "Planeado")]
    Planned,
    #[serde(rename = "Em Curso")]
    InProgress,
    #[serde(rename = "Concluído")]
    Completed,
}

/// A school year and its teaching window. `start_month` and `end_month` are
/// calendar months (1-12), both inclusive.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AcademicYear {
    pub year: i32,
    pub status: AcademicYearStatus,
    pub start_month: u32,
    pub end_month: u32,
}

impl AcademicYear {
    pub fn is_in_progress(&self) -> bool {
        self.status == AcademicYearStatus::InProgress
    }
}

/// The year in progress, or the first listed year when none is in progress.
pub fn active_year(years: &[AcademicYear]) -> Option<&AcademicYear> {
    years
        .iter()
        .find(|y| y.is_in_progress())
        .or_else(|| years.first())
}
