//! Records owned by the school administration application.
//!
//! The engine only ever reads these. Field names and enum labels follow the
//! JSON the application stores (camelCase keys, Portuguese labels) so a
//! snapshot can be handed over without translation.

pub mod academic_year;
pub mod settings;
pub mod student;

pub use academic_year::{AcademicYear, AcademicYearStatus};
pub use settings::{ClassFee, FinancialSettings};
pub use student::{
    ExtraCharge, FinancialProfile, PaymentRecord, PaymentType, ProfileStatus, Student,
    StudentStatus,
};
