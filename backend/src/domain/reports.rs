//! Issue reports raised by clinic staff and the dashboard built on them.

use chrono::{DateTime, Datelike, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use super::user::UserId;

/// Number of pending reports shown on the dashboard.
pub const RECENT_PENDING_LIMIT: usize = 6;

/// Workflow state of a report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReportStatus {
    Pending,
    Solved,
}

impl ReportStatus {
    /// Value stored in the `status` column.
    pub const fn as_stored(self) -> &'static str {
        match self {
            Self::Pending => "Pending",
            Self::Solved => "Solved",
        }
    }
}

impl std::str::FromStr for ReportStatus {
    type Err = UnknownReportStatus;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "pending" => Ok(Self::Pending),
            "solved" => Ok(Self::Solved),
            other => Err(UnknownReportStatus(other.to_owned())),
        }
    }
}

/// Raised for an unrecognised status.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown report status: {0}")]
pub struct UnknownReportStatus(pub String);

/// Stored report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Report {
    pub id: i64,
    pub title: String,
    pub report_data: String,
    pub status: ReportStatus,
    pub created_at: DateTime<Utc>,
    pub user_id: Option<UserId>,
    pub author_name: Option<String>,
    pub is_archived: bool,
}

/// Report to insert.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewReport {
    pub title: String,
    pub report_data: String,
    pub user_id: UserId,
    pub created_at: DateTime<Utc>,
}

/// Report form problems.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ReportValidationError {
    /// Title missing.
    #[error("report title must not be empty")]
    EmptyTitle,
    /// Description missing.
    #[error("report description must not be empty")]
    EmptyDescription,
}

impl ReportValidationError {
    /// Payload field at fault.
    pub const fn field(&self) -> &'static str {
        match self {
            Self::EmptyTitle => "title",
            Self::EmptyDescription => "reportData",
        }
    }
}

/// Validated report form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportDraft {
    pub title: String,
    pub report_data: String,
}

impl ReportDraft {
    /// Validate raw inputs.
    pub fn try_from_parts(title: &str, report_data: &str) -> Result<Self, ReportValidationError> {
        let title = title.trim();
        if title.is_empty() {
            return Err(ReportValidationError::EmptyTitle);
        }
        let report_data = report_data.trim();
        if report_data.is_empty() {
            return Err(ReportValidationError::EmptyDescription);
        }
        Ok(Self {
            title: title.to_owned(),
            report_data: report_data.to_owned(),
        })
    }
}

/// Filter applied to the report list.
///
/// Date bounds are inclusive calendar days in UTC; a missing bound is open.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReportFilter {
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
    pub status: Option<ReportStatus>,
}

impl ReportFilter {
    /// Whether `report` passes the filter.
    pub fn matches(&self, report: &Report) -> bool {
        let day = report.created_at.date_naive();
        self.from.is_none_or(|from| day >= from)
            && self.to.is_none_or(|to| day <= to)
            && self.status.is_none_or(|status| report.status == status)
    }

    /// Keep matching reports, preserving order.
    pub fn apply(&self, reports: Vec<Report>) -> Vec<Report> {
        reports
            .into_iter()
            .filter(|report| self.matches(report))
            .collect()
    }
}

/// Headline numbers for the dashboard.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardStats {
    pub patients: u64,
    pub doctors: u64,
    pub reports: u64,
    pub recent_pending: Vec<Report>,
    pub year: i32,
    pub patients_per_month: [u32; 12],
}

/// Count creation timestamps per calendar month of `year`.
///
/// # Examples
/// ```
/// use chrono::{TimeZone, Utc};
/// use clinic_console::domain::patients_per_month;
///
/// let stamps = [
///     Utc.with_ymd_and_hms(2024, 1, 3, 0, 0, 0).unwrap(),
///     Utc.with_ymd_and_hms(2024, 1, 9, 0, 0, 0).unwrap(),
///     Utc.with_ymd_and_hms(2023, 3, 1, 0, 0, 0).unwrap(),
/// ];
/// let buckets = patients_per_month(stamps, 2024);
/// assert_eq!(buckets[0], 2);
/// assert_eq!(buckets[2], 0);
/// ```
pub fn patients_per_month<I>(created: I, year: i32) -> [u32; 12]
where
    I: IntoIterator<Item = DateTime<Utc>>,
{
    let mut buckets = [0_u32; 12];
    for stamp in created.into_iter().filter(|stamp| stamp.year() == year) {
        if let Some(bucket) = usize::try_from(stamp.month0())
            .ok()
            .and_then(|index| buckets.get_mut(index))
        {
            *bucket = bucket.saturating_add(1);
        }
    }
    buckets
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use rstest::rstest;

    fn report(id: i64, day: u32, status: ReportStatus) -> Report {
        Report {
            id,
            title: format!("report {id}"),
            report_data: "details".into(),
            status,
            created_at: Utc
                .with_ymd_and_hms(2024, 6, day, 12, 0, 0)
                .single()
                .expect("valid date"),
            user_id: None,
            author_name: None,
            is_archived: false,
        }
    }

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 6, d).expect("valid date")
    }

    #[rstest]
    #[case(ReportFilter::default(), vec![1, 2, 3])]
    #[case(ReportFilter { from: Some(day(10)), ..ReportFilter::default() }, vec![2, 3])]
    #[case(ReportFilter { to: Some(day(10)), ..ReportFilter::default() }, vec![1, 2])]
    #[case(ReportFilter { from: Some(day(10)), to: Some(day(10)), status: None }, vec![2])]
    #[case(ReportFilter { status: Some(ReportStatus::Solved), ..ReportFilter::default() }, vec![3])]
    fn filter_selects(#[case] filter: ReportFilter, #[case] expected: Vec<i64>) {
        let reports = vec![
            report(1, 1, ReportStatus::Pending),
            report(2, 10, ReportStatus::Pending),
            report(3, 20, ReportStatus::Solved),
        ];
        let ids: Vec<i64> = filter.apply(reports).iter().map(|r| r.id).collect();
        assert_eq!(ids, expected);
    }

    #[rstest]
    #[case("Pending", ReportStatus::Pending)]
    #[case("solved", ReportStatus::Solved)]
    fn status_parses_stored_values(#[case] raw: &str, #[case] status: ReportStatus) {
        assert_eq!(raw.parse::<ReportStatus>(), Ok(status));
        assert!(status.as_stored().eq_ignore_ascii_case(raw));
    }

    #[rstest]
    fn draft_requires_title_and_description() {
        assert_eq!(
            ReportDraft::try_from_parts(" ", "x"),
            Err(ReportValidationError::EmptyTitle)
        );
        assert_eq!(
            ReportDraft::try_from_parts("x", ""),
            Err(ReportValidationError::EmptyDescription)
        );
    }

    #[rstest]
    fn histogram_ignores_other_years() {
        let stamps = vec![
            Utc.with_ymd_and_hms(2024, 12, 31, 23, 0, 0).single().expect("date"),
            Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).single().expect("date"),
        ];
        let buckets = patients_per_month(stamps, 2024);
        assert_eq!(buckets[11], 1);
        assert_eq!(buckets.iter().sum::<u32>(), 1);
    }
}
