//! Directory, archive and report repositories.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use super::client::{GatewayError, RestGateway, eq};
use super::rows::{
    ArchivePatch, CreatedAtRow, DoctorColumns, DoctorRow, NewReportRow, PatientColumns,
    PatientRow, ReportRow, StatusPatch,
};
use crate::domain::ports::{
    ArchiveRepository, ArchiveRepositoryError, DirectoryRepository, DirectoryRepositoryError,
    PatientLogKind, ReportRepository, ReportRepositoryError,
};
use crate::domain::{
    Doctor, DoctorProfile, NewDoctor, NewPatient, NewReport, Patient, PatientProfile, RecordKind,
    Report, ReportStatus,
};

const WITH_ACCOUNT_EMAIL: &str = "*,users:user_id(email)";
const WITH_AUTHOR: &str = "*,users:user_id(full_name)";

fn archived_filter(archived: bool) -> (&'static str, String) {
    ("is_archived", eq(archived))
}

fn first_or_missing<T>(rows: Vec<T>, what: &str) -> Result<T, GatewayError> {
    rows.into_iter()
        .next()
        .ok_or_else(|| GatewayError::decode(format!("{what} returned no row")))
}

/// Gateway-backed doctor and patient directory.
#[derive(Debug, Clone)]
pub struct GatewayDirectoryRepository {
    gateway: RestGateway,
}

impl GatewayDirectoryRepository {
    /// Wrap a shared gateway client.
    pub fn new(gateway: RestGateway) -> Self {
        Self { gateway }
    }
}

#[async_trait]
impl DirectoryRepository for GatewayDirectoryRepository {
    async fn list_doctors(&self, archived: bool) -> Result<Vec<Doctor>, DirectoryRepositoryError> {
        let rows: Vec<DoctorRow> = self
            .gateway
            .select(
                RecordKind::Doctor.table(),
                &[
                    ("select", WITH_ACCOUNT_EMAIL.to_owned()),
                    archived_filter(archived),
                    ("order", "last_name.asc".to_owned()),
                ],
            )
            .await?;
        Ok(rows.into_iter().map(Doctor::from).collect())
    }

    async fn insert_doctor(&self, doctor: &NewDoctor) -> Result<Doctor, DirectoryRepositoryError> {
        let rows: Vec<DoctorRow> = self
            .gateway
            .insert(RecordKind::Doctor.table(), &DoctorColumns::from(doctor))
            .await?;
        Ok(first_or_missing(rows, "doctor insert")?.into())
    }

    async fn update_doctor(
        &self,
        id: i64,
        profile: &DoctorProfile,
    ) -> Result<Option<Doctor>, DirectoryRepositoryError> {
        let rows: Vec<DoctorRow> = self
            .gateway
            .update(
                RecordKind::Doctor.table(),
                &[("id", eq(id)), ("select", WITH_ACCOUNT_EMAIL.to_owned())],
                &DoctorColumns::from(profile),
            )
            .await?;
        Ok(rows.into_iter().next().map(Doctor::from))
    }

    async fn list_patients(
        &self,
        archived: bool,
    ) -> Result<Vec<Patient>, DirectoryRepositoryError> {
        let rows: Vec<PatientRow> = self
            .gateway
            .select(
                RecordKind::Patient.table(),
                &[
                    ("select", WITH_ACCOUNT_EMAIL.to_owned()),
                    archived_filter(archived),
                    ("order", "name.asc".to_owned()),
                ],
            )
            .await?;
        Ok(rows.into_iter().map(Patient::from).collect())
    }

    async fn insert_patient(
        &self,
        patient: &NewPatient,
    ) -> Result<Patient, DirectoryRepositoryError> {
        let rows: Vec<PatientRow> = self
            .gateway
            .insert(RecordKind::Patient.table(), &PatientColumns::from(patient))
            .await?;
        Ok(first_or_missing(rows, "patient insert")?.into())
    }

    async fn update_patient(
        &self,
        id: i64,
        profile: &PatientProfile,
    ) -> Result<Option<Patient>, DirectoryRepositoryError> {
        let rows: Vec<PatientRow> = self
            .gateway
            .update(
                RecordKind::Patient.table(),
                &[("id", eq(id)), ("select", WITH_ACCOUNT_EMAIL.to_owned())],
                &PatientColumns::from(profile),
            )
            .await?;
        Ok(rows.into_iter().next().map(Patient::from))
    }

    async fn patient_created_at(&self) -> Result<Vec<DateTime<Utc>>, DirectoryRepositoryError> {
        let rows: Vec<CreatedAtRow> = self
            .gateway
            .select(
                RecordKind::Patient.table(),
                &[("select", "created_at".to_owned()), archived_filter(false)],
            )
            .await?;
        Ok(rows.into_iter().filter_map(|row| row.created_at).collect())
    }

    async fn patient_log(
        &self,
        kind: PatientLogKind,
        patient_id: i64,
    ) -> Result<Vec<serde_json::Value>, DirectoryRepositoryError> {
        Ok(self
            .gateway
            .select(
                kind.table(),
                &[
                    ("select", "*".to_owned()),
                    ("patient_id", eq(patient_id)),
                    ("order", "created_at.desc".to_owned()),
                ],
            )
            .await?)
    }
}

/// Gateway-backed archive flag store.
#[derive(Debug, Clone)]
pub struct GatewayArchiveRepository {
    gateway: RestGateway,
}

impl GatewayArchiveRepository {
    /// Wrap a shared gateway client.
    pub fn new(gateway: RestGateway) -> Self {
        Self { gateway }
    }
}

#[async_trait]
impl ArchiveRepository for GatewayArchiveRepository {
    async fn set_archived(
        &self,
        kind: RecordKind,
        id: i64,
        archived: bool,
    ) -> Result<bool, ArchiveRepositoryError> {
        let rows: Vec<serde_json::Value> = self
            .gateway
            .update(
                kind.table(),
                &[("id", eq(id)), ("select", "id".to_owned())],
                &ArchivePatch {
                    is_archived: archived,
                },
            )
            .await?;
        Ok(!rows.is_empty())
    }

    async fn count_active(&self, kind: RecordKind) -> Result<u64, ArchiveRepositoryError> {
        Ok(self
            .gateway
            .count(
                kind.table(),
                &[("select", "id".to_owned()), archived_filter(false)],
            )
            .await?)
    }
}

/// Gateway-backed report repository.
#[derive(Debug, Clone)]
pub struct GatewayReportRepository {
    gateway: RestGateway,
}

impl GatewayReportRepository {
    /// Wrap a shared gateway client.
    pub fn new(gateway: RestGateway) -> Self {
        Self { gateway }
    }

    async fn fetch(&self, query: &[(&str, String)]) -> Result<Vec<Report>, GatewayError> {
        let rows: Vec<ReportRow> = self
            .gateway
            .select(RecordKind::Report.table(), query)
            .await?;
        rows.into_iter()
            .map(Report::try_from)
            .collect::<Result<Vec<_>, _>>()
            .map_err(GatewayError::decode)
    }
}

#[async_trait]
impl ReportRepository for GatewayReportRepository {
    async fn list(&self, archived: bool) -> Result<Vec<Report>, ReportRepositoryError> {
        Ok(self
            .fetch(&[
                ("select", WITH_AUTHOR.to_owned()),
                archived_filter(archived),
                ("order", "created_at.desc".to_owned()),
            ])
            .await?)
    }

    async fn recent_pending(&self, limit: usize) -> Result<Vec<Report>, ReportRepositoryError> {
        Ok(self
            .fetch(&[
                ("select", WITH_AUTHOR.to_owned()),
                ("status", eq(ReportStatus::Pending.as_stored())),
                archived_filter(false),
                ("order", "created_at.desc".to_owned()),
                ("limit", limit.to_string()),
            ])
            .await?)
    }

    async fn insert(&self, report: &NewReport) -> Result<Report, ReportRepositoryError> {
        let rows: Vec<ReportRow> = self
            .gateway
            .insert(RecordKind::Report.table(), &NewReportRow::from(report))
            .await?;
        let row = first_or_missing(rows, "report insert")?;
        Ok(Report::try_from(row).map_err(GatewayError::decode)?)
    }

    async fn update_status(
        &self,
        id: i64,
        status: ReportStatus,
    ) -> Result<Option<Report>, ReportRepositoryError> {
        let rows: Vec<ReportRow> = self
            .gateway
            .update(
                RecordKind::Report.table(),
                &[("id", eq(id)), ("select", WITH_AUTHOR.to_owned())],
                &StatusPatch {
                    status: status.as_stored(),
                },
            )
            .await?;
        Ok(rows
            .into_iter()
            .next()
            .map(Report::try_from)
            .transpose()
            .map_err(GatewayError::decode)?)
    }
}
