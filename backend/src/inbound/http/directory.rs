//! Doctor and patient directory handlers.
//!
//! ```text
//! GET  /api/v1/doctors
//! POST /api/v1/doctors
//! PUT  /api/v1/doctors/{id}
//! GET  /api/v1/patients
//! POST /api/v1/patients
//! PUT  /api/v1/patients/{id}
//! GET  /api/v1/patients/{id}/logs
//! ```
//!
//! Creating a record provisions a login account. The generated password is
//! returned once in the `201` body and never stored in clear.

use actix_web::{HttpResponse, get, post, put, web};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::domain::{
    AddressParts, Doctor, DoctorDraft, DoctorForm, GeneratedCredentials, Patient, PatientDraft,
    PatientForm, PatientLogs,
};
use crate::inbound::http::ApiResult;
use crate::inbound::http::schemas::ErrorSchema;
use crate::inbound::http::session::SessionContext;
use crate::inbound::http::state::HttpState;
use crate::inbound::http::validation::field_error;

/// Doctor form as submitted by the console.
#[derive(Debug, Clone, Default, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DoctorBody {
    pub first_name: String,
    pub middle_name: Option<String>,
    pub last_name: String,
    #[schema(example = "jose.rizal@clinic.test")]
    pub email: String,
    pub specialization: Option<String>,
    pub phone_number: Option<String>,
    #[serde(default)]
    pub street: String,
    #[serde(default)]
    pub barangay: String,
    #[serde(default)]
    pub city: String,
    #[serde(default)]
    pub province: String,
    pub gender: Option<String>,
    pub prc_license: Option<String>,
    pub hospital_affiliate: Option<String>,
}

impl From<DoctorBody> for DoctorForm {
    fn from(body: DoctorBody) -> Self {
        Self {
            first_name: body.first_name,
            middle_name: body.middle_name,
            last_name: body.last_name,
            email: body.email,
            specialization: body.specialization,
            phone_number: body.phone_number,
            address: AddressParts {
                street: body.street,
                barangay: body.barangay,
                city: body.city,
                province: body.province,
            },
            gender: body.gender,
            prc_license: body.prc_license,
            hospital_affiliate: body.hospital_affiliate,
        }
    }
}

/// Patient form as submitted by the console.
#[derive(Debug, Clone, Default, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PatientBody {
    pub name: String,
    /// Omit to derive a placeholder address from the name.
    pub email: Option<String>,
    pub age: Option<u16>,
    pub gender: Option<String>,
    #[schema(value_type = Option<String>, format = Date, example = "1990-06-19")]
    pub date_of_birth: Option<NaiveDate>,
    pub address: Option<String>,
    pub phone_number: Option<String>,
    pub condition: Option<String>,
    pub doctor_id: Option<i64>,
}

impl From<PatientBody> for PatientForm {
    fn from(body: PatientBody) -> Self {
        Self {
            name: body.name,
            email: body.email,
            age: body.age,
            gender: body.gender,
            date_of_birth: body.date_of_birth,
            address: body.address,
            phone_number: body.phone_number,
            condition: body.condition,
            doctor_id: body.doctor_id,
        }
    }
}

/// One-time credentials handed to the administrator.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CredentialsResponse {
    pub name: String,
    pub email: String,
    #[schema(example = "aB3dE5gH")]
    pub password: String,
}

impl From<GeneratedCredentials> for CredentialsResponse {
    fn from(credentials: GeneratedCredentials) -> Self {
        Self {
            name: credentials.name,
            email: credentials.email.to_string(),
            password: credentials.password.expose().to_owned(),
        }
    }
}

#[derive(Debug, Serialize)]
struct Provisioned<T> {
    record: T,
    credentials: CredentialsResponse,
}

/// Active doctors, alphabetical.
#[utoipa::path(
    get,
    path = "/api/v1/doctors",
    responses(
        (status = 200, description = "Doctors that are not archived"),
        (status = 401, description = "Not signed in", body = ErrorSchema)
    ),
    tags = ["directory"],
    operation_id = "listDoctors"
)]
#[get("/doctors")]
pub async fn list_doctors(
    state: web::Data<HttpState>,
    session: SessionContext,
) -> ApiResult<web::Json<Vec<Doctor>>> {
    session.require_admin()?;
    Ok(web::Json(state.directory.doctors().await?))
}

/// Register a doctor and provision their login.
#[utoipa::path(
    post,
    path = "/api/v1/doctors",
    request_body = DoctorBody,
    responses(
        (status = 201, description = "Doctor created; body carries one-time credentials"),
        (status = 400, description = "Invalid request", body = ErrorSchema),
        (status = 401, description = "Not signed in", body = ErrorSchema),
        (status = 409, description = "Email already in use", body = ErrorSchema)
    ),
    tags = ["directory"],
    operation_id = "createDoctor"
)]
#[post("/doctors")]
pub async fn create_doctor(
    state: web::Data<HttpState>,
    session: SessionContext,
    payload: web::Json<DoctorBody>,
) -> ApiResult<HttpResponse> {
    session.require_admin()?;
    let draft = DoctorDraft::try_from_form(payload.into_inner().into()).map_err(field_error)?;
    let provisioned = state.directory_commands.provision_doctor(draft).await?;
    Ok(HttpResponse::Created().json(Provisioned {
        record: provisioned.doctor,
        credentials: provisioned.credentials.into(),
    }))
}

/// Edit a doctor's profile. The login email is not changed here.
#[utoipa::path(
    put,
    path = "/api/v1/doctors/{id}",
    params(("id" = i64, Path, description = "Doctor id")),
    request_body = DoctorBody,
    responses(
        (status = 200, description = "Updated doctor"),
        (status = 400, description = "Invalid request", body = ErrorSchema),
        (status = 401, description = "Not signed in", body = ErrorSchema),
        (status = 404, description = "Unknown doctor", body = ErrorSchema)
    ),
    tags = ["directory"],
    operation_id = "updateDoctor"
)]
#[put("/doctors/{id}")]
pub async fn update_doctor(
    state: web::Data<HttpState>,
    session: SessionContext,
    path: web::Path<i64>,
    payload: web::Json<DoctorBody>,
) -> ApiResult<web::Json<Doctor>> {
    session.require_admin()?;
    let draft = DoctorDraft::try_from_form(payload.into_inner().into()).map_err(field_error)?;
    let doctor = state
        .directory_commands
        .update_doctor(path.into_inner(), draft.profile)
        .await?;
    Ok(web::Json(doctor))
}

/// Active patients, newest first.
#[utoipa::path(
    get,
    path = "/api/v1/patients",
    responses(
        (status = 200, description = "Patients that are not archived"),
        (status = 401, description = "Not signed in", body = ErrorSchema)
    ),
    tags = ["directory"],
    operation_id = "listPatients"
)]
#[get("/patients")]
pub async fn list_patients(
    state: web::Data<HttpState>,
    session: SessionContext,
) -> ApiResult<web::Json<Vec<Patient>>> {
    session.require_admin()?;
    Ok(web::Json(state.directory.patients().await?))
}

/// Register a patient and provision their login.
#[utoipa::path(
    post,
    path = "/api/v1/patients",
    request_body = PatientBody,
    responses(
        (status = 201, description = "Patient created; body carries one-time credentials"),
        (status = 400, description = "Invalid request", body = ErrorSchema),
        (status = 401, description = "Not signed in", body = ErrorSchema),
        (status = 409, description = "Email already in use", body = ErrorSchema)
    ),
    tags = ["directory"],
    operation_id = "createPatient"
)]
#[post("/patients")]
pub async fn create_patient(
    state: web::Data<HttpState>,
    session: SessionContext,
    payload: web::Json<PatientBody>,
) -> ApiResult<HttpResponse> {
    session.require_admin()?;
    let draft = PatientDraft::try_from_form(payload.into_inner().into()).map_err(field_error)?;
    let provisioned = state.directory_commands.provision_patient(draft).await?;
    Ok(HttpResponse::Created().json(Provisioned {
        record: provisioned.patient,
        credentials: provisioned.credentials.into(),
    }))
}

/// Edit a patient's profile.
#[utoipa::path(
    put,
    path = "/api/v1/patients/{id}",
    params(("id" = i64, Path, description = "Patient id")),
    request_body = PatientBody,
    responses(
        (status = 200, description = "Updated patient"),
        (status = 400, description = "Invalid request", body = ErrorSchema),
        (status = 401, description = "Not signed in", body = ErrorSchema),
        (status = 404, description = "Unknown patient", body = ErrorSchema)
    ),
    tags = ["directory"],
    operation_id = "updatePatient"
)]
#[put("/patients/{id}")]
pub async fn update_patient(
    state: web::Data<HttpState>,
    session: SessionContext,
    path: web::Path<i64>,
    payload: web::Json<PatientBody>,
) -> ApiResult<web::Json<Patient>> {
    session.require_admin()?;
    let draft = PatientDraft::try_from_form(payload.into_inner().into()).map_err(field_error)?;
    let patient = state
        .directory_commands
        .update_patient(path.into_inner(), draft.profile)
        .await?;
    Ok(web::Json(patient))
}

/// Glucose readings, meals, activities and logins for one patient.
#[utoipa::path(
    get,
    path = "/api/v1/patients/{id}/logs",
    params(("id" = i64, Path, description = "Patient id")),
    responses(
        (status = 200, description = "Patient activity logs"),
        (status = 401, description = "Not signed in", body = ErrorSchema),
        (status = 503, description = "Backend unavailable", body = ErrorSchema)
    ),
    tags = ["directory"],
    operation_id = "patientLogs"
)]
#[get("/patients/{id}/logs")]
pub async fn patient_logs(
    state: web::Data<HttpState>,
    session: SessionContext,
    path: web::Path<i64>,
) -> ApiResult<web::Json<PatientLogs>> {
    session.require_admin()?;
    Ok(web::Json(
        state.directory.patient_logs(path.into_inner()).await?,
    ))
}

#[cfg(test)]
#[path = "directory_tests.rs"]
mod tests;
