//! Employee endpoints, nested under a company.
//!
//! The list endpoint runs the full representation pipeline: parameters,
//! paging, shaping and, for hateoas media types, links. The paging metadata
//! travels in the `X-Pagination` header so the body stays a plain array.

use super::AppState;
use super::error::ApiError;
use super::negotiate::{
    Negotiated, RequiredMediaType, base_url, location, parse_body, represent, validated,
};
use axum::body::Bytes;
use axum::extract::{Path, Query, State};
use axum::http::{HeaderMap, HeaderName, HeaderValue, StatusCode};
use axum::response::Response;
use roster_core::formats::XmlNames;
use roster_core::links::EmployeeLinks;
use roster_core::patch::PatchDocument;
use roster_core::{
    CompanyId, CompanyRepository, DataShaper, EmployeeDto, EmployeeForCreation,
    EmployeeForUpdate, EmployeeId, EmployeeParameters, EmployeeRepository, Validate,
};
use uuid::Uuid;

const X_PAGINATION: HeaderName = HeaderName::from_static("x-pagination");
const EMPLOYEES_XML: XmlNames = XmlNames::new("employees", "employee");
const EMPLOYEE_XML: XmlNames = XmlNames::new("employee", "item");

fn company_not_found(id: CompanyId) -> ApiError {
    let message = format!("Company with id: {id} doesn't exist in the database.");
    tracing::info!("{message}");
    ApiError::NotFound(message)
}

fn employee_not_found(id: EmployeeId) -> ApiError {
    let message = format!("Employee with id: {id} doesn't exist in the database.");
    tracing::info!("{message}");
    ApiError::NotFound(message)
}

/// Look up an employee, distinguishing an unknown company from an unknown employee.
async fn find_employee(
    state: &AppState,
    company_id: CompanyId,
    id: EmployeeId,
) -> Result<roster_core::Employee, ApiError> {
    let (company, employee) = state
        .with_store(move |store| {
            let Some(company) = store.company(company_id)? else {
                return Ok((None, None));
            };
            Ok((Some(company), store.employee(company_id, id)?))
        })
        .await?;
    if company.is_none() {
        return Err(company_not_found(company_id));
    }
    employee.ok_or_else(|| employee_not_found(id))
}

/// `GET /api/companies/{id}/employees`
pub async fn list(
    State(state): State<AppState>,
    Path(company_id): Path<Uuid>,
    Query(query): Query<Vec<(String, String)>>,
    headers: HeaderMap,
    RequiredMediaType(media): RequiredMediaType,
) -> Result<Response, ApiError> {
    let params = EmployeeParameters::from_pairs(
        query.iter().map(|(k, v)| (k.as_str(), v.as_str())),
    )
    .map_err(|err| ApiError::BadRequest(err.to_string()))?;
    if !params.valid_age_range() {
        return Err(ApiError::BadRequest(
            "Max age can't be less than min age.".to_string(),
        ));
    }

    let company_id = CompanyId(company_id);
    let lookup = params.clone();
    let page = state
        .with_store(move |store| {
            if store.company(company_id)?.is_none() {
                return Ok(None);
            }
            store.employees_paged(company_id, &lookup).map(Some)
        })
        .await?
        .ok_or_else(|| company_not_found(company_id))?;

    let meta = serde_json::to_string(&page.meta)?;
    let dtos: Vec<EmployeeDto> = page.items.iter().map(EmployeeDto::from).collect();
    let links = EmployeeLinks::new(&base_url(&state.config, &headers));
    let shaped = links.try_generate_links(&dtos, params.fields(), company_id, &media)?;

    let mut response = represent(StatusCode::OK, &shaped.to_value()?, &media, EMPLOYEES_XML)?;
    let meta = HeaderValue::from_str(&meta).map_err(ApiError::internal)?;
    response.headers_mut().insert(X_PAGINATION, meta);
    Ok(response)
}

/// `GET /api/companies/{id}/employees/{employee_id}`
pub async fn get_one(
    State(state): State<AppState>,
    Path((company_id, id)): Path<(Uuid, Uuid)>,
    Query(query): Query<Vec<(String, String)>>,
    headers: HeaderMap,
    Negotiated(media): Negotiated,
) -> Result<Response, ApiError> {
    let company_id = CompanyId(company_id);
    let employee = find_employee(&state, company_id, EmployeeId(id)).await?;
    let fields = query
        .iter()
        .find(|(key, _)| key.eq_ignore_ascii_case("fields"))
        .map(|(_, value)| value.as_str());

    let dto = EmployeeDto::from(&employee);
    let shaped = DataShaper::<EmployeeDto>::new().shape(&dto, fields)?;
    let mut entity = shaped.entity;
    if media.wants_links() {
        let links = EmployeeLinks::new(&base_url(&state.config, &headers))
            .links_for_employee(company_id, shaped.id, fields);
        entity.insert("links", serde_json::to_value(links)?);
    }
    represent(StatusCode::OK, &entity.into_value(), &media, EMPLOYEE_XML)
}

/// `POST /api/companies/{id}/employees`
pub async fn create(
    State(state): State<AppState>,
    Path(company_id): Path<Uuid>,
    headers: HeaderMap,
    Negotiated(media): Negotiated,
    body: Bytes,
) -> Result<Response, ApiError> {
    let dto: EmployeeForCreation = validated(&body, "EmployeeForCreationDto object is null")?;
    let company_id = CompanyId(company_id);
    let employee = dto.into_employee(company_id);

    let stored = employee.clone();
    let created = state
        .with_store(move |store| {
            if store.company(company_id)?.is_none() {
                return Ok(false);
            }
            store.create_employee(company_id, &stored).map(|()| true)
        })
        .await?;
    if !created {
        return Err(company_not_found(company_id));
    }
    tracing::info!(company = %company_id, employee = %employee.id, "employee created");

    let url = format!(
        "{}/api/companies/{company_id}/employees/{}",
        base_url(&state.config, &headers),
        employee.id
    );
    let value = serde_json::to_value(EmployeeDto::from(&employee))?;
    let mut response = represent(StatusCode::CREATED, &value, &media, EMPLOYEE_XML)?;
    response.headers_mut().extend(location(&url)?);
    Ok(response)
}

/// `PUT /api/companies/{id}/employees/{employee_id}`
pub async fn update(
    State(state): State<AppState>,
    Path((company_id, id)): Path<(Uuid, Uuid)>,
    body: Bytes,
) -> Result<StatusCode, ApiError> {
    let dto: EmployeeForUpdate = validated(&body, "EmployeeForUpdateDto object is null")?;
    let mut employee = find_employee(&state, CompanyId(company_id), EmployeeId(id)).await?;
    dto.apply_to(&mut employee);
    save(&state, employee).await
}

/// `PATCH /api/companies/{id}/employees/{employee_id}`
pub async fn patch(
    State(state): State<AppState>,
    Path((company_id, id)): Path<(Uuid, Uuid)>,
    body: Bytes,
) -> Result<StatusCode, ApiError> {
    let document: PatchDocument = parse_body(&body, "patchDoc object is null")?;
    let mut employee = find_employee(&state, CompanyId(company_id), EmployeeId(id)).await?;

    let patched = document
        .apply_to(&EmployeeForUpdate::from(&employee))
        .map_err(ApiError::Unprocessable)?;
    patched.validate().map_err(ApiError::Unprocessable)?;
    patched.apply_to(&mut employee);
    save(&state, employee).await
}

async fn save(state: &AppState, employee: roster_core::Employee) -> Result<StatusCode, ApiError> {
    let id = employee.id;
    if !state
        .with_store(move |store| store.update_employee(&employee))
        .await?
    {
        return Err(employee_not_found(id));
    }
    Ok(StatusCode::NO_CONTENT)
}

/// `DELETE /api/companies/{id}/employees/{employee_id}`
pub async fn delete(
    State(state): State<AppState>,
    Path((company_id, id)): Path<(Uuid, Uuid)>,
) -> Result<StatusCode, ApiError> {
    let company_id = CompanyId(company_id);
    let id = EmployeeId(id);
    find_employee(&state, company_id, id).await?;
    if !state
        .with_store(move |store| store.delete_employee(company_id, id))
        .await?
    {
        return Err(employee_not_found(id));
    }
    tracing::info!(company = %company_id, employee = %id, "employee deleted");
    Ok(StatusCode::NO_CONTENT)
}
