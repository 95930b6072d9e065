//! Company endpoints.

use super::AppState;
use super::error::ApiError;
use super::negotiate::{Negotiated, base_url, location, parse_body, represent, validated};
use super::versioning::ApiVersion;
use axum::body::Bytes;
use axum::extract::{Extension, Path, State};
use axum::http::{HeaderMap, StatusCode, header};
use axum::response::{IntoResponse, Response};
use roster_core::formats::{MediaType, XmlNames};
use roster_core::model::{Company, Employee};
use roster_core::{
    CompanyDto, CompanyForCreation, CompanyForUpdate, CompanyId, CompanyRepository, Validate,
    ValidationErrors,
};
use uuid::Uuid;

const COMPANIES_XML: XmlNames = XmlNames::new("companies", "company");
const COMPANY_XML: XmlNames = XmlNames::new("company", "item");

fn not_found(id: CompanyId) -> ApiError {
    let message = format!("Company with id: {id} doesn't exist in the database.");
    tracing::info!("{message}");
    ApiError::NotFound(message)
}

async fn list_for_version(
    state: &AppState,
    version: ApiVersion,
    media: &MediaType,
) -> Result<Response, ApiError> {
    let companies = state.with_store(|store| store.all_companies()).await?;
    let value = if version == ApiVersion::V2 {
        serde_json::to_value(&companies)?
    } else {
        let dtos: Vec<CompanyDto> = companies.iter().map(CompanyDto::from).collect();
        serde_json::to_value(dtos)?
    };
    represent(StatusCode::OK, &value, media, COMPANIES_XML)
}

/// `GET /api/companies`
pub async fn list(
    State(state): State<AppState>,
    Extension(version): Extension<ApiVersion>,
    Negotiated(media): Negotiated,
) -> Result<Response, ApiError> {
    list_for_version(&state, version, &media).await
}

/// `GET /api/{version}/companies`
pub async fn list_versioned(
    State(state): State<AppState>,
    Path(version): Path<String>,
    Negotiated(media): Negotiated,
) -> Result<Response, ApiError> {
    let version = ApiVersion::resolve(&version)?;
    list_for_version(&state, version, &media).await
}

/// `OPTIONS /api/companies`
pub async fn options() -> impl IntoResponse {
    (StatusCode::OK, [(header::ALLOW, "GET, OPTIONS, POST")])
}

/// `GET /api/companies/{id}`
pub async fn get_one(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Negotiated(media): Negotiated,
) -> Result<Response, ApiError> {
    let id = CompanyId(id);
    let company = state
        .with_store(move |store| store.company(id))
        .await?
        .ok_or_else(|| not_found(id))?;
    let value = serde_json::to_value(CompanyDto::from(&company))?;
    represent(StatusCode::OK, &value, &media, COMPANY_XML)
}

/// `POST /api/companies`
pub async fn create(
    State(state): State<AppState>,
    headers: HeaderMap,
    Negotiated(media): Negotiated,
    body: Bytes,
) -> Result<Response, ApiError> {
    let dto: CompanyForCreation = validated(&body, "CompanyForCreationDto object is null")?;
    let (company, employees) = dto.into_records();
    let stored = company.clone();
    state
        .with_store(move |store| store.create_company(&stored, &employees))
        .await?;
    tracing::info!(company = %company.id, "company created");

    let url = format!("{}/api/companies/{}", base_url(&state.config, &headers), company.id);
    let value = serde_json::to_value(CompanyDto::from(&company))?;
    let mut response = represent(StatusCode::CREATED, &value, &media, COMPANY_XML)?;
    response.headers_mut().extend(location(&url)?);
    Ok(response)
}

/// Parse `(id1,id2,...)` or `id1,id2`. Duplicates are dropped, order kept.
fn parse_ids(raw: &str) -> Option<Vec<CompanyId>> {
    let inner = raw.trim().trim_start_matches('(').trim_end_matches(')');
    let mut ids: Vec<CompanyId> = Vec::new();
    for part in inner.split(',') {
        let id = CompanyId(Uuid::parse_str(part.trim()).ok()?);
        if !ids.contains(&id) {
            ids.push(id);
        }
    }
    Some(ids)
}

/// `GET /api/companies/collection/({ids})`
pub async fn collection(
    State(state): State<AppState>,
    Path(raw): Path<String>,
    Negotiated(media): Negotiated,
) -> Result<Response, ApiError> {
    let Some(ids) = parse_ids(&raw).filter(|ids| !ids.is_empty()) else {
        tracing::error!("Parameter ids is null");
        return Err(ApiError::BadRequest("Parameter ids is null".to_string()));
    };

    let wanted = ids.len();
    let companies = state
        .with_store(move |store| store.companies_by_ids(&ids))
        .await?;
    if companies.len() != wanted {
        tracing::error!("Some ids are not valid in a collection");
        return Err(ApiError::NotFound(
            "Some ids are not valid in a collection".to_string(),
        ));
    }

    let dtos: Vec<CompanyDto> = companies.iter().map(CompanyDto::from).collect();
    represent(StatusCode::OK, &serde_json::to_value(dtos)?, &media, COMPANIES_XML)
}

/// `POST /api/companies/collection`
pub async fn create_collection(
    State(state): State<AppState>,
    headers: HeaderMap,
    Negotiated(media): Negotiated,
    body: Bytes,
) -> Result<Response, ApiError> {
    let dtos: Vec<CompanyForCreation> = parse_body(&body, "Company collection is null")?;
    if dtos.is_empty() {
        tracing::error!("Company collection sent from client is empty.");
        return Err(ApiError::BadRequest("Company collection is null".to_string()));
    }

    let mut errors = ValidationErrors::new();
    for (i, dto) in dtos.iter().enumerate() {
        if let Err(e) = dto.validate() {
            errors.merge_prefixed(&format!("[{i}]"), e);
        }
    }
    if !errors.is_empty() {
        return Err(ApiError::Unprocessable(errors));
    }

    let batch: Vec<(Company, Vec<Employee>)> =
        dtos.into_iter().map(CompanyForCreation::into_records).collect();
    let companies: Vec<Company> = batch.iter().map(|(c, _)| c.clone()).collect();
    state
        .with_store(move |store| store.create_companies(&batch))
        .await?;
    tracing::info!(count = companies.len(), "company collection created");

    let ids = companies
        .iter()
        .map(|c| c.id.to_string())
        .collect::<Vec<_>>()
        .join(",");
    let url = format!(
        "{}/api/companies/collection/({ids})",
        base_url(&state.config, &headers)
    );
    let dtos: Vec<CompanyDto> = companies.iter().map(CompanyDto::from).collect();
    let mut response = represent(
        StatusCode::CREATED,
        &serde_json::to_value(dtos)?,
        &media,
        COMPANIES_XML,
    )?;
    response.headers_mut().extend(location(&url)?);
    Ok(response)
}

/// `PUT /api/companies/{id}`
pub async fn update(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    body: Bytes,
) -> Result<StatusCode, ApiError> {
    let dto: CompanyForUpdate = validated(&body, "CompanyForUpdateDto object is null")?;
    let id = CompanyId(id);

    let updated = state
        .with_store(move |store| {
            let Some(mut company) = store.company(id)? else {
                return Ok(false);
            };
            let new_employees = dto.apply_to(&mut company);
            store.update_company(&company, &new_employees)
        })
        .await?;

    if !updated {
        return Err(not_found(id));
    }
    Ok(StatusCode::NO_CONTENT)
}

/// `DELETE /api/companies/{id}`
pub async fn delete(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    let id = CompanyId(id);
    if !state.with_store(move |store| store.delete_company(id)).await? {
        return Err(not_found(id));
    }
    tracing::info!(company = %id, "company deleted");
    Ok(StatusCode::NO_CONTENT)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_with_and_without_parentheses() {
        let a = Uuid::from_u128(1);
        let b = Uuid::from_u128(2);
        let raw = format!("({a}, {b})");
        assert_eq!(parse_ids(&raw), Some(vec![CompanyId(a), CompanyId(b)]));
        assert_eq!(parse_ids(&format!("{a},{a}")), Some(vec![CompanyId(a)]));
    }

    #[test]
    fn malformed_ids_are_rejected() {
        assert_eq!(parse_ids("(not-a-guid)"), None);
        assert_eq!(parse_ids("()"), None);
    }
}
