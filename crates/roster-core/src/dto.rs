//! # DTOs and Mapping
//!
//! Wire shapes for the API and the conversions between them and the stored
//! records. Incoming DTOs keep every field optional so that a missing field
//! surfaces as a validation message instead of a deserialization failure.

use crate::model::{Company, CompanyId, Employee, EmployeeId};
use crate::validation::{
    Validate, ValidationErrors, optional_text, required_min, required_text,
};
use serde::{Deserialize, Serialize};

// =============================================================================
// OUTGOING
// =============================================================================

/// Company as returned to clients.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompanyDto {
    pub id: CompanyId,
    pub name: String,
    pub full_address: String,
}

impl From<&Company> for CompanyDto {
    fn from(company: &Company) -> Self {
        let full_address = format!("{} {}", company.address, company.country)
            .trim()
            .to_string();
        Self {
            id: company.id,
            name: company.name.clone(),
            full_address,
        }
    }
}

/// Employee as returned to clients.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EmployeeDto {
    pub id: EmployeeId,
    pub name: String,
    pub age: u32,
    pub position: String,
}

impl From<&Employee> for EmployeeDto {
    fn from(employee: &Employee) -> Self {
        Self {
            id: employee.id,
            name: employee.name.clone(),
            age: employee.age,
            position: employee.position.clone(),
        }
    }
}

// =============================================================================
// EMPLOYEE INPUT
// =============================================================================

const EMPLOYEE_NAME_MAX: usize = 30;
const EMPLOYEE_POSITION_MAX: usize = 20;
const CREATION_MIN_AGE: i64 = 14;
const UPDATE_MIN_AGE: i64 = 12;

fn validate_employee_fields(
    name: Option<&str>,
    age: Option<i64>,
    position: Option<&str>,
    min_age: i64,
) -> ValidationErrors {
    let mut errors = ValidationErrors::new();
    required_text(
        &mut errors,
        "name",
        name,
        EMPLOYEE_NAME_MAX,
        "Employee name is a required field.",
        "Maximum length for the Name is 30 characters.",
    );
    required_min(
        &mut errors,
        "age",
        age,
        min_age,
        "Age is a required field.",
        &format!("Age is required and it can't be lower than {min_age}"),
    );
    required_text(
        &mut errors,
        "position",
        position,
        EMPLOYEE_POSITION_MAX,
        "Position is a required field.",
        "Maximum length for the Position is 20 characters.",
    );
    errors
}

fn age_of(age: Option<i64>) -> u32 {
    age.and_then(|a| u32::try_from(a).ok()).unwrap_or_default()
}

/// Payload for creating an employee.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EmployeeForCreation {
    pub name: Option<String>,
    pub age: Option<i64>,
    pub position: Option<String>,
}

impl Validate for EmployeeForCreation {
    fn validate(&self) -> Result<(), ValidationErrors> {
        validate_employee_fields(
            self.name.as_deref(),
            self.age,
            self.position.as_deref(),
            CREATION_MIN_AGE,
        )
        .into_result()
    }
}

impl EmployeeForCreation {
    /// Build the stored record. Call after [`Validate::validate`].
    #[must_use]
    pub fn into_employee(self, company_id: CompanyId) -> Employee {
        Employee {
            id: EmployeeId::new_v4(),
            name: self.name.unwrap_or_default(),
            age: age_of(self.age),
            position: self.position.unwrap_or_default(),
            company_id,
        }
    }
}

/// Payload for replacing an employee, and the document a PATCH applies to.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EmployeeForUpdate {
    pub name: Option<String>,
    pub age: Option<i64>,
    pub position: Option<String>,
}

impl Validate for EmployeeForUpdate {
    fn validate(&self) -> Result<(), ValidationErrors> {
        validate_employee_fields(
            self.name.as_deref(),
            self.age,
            self.position.as_deref(),
            UPDATE_MIN_AGE,
        )
        .into_result()
    }
}

impl EmployeeForUpdate {
    /// Copy every field onto an existing record. Call after validation.
    pub fn apply_to(self, employee: &mut Employee) {
        employee.name = self.name.unwrap_or_default();
        employee.age = age_of(self.age);
        employee.position = self.position.unwrap_or_default();
    }
}

impl From<&Employee> for EmployeeForUpdate {
    fn from(employee: &Employee) -> Self {
        Self {
            name: Some(employee.name.clone()),
            age: Some(i64::from(employee.age)),
            position: Some(employee.position.clone()),
        }
    }
}

// =============================================================================
// COMPANY INPUT
// =============================================================================

const COMPANY_NAME_MAX: usize = 60;
const COMPANY_ADDRESS_MAX: usize = 60;

fn validate_company_fields(
    name: Option<&str>,
    address: Option<&str>,
    country: Option<&str>,
    employees: Option<&[EmployeeForCreation]>,
) -> ValidationErrors {
    let mut errors = ValidationErrors::new();
    required_text(
        &mut errors,
        "name",
        name,
        COMPANY_NAME_MAX,
        "Company name is a required field.",
        "Maximum length for the Name is 60 characters.",
    );
    required_text(
        &mut errors,
        "address",
        address,
        COMPANY_ADDRESS_MAX,
        "Company address is a required field.",
        "Maximum length for the Address is 60 characters.",
    );
    optional_text(
        &mut errors,
        "country",
        country,
        COMPANY_ADDRESS_MAX,
        "Maximum length for the Country is 60 characters.",
    );
    for (index, employee) in employees.unwrap_or_default().iter().enumerate() {
        if let Err(nested) = employee.validate() {
            errors.merge_prefixed(&format!("employees[{index}]"), nested);
        }
    }
    errors
}

/// Payload for creating a company, optionally with its first employees.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompanyForCreation {
    pub name: Option<String>,
    pub address: Option<String>,
    pub country: Option<String>,
    pub employees: Option<Vec<EmployeeForCreation>>,
}

impl Validate for CompanyForCreation {
    fn validate(&self) -> Result<(), ValidationErrors> {
        validate_company_fields(
            self.name.as_deref(),
            self.address.as_deref(),
            self.country.as_deref(),
            self.employees.as_deref(),
        )
        .into_result()
    }
}

impl CompanyForCreation {
    /// Build the company and any nested employees. Call after validation.
    #[must_use]
    pub fn into_records(self) -> (Company, Vec<Employee>) {
        let company = Company {
            id: CompanyId::new_v4(),
            name: self.name.unwrap_or_default(),
            address: self.address.unwrap_or_default(),
            country: self.country.unwrap_or_default(),
        };
        let employees = self
            .employees
            .unwrap_or_default()
            .into_iter()
            .map(|e| e.into_employee(company.id))
            .collect();
        (company, employees)
    }
}

/// Payload for replacing a company. Nested employees are added, not replaced.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompanyForUpdate {
    pub name: Option<String>,
    pub address: Option<String>,
    pub country: Option<String>,
    pub employees: Option<Vec<EmployeeForCreation>>,
}

impl Validate for CompanyForUpdate {
    fn validate(&self) -> Result<(), ValidationErrors> {
        validate_company_fields(
            self.name.as_deref(),
            self.address.as_deref(),
            self.country.as_deref(),
            self.employees.as_deref(),
        )
        .into_result()
    }
}

impl CompanyForUpdate {
    /// Overwrite the company fields and return the employees to add.
    #[must_use]
    pub fn apply_to(self, company: &mut Company) -> Vec<Employee> {
        company.name = self.name.unwrap_or_default();
        company.address = self.address.unwrap_or_default();
        company.country = self.country.unwrap_or_default();
        self.employees
            .unwrap_or_default()
            .into_iter()
            .map(|e| e.into_employee(company.id))
            .collect()
    }
}

// =============================================================================
// USERS
// =============================================================================

/// Payload for `POST /api/auth/register`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserForRegistration {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub user_name: Option<String>,
    pub password: Option<String>,
    pub email: Option<String>,
    pub phone_number: Option<String>,
    #[serde(default)]
    pub roles: Vec<String>,
}

impl Validate for UserForRegistration {
    fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();
        required_text(
            &mut errors,
            "userName",
            self.user_name.as_deref(),
            256,
            "Username is required.",
            "Username is too long.",
        );
        required_text(
            &mut errors,
            "password",
            self.password.as_deref(),
            256,
            "Password is required.",
            "Password is too long.",
        );
        required_text(
            &mut errors,
            "email",
            self.email.as_deref(),
            256,
            "Email is required.",
            "Email is too long.",
        );
        errors.into_result()
    }
}

/// Payload for `POST /api/auth/login`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserForAuthentication {
    pub user_name: Option<String>,
    pub password: Option<String>,
}

impl Validate for UserForAuthentication {
    fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();
        required_text(
            &mut errors,
            "userName",
            self.user_name.as_deref(),
            256,
            "User name is required",
            "User name is too long.",
        );
        required_text(
            &mut errors,
            "password",
            self.password.as_deref(),
            256,
            "Password name is required",
            "Password is too long.",
        );
        errors.into_result()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn employee(name: &str, age: i64, position: &str) -> EmployeeForCreation {
        EmployeeForCreation {
            name: Some(name.to_string()),
            age: Some(age),
            position: Some(position.to_string()),
        }
    }

    #[test]
    fn company_dto_joins_address_and_country() {
        let company = Company {
            id: CompanyId::new_v4(),
            name: "IT_Solutions Ltd".into(),
            address: "583 Wall Dr. Gwynn Oak, MD 21207".into(),
            country: "USA".into(),
        };
        let dto = CompanyDto::from(&company);
        assert_eq!(dto.full_address, "583 Wall Dr. Gwynn Oak, MD 21207 USA");
    }

    #[test]
    fn company_dto_serializes_camel_case() {
        let company = Company {
            id: CompanyId::new_v4(),
            name: "n".into(),
            address: "a".into(),
            country: String::new(),
        };
        let json = serde_json::to_value(CompanyDto::from(&company)).unwrap_or_default();
        assert_eq!(json["fullAddress"], "a");
    }

    #[test]
    fn creation_requires_age_of_fourteen() {
        let errors = employee("Sam", 13, "Dev").validate().err().unwrap_or_default();
        assert_eq!(
            errors.field("age"),
            ["Age is required and it can't be lower than 14"]
        );
        assert!(employee("Sam", 14, "Dev").validate().is_ok());
    }

    #[test]
    fn update_allows_age_twelve() {
        let update = EmployeeForUpdate {
            name: Some("Sam".into()),
            age: Some(12),
            position: Some("Dev".into()),
        };
        assert!(update.validate().is_ok());
    }

    #[test]
    fn missing_fields_report_required_messages() {
        let errors = EmployeeForCreation::default()
            .validate()
            .err()
            .unwrap_or_default();
        assert_eq!(errors.field("name"), ["Employee name is a required field."]);
        assert_eq!(errors.field("age"), ["Age is a required field."]);
        assert_eq!(errors.field("position"), ["Position is a required field."]);
    }

    #[test]
    fn length_limits_are_enforced() {
        let errors = employee(&"x".repeat(31), 20, &"y".repeat(21))
            .validate()
            .err()
            .unwrap_or_default();
        assert_eq!(
            errors.field("name"),
            ["Maximum length for the Name is 30 characters."]
        );
        assert_eq!(
            errors.field("position"),
            ["Maximum length for the Position is 20 characters."]
        );
    }

    #[test]
    fn nested_employee_errors_are_prefixed() {
        let company = CompanyForCreation {
            name: Some("Acme".into()),
            address: Some("1 Road".into()),
            country: None,
            employees: Some(vec![employee("Ok", 30, "Dev"), employee("", 30, "Dev")]),
        };
        let errors = company.validate().err().unwrap_or_default();
        assert_eq!(
            errors.field("employees[1].name"),
            ["Employee name is a required field."]
        );
        assert!(errors.field("employees[0].name").is_empty());
    }

    #[test]
    fn company_creation_builds_owned_employees() {
        let company = CompanyForCreation {
            name: Some("Acme".into()),
            address: Some("1 Road".into()),
            country: Some("UK".into()),
            employees: Some(vec![employee("Ann", 30, "Dev")]),
        };
        let (company, employees) = company.into_records();
        assert_eq!(employees.len(), 1);
        assert_eq!(employees[0].company_id, company.id);
    }

    #[test]
    fn update_dto_reverse_maps_from_employee() {
        let record = employee("Ann", 30, "Dev").into_employee(CompanyId::new_v4());
        let dto = EmployeeForUpdate::from(&record);
        assert_eq!(dto.age, Some(30));

        let mut copy = record.clone();
        EmployeeForUpdate {
            name: Some("Bea".into()),
            ..dto
        }
        .apply_to(&mut copy);
        assert_eq!(copy.name, "Bea");
        assert_eq!(copy.id, record.id);
    }
}
