//! # Storage Module
//!
//! Repository traits over the embedded redb database.
//!
//! Uses redb for:
//! - ACID transactions (each repository write is one write transaction)
//! - Crash safety (copy-on-write B-trees)
//! - MVCC (concurrent readers, single writer)

mod redb_store;
mod seed;

pub use redb_store::{Store, StoreStats};
pub use seed::{ADMIN_SOLUTIONS, IT_SOLUTIONS};

use crate::model::{Company, CompanyId, Employee, EmployeeId, User};
use crate::paging::PagedList;
use crate::params::EmployeeParameters;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(#[from] redb::Error),

    #[error("record encoding error: {0}")]
    Encoding(#[from] postcard::Error),

    #[error("Username '{0}' is already taken.")]
    DuplicateUserName(String),

    #[error("Email '{0}' is already taken.")]
    DuplicateEmail(String),

    #[error("Role {0} does not exist.")]
    UnknownRole(String),
}

impl StoreError {
    /// Identity-style error code, used as the key in registration error maps.
    #[must_use]
    pub fn code(&self) -> &'static str {
        match self {
            Self::Database(_) | Self::Encoding(_) => "Storage",
            Self::DuplicateUserName(_) => "DuplicateUserName",
            Self::DuplicateEmail(_) => "DuplicateEmail",
            Self::UnknownRole(_) => "RoleNotFound",
        }
    }

    /// Whether the caller sent bad input, as opposed to a storage failure.
    #[must_use]
    pub fn is_conflict(&self) -> bool {
        matches!(
            self,
            Self::DuplicateUserName(_) | Self::DuplicateEmail(_) | Self::UnknownRole(_)
        )
    }
}

macro_rules! redb_error_from {
    ($($ty:ty),* $(,)?) => {
        $(
            impl From<$ty> for StoreError {
                fn from(err: $ty) -> Self {
                    Self::Database(err.into())
                }
            }
        )*
    };
}

redb_error_from!(
    redb::DatabaseError,
    redb::TransactionError,
    redb::TableError,
    redb::StorageError,
    redb::CommitError,
);

pub type StoreResult<T> = Result<T, StoreError>;

pub trait CompanyRepository {
    /// Every company, ordered by name.
    fn all_companies(&self) -> StoreResult<Vec<Company>>;

    fn company(&self, id: CompanyId) -> StoreResult<Option<Company>>;

    /// The companies among `ids` that exist, in the order requested.
    fn companies_by_ids(&self, ids: &[CompanyId]) -> StoreResult<Vec<Company>>;

    /// Insert a company together with its initial employees.
    fn create_company(&self, company: &Company, employees: &[Employee]) -> StoreResult<()>;

    /// Insert several companies in one transaction.
    fn create_companies(&self, batch: &[(Company, Vec<Employee>)]) -> StoreResult<()>;

    /// Overwrite a company and add `new_employees`. `false` if it does not exist.
    fn update_company(&self, company: &Company, new_employees: &[Employee]) -> StoreResult<bool>;

    /// Delete a company and every employee it owns. `false` if it does not exist.
    fn delete_company(&self, id: CompanyId) -> StoreResult<bool>;
}

pub trait EmployeeRepository {
    /// A company's employees, ordered by name.
    fn employees(&self, company_id: CompanyId) -> StoreResult<Vec<Employee>>;

    /// Filter, search, sort, then page.
    fn employees_paged(
        &self,
        company_id: CompanyId,
        params: &EmployeeParameters,
    ) -> StoreResult<PagedList<Employee>>;

    fn employee(&self, company_id: CompanyId, id: EmployeeId) -> StoreResult<Option<Employee>>;

    /// Insert `employee` under `company_id`; the record's own company id is overwritten.
    fn create_employee(&self, company_id: CompanyId, employee: &Employee) -> StoreResult<()>;

    /// `false` if the employee does not exist under its company.
    fn update_employee(&self, employee: &Employee) -> StoreResult<bool>;

    fn delete_employee(&self, company_id: CompanyId, id: EmployeeId) -> StoreResult<bool>;
}

pub trait UserRepository {
    fn role_exists(&self, name: &str) -> StoreResult<bool>;

    fn find_user(&self, user_name: &str) -> StoreResult<Option<User>>;

    /// Insert a user. User names and emails are unique (case-insensitive),
    /// and every role must exist.
    fn create_user(&self, user: &User) -> StoreResult<()>;

    /// The user, if `password` matches the stored hash.
    fn check_password(&self, user_name: &str, password: &str) -> StoreResult<Option<User>>;
}
