//! # Roster Core
//!
//! The synchronous half of Roster: everything between the HTTP layer and the
//! database that does not need a runtime.
//!
//! - `model`: stored records (companies, employees, users, roles)
//! - `dto` + `validation`: wire shapes, mapping and input rules
//! - `params`, `query`, `paging`: list request features
//! - `shaping`, `links`: the representation pipeline (field selection + HATEOAS)
//! - `patch`: RFC 6902 JSON Patch over DTO documents
//! - `formats`: media type negotiation and JSON/XML/CSV encoders
//! - `cache`: TTL-aware LRU used by the server-side response cache
//! - `security`: password hashing and policy
//! - `storage`: redb-backed repositories

pub mod cache;
pub mod dto;
pub mod formats;
pub mod links;
pub mod model;
pub mod paging;
pub mod params;
pub mod patch;
pub mod query;
pub mod security;
pub mod shaping;
pub mod storage;
pub mod validation;

pub use dto::{
    CompanyDto, CompanyForCreation, CompanyForUpdate, EmployeeDto, EmployeeForCreation,
    EmployeeForUpdate, UserForAuthentication, UserForRegistration,
};
pub use model::{Company, CompanyId, Employee, EmployeeId, Role, User, UserId};
pub use paging::{MetaData, PagedList};
pub use params::{EmployeeParameters, RequestParameters};
pub use shaping::{DataShaper, Entity, ShapedEntity};
pub use storage::{
    CompanyRepository, EmployeeRepository, StoreError, Store, UserRepository,
};
pub use validation::{Validate, ValidationErrors};
