//! redb-backed implementation of the repository traits.
//!
//! ## Tables
//!
//! | table | key | value |
//! |---|---|---|
//! | `companies` | company id | postcard `Company` |
//! | `employees` | employee id | postcard `Employee` |
//! | `company_employees` | (company id, employee id) | `()` |
//! | `users` | normalized user name | postcard `User` |
//! | `user_emails` | normalized email | normalized user name |
//! | `roles` | normalized role name | display name |
//!
//! Every mutating call opens exactly one write transaction and commits it at
//! the end, so a multi-record write (a company plus its employees, a batch of
//! companies, a cascade delete) is all-or-nothing.

use super::seed::sample_data;
use super::{CompanyRepository, EmployeeRepository, StoreError, StoreResult, UserRepository};
use crate::model::{Company, CompanyId, Employee, EmployeeId, Role, User, normalize};
use crate::paging::PagedList;
use crate::params::EmployeeParameters;
use crate::query;
use crate::security::verify_password;
use redb::backends::InMemoryBackend;
use redb::{
    Database, ReadableDatabase, ReadableTable, ReadableTableMetadata, Table, TableDefinition,
};
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::path::Path;

const COMPANIES: TableDefinition<u128, &[u8]> = TableDefinition::new("companies");
const EMPLOYEES: TableDefinition<u128, &[u8]> = TableDefinition::new("employees");
const COMPANY_EMPLOYEES: TableDefinition<(u128, u128), ()> =
    TableDefinition::new("company_employees");
const USERS: TableDefinition<&str, &[u8]> = TableDefinition::new("users");
const USER_EMAILS: TableDefinition<&str, &str> = TableDefinition::new("user_emails");
const ROLES: TableDefinition<&str, &str> = TableDefinition::new("roles");

/// Record counts reported by `roster status`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct StoreStats {
    pub companies: u64,
    pub employees: u64,
    pub users: u64,
}

/// Handle to the database. Cheap to share behind an `Arc`.
pub struct Store {
    db: Database,
}

impl std::fmt::Debug for Store {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Store").finish_non_exhaustive()
    }
}

impl Store {
    /// Open the database at `path`, creating it when missing.
    pub fn open(path: &Path) -> StoreResult<Self> {
        Self::init(Database::create(path)?)
    }

    /// A fresh database that lives only in memory.
    pub fn in_memory() -> StoreResult<Self> {
        let db = Database::builder().create_with_backend(InMemoryBackend::new())?;
        Self::init(db)
    }

    fn init(db: Database) -> StoreResult<Self> {
        let store = Self { db };
        store.ensure_tables()?;
        store.seed_roles()?;
        Ok(store)
    }

    /// Read transactions fail on tables that were never created.
    fn ensure_tables(&self) -> StoreResult<()> {
        let txn = self.db.begin_write()?;
        txn.open_table(COMPANIES)?;
        txn.open_table(EMPLOYEES)?;
        txn.open_table(COMPANY_EMPLOYEES)?;
        txn.open_table(USERS)?;
        txn.open_table(USER_EMAILS)?;
        txn.open_table(ROLES)?;
        txn.commit()?;
        Ok(())
    }

    /// Insert the built-in roles. Idempotent.
    pub fn seed_roles(&self) -> StoreResult<()> {
        let txn = self.db.begin_write()?;
        {
            let mut roles = txn.open_table(ROLES)?;
            for role in Role::ALL {
                roles.insert(role.normalized().as_str(), role.name())?;
            }
        }
        txn.commit()?;
        Ok(())
    }

    /// Insert the sample companies that are not present yet. Returns how many
    /// companies were added.
    pub fn seed_sample_data(&self) -> StoreResult<usize> {
        let txn = self.db.begin_write()?;
        let mut added = 0;
        {
            let mut companies = txn.open_table(COMPANIES)?;
            let mut employees = txn.open_table(EMPLOYEES)?;
            let mut index = txn.open_table(COMPANY_EMPLOYEES)?;
            for (company, staff) in sample_data() {
                if companies.get(company.id.as_u128())?.is_some() {
                    continue;
                }
                put_company(&mut companies, &company)?;
                for employee in &staff {
                    put_employee(&mut employees, &mut index, employee)?;
                }
                added += 1;
            }
        }
        txn.commit()?;
        Ok(added)
    }

    pub fn stats(&self) -> StoreResult<StoreStats> {
        let txn = self.db.begin_read()?;
        Ok(StoreStats {
            companies: txn.open_table(COMPANIES)?.len()?,
            employees: txn.open_table(EMPLOYEES)?.len()?,
            users: txn.open_table(USERS)?.len()?,
        })
    }
}

// =============================================================================
// RECORD HELPERS
// =============================================================================

type RecordTable<'txn> = Table<'txn, u128, &'static [u8]>;
type IndexTable<'txn> = Table<'txn, (u128, u128), ()>;

fn encode<T: Serialize>(record: &T) -> StoreResult<Vec<u8>> {
    Ok(postcard::to_allocvec(record)?)
}

fn load<T, R>(table: &R, key: u128) -> StoreResult<Option<T>>
where
    T: DeserializeOwned,
    R: ReadableTable<u128, &'static [u8]>,
{
    match table.get(key)? {
        Some(guard) => Ok(Some(postcard::from_bytes(guard.value())?)),
        None => Ok(None),
    }
}

fn load_all<T, R>(table: &R) -> StoreResult<Vec<T>>
where
    T: DeserializeOwned,
    R: ReadableTable<u128, &'static [u8]>,
{
    let mut out = Vec::new();
    for entry in table.iter()? {
        let (_, value) = entry?;
        out.push(postcard::from_bytes(value.value())?);
    }
    Ok(out)
}

fn employee_ids<R>(index: &R, company_id: CompanyId) -> StoreResult<Vec<u128>>
where
    R: ReadableTable<(u128, u128), ()>,
{
    let cid = company_id.as_u128();
    let mut ids = Vec::new();
    for entry in index.range((cid, 0u128)..=(cid, u128::MAX))? {
        let (key, _) = entry?;
        ids.push(key.value().1);
    }
    Ok(ids)
}

fn put_company(table: &mut RecordTable<'_>, company: &Company) -> StoreResult<()> {
    let bytes = encode(company)?;
    table.insert(company.id.as_u128(), bytes.as_slice())?;
    Ok(())
}

fn put_employee(
    table: &mut RecordTable<'_>,
    index: &mut IndexTable<'_>,
    employee: &Employee,
) -> StoreResult<()> {
    let bytes = encode(employee)?;
    table.insert(employee.id.as_u128(), bytes.as_slice())?;
    index.insert((employee.company_id.as_u128(), employee.id.as_u128()), ())?;
    Ok(())
}

fn by_name<T>(mut records: Vec<T>, name: impl Fn(&T) -> &str) -> Vec<T> {
    records.sort_by(|a, b| query::compare_text(name(a), name(b)));
    records
}

// =============================================================================
// COMPANIES
// =============================================================================

impl CompanyRepository for Store {
    fn all_companies(&self) -> StoreResult<Vec<Company>> {
        let txn = self.db.begin_read()?;
        let table = txn.open_table(COMPANIES)?;
        let companies: Vec<Company> = load_all(&table)?;
        Ok(by_name(companies, |c| c.name.as_str()))
    }

    fn company(&self, id: CompanyId) -> StoreResult<Option<Company>> {
        let txn = self.db.begin_read()?;
        let table = txn.open_table(COMPANIES)?;
        load(&table, id.as_u128())
    }

    fn companies_by_ids(&self, ids: &[CompanyId]) -> StoreResult<Vec<Company>> {
        let txn = self.db.begin_read()?;
        let table = txn.open_table(COMPANIES)?;
        let mut out = Vec::with_capacity(ids.len());
        for id in ids {
            if let Some(company) = load(&table, id.as_u128())? {
                out.push(company);
            }
        }
        Ok(out)
    }

    fn create_company(&self, company: &Company, employees: &[Employee]) -> StoreResult<()> {
        self.create_companies(&[(company.clone(), employees.to_vec())])
    }

    fn create_companies(&self, batch: &[(Company, Vec<Employee>)]) -> StoreResult<()> {
        let txn = self.db.begin_write()?;
        {
            let mut companies = txn.open_table(COMPANIES)?;
            let mut table = txn.open_table(EMPLOYEES)?;
            let mut index = txn.open_table(COMPANY_EMPLOYEES)?;
            for (company, employees) in batch {
                put_company(&mut companies, company)?;
                for employee in employees {
                    let employee = Employee {
                        company_id: company.id,
                        ..employee.clone()
                    };
                    put_employee(&mut table, &mut index, &employee)?;
                }
            }
        }
        txn.commit()?;
        Ok(())
    }

    fn update_company(&self, company: &Company, new_employees: &[Employee]) -> StoreResult<bool> {
        let txn = self.db.begin_write()?;
        {
            let mut companies = txn.open_table(COMPANIES)?;
            if companies.get(company.id.as_u128())?.is_none() {
                drop(companies);
                txn.abort()?;
                return Ok(false);
            }
            put_company(&mut companies, company)?;

            let mut table = txn.open_table(EMPLOYEES)?;
            let mut index = txn.open_table(COMPANY_EMPLOYEES)?;
            for employee in new_employees {
                let employee = Employee {
                    company_id: company.id,
                    ..employee.clone()
                };
                put_employee(&mut table, &mut index, &employee)?;
            }
        }
        txn.commit()?;
        Ok(true)
    }

    fn delete_company(&self, id: CompanyId) -> StoreResult<bool> {
        let txn = self.db.begin_write()?;
        let removed = {
            let mut companies = txn.open_table(COMPANIES)?;
            let mut employees = txn.open_table(EMPLOYEES)?;
            let mut index = txn.open_table(COMPANY_EMPLOYEES)?;

            let existed = companies.remove(id.as_u128())?.is_some();
            if existed {
                let cid = id.as_u128();
                for eid in employee_ids(&index, id)? {
                    employees.remove(eid)?;
                    index.remove((cid, eid))?;
                }
            }
            existed
        };
        if removed {
            txn.commit()?;
        } else {
            txn.abort()?;
        }
        Ok(removed)
    }
}

// =============================================================================
// EMPLOYEES
// =============================================================================

impl EmployeeRepository for Store {
    fn employees(&self, company_id: CompanyId) -> StoreResult<Vec<Employee>> {
        let txn = self.db.begin_read()?;
        let index = txn.open_table(COMPANY_EMPLOYEES)?;
        let table = txn.open_table(EMPLOYEES)?;
        let mut out = Vec::new();
        for eid in employee_ids(&index, company_id)? {
            if let Some(employee) = load(&table, eid)? {
                out.push(employee);
            }
        }
        Ok(by_name(out, |e| e.name.as_str()))
    }

    fn employees_paged(
        &self,
        company_id: CompanyId,
        params: &EmployeeParameters,
    ) -> StoreResult<PagedList<Employee>> {
        let employees = query::apply(self.employees(company_id)?, params);
        Ok(PagedList::to_paged_list(
            employees,
            params.request.page_number(),
            params.request.page_size(),
        ))
    }

    fn employee(&self, company_id: CompanyId, id: EmployeeId) -> StoreResult<Option<Employee>> {
        let txn = self.db.begin_read()?;
        let table = txn.open_table(EMPLOYEES)?;
        let employee: Option<Employee> = load(&table, id.as_u128())?;
        Ok(employee.filter(|e| e.company_id == company_id))
    }

    fn create_employee(&self, company_id: CompanyId, employee: &Employee) -> StoreResult<()> {
        let employee = Employee {
            company_id,
            ..employee.clone()
        };
        let txn = self.db.begin_write()?;
        {
            let mut table = txn.open_table(EMPLOYEES)?;
            let mut index = txn.open_table(COMPANY_EMPLOYEES)?;
            put_employee(&mut table, &mut index, &employee)?;
        }
        txn.commit()?;
        Ok(())
    }

    fn update_employee(&self, employee: &Employee) -> StoreResult<bool> {
        let txn = self.db.begin_write()?;
        let updated = {
            let mut table = txn.open_table(EMPLOYEES)?;
            let mut index = txn.open_table(COMPANY_EMPLOYEES)?;
            let key = (employee.company_id.as_u128(), employee.id.as_u128());
            let exists = index.get(key)?.is_some();
            if exists {
                put_employee(&mut table, &mut index, employee)?;
            }
            exists
        };
        if updated {
            txn.commit()?;
        } else {
            txn.abort()?;
        }
        Ok(updated)
    }

    fn delete_employee(&self, company_id: CompanyId, id: EmployeeId) -> StoreResult<bool> {
        let txn = self.db.begin_write()?;
        let removed = {
            let mut table = txn.open_table(EMPLOYEES)?;
            let mut index = txn.open_table(COMPANY_EMPLOYEES)?;
            let existed = index
                .remove((company_id.as_u128(), id.as_u128()))?
                .is_some();
            if existed {
                table.remove(id.as_u128())?;
            }
            existed
        };
        if removed {
            txn.commit()?;
        } else {
            txn.abort()?;
        }
        Ok(removed)
    }
}

// =============================================================================
// USERS
// =============================================================================

impl UserRepository for Store {
    fn role_exists(&self, name: &str) -> StoreResult<bool> {
        let txn = self.db.begin_read()?;
        let roles = txn.open_table(ROLES)?;
        Ok(roles.get(normalize(name).as_str())?.is_some())
    }

    fn find_user(&self, user_name: &str) -> StoreResult<Option<User>> {
        let txn = self.db.begin_read()?;
        let users = txn.open_table(USERS)?;
        match users.get(normalize(user_name).as_str())? {
            Some(guard) => Ok(Some(postcard::from_bytes(guard.value())?)),
            None => Ok(None),
        }
    }

    fn create_user(&self, user: &User) -> StoreResult<()> {
        let key = normalize(&user.user_name);
        let email = normalize(&user.email);

        let txn = self.db.begin_write()?;
        let outcome = (|| -> StoreResult<()> {
            let mut users = txn.open_table(USERS)?;
            let mut emails = txn.open_table(USER_EMAILS)?;
            let roles = txn.open_table(ROLES)?;

            if users.get(key.as_str())?.is_some() {
                return Err(StoreError::DuplicateUserName(user.user_name.clone()));
            }
            if emails.get(email.as_str())?.is_some() {
                return Err(StoreError::DuplicateEmail(user.email.clone()));
            }

            let mut display_roles = Vec::with_capacity(user.roles.len());
            for role in &user.roles {
                match roles.get(normalize(role).as_str())? {
                    Some(name) => display_roles.push(name.value().to_string()),
                    None => return Err(StoreError::UnknownRole(role.clone())),
                }
            }

            let record = User {
                roles: display_roles,
                ..user.clone()
            };
            let bytes = encode(&record)?;
            users.insert(key.as_str(), bytes.as_slice())?;
            emails.insert(email.as_str(), key.as_str())?;
            Ok(())
        })();

        match outcome {
            Ok(()) => {
                txn.commit()?;
                Ok(())
            }
            Err(err) => {
                txn.abort()?;
                Err(err)
            }
        }
    }

    fn check_password(&self, user_name: &str, password: &str) -> StoreResult<Option<User>> {
        Ok(self
            .find_user(user_name)?
            .filter(|user| verify_password(&user.password_hash, password)))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::security::hash_password;
    use crate::storage::seed::{ADMIN_SOLUTIONS, IT_SOLUTIONS};

    fn store() -> Store {
        let store = Store::in_memory().unwrap();
        store.seed_sample_data().unwrap();
        store
    }

    fn company(name: &str) -> Company {
        Company {
            id: CompanyId::new_v4(),
            name: name.to_string(),
            address: "1 Main St".to_string(),
            country: "UK".to_string(),
        }
    }

    fn employee(name: &str, age: u32, company_id: CompanyId) -> Employee {
        Employee {
            id: EmployeeId::new_v4(),
            name: name.to_string(),
            age,
            position: "Tester".to_string(),
            company_id,
        }
    }

    fn user(name: &str, email: &str, roles: &[&str]) -> User {
        User {
            id: crate::model::UserId::new_v4(),
            first_name: "Ada".into(),
            last_name: "Lovelace".into(),
            user_name: name.into(),
            email: email.into(),
            phone_number: None,
            password_hash: hash_password("Password1000"),
            roles: roles.iter().map(|r| r.to_string()).collect(),
        }
    }

    #[test]
    fn seeding_is_idempotent() {
        let store = store();
        assert_eq!(store.seed_sample_data().unwrap(), 0);
        let stats = store.stats().unwrap();
        assert_eq!((stats.companies, stats.employees, stats.users), (2, 3, 0));
    }

    #[test]
    fn companies_are_ordered_by_name() {
        let names: Vec<_> = store()
            .all_companies()
            .unwrap()
            .into_iter()
            .map(|c| c.name)
            .collect();
        assert_eq!(names, ["Admin_Solutions Ltd", "IT_Solutions Ltd"]);
    }

    #[test]
    fn name_order_ignores_case() {
        let store = store();
        store.create_company(&company("acme"), &[]).unwrap();
        let names: Vec<_> = store
            .all_companies()
            .unwrap()
            .into_iter()
            .map(|c| c.name)
            .collect();
        assert_eq!(names, ["acme", "Admin_Solutions Ltd", "IT_Solutions Ltd"]);
    }

    #[test]
    fn employees_are_scoped_to_their_company() {
        let store = store();
        let names: Vec<_> = store
            .employees(IT_SOLUTIONS)
            .unwrap()
            .into_iter()
            .map(|e| e.name)
            .collect();
        assert_eq!(names, ["Jana McLeaf", "Sam Raiden"]);

        let kane = store.employees(ADMIN_SOLUTIONS).unwrap().remove(0);
        assert_eq!(store.employee(IT_SOLUTIONS, kane.id).unwrap(), None);
        assert_eq!(store.employee(ADMIN_SOLUTIONS, kane.id).unwrap(), Some(kane));
    }

    #[test]
    fn create_company_with_employees() {
        let store = store();
        let acme = company("Acme");
        let staff = vec![employee("Zed", 40, CompanyId::from_u128(0))];
        store.create_company(&acme, &staff).unwrap();

        let stored = store.employees(acme.id).unwrap();
        assert_eq!(stored.len(), 1);
        assert_eq!(stored[0].company_id, acme.id);
    }

    #[test]
    fn companies_by_ids_skips_unknown() {
        let store = store();
        let found = store
            .companies_by_ids(&[IT_SOLUTIONS, CompanyId::new_v4(), ADMIN_SOLUTIONS])
            .unwrap();
        let ids: Vec<_> = found.into_iter().map(|c| c.id).collect();
        assert_eq!(ids, [IT_SOLUTIONS, ADMIN_SOLUTIONS]);
    }

    #[test]
    fn update_company_adds_employees() {
        let store = store();
        let mut it = store.company(IT_SOLUTIONS).unwrap().unwrap();
        it.name = "IT Solutions".into();
        let extra = employee("New Hire", 22, IT_SOLUTIONS);
        assert!(store.update_company(&it, &[extra]).unwrap());

        assert_eq!(store.company(IT_SOLUTIONS).unwrap().unwrap().name, "IT Solutions");
        assert_eq!(store.employees(IT_SOLUTIONS).unwrap().len(), 3);
        assert!(!store.update_company(&company("Ghost"), &[]).unwrap());
    }

    #[test]
    fn delete_company_cascades() {
        let store = store();
        assert!(store.delete_company(IT_SOLUTIONS).unwrap());
        assert!(store.employees(IT_SOLUTIONS).unwrap().is_empty());
        assert_eq!(store.stats().unwrap().employees, 1);
        assert!(!store.delete_company(IT_SOLUTIONS).unwrap());
    }

    #[test]
    fn employee_crud() {
        let store = store();
        let mut bob = employee("Bob", 30, IT_SOLUTIONS);
        store.create_employee(IT_SOLUTIONS, &bob).unwrap();
        assert_eq!(store.employee(IT_SOLUTIONS, bob.id).unwrap(), Some(bob.clone()));

        bob.age = 31;
        assert!(store.update_employee(&bob).unwrap());
        assert_eq!(store.employee(IT_SOLUTIONS, bob.id).unwrap().unwrap().age, 31);

        assert!(!store.delete_employee(ADMIN_SOLUTIONS, bob.id).unwrap());
        assert!(store.delete_employee(IT_SOLUTIONS, bob.id).unwrap());
        assert_eq!(store.employee(IT_SOLUTIONS, bob.id).unwrap(), None);
    }

    #[test]
    fn paged_employees_apply_query() {
        let store = store();
        let mut params = EmployeeParameters::default();
        params.request.set_page_size(1);
        params.request.order_by = Some("age desc".into());

        let page = store.employees_paged(IT_SOLUTIONS, &params).unwrap();
        assert_eq!(page.items[0].name, "Jana McLeaf");
        assert_eq!(page.meta.total_count, 2);
        assert!(page.meta.has_next);
    }

    #[test]
    fn roles_are_seeded_and_case_insensitive() {
        let store = Store::in_memory().unwrap();
        assert!(store.role_exists("manager").unwrap());
        assert!(store.role_exists("Administrator").unwrap());
        assert!(!store.role_exists("Janitor").unwrap());
    }

    #[test]
    fn users_are_unique_by_name_and_email() {
        let store = Store::in_memory().unwrap();
        store.create_user(&user("ada", "ada@x.io", &["manager"])).unwrap();

        let stored = store.find_user("ADA").unwrap().unwrap();
        assert_eq!(stored.roles, ["Manager"]);

        let dup_name = store.create_user(&user("Ada", "other@x.io", &[]));
        assert!(matches!(dup_name, Err(StoreError::DuplicateUserName(_))));

        let dup_email = store.create_user(&user("grace", "ADA@x.io", &[]));
        assert!(matches!(dup_email, Err(StoreError::DuplicateEmail(_))));

        let bad_role = store.create_user(&user("grace", "grace@x.io", &["Janitor"]));
        assert!(matches!(bad_role, Err(StoreError::UnknownRole(_))));
        assert_eq!(store.stats().unwrap().users, 1);
    }

    #[test]
    fn check_password_returns_user_on_match() {
        let store = Store::in_memory().unwrap();
        store.create_user(&user("ada", "ada@x.io", &[])).unwrap();
        assert!(store.check_password("ada", "Password1000").unwrap().is_some());
        assert!(store.check_password("ada", "wrong").unwrap().is_none());
        assert!(store.check_password("nobody", "Password1000").unwrap().is_none());
    }

    #[test]
    fn file_store_survives_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("roster.redb");
        {
            let store = Store::open(&path).unwrap();
            store.seed_sample_data().unwrap();
        }
        let store = Store::open(&path).unwrap();
        assert_eq!(store.stats().unwrap().companies, 2);
    }
}
