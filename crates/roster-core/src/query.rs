//! # Employee Queries
//!
//! Filtering, searching and sorting applied before paging.

use crate::model::Employee;
use crate::params::EmployeeParameters;
use std::cmp::Ordering;

/// Keep employees with `min_age <= age <= max_age`.
#[must_use]
pub fn filter_by_age(employees: Vec<Employee>, min_age: u32, max_age: u32) -> Vec<Employee> {
    employees
        .into_iter()
        .filter(|e| e.age >= min_age && e.age <= max_age)
        .collect()
}

/// Keep employees whose name contains `term`, ignoring case.
/// A missing or blank term keeps everything.
#[must_use]
pub fn search(employees: Vec<Employee>, term: Option<&str>) -> Vec<Employee> {
    let needle = match term.map(str::trim) {
        Some(t) if !t.is_empty() => t.to_lowercase(),
        _ => return employees,
    };
    employees
        .into_iter()
        .filter(|e| e.name.to_lowercase().contains(&needle))
        .collect()
}

/// Employee properties a client may order by.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortKey {
    Id,
    Name,
    Age,
    Position,
    CompanyId,
}

impl SortKey {
    fn parse(name: &str) -> Option<Self> {
        match name.to_ascii_lowercase().as_str() {
            "id" => Some(Self::Id),
            "name" => Some(Self::Name),
            "age" => Some(Self::Age),
            "position" => Some(Self::Position),
            "companyid" => Some(Self::CompanyId),
            _ => None,
        }
    }

    fn compare(&self, a: &Employee, b: &Employee) -> Ordering {
        match self {
            Self::Id => a.id.cmp(&b.id),
            Self::Name => compare_text(&a.name, &b.name),
            Self::Age => a.age.cmp(&b.age),
            Self::Position => compare_text(&a.position, &b.position),
            Self::CompanyId => a.company_id.cmp(&b.company_id),
        }
    }
}

/// Case-insensitive, ties broken by byte order.
pub(crate) fn compare_text(a: &str, b: &str) -> Ordering {
    a.to_lowercase()
        .cmp(&b.to_lowercase())
        .then_with(|| a.cmp(b))
}

/// One `orderBy` clause.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SortClause {
    pub key: SortKey,
    pub descending: bool,
}

/// Parse `"name desc, age"` into clauses. Unknown properties are dropped.
#[must_use]
pub fn parse_order_by(order_by: &str) -> Vec<SortClause> {
    order_by
        .split(',')
        .filter_map(|clause| {
            let mut parts = clause.split_whitespace();
            let key = SortKey::parse(parts.next()?)?;
            let descending = parts
                .next()
                .is_some_and(|dir| dir.eq_ignore_ascii_case("desc"));
            Some(SortClause { key, descending })
        })
        .collect()
}

/// Stable multi-key sort. Falls back to ordering by name.
#[must_use]
pub fn sort(mut employees: Vec<Employee>, order_by: Option<&str>) -> Vec<Employee> {
    let mut clauses = order_by.map(parse_order_by).unwrap_or_default();
    if clauses.is_empty() {
        clauses.push(SortClause {
            key: SortKey::Name,
            descending: false,
        });
    }
    employees.sort_by(|a, b| {
        clauses.iter().fold(Ordering::Equal, |acc, clause| {
            acc.then_with(|| {
                let ord = clause.key.compare(a, b);
                if clause.descending { ord.reverse() } else { ord }
            })
        })
    });
    employees
}

/// Filter, search and sort in the order the list endpoint applies them.
#[must_use]
pub fn apply(employees: Vec<Employee>, params: &EmployeeParameters) -> Vec<Employee> {
    let filtered = filter_by_age(employees, params.min_age, params.max_age);
    let searched = search(filtered, params.search_term.as_deref());
    sort(searched, params.request.order_by.as_deref())
}
