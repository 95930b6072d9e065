//! # Hypermedia Links
//!
//! HATEOAS support for the employee collection and the API root. Links are
//! only attached when the negotiated media type asks for them; otherwise the
//! shaped entities are returned untouched.

use crate::dto::EmployeeDto;
use crate::formats::MediaType;
use crate::model::CompanyId;
use crate::shaping::{DataShaper, Entity};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A navigation link.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Link {
    pub href: String,
    pub rel: String,
    pub method: String,
}

impl Link {
    #[must_use]
    pub fn new(href: impl Into<String>, rel: &str, method: &str) -> Self {
        Self {
            href: href.into(),
            rel: rel.to_string(),
            method: method.to_string(),
        }
    }
}

/// A collection plus links about the collection itself.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LinkCollectionWrapper<T> {
    pub value: Vec<T>,
    pub links: Vec<Link>,
}

impl<T> LinkCollectionWrapper<T> {
    #[must_use]
    pub fn new(value: Vec<T>) -> Self {
        Self {
            value,
            links: Vec::new(),
        }
    }
}

/// Result of the shaping + linking pipeline.
#[derive(Debug, Clone, PartialEq)]
pub enum LinkResponse {
    Shaped(Vec<Entity>),
    Linked(LinkCollectionWrapper<Entity>),
}

impl LinkResponse {
    #[must_use]
    pub fn has_links(&self) -> bool {
        matches!(self, Self::Linked(_))
    }

    /// The value handed to the encoders.
    pub fn to_value(&self) -> Result<serde_json::Value, serde_json::Error> {
        match self {
            Self::Shaped(entities) => serde_json::to_value(entities),
            Self::Linked(wrapper) => serde_json::to_value(wrapper),
        }
    }
}

/// Builds employee representations, with links when requested.
#[derive(Debug, Clone)]
pub struct EmployeeLinks {
    base_url: String,
    shaper: DataShaper<EmployeeDto>,
}

impl EmployeeLinks {
    /// `base_url` is scheme + authority, e.g. `http://localhost:5000`.
    #[must_use]
    pub fn new(base_url: &str) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            shaper: DataShaper::new(),
        }
    }

    /// Shape `employees`, and when `media` is a hateoas type attach per-item
    /// and collection links.
    pub fn try_generate_links(
        &self,
        employees: &[EmployeeDto],
        fields: Option<&str>,
        company_id: CompanyId,
        media: &MediaType,
    ) -> Result<LinkResponse, serde_json::Error> {
        let shaped = self.shaper.shape_all(employees, fields)?;
        if !media.wants_links() {
            return Ok(LinkResponse::Shaped(
                shaped.into_iter().map(|s| s.entity).collect(),
            ));
        }

        let mut entities = Vec::with_capacity(shaped.len());
        for item in shaped {
            let mut entity = item.entity;
            let links = self.links_for_employee(company_id, item.id, fields);
            entity.insert("links", serde_json::to_value(links)?);
            entities.push(entity);
        }

        let mut wrapper = LinkCollectionWrapper::new(entities);
        wrapper
            .links
            .push(Link::new(self.collection_href(company_id), "self", "GET"));
        Ok(LinkResponse::Linked(wrapper))
    }

    /// Links for one employee. `self` carries the `fields` selection.
    #[must_use]
    pub fn links_for_employee(
        &self,
        company_id: CompanyId,
        id: Uuid,
        fields: Option<&str>,
    ) -> Vec<Link> {
        let href = format!("{}/{}", self.collection_href(company_id), id);
        let self_href = match fields.map(str::trim).filter(|f| !f.is_empty()) {
            Some(f) => format!("{href}?fields={}", urlencoding::encode(f)),
            None => href.clone(),
        };
        vec![
            Link::new(self_href, "self", "GET"),
            Link::new(href.clone(), "delete_employee", "DELETE"),
            Link::new(href.clone(), "update_employee", "PUT"),
            Link::new(href, "partially_update_employee", "PATCH"),
        ]
    }

    fn collection_href(&self, company_id: CompanyId) -> String {
        format!("{}/api/companies/{}/employees", self.base_url, company_id)
    }
}

/// Links served from `GET /api` for the apiroot media type.
#[must_use]
pub fn root_links(base_url: &str) -> Vec<Link> {
    let base = base_url.trim_end_matches('/');
    vec![
        Link::new(format!("{base}/api"), "self", "GET"),
        Link::new(format!("{base}/api/companies"), "companies", "GET"),
        Link::new(format!("{base}/api/companies"), "create_company", "POST"),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::formats::media::{HATEOAS_JSON, HATEOAS_XML};
    use crate::model::EmployeeId;
    use serde_json::json;

    fn employees() -> Vec<EmployeeDto> {
        vec![EmployeeDto {
            id: EmployeeId(Uuid::from_u128(2)),
            name: "Sam Raiden".into(),
            age: 26,
            position: "Software developer".into(),
        }]
    }

    fn media(raw: &str) -> MediaType {
        MediaType::parse(raw).unwrap_or_else(MediaType::json)
    }

    #[test]
    fn plain_json_gets_shaped_entities_only() {
        let links = EmployeeLinks::new("http://localhost");
        let response = links
            .try_generate_links(&employees(), Some("name"), CompanyId::from_u128(1), &media("application/json"))
            .ok();
        assert_eq!(response.as_ref().map(LinkResponse::has_links), Some(false));
        assert_eq!(
            response.and_then(|r| r.to_value().ok()),
            Some(json!([{"name": "Sam Raiden"}]))
        );
    }

    #[test]
    fn hateoas_adds_item_and_collection_links() {
        let links = EmployeeLinks::new("http://localhost:5000/");
        let company = CompanyId::from_u128(1);
        let value = links
            .try_generate_links(&employees(), Some("name"), company, &media(HATEOAS_JSON))
            .ok()
            .and_then(|r| r.to_value().ok())
            .unwrap_or_default();

        let base = format!("http://localhost:5000/api/companies/{company}/employees");
        let item = format!("{base}/{}", Uuid::from_u128(2));
        assert_eq!(value["links"][0]["href"], base);
        assert_eq!(value["links"][0]["rel"], "self");
        assert_eq!(value["value"][0]["name"], "Sam Raiden");
        assert_eq!(value["value"][0]["links"][0]["href"], format!("{item}?fields=name"));
        assert_eq!(value["value"][0]["links"][1]["rel"], "delete_employee");
        assert_eq!(value["value"][0]["links"][2]["method"], "PUT");
        assert_eq!(value["value"][0]["links"][3]["method"], "PATCH");
    }

    #[test]
    fn hateoas_xml_is_also_linked() {
        let links = EmployeeLinks::new("http://h");
        let response = links
            .try_generate_links(&employees(), None, CompanyId::from_u128(1), &media(HATEOAS_XML))
            .ok();
        assert_eq!(response.map(|r| r.has_links()), Some(true));
    }

    #[test]
    fn self_link_encodes_fields() {
        let links = EmployeeLinks::new("http://h");
        let list = links.links_for_employee(CompanyId::from_u128(1), Uuid::from_u128(2), Some("name, age"));
        assert!(list[0].href.ends_with("?fields=name%2C%20age"));
        assert!(!list[1].href.contains('?'));
    }

    #[test]
    fn root_links_cover_entry_points() {
        let rels: Vec<_> = root_links("http://h").into_iter().map(|l| l.rel).collect();
        assert_eq!(rels, ["self", "companies", "create_company"]);
    }
}
