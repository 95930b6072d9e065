use criterion::{Criterion, criterion_group, criterion_main};
use roster_core::formats::{MediaType, XmlNames, encode};
use roster_core::links::EmployeeLinks;
use roster_core::model::{CompanyId, Employee, EmployeeId};
use roster_core::{EmployeeDto, EmployeeParameters, PagedList};
use std::hint::black_box;

fn employees(count: u32) -> Vec<EmployeeDto> {
    let company = CompanyId::from_u128(1);
    (0..count)
        .map(|i| {
            EmployeeDto::from(&Employee {
                id: EmployeeId::from_u128(u128::from(i) + 1),
                name: format!("Employee {i:04}"),
                age: 20 + i % 40,
                position: "Engineer".to_string(),
                company_id: company,
            })
        })
        .collect()
}

fn bench_pipeline(c: &mut Criterion) {
    let page = employees(50);
    let company = CompanyId::from_u128(1);
    let links = EmployeeLinks::new("http://localhost:5000");
    let plain = MediaType::json();
    let hateoas = MediaType::parse("application/x.y.hateoas+json").unwrap_or_else(MediaType::json);
    let xml = MediaType::parse("application/xml").unwrap_or_else(MediaType::json);
    let names = XmlNames::new("employees", "employee");

    c.bench_function("shape_50_all_fields", |b| {
        b.iter(|| links.try_generate_links(black_box(&page), None, company, &plain))
    });

    c.bench_function("shape_50_two_fields_with_links", |b| {
        b.iter(|| links.try_generate_links(black_box(&page), Some("name,age"), company, &hateoas))
    });

    c.bench_function("encode_50_as_xml", |b| {
        let value = links
            .try_generate_links(&page, None, company, &plain)
            .and_then(|r| r.to_value())
            .unwrap_or_default();
        b.iter(|| encode(black_box(&value), &xml, names))
    });
}

fn bench_paging(c: &mut Criterion) {
    let all = employees(1_000);
    let params = EmployeeParameters::from_pairs([("pageNumber", "7"), ("pageSize", "50")])
        .unwrap_or_default();

    c.bench_function("page_1000_to_50", |b| {
        b.iter(|| {
            PagedList::to_paged_list(
                black_box(all.clone()),
                params.request.page_number(),
                params.request.page_size(),
            )
        })
    });
}

criterion_group!(benches, bench_pipeline, bench_paging);
criterion_main!(benches);
