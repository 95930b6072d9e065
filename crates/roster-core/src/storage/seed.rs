//! Sample companies and employees loaded by `roster init --seed`.

use crate::model::{Company, CompanyId, Employee, EmployeeId};

pub const IT_SOLUTIONS: CompanyId =
    CompanyId::from_u128(0xc9d4c053_49b6_410c_bc78_2d54a9991870);
pub const ADMIN_SOLUTIONS: CompanyId =
    CompanyId::from_u128(0x3d490a70_94ce_4d15_9494_5248280c2ce3);

fn employee(id: u128, name: &str, age: u32, position: &str, company_id: CompanyId) -> Employee {
    Employee {
        id: EmployeeId::from_u128(id),
        name: name.to_string(),
        age,
        position: position.to_string(),
        company_id,
    }
}

/// The sample data set, one entry per company.
pub(crate) fn sample_data() -> Vec<(Company, Vec<Employee>)> {
    vec![
        (
            Company {
                id: IT_SOLUTIONS,
                name: "IT_Solutions Ltd".to_string(),
                address: "583 Wall Dr. Gwynn Oak, MD 21207".to_string(),
                country: "USA".to_string(),
            },
            vec![
                employee(
                    0x80abbca8_664d_4b20_b5de_024705497d4a,
                    "Sam Raiden",
                    26,
                    "Software developer",
                    IT_SOLUTIONS,
                ),
                employee(
                    0x86dba8c0_d178_41e7_938c_ed49778fb52a,
                    "Jana McLeaf",
                    30,
                    "Software developer",
                    IT_SOLUTIONS,
                ),
            ],
        ),
        (
            Company {
                id: ADMIN_SOLUTIONS,
                name: "Admin_Solutions Ltd".to_string(),
                address: "312 Forest Avenue, BF 923".to_string(),
                country: "USA".to_string(),
            },
            vec![employee(
                0x021ca3c1_0deb_4afd_ae94_2159a8479811,
                "Kane Miller",
                35,
                "Administrator",
                ADMIN_SOLUTIONS,
            )],
        ),
    ]
}
