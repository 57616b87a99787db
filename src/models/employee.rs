use serde::{Deserialize, Serialize};
use validator::Validate;
use chrono::Utc;

// Column sizes of the Employees table, in characters.
pub const LAST_NAME_LEN: usize = 20;
pub const FIRST_NAME_LEN: usize = 10;
pub const ADDRESS_LEN: usize = 60;
pub const CITY_LEN: usize = 15;
pub const REGION_LEN: usize = 15;
pub const POSTAL_CODE_LEN: usize = 10;
pub const COUNTRY_LEN: usize = 15;
pub const HOME_PHONE_LEN: usize = 24;

/// One entry of the name selection list.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct EmployeeName {
    pub employee_id: i32,
    pub name: String,
}

#[derive(sqlx::FromRow, Debug)]
pub struct EmployeeNameRow {
    pub employee_id: Option<i32>,
    pub last_name: Option<String>,
    pub first_name: Option<String>,
}

impl EmployeeNameRow {
    /// "LastName, FirstName", or `None` when any part is NULL.
    pub fn into_name(self) -> Option<EmployeeName> {
        match (self.employee_id, self.last_name, self.first_name) {
            (Some(employee_id), Some(last), Some(first)) => Some(EmployeeName {
                employee_id,
                name: format!("{}, {}", last, first),
            }),
            _ => None,
        }
    }
}

#[derive(sqlx::FromRow, Debug)]
pub struct EmployeeInfoRow {
    pub employee_id: i32,
    pub address: Option<String>,
    pub city: Option<String>,
    pub region: Option<String>,
    pub postal_code: Option<String>,
    pub country: Option<String>,
    pub home_phone: Option<String>,
    pub photo: Option<Vec<u8>>,
    pub updated_at: Option<chrono::DateTime<Utc>>,
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq)]
pub struct PhotoSummary {
    pub width: u32,
    pub height: u32,
}

/// The attributes shown on the form once a name is selected.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct EmployeeInfo {
    pub employee_id: i32,
    pub address: Option<String>,
    pub city: Option<String>,
    pub region: Option<String>,
    pub postal_code: Option<String>,
    pub country: Option<String>,
    pub home_phone: Option<String>,
    pub photo: Option<PhotoSummary>,
    pub updated_at: Option<chrono::DateTime<Utc>>,
}

#[derive(sqlx::FromRow, Debug)]
pub struct EmployeePhoto {
    pub employee_id: i32,
    pub photo: Option<Vec<u8>>,
}

/// Editable attributes. Fields left out keep their stored value.
#[derive(Deserialize, Validate, Debug, Default, Clone)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct EmployeeUpdate {
    #[validate(length(max = 60))]
    pub address: Option<String>,
    #[validate(length(max = 15))]
    pub city: Option<String>,
    #[validate(length(max = 15))]
    pub region: Option<String>,
    #[validate(length(max = 10))]
    pub postal_code: Option<String>,
    #[validate(length(max = 15))]
    pub country: Option<String>,
    #[validate(length(max = 24))]
    pub home_phone: Option<String>,
}

impl EmployeeUpdate {
    pub fn is_empty(&self) -> bool {
        self.address.is_none()
            && self.city.is_none()
            && self.region.is_none()
            && self.postal_code.is_none()
            && self.country.is_none()
            && self.home_phone.is_none()
    }
}

/// Cuts `value` down to at most `max_chars` characters.
pub fn truncate_to(value: &str, max_chars: usize) -> String {
    value.chars().take(max_chars).collect()
}
