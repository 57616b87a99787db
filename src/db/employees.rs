use chrono::Utc;
use log::{debug, info};
use sqlx::SqlitePool;

use crate::errors::AppError;
use crate::models::employee::{
    EmployeeInfo, EmployeeInfoRow, EmployeeName, EmployeeNameRow, EmployeePhoto, EmployeeUpdate, PhotoSummary,
};
use crate::utils::bitmap;

const SQL_SELECT_EMPLOYEE_NAMES: &str = r#"
    SELECT EmployeeID AS employee_id, LastName AS last_name, FirstName AS first_name
    FROM Employees INDEXED BY PK_Employees
    ORDER BY EmployeeID
"#;

const SQL_SEEK_EMPLOYEE_INFO: &str = r#"
    SELECT
        EmployeeID AS employee_id,
        Address AS address,
        City AS city,
        Region AS region,
        PostalCode AS postal_code,
        Country AS country,
        HomePhone AS home_phone,
        Photo AS photo,
        UpdatedAt AS updated_at
    FROM Employees INDEXED BY PK_Employees
    WHERE EmployeeID = ?
"#;

const SQL_SEEK_EMPLOYEE_PHOTO: &str = r#"
    SELECT EmployeeID AS employee_id, Photo AS photo
    FROM Employees INDEXED BY PK_Employees
    WHERE EmployeeID = ?
"#;

const SQL_SEEK_EMPLOYEE_ID: &str =
    "SELECT EmployeeID FROM Employees INDEXED BY PK_Employees WHERE EmployeeID = ?";

/// Lists every employee as "LastName, FirstName" in key order.
pub async fn populate_employee_names(pool: &SqlitePool) -> Result<Vec<EmployeeName>, AppError> {
    let rows = sqlx::query_as::<_, EmployeeNameRow>(SQL_SELECT_EMPLOYEE_NAMES)
        .fetch_all(pool)
        .await
        .map_err(AppError::database("Retrieve employee name list"))?;

    let names: Vec<EmployeeName> = rows.into_iter().filter_map(EmployeeNameRow::into_name).collect();
    debug!("Retrieved {} employee names", names.len());
    Ok(names)
}

pub async fn load_employee_info(pool: &SqlitePool, employee_id: i32) -> Result<Option<EmployeeInfo>, AppError> {
    let row = sqlx::query_as::<_, EmployeeInfoRow>(SQL_SEEK_EMPLOYEE_INFO)
        .bind(employee_id)
        .fetch_optional(pool)
        .await
        .map_err(AppError::database("Load employee info"))?;

    Ok(row.map(|row| EmployeeInfo {
        employee_id: row.employee_id,
        address: row.address,
        city: row.city,
        region: row.region,
        postal_code: row.postal_code,
        country: row.country,
        home_phone: row.home_phone,
        photo: row.photo.as_deref().and_then(summarize_photo),
        updated_at: row.updated_at,
    }))
}

fn summarize_photo(bytes: &[u8]) -> Option<PhotoSummary> {
    match bitmap::parse(bytes) {
        Ok(info) => Some(PhotoSummary {
            width: info.width,
            height: info.height,
        }),
        Err(err) => {
            debug!("Stored photo is not displayable: {}", err);
            None
        }
    }
}

/// Writes the supplied attributes to the row with `employee_id`.
/// Returns `false` when no such employee exists.
pub async fn save_employee_info(
    pool: &SqlitePool,
    employee_id: i32,
    update: &EmployeeUpdate,
) -> Result<bool, AppError> {
    const STEP: &str = "Save employee info";

    let mut tx = pool.begin().await.map_err(AppError::database(STEP))?;

    let found = sqlx::query_scalar::<_, i32>(SQL_SEEK_EMPLOYEE_ID)
        .bind(employee_id)
        .fetch_optional(&mut *tx)
        .await
        .map_err(AppError::database(STEP))?;
    if found.is_none() {
        return Ok(false);
    }

    let mut query: sqlx::QueryBuilder<'_, sqlx::Sqlite> = sqlx::QueryBuilder::new("UPDATE Employees SET ");
    let mut separated = query.separated(", ");

    let columns = [
        ("Address", &update.address),
        ("City", &update.city),
        ("Region", &update.region),
        ("PostalCode", &update.postal_code),
        ("Country", &update.country),
        ("HomePhone", &update.home_phone),
    ];
    for (column, value) in columns {
        if let Some(value) = value {
            separated.push(format!("{} = ", column));
            separated.push_bind_unseparated(value.clone());
        }
    }
    separated.push("UpdatedAt = ");
    separated.push_bind_unseparated(Utc::now());

    query.push(" WHERE EmployeeID = ");
    query.push_bind(employee_id);

    query
        .build()
        .execute(&mut *tx)
        .await
        .map_err(AppError::database(STEP))?;

    tx.commit().await.map_err(AppError::database(STEP))?;
    info!("Saved employee {}", employee_id);
    Ok(true)
}

pub async fn load_employee_photo(pool: &SqlitePool, employee_id: i32) -> Result<Option<EmployeePhoto>, AppError> {
    sqlx::query_as::<_, EmployeePhoto>(SQL_SEEK_EMPLOYEE_PHOTO)
        .bind(employee_id)
        .fetch_optional(pool)
        .await
        .map_err(AppError::database("Load employee photo"))
}

/// Replaces the stored photo. Returns `false` when no such employee exists.
pub async fn save_employee_photo(pool: &SqlitePool, employee_id: i32, photo: &[u8]) -> Result<bool, AppError> {
    let result = sqlx::query("UPDATE Employees SET Photo = ?, UpdatedAt = ? WHERE EmployeeID = ?")
        .bind(photo)
        .bind(Utc::now())
        .bind(employee_id)
        .execute(pool)
        .await
        .map_err(AppError::database("Save employee photo"))?;

    let saved = result.rows_affected() > 0;
    if saved {
        info!("Saved {} byte photo for employee {}", photo.len(), employee_id);
    }
    Ok(saved)
}
