use actix_web::{web, HttpResponse};
use sqlx::SqlitePool;

use crate::db;
use crate::errors::AppError;
use crate::models::employee::EmployeeUpdate;
use crate::utils;

pub async fn get_employee_names(
    pool: web::Data<SqlitePool>,
) -> Result<HttpResponse, actix_web::Error> {
    let names = db::employees::populate_employee_names(&pool).await?;
    Ok(HttpResponse::Ok().json(names))
}

pub async fn get_employee(
    pool: web::Data<SqlitePool>,
    employee_id: web::Path<i32>,
) -> Result<HttpResponse, actix_web::Error> {
    let employee_id = employee_id.into_inner();

    let employee = db::employees::load_employee_info(&pool, employee_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Employee not found".to_string()))?;

    Ok(HttpResponse::Ok().json(employee))
}

pub async fn update_employee(
    pool: web::Data<SqlitePool>,
    employee_id: web::Path<i32>,
    updates: web::Json<EmployeeUpdate>,
) -> Result<HttpResponse, actix_web::Error> {
    utils::validation::validate_payload(&updates.0)?;
    if updates.is_empty() {
        return Err(AppError::BadRequest("No fields to update".to_string()).into());
    }

    let employee_id = employee_id.into_inner();

    if !db::employees::save_employee_info(&pool, employee_id, &updates).await? {
        return Err(AppError::NotFound("Employee not found".to_string()).into());
    }

    // Re-read so the form shows what was actually stored
    let employee = db::employees::load_employee_info(&pool, employee_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Employee not found".to_string()))?;

    Ok(HttpResponse::Ok().json(employee))
}
