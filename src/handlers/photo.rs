use actix_web::{web, HttpResponse};
use serde::Serialize;
use sqlx::SqlitePool;
use log::warn;

use crate::config::AppConfig;
use crate::db;
use crate::errors::AppError;
use crate::utils::bitmap;

pub const BMP_MIME: &str = "image/bmp";

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct PhotoUploadResponse {
    employee_id: i32,
    width: u32,
    height: u32,
    size: usize,
}

fn placeholder() -> Result<Vec<u8>, AppError> {
    bitmap::placeholder().map_err(|err| AppError::InternalServerError(err.to_string()))
}

/// The photo region: the stored bitmap, or the grey placeholder when the
/// employee has none that can be displayed.
pub async fn get_employee_photo(
    pool: web::Data<SqlitePool>,
    employee_id: web::Path<i32>,
) -> Result<HttpResponse, actix_web::Error> {
    let employee_id = employee_id.into_inner();

    let stored = db::employees::load_employee_photo(&pool, employee_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Employee not found".to_string()))?;

    let body = match stored.photo {
        Some(photo) => match bitmap::parse(&photo) {
            Ok(_) => photo,
            Err(err) => {
                warn!("Photo of employee {} cannot be shown: {}", stored.employee_id, err);
                placeholder()?
            }
        },
        None => placeholder()?,
    };

    Ok(HttpResponse::Ok().content_type(BMP_MIME).body(body))
}

pub async fn upload_employee_photo(
    pool: web::Data<SqlitePool>,
    config: web::Data<AppConfig>,
    employee_id: web::Path<i32>,
    file: web::Bytes,
) -> Result<HttpResponse, actix_web::Error> {
    let employee_id = employee_id.into_inner();

    if file.len() > config.max_photo_bytes {
        return Err(AppError::BadRequest(format!(
            "File size exceeds {} byte limit",
            config.max_photo_bytes
        ))
        .into());
    }

    // Validate file type
    let file_type = infer::get(&file)
        .ok_or_else(|| AppError::UnsupportedMediaType("Invalid file type".to_string()))?;
    if file_type.mime_type() != BMP_MIME {
        return Err(AppError::UnsupportedMediaType("Only BMP files are allowed".to_string()).into());
    }

    let info = bitmap::parse(&file).map_err(|err| AppError::UnsupportedMediaType(err.to_string()))?;

    if !db::employees::save_employee_photo(&pool, employee_id, &file).await? {
        return Err(AppError::NotFound("Employee not found".to_string()).into());
    }

    Ok(HttpResponse::Ok().json(PhotoUploadResponse {
        employee_id,
        width: info.width,
        height: info.height,
        size: file.len(),
    }))
}

#[cfg(test)]
mod tests {
    use actix_web::{http::StatusCode, test, web, App};
    use image::codecs::bmp::BmpEncoder;
    use image::ExtendedColorType;
    use serde_json::Value;

    use super::*;
    use crate::db::{connect_in_memory, create_schema, sample};
    use crate::handlers;

    async fn seeded_pool() -> SqlitePool {
        let pool = connect_in_memory().await;
        create_schema(&pool).await.expect("schema");
        sample::insert_sample_employees(&pool, &sample::SAMPLE_EMPLOYEES, None).await.expect("seed");
        pool
    }

    fn test_config() -> AppConfig {
        AppConfig {
            database_path: "unused.db".into(),
            bind_address: "127.0.0.1:0".to_string(),
            photo_dir: None,
            max_photo_bytes: 4096,
        }
    }

    macro_rules! app {
        ($pool:expr) => {
            test::init_service(
                App::new()
                    .app_data(web::Data::new($pool.clone()))
                    .app_data(web::Data::new(test_config()))
                    .configure(handlers::configure),
            )
            .await
        };
    }

    #[actix_web::test]
    async fn serves_stored_photo_as_bitmap() {
        let pool = seeded_pool().await;
        let app = app!(pool);

        let req = test::TestRequest::get().uri("/v1/employee/2/photo").to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(
            resp.headers().get("content-type").and_then(|v| v.to_str().ok()),
            Some(BMP_MIME)
        );
        let body = test::read_body(resp).await;
        assert_eq!(body.as_ref(), sample::sample_portrait(2).unwrap().as_slice());
    }

    #[actix_web::test]
    async fn missing_photo_shows_placeholder() {
        let pool = seeded_pool().await;
        sqlx::query("UPDATE Employees SET Photo = NULL WHERE EmployeeID = 3")
            .execute(&pool)
            .await
            .expect("clear photo");
        let app = app!(pool);

        let req = test::TestRequest::get().uri("/v1/employee/3/photo").to_request();
        let body = test::call_and_read_body(&app, req).await;
        assert_eq!(body.as_ref(), bitmap::placeholder().unwrap().as_slice());
    }

    #[actix_web::test]
    async fn photo_of_unknown_employee_is_not_found() {
        let pool = seeded_pool().await;
        let app = app!(pool);

        let req = test::TestRequest::get().uri("/v1/employee/50/photo").to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    }

    #[actix_web::test]
    async fn uploaded_bitmap_replaces_photo() {
        let pool = seeded_pool().await;
        let app = app!(pool);
        let photo = bitmap::encode_solid(6, 4, (200, 10, 10)).unwrap();

        let req = test::TestRequest::put()
            .uri("/v1/employee/5/photo")
            .set_payload(photo.clone())
            .to_request();
        let resp: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(resp["employeeId"], 5);
        assert_eq!(resp["width"], 6);
        assert_eq!(resp["height"], 4);

        let req = test::TestRequest::get().uri("/v1/employee/5/photo").to_request();
        let body = test::call_and_read_body(&app, req).await;
        assert_eq!(body.as_ref(), photo.as_slice());
    }

    #[actix_web::test]
    async fn upload_rejects_other_formats() {
        let pool = seeded_pool().await;
        let app = app!(pool);
        let png = [0x89u8, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A, 0, 0, 0, 0];

        let req = test::TestRequest::put()
            .uri("/v1/employee/5/photo")
            .set_payload(png.to_vec())
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::UNSUPPORTED_MEDIA_TYPE);
    }

    #[actix_web::test]
    async fn upload_rejects_non_24_bit_bitmaps() {
        let pool = seeded_pool().await;
        let app = app!(pool);
        let mut photo = Vec::new();
        BmpEncoder::new(&mut photo)
            .encode(&[0u8; 16], 4, 4, ExtendedColorType::L8)
            .unwrap();

        let req = test::TestRequest::put()
            .uri("/v1/employee/5/photo")
            .set_payload(photo)
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::UNSUPPORTED_MEDIA_TYPE);
    }

    #[actix_web::test]
    async fn upload_enforces_size_limit() {
        let pool = seeded_pool().await;
        let app = app!(pool);
        let photo = bitmap::encode_solid(64, 64, (0, 0, 0)).unwrap();
        assert!(photo.len() > test_config().max_photo_bytes);

        let req = test::TestRequest::put()
            .uri("/v1/employee/5/photo")
            .set_payload(photo)
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    }

    #[actix_web::test]
    async fn upload_for_unknown_employee_is_not_found() {
        let pool = seeded_pool().await;
        let app = app!(pool);

        let req = test::TestRequest::put()
            .uri("/v1/employee/99/photo")
            .set_payload(bitmap::encode_solid(2, 2, (0, 0, 0)).unwrap())
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    }

    #[actix_web::test]
    async fn upload_with_most_negative_height_leaves_employee_readable() {
        let pool = seeded_pool().await;
        let app = app!(pool);
        let mut photo = bitmap::encode_solid(2, 2, (0, 0, 0)).unwrap();
        photo[22..26].copy_from_slice(&i32::MIN.to_le_bytes());

        let req = test::TestRequest::put()
            .uri("/v1/employee/5/photo")
            .set_payload(photo)
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::UNSUPPORTED_MEDIA_TYPE);

        let req = test::TestRequest::get().uri("/v1/employee/5").to_request();
        let info: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(info["employeeId"], 5);
        assert_eq!(info["photo"]["width"], bitmap::PHOTO_WIDTH);

        let req = test::TestRequest::get().uri("/v1/employee/5/photo").to_request();
        let body = test::call_and_read_body(&app, req).await;
        assert_eq!(body.as_ref(), sample::sample_portrait(5).unwrap().as_slice());
    }

    #[actix_web::test]
    async fn upload_rejects_header_larger_than_its_pixels() {
        let pool = seeded_pool().await;
        let app = app!(pool);
        let mut photo = bitmap::encode_solid(2, 2, (0, 0, 0)).unwrap();
        photo[18..22].copy_from_slice(&10_000i32.to_le_bytes());
        photo[22..26].copy_from_slice(&10_000i32.to_le_bytes());
        photo[34..38].copy_from_slice(&16u32.to_le_bytes());

        let req = test::TestRequest::put()
            .uri("/v1/employee/5/photo")
            .set_payload(photo)
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::UNSUPPORTED_MEDIA_TYPE);
    }
}
