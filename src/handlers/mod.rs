pub mod dialog;
pub mod employee;
pub mod photo;

use actix_web::web;

/// Routes of the employees form and the resources it calls.
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::resource("/")
            .route(web::get().to(dialog::employees_form)),
    )
    .service(
        web::resource("/v1/employee")
            .route(web::get().to(employee::get_employee_names)),
    )
    .service(
        web::resource("/v1/employee/{employee_id}")
            .route(web::get().to(employee::get_employee))
            .route(web::patch().to(employee::update_employee)),
    )
    .service(
        web::resource("/v1/employee/{employee_id}/photo")
            .route(web::get().to(photo::get_employee_photo))
            .route(web::put().to(photo::upload_employee_photo)),
    )
    .service(
        web::resource("/v1/exit")
            .route(web::post().to(dialog::exit)),
    );
}
