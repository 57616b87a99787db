use actix_web::{web, HttpResponse};
use serde_json::json;
use tokio::sync::Notify;
use log::info;

const EMPLOYEES_FORM: &str = include_str!("../../static/employees.html");

pub async fn employees_form() -> HttpResponse {
    HttpResponse::Ok()
        .content_type("text/html; charset=utf-8")
        .body(EMPLOYEES_FORM)
}

/// Exit button: asks the server to stop once in-flight requests are done.
pub async fn exit(exit_signal: web::Data<Notify>) -> HttpResponse {
    info!("Exit requested");
    exit_signal.notify_one();
    HttpResponse::Accepted().json(json!({
        "message": "Shutting down",
    }))
}
