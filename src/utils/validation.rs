use validator::{Validate, ValidationErrors};

use crate::errors::AppError;

pub fn validate_payload<T: Validate>(payload: &T) -> Result<(), AppError> {
    payload.validate().map_err(map_validation_error)
}

fn map_validation_error(err: ValidationErrors) -> AppError {
    let details = err
        .field_errors()
        .iter()
        .map(|(field, errs)| {
            let errors = errs
                .iter()
                .map(|e| e.code.to_string())
                .collect::<Vec<_>>()
                .join(", ");
            format!("{}: [{}]", field, errors)
        })
        .collect::<Vec<_>>()
        .join("; ");
    AppError::BadRequest(format!("Validation failed: {}", details))
}
