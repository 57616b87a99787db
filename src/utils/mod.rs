pub mod bitmap;
pub mod validation;
