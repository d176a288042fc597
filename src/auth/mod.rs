pub mod password;
pub mod service;
pub mod token;
pub mod validation;
