// src/handlers/mod.rs

pub mod auth;
pub mod import_docx;
pub mod question;
pub mod quiz;
pub mod quiz_type;
