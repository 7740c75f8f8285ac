// src/models/mod.rs

pub mod attempt;
pub mod question;
pub mod quiz_type;
pub mod user;
