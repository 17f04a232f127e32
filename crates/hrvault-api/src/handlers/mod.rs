pub mod employees;
pub mod files;
pub mod health;
pub mod security;
