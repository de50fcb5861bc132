pub mod admin;
pub mod auth;
pub mod bookmark;
pub mod doctor;
pub mod review;
pub mod user;
