pub mod application;
pub mod auth;
pub mod company;
pub mod dashboard;
pub mod health;
pub mod offer;
