pub mod account;
pub mod application;
pub mod company;
pub mod offer;
pub mod profile;
