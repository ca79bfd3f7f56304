pub mod application_dto;
pub mod auth_dto;
pub mod company_dto;
pub mod dashboard_dto;
pub mod offer_dto;
