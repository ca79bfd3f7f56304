pub mod application_service;
pub mod auth_service;
pub mod company_service;
pub mod discovery;
pub mod offer_service;
pub mod storage_service;
