pub mod config;
pub mod database;
pub mod dto;
pub mod error;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;
pub mod utils;

use crate::services::{
    application_service::ApplicationService, auth_service::AuthService,
    company_service::CompanyService, offer_service::OfferService,
    storage_service::StorageService,
};
use sqlx::PgPool;

#[derive(Clone)]
pub struct AppState {
    pub pool: PgPool,
    pub offer_service: OfferService,
    pub company_service: CompanyService,
    pub application_service: ApplicationService,
    pub auth_service: AuthService,
    pub storage: StorageService,
}

impl AppState {
    pub fn new(pool: PgPool) -> Self {
        let config = crate::config::get_config();
        let storage = StorageService::new(config.uploads_dir.clone());

        let offer_service = OfferService::new(pool.clone());
        let company_service = CompanyService::new(pool.clone());
        let application_service = ApplicationService::new(pool.clone(), storage.clone());
        let auth_service = AuthService::new(pool.clone());

        Self {
            pool,
            offer_service,
            company_service,
            application_service,
            auth_service,
            storage,
        }
    }
}
