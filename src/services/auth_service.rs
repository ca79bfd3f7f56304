use sqlx::PgPool;
use uuid::Uuid;

use crate::config::get_config;
use crate::dto::auth_dto::SignUpPayload;
use crate::error::{Error, Result};
use crate::models::account::Account;
use crate::models::profile::{Profile, UserRole};
use crate::utils::crypto::{hash_password, verify_password};
use crate::utils::jwt::issue_token;

const PROFILE_COLUMNS: &str = "id, role, first_name, last_name, created_at, updated_at";

#[derive(Clone)]
pub struct AuthService {
    pool: PgPool,
}

impl AuthService {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Sign-up provisioning: account insert, then profile upsert keyed by
    /// the account id, then the role-specific record. The steps are not
    /// one transaction with the identity creation in the original system,
    /// so the profile write is an idempotent upsert and a failure after
    /// account creation leaves a partially provisioned account (logged,
    /// not remediated here).
    pub async fn sign_up(&self, payload: SignUpPayload) -> Result<Profile> {
        let existing = sqlx::query_scalar::<_, Uuid>("SELECT id FROM accounts WHERE email = $1")
            .bind(&payload.email)
            .fetch_optional(&self.pool)
            .await?;
        if existing.is_some() {
            return Err(Error::Conflict(
                "An account with this email already exists".to_string(),
            ));
        }

        let password_hash = hash_password(&payload.password)
            .map_err(|e| Error::Internal(format!("Password hashing failed: {}", e)))?;

        let account = sqlx::query_as::<_, Account>(
            "INSERT INTO accounts (email, password_hash) VALUES ($1, $2) \
             RETURNING id, email, password_hash, created_at, updated_at",
        )
        .bind(&payload.email)
        .bind(&password_hash)
        .fetch_one(&self.pool)
        .await?;

        match self.provision(&account, &payload).await {
            Ok(profile) => Ok(profile),
            Err(err) => {
                tracing::error!(
                    account_id = %account.id,
                    error = ?err,
                    "sign-up provisioning failed after account creation; account left partially provisioned"
                );
                Err(err)
            }
        }
    }

    async fn provision(&self, account: &Account, payload: &SignUpPayload) -> Result<Profile> {
        let profile = sqlx::query_as::<_, Profile>(&format!(
            "INSERT INTO profiles (id, role, first_name, last_name) \
             VALUES ($1, $2, $3, $4) \
             ON CONFLICT (id) DO UPDATE SET \
                role = EXCLUDED.role, \
                first_name = EXCLUDED.first_name, \
                last_name = EXCLUDED.last_name, \
                updated_at = NOW() \
             RETURNING {}",
            PROFILE_COLUMNS
        ))
        .bind(account.id)
        .bind(payload.role)
        .bind(&payload.first_name)
        .bind(&payload.last_name)
        .fetch_one(&self.pool)
        .await?;

        match payload.role {
            UserRole::Student => {
                sqlx::query(
                    "INSERT INTO students (user_id) VALUES ($1) \
                     ON CONFLICT (user_id) DO NOTHING",
                )
                .bind(account.id)
                .execute(&self.pool)
                .await?;
            }
            UserRole::Company => {
                let data = payload.company.as_ref().ok_or_else(|| {
                    Error::BadRequest(
                        "Company details are required for company sign-up".to_string(),
                    )
                })?;
                sqlx::query(
                    "INSERT INTO companies (owner_id, name, address, sector) \
                     VALUES ($1, $2, $3, $4)",
                )
                .bind(account.id)
                .bind(&data.name)
                .bind(&data.address)
                .bind(&data.sector)
                .execute(&self.pool)
                .await?;
            }
            UserRole::Admin => {}
        }

        Ok(profile)
    }

    pub async fn sign_in(&self, email: &str, password: &str) -> Result<(String, Profile)> {
        let account = sqlx::query_as::<_, Account>(
            "SELECT id, email, password_hash, created_at, updated_at \
             FROM accounts WHERE email = $1",
        )
        .bind(email)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| Error::Unauthorized("Invalid email or password".to_string()))?;

        let ok = verify_password(password, &account.password_hash)
            .map_err(|e| Error::Internal(format!("Password verification failed: {}", e)))?;
        if !ok {
            return Err(Error::Unauthorized("Invalid email or password".to_string()));
        }

        let profile = self
            .current_user(account.id)
            .await?
            .ok_or_else(|| Error::Unauthorized("Account has no profile".to_string()))?;

        let token = issue_token(account.id, profile.role, &get_config().jwt_secret)?;
        Ok((token, profile))
    }

    /// Resolves the caller's profile. `None`, not an error, when the id is
    /// unknown.
    pub async fn current_user(&self, account_id: Uuid) -> Result<Option<Profile>> {
        let profile = sqlx::query_as::<_, Profile>(&format!(
            "SELECT {} FROM profiles WHERE id = $1",
            PROFILE_COLUMNS
        ))
        .bind(account_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(profile)
    }

    pub async fn count_students(&self) -> Result<i64> {
        let total = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM students")
            .fetch_one(&self.pool)
            .await?;
        Ok(total)
    }
}
