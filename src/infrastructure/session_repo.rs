use chrono::Utc;
use diesel::prelude::*;

use crate::db::DbPool;
use crate::domain::errors::DomainError;
use crate::domain::ports::SessionResolver;
use crate::domain::session::{Role, SessionContext};
use crate::schema::{sessions, users};

/// Resolves bearer tokens against the session table written by the identity
/// provider. Expired or unknown tokens are rejected alike.
pub struct DieselSessionResolver {
    pool: DbPool,
}

impl DieselSessionResolver {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

impl SessionResolver for DieselSessionResolver {
    fn resolve(&self, token: &str) -> Result<SessionContext, DomainError> {
        let mut conn = self.pool.get()?;

        let (user_id, role, establishment_id) = sessions::table
            .inner_join(users::table)
            .filter(sessions::token.eq(token))
            .filter(sessions::expires_at.gt(Utc::now()))
            .select((users::id, users::role, users::establishment_id))
            .first::<(i32, String, Option<i32>)>(&mut conn)
            .optional()?
            .ok_or(DomainError::Unauthenticated)?;

        let role = role.parse::<Role>().map_err(|e| {
            log::warn!("user {} has an unusable role: {}", user_id, e);
            DomainError::Unauthenticated
        })?;

        Ok(SessionContext::new(user_id, role, establishment_id))
    }
}
