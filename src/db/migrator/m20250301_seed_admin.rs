use crate::db::repositories::user::{generate_api_key, generate_password, hash_password};
use crate::entities::prelude::*;
use crate::entities::users;
use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

pub const DEFAULT_ADMIN_EMAIL: &str = "admin@helpdesk.local";

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let now = chrono::Utc::now().to_rfc3339();

        // Fresh secrets per database; they are only ever shown in this log line
        let password = generate_password();
        let api_key = generate_api_key();
        let password_hash = hash_password(&password, None)
            .map_err(|e| DbErr::Custom(format!("Failed to hash admin password: {e}")))?;

        let insert = sea_orm_migration::sea_query::Query::insert()
            .into_table(Users)
            .columns([
                users::Column::Name,
                users::Column::Email,
                users::Column::PasswordHash,
                users::Column::ApiKey,
                users::Column::IsAdmin,
                users::Column::CreatedAt,
                users::Column::UpdatedAt,
            ])
            .values_panic([
                "Administrator".into(),
                DEFAULT_ADMIN_EMAIL.into(),
                password_hash.into(),
                api_key.clone().into(),
                true.into(),
                now.clone().into(),
                now.into(),
            ])
            .to_owned();

        manager.exec_stmt(insert).await?;

        tracing::warn!(
            "Created administrator {DEFAULT_ADMIN_EMAIL} with password {password} and API key \
             {api_key}. Change both via /api/users/password and /api/users/api-key/regenerate"
        );

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let delete = sea_orm_migration::sea_query::Query::delete()
            .from_table(Users)
            .and_where(Expr::col(users::Column::Email).eq(DEFAULT_ADMIN_EMAIL))
            .to_owned();

        manager.exec_stmt(delete).await
    }
}
