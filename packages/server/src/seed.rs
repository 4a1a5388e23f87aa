use sea_orm::*;
use sea_orm::sea_query::{Index, PostgresQueryBuilder};
use tracing::info;

use crate::config::AdminConfig;
use crate::entity::{review, user};
use crate::utils::hash;

/// Ensure required database indexes exist.
///
/// SeaORM's schema-sync doesn't support composite unique indexes, so the
/// one-review-per-(cafe, user) constraint is created manually on startup.
pub async fn ensure_indexes(db: &DatabaseConnection) -> Result<(), DbErr> {
    let stmt = Index::create()
        .if_not_exists()
        .unique()
        .name("idx_review_cafe_user")
        .table(review::Entity)
        .col(review::Column::CafeId)
        .col(review::Column::UserId)
        .to_string(PostgresQueryBuilder);

    db.execute_unprepared(&stmt).await?;
    info!("Ensured unique index idx_review_cafe_user exists");

    Ok(())
}

/// Ensure the configured admin account exists. A no-op when an account with
/// the same email is already present; an existing account is never modified.
pub async fn ensure_admin(db: &DatabaseConnection, admin: &AdminConfig) -> anyhow::Result<()> {
    let password = hash::hash_password(&admin.password)
        .map_err(|e| anyhow::anyhow!("Password hash error: {e}"))?;

    let model = user::ActiveModel {
        name: Set(admin.name.clone()),
        email: Set(admin.email.clone()),
        password: Set(password),
        is_admin: Set(true),
        created_at: Set(chrono::Utc::now()),
        ..Default::default()
    };

    let result = user::Entity::insert(model)
        .on_conflict(
            sea_orm::sea_query::OnConflict::column(user::Column::Email)
                .do_nothing()
                .to_owned(),
        )
        .exec_without_returning(db)
        .await;

    match result {
        Ok(_) => {
            info!("Seeded admin account {}", admin.email);
            Ok(())
        }
        Err(DbErr::RecordNotInserted) => Ok(()),
        Err(e) => Err(e.into()),
    }
}
