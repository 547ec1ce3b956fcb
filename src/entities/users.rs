use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "users")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,

    #[sea_orm(unique)]
    pub email: String,

    #[sea_orm(unique)]
    pub username: String,

    /// Argon2id password hash
    pub password_hash: String,

    pub is_verified: bool,

    /// 6-digit code mailed on registration, cleared once consumed.
    pub verification_code: Option<String>,

    /// Password-reset token (64-char hex string), cleared once consumed.
    pub reset_token: Option<String>,

    pub reset_token_expire: Option<DateTimeUtc>,

    /// Denormalized bookmark count, maintained transactionally with the rows.
    pub amount_of_bookmarks: i32,

    pub created_at: String,

    pub updated_at: String,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
