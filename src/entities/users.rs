use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "users")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,

    #[sea_orm(unique)]
    pub username: String,

    /// Hex-encoded SHA-256 digest of `salt || password`.
    pub password_hash: String,

    /// Hex-encoded 16-byte random salt, unique per user.
    pub salt: String,

    /// Role level: -1 admin, 0 leadership, 1 command center,
    /// 2 department head, 3 security officer.
    pub role_level: i32,

    pub email: Option<String>,

    /// Accounts are never hard-deleted; deactivation flips this flag.
    pub is_active: bool,

    pub created_at: String,

    pub updated_at: String,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::login_attempts::Entity")]
    LoginAttempts,
}

impl Related<super::login_attempts::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::LoginAttempts.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
