use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "users")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,

    #[sea_orm(unique)]
    pub email: String,

    /// Argon2id password hash
    pub password_hash: String,

    /// Base32 TOTP secret (32 chars)
    pub pin_key: String,

    pub firstname: String,

    pub lastname: String,

    pub phone: String,

    pub birthdate: String,

    pub postcode: String,

    /// `user` or `admin`
    pub role: String,

    pub registered_on: String,

    pub current_login: Option<String>,

    pub last_login: Option<String>,

    pub current_ip: Option<String>,

    pub last_ip: Option<String>,

    pub total_logins: i32,

    /// SPKI PEM; draws owned by this user are encrypted with it.
    #[sea_orm(column_type = "Text")]
    pub public_key: String,

    /// PKCS#8 PEM
    #[sea_orm(column_type = "Text")]
    pub private_key: String,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::draws::Entity")]
    Draws,
}

impl Related<super::draws::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Draws.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
