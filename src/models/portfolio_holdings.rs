use serde::{Serialize, Deserialize};
use sea_orm::entity::prelude::*;

// Un holding = symbole + nombre de parts + prix de revient moyen.
// Les champs dérivés (prix courant, valeur, gain) ne sont JAMAIS stockés:
// ils sont recalculés à chaque lecture depuis la dernière quote.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "portfolio_holdings")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub user_id: i32,
    pub symbol: String,
    pub name: Option<String>,
    pub shares: Decimal,
    pub avg_price: Decimal,
    pub created_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::users::Entity",
        from = "Column::UserId",
        to = "super::users::Column::Id"
    )]
    User,
}

impl Related<super::users::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::User.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
