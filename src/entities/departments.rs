use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "departments")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,

    #[sea_orm(unique)]
    pub name: String,

    pub created_at: String,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl Related<super::incidents::Entity> for Entity {
    fn to() -> RelationDef {
        super::incident_departments::Relation::Incident.def()
    }

    fn via() -> Option<RelationDef> {
        Some(
            super::incident_departments::Relation::Department
                .def()
                .rev(),
        )
    }
}

impl ActiveModelBehavior for ActiveModel {}
