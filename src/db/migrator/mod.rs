use sea_orm_migration::prelude::*;

mod m20260301_initial;

pub use m20260301_initial::{DEFAULT_ADMIN_PASSWORD, DEFAULT_ADMIN_USERNAME};

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![Box::new(m20260301_initial::Migration)]
    }
}
