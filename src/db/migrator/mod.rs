use sea_orm_migration::prelude::*;

mod m20250301_initial;
mod m20250301_seed_admin;

pub use m20250301_seed_admin::DEFAULT_ADMIN_EMAIL;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20250301_initial::Migration),
            Box::new(m20250301_seed_admin::Migration),
        ]
    }
}
