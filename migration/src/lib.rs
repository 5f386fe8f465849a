pub use sea_orm_migration::prelude::*;

mod m20260301_000001_create_user_table;
mod m20260301_000002_create_auth_table;
mod m20260301_000003_create_team_tables;
mod m20260301_000004_create_post_tables;
mod m20260301_000005_create_comment_tables;
mod m20260301_000006_create_relation_tables;
mod m20260301_000007_create_notice_table;
mod m20260301_000008_create_report_table;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20260301_000001_create_user_table::Migration),
            Box::new(m20260301_000002_create_auth_table::Migration),
            Box::new(m20260301_000003_create_team_tables::Migration),
            Box::new(m20260301_000004_create_post_tables::Migration),
            Box::new(m20260301_000005_create_comment_tables::Migration),
            Box::new(m20260301_000006_create_relation_tables::Migration),
            Box::new(m20260301_000007_create_notice_table::Migration),
            Box::new(m20260301_000008_create_report_table::Migration),
        ]
    }
}
