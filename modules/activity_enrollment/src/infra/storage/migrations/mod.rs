//! Database migrations for activity enrollment

use sea_orm_migration::prelude::*;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20250301_000001_create_activities::Migration),
            Box::new(m20250301_000002_create_participations::Migration),
            Box::new(m20250301_000003_create_audit_log::Migration),
        ]
    }
}

mod m20250301_000001_create_activities {
    use super::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20250301_000001_create_activities"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(Activities::Table)
                        .if_not_exists()
                        .col(ColumnDef::new(Activities::Id).uuid().not_null().primary_key())
                        .col(ColumnDef::new(Activities::SchoolId).uuid().not_null())
                        .col(ColumnDef::new(Activities::TeacherId).uuid().not_null())
                        .col(ColumnDef::new(Activities::Title).string().not_null())
                        .col(ColumnDef::new(Activities::Description).text().not_null())
                        .col(ColumnDef::new(Activities::Category).string().not_null())
                        .col(ColumnDef::new(Activities::Level).string().not_null())
                        .col(ColumnDef::new(Activities::Status).string().not_null())
                        .col(
                            ColumnDef::new(Activities::MaxParticipants)
                                .integer()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(Activities::CurrentParticipants)
                                .integer()
                                .not_null()
                                .default(0),
                        )
                        .col(
                            ColumnDef::new(Activities::RequiresApproval)
                                .boolean()
                                .not_null(),
                        )
                        .col(ColumnDef::new(Activities::AllowWaitlist).boolean().not_null())
                        .col(ColumnDef::new(Activities::IsPublic).boolean().not_null())
                        .col(ColumnDef::new(Activities::Schedule).json().not_null())
                        .col(
                            ColumnDef::new(Activities::CreatedAt)
                                .timestamp_with_time_zone()
                                .not_null()
                                .default(Expr::current_timestamp()),
                        )
                        .col(
                            ColumnDef::new(Activities::UpdatedAt)
                                .timestamp_with_time_zone()
                                .not_null()
                                .default(Expr::current_timestamp()),
                        )
                        .col(
                            ColumnDef::new(Activities::Version)
                                .big_integer()
                                .not_null()
                                .default(1),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .name("idx_enrollment_activities_school_id")
                        .table(Activities::Table)
                        .col(Activities::SchoolId)
                        .to_owned(),
                )
                .await?;

            Ok(())
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(Activities::Table).to_owned())
                .await
        }
    }

    #[derive(DeriveIden)]
    enum Activities {
        #[sea_orm(iden = "enrollment_activities")]
        Table,
        Id,
        SchoolId,
        TeacherId,
        Title,
        Description,
        Category,
        Level,
        Status,
        MaxParticipants,
        CurrentParticipants,
        RequiresApproval,
        AllowWaitlist,
        IsPublic,
        Schedule,
        CreatedAt,
        UpdatedAt,
        Version,
    }
}

mod m20250301_000002_create_participations {
    use super::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20250301_000002_create_participations"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(Participations::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(Participations::Id)
                                .uuid()
                                .not_null()
                                .primary_key(),
                        )
                        .col(ColumnDef::new(Participations::ActivityId).uuid().not_null())
                        .col(ColumnDef::new(Participations::StudentId).uuid().not_null())
                        .col(ColumnDef::new(Participations::SchoolId).uuid().not_null())
                        .col(ColumnDef::new(Participations::Status).string().not_null())
                        .col(
                            ColumnDef::new(Participations::Waitlisted)
                                .boolean()
                                .not_null()
                                .default(false),
                        )
                        .col(
                            ColumnDef::new(Participations::ApplicationDate)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .col(ColumnDef::new(Participations::ApplicationMessage).text())
                        .col(ColumnDef::new(Participations::ReviewedBy).uuid())
                        .col(ColumnDef::new(Participations::ReviewedAt).timestamp_with_time_zone())
                        .col(ColumnDef::new(Participations::ReviewNote).text())
                        .col(ColumnDef::new(Participations::Attendance).json().not_null())
                        .col(ColumnDef::new(Participations::ParticipationScore).small_integer())
                        .col(ColumnDef::new(Participations::Feedback).text())
                        .col(ColumnDef::new(Participations::CompletedAt).timestamp_with_time_zone())
                        .col(ColumnDef::new(Participations::WithdrawnAt).timestamp_with_time_zone())
                        .col(
                            ColumnDef::new(Participations::UpdatedAt)
                                .timestamp_with_time_zone()
                                .not_null()
                                .default(Expr::current_timestamp()),
                        )
                        .col(
                            ColumnDef::new(Participations::Version)
                                .big_integer()
                                .not_null()
                                .default(1),
                        )
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_enrollment_participations_activity")
                                .from(Participations::Table, Participations::ActivityId)
                                .to(Activities::Table, Activities::Id)
                                .on_delete(ForeignKeyAction::Cascade)
                                .on_update(ForeignKeyAction::Cascade),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .name("idx_enrollment_participations_activity_id")
                        .table(Participations::Table)
                        .col(Participations::ActivityId)
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .name("idx_enrollment_participations_student_id")
                        .table(Participations::Table)
                        .col(Participations::StudentId)
                        .to_owned(),
                )
                .await?;

            Ok(())
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(Participations::Table).to_owned())
                .await
        }
    }

    #[derive(DeriveIden)]
    enum Participations {
        #[sea_orm(iden = "enrollment_participations")]
        Table,
        Id,
        ActivityId,
        StudentId,
        SchoolId,
        Status,
        Waitlisted,
        ApplicationDate,
        ApplicationMessage,
        ReviewedBy,
        ReviewedAt,
        ReviewNote,
        Attendance,
        ParticipationScore,
        Feedback,
        CompletedAt,
        WithdrawnAt,
        UpdatedAt,
        Version,
    }

    #[derive(DeriveIden)]
    enum Activities {
        #[sea_orm(iden = "enrollment_activities")]
        Table,
        Id,
    }
}

mod m20250301_000003_create_audit_log {
    use super::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20250301_000003_create_audit_log"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(AuditLog::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(AuditLog::Seq)
                                .integer()
                                .not_null()
                                .auto_increment()
                                .primary_key(),
                        )
                        .col(ColumnDef::new(AuditLog::Id).uuid().not_null().unique_key())
                        .col(ColumnDef::new(AuditLog::Action).string().not_null())
                        .col(ColumnDef::new(AuditLog::PerformedBy).uuid().not_null())
                        .col(ColumnDef::new(AuditLog::TargetId).uuid().not_null())
                        .col(ColumnDef::new(AuditLog::SchoolId).uuid().not_null())
                        .col(ColumnDef::new(AuditLog::Details).json().not_null())
                        .col(
                            ColumnDef::new(AuditLog::Timestamp)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .to_owned(),
                )
                .await?;

            for (name, column) in [
                ("idx_enrollment_audit_log_target_id", AuditLog::TargetId),
                ("idx_enrollment_audit_log_school_id", AuditLog::SchoolId),
                ("idx_enrollment_audit_log_performed_by", AuditLog::PerformedBy),
            ] {
                manager
                    .create_index(
                        Index::create()
                            .name(name)
                            .table(AuditLog::Table)
                            .col(column)
                            .to_owned(),
                    )
                    .await?;
            }

            Ok(())
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(AuditLog::Table).to_owned())
                .await
        }
    }

    #[derive(DeriveIden)]
    enum AuditLog {
        #[sea_orm(iden = "enrollment_audit_log")]
        Table,
        Seq,
        Id,
        Action,
        PerformedBy,
        TargetId,
        SchoolId,
        Details,
        Timestamp,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_migration_names_are_unique_and_ordered() {
        let names: Vec<String> = Migrator::migrations()
            .iter()
            .map(|m| m.name().to_string())
            .collect();
        let unique: HashSet<_> = names.iter().collect();
        assert_eq!(unique.len(), names.len(), "duplicate migration names: {names:?}");

        let mut sorted = names.clone();
        sorted.sort();
        assert_eq!(sorted, names);
        assert!(names.iter().all(|n| n.starts_with("m2025")));
    }
}
