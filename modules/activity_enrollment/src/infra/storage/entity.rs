//! SeaORM entities for database tables

/// Activities table entity
pub mod activity {
    use sea_orm::entity::prelude::*;

    #[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq)]
    #[sea_orm(table_name = "enrollment_activities")]
    pub struct Model {
        #[sea_orm(primary_key, auto_increment = false)]
        pub id: Uuid,

        /// Tenant scope
        pub school_id: Uuid,

        pub teacher_id: Uuid,
        pub title: String,
        pub description: String,

        /// Lowercase category tag
        pub category: String,

        /// Lowercase level tag
        pub level: String,

        /// Lowercase lifecycle status tag
        pub status: String,

        pub max_participants: i32,

        /// Seat-holding participations, maintained by the engine
        pub current_participants: i32,

        pub requires_approval: bool,
        pub allow_waitlist: bool,
        pub is_public: bool,

        /// Opaque schedule metadata as JSON
        pub schedule: Json,

        pub created_at: DateTimeUtc,
        pub updated_at: DateTimeUtc,

        /// Optimistic concurrency token
        pub version: i64,
    }

    #[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
    pub enum Relation {
        #[sea_orm(has_many = "super::participation::Entity")]
        Participations,
    }

    impl Related<super::participation::Entity> for Entity {
        fn to() -> RelationDef {
            Relation::Participations.def()
        }
    }

    impl ActiveModelBehavior for ActiveModel {}
}

/// Participations table entity
pub mod participation {
    use sea_orm::entity::prelude::*;

    #[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq)]
    #[sea_orm(table_name = "enrollment_participations")]
    pub struct Model {
        #[sea_orm(primary_key, auto_increment = false)]
        pub id: Uuid,

        pub activity_id: Uuid,
        pub student_id: Uuid,
        pub school_id: Uuid,

        /// Lowercase lifecycle status tag
        pub status: String,

        pub waitlisted: bool,
        pub application_date: DateTimeUtc,
        pub application_message: Option<String>,
        pub reviewed_by: Option<Uuid>,
        pub reviewed_at: Option<DateTimeUtc>,
        pub review_note: Option<String>,

        /// Attendance records as a JSON array ordered by date
        pub attendance: Json,

        pub participation_score: Option<i16>,
        pub feedback: Option<String>,
        pub completed_at: Option<DateTimeUtc>,
        pub withdrawn_at: Option<DateTimeUtc>,
        pub updated_at: DateTimeUtc,
        pub version: i64,
    }

    #[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
    pub enum Relation {
        #[sea_orm(
            belongs_to = "super::activity::Entity",
            from = "Column::ActivityId",
            to = "super::activity::Column::Id",
            on_delete = "Cascade"
        )]
        Activity,
    }

    impl Related<super::activity::Entity> for Entity {
        fn to() -> RelationDef {
            Relation::Activity.def()
        }
    }

    impl ActiveModelBehavior for ActiveModel {}
}

/// Append-only audit log table entity
pub mod audit_log {
    use sea_orm::entity::prelude::*;

    #[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq)]
    #[sea_orm(table_name = "enrollment_audit_log")]
    pub struct Model {
        /// Commit order
        #[sea_orm(primary_key)]
        pub seq: i32,

        #[sea_orm(unique)]
        pub id: Uuid,

        pub action: String,
        pub performed_by: Uuid,
        pub target_id: Uuid,
        pub school_id: Uuid,

        /// Event payload as JSON
        pub details: Json,

        pub timestamp: DateTimeUtc,
    }

    #[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
    pub enum Relation {}

    impl ActiveModelBehavior for ActiveModel {}
}
