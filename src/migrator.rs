use sea_orm_migration::prelude::*;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20250101_000001_create_reference_tables::Migration),
            Box::new(m20250101_000002_create_appointment_tables::Migration),
            Box::new(m20250101_000003_create_work_order_tables::Migration),
            Box::new(m20250101_000004_create_purchased_parts_table::Migration),
            Box::new(m20250101_000005_create_next_service_reminders_table::Migration),
        ]
    }
}

// Identifiers shared between migrations

#[derive(DeriveIden)]
enum OrderTypes {
    Table,
    Id,
    Name,
}

#[derive(DeriveIden)]
enum ServiceTypes {
    Table,
    Id,
    Name,
}

#[derive(DeriveIden)]
enum OrderStatuses {
    Table,
    Id,
    Name,
}

#[derive(DeriveIden)]
enum WorkStatuses {
    Table,
    Id,
    Name,
    Color,
}

#[derive(DeriveIden)]
enum Customers {
    Table,
    Id,
    FullName,
    TaxId,
    MobilePhone,
    HomePhone,
    Email,
    Address,
    Active,
    CreatedAt,
}

#[derive(DeriveIden)]
enum Vehicles {
    Table,
    Id,
    CustomerId,
    Make,
    Model,
    Year,
    Color,
    Trim,
    Vin,
    Plates,
    Odometer,
    Active,
}

#[derive(DeriveIden)]
enum StaffMembers {
    Table,
    Id,
    FullName,
    Role,
    Active,
}

#[derive(DeriveIden)]
enum Appointments {
    Table,
    Id,
    OrderTypeId,
    CustomerId,
    VehicleId,
    ServiceTypeId,
    SchedulerId,
    ScheduledAt,
    CreatedAt,
    Active,
}

#[derive(DeriveIden)]
enum AppointmentWorkItems {
    Table,
    Id,
    AppointmentId,
    Description,
    Instructions,
    PartsReady,
    Active,
    CreatedAt,
}

#[derive(DeriveIden)]
enum WorkOrders {
    Table,
    Id,
    OrderNumber,
    OrderTypeId,
    CustomerId,
    VehicleId,
    ServiceTypeId,
    AdvisorId,
    Odometer,
    Status,
    PromisedDeliveryAt,
    FinishedAt,
    DeliveredAt,
    AdvisorNotes,
    ShopManagerNotes,
    CostTotal,
    CostTotalWithTax,
    TotalWorkItems,
    CompletedWorkItems,
    Progress,
    HasEvidence,
    CreatedAt,
    Active,
}

#[derive(DeriveIden)]
enum OrderWorkItems {
    Table,
    Id,
    WorkOrderId,
    Description,
    Instructions,
    TechnicianId,
    AssignedAt,
    StartedAt,
    FinishedAt,
    TechnicianComments,
    ShopManagerComments,
    PartsReady,
    LaborCost,
    PartsTotal,
    Status,
    Active,
    CreatedAt,
}

#[derive(DeriveIden)]
enum ServiceChecklists {
    Table,
    Id,
    WorkOrderId,
    Steering,
    Suspension,
    Tires,
    Lights,
    Brakes,
    PartsReplaced,
    WorkPerformed,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum PurchasedParts {
    Table,
    Id,
    AppointmentWorkItemId,
    OrderWorkItemId,
    Description,
    Quantity,
    UnitCost,
    UnitSalePrice,
    PurchasedAt,
    Transferred,
}

#[derive(DeriveIden)]
enum NextServiceReminders {
    Table,
    Id,
    CustomerId,
    VehicleId,
    LastServiceName,
    NextServiceLabel,
    LastOdometer,
    LastServiceDate,
    NextServiceDate,
    NextServiceOdometer,
    FirstSent,
    SecondSent,
    ThirdSent,
    Active,
    ModifiedAt,
}

fn id_column<T: IntoIden>(iden: T) -> ColumnDef {
    ColumnDef::new(iden)
        .integer()
        .not_null()
        .auto_increment()
        .primary_key()
        .to_owned()
}

fn money_column<T: IntoIden>(iden: T) -> ColumnDef {
    ColumnDef::new(iden)
        .decimal_len(12, 2)
        .not_null()
        .default(0)
        .to_owned()
}

fn seed_error(err: sea_orm_migration::sea_query::error::Error) -> DbErr {
    DbErr::Migration(format!("invalid seed row: {}", err))
}

mod m20250101_000001_create_reference_tables {
    use super::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20250101_000001_create_reference_tables"
        }
    }

    const ORDER_TYPES: [(i32, &str); 5] = [
        (1, "Service"),
        (2, "Diagnostic"),
        (3, "Repair"),
        (4, "Warranty"),
        (5, "Return"),
    ];

    const SERVICE_TYPES: [(i32, &str); 4] = [
        (1, "First Service"),
        (2, "Second Service"),
        (3, "Third Service"),
        (4, "External Service"),
    ];

    const ORDER_STATUSES: [(i32, &str); 5] = [
        (1, "Pending"),
        (2, "Assigned"),
        (3, "In Progress"),
        (4, "Delivered"),
        (5, "Cancelled"),
    ];

    const WORK_STATUSES: [(i32, &str, &str); 6] = [
        (1, "Pending", "#9E9E9E"),
        (2, "Assigned", "#2196F3"),
        (3, "In Progress", "#FF9800"),
        (4, "Completed", "#4CAF50"),
        (5, "Paused", "#FFC107"),
        (6, "Cancelled", "#F44336"),
    ];

    async fn create_lookup<T>(manager: &SchemaManager<'_>, table: T, id: T, name: T) -> Result<(), DbErr>
    where
        T: IntoIden + 'static,
    {
        manager
            .create_table(
                Table::create()
                    .table(table)
                    .if_not_exists()
                    .col(ColumnDef::new(id).integer().not_null().primary_key())
                    .col(ColumnDef::new(name).string_len(100).not_null())
                    .to_owned(),
            )
            .await
    }

    async fn seed_lookup<T>(
        manager: &SchemaManager<'_>,
        table: T,
        id: T,
        name: T,
        rows: &[(i32, &str)],
    ) -> Result<(), DbErr>
    where
        T: IntoIden + 'static,
    {
        let mut insert = Query::insert();
        insert.into_table(table).columns([id, name]);
        for (row_id, row_name) in rows {
            insert
                .values([(*row_id).into(), (*row_name).into()])
                .map_err(seed_error)?;
        }
        manager.exec_stmt(insert).await
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            create_lookup(manager, OrderTypes::Table, OrderTypes::Id, OrderTypes::Name).await?;
            create_lookup(
                manager,
                ServiceTypes::Table,
                ServiceTypes::Id,
                ServiceTypes::Name,
            )
            .await?;
            create_lookup(
                manager,
                OrderStatuses::Table,
                OrderStatuses::Id,
                OrderStatuses::Name,
            )
            .await?;

            manager
                .create_table(
                    Table::create()
                        .table(WorkStatuses::Table)
                        .if_not_exists()
                        .col(ColumnDef::new(WorkStatuses::Id).integer().not_null().primary_key())
                        .col(ColumnDef::new(WorkStatuses::Name).string_len(100).not_null())
                        .col(ColumnDef::new(WorkStatuses::Color).string_len(16).not_null())
                        .to_owned(),
                )
                .await?;

            seed_lookup(
                manager,
                OrderTypes::Table,
                OrderTypes::Id,
                OrderTypes::Name,
                &ORDER_TYPES,
            )
            .await?;
            seed_lookup(
                manager,
                ServiceTypes::Table,
                ServiceTypes::Id,
                ServiceTypes::Name,
                &SERVICE_TYPES,
            )
            .await?;
            seed_lookup(
                manager,
                OrderStatuses::Table,
                OrderStatuses::Id,
                OrderStatuses::Name,
                &ORDER_STATUSES,
            )
            .await?;

            let mut statuses = Query::insert();
            statuses
                .into_table(WorkStatuses::Table)
                .columns([WorkStatuses::Id, WorkStatuses::Name, WorkStatuses::Color]);
            for (id, name, color) in WORK_STATUSES {
                statuses
                    .values([id.into(), name.into(), color.into()])
                    .map_err(seed_error)?;
            }
            manager.exec_stmt(statuses).await?;

            manager
                .create_table(
                    Table::create()
                        .table(Customers::Table)
                        .if_not_exists()
                        .col(id_column(Customers::Id))
                        .col(ColumnDef::new(Customers::FullName).string_len(200).not_null())
                        .col(ColumnDef::new(Customers::TaxId).string_len(20))
                        .col(ColumnDef::new(Customers::MobilePhone).string_len(20).not_null())
                        .col(ColumnDef::new(Customers::HomePhone).string_len(20))
                        .col(ColumnDef::new(Customers::Email).string_len(200))
                        .col(ColumnDef::new(Customers::Address).string_len(300))
                        .col(ColumnDef::new(Customers::Active).boolean().not_null().default(true))
                        .col(ColumnDef::new(Customers::CreatedAt).date_time().not_null())
                        .to_owned(),
                )
                .await?;

            manager
                .create_table(
                    Table::create()
                        .table(Vehicles::Table)
                        .if_not_exists()
                        .col(id_column(Vehicles::Id))
                        .col(ColumnDef::new(Vehicles::CustomerId).integer().not_null())
                        .col(ColumnDef::new(Vehicles::Make).string_len(50).not_null())
                        .col(ColumnDef::new(Vehicles::Model).string_len(50).not_null())
                        .col(ColumnDef::new(Vehicles::Year).integer().not_null())
                        .col(ColumnDef::new(Vehicles::Color).string_len(30))
                        .col(ColumnDef::new(Vehicles::Trim).string_len(50))
                        .col(ColumnDef::new(Vehicles::Vin).string_len(17).not_null())
                        .col(ColumnDef::new(Vehicles::Plates).string_len(15))
                        .col(ColumnDef::new(Vehicles::Odometer).integer())
                        .col(ColumnDef::new(Vehicles::Active).boolean().not_null().default(true))
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_vehicles_customer_id")
                                .from(Vehicles::Table, Vehicles::CustomerId)
                                .to(Customers::Table, Customers::Id),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_table(
                    Table::create()
                        .table(StaffMembers::Table)
                        .if_not_exists()
                        .col(id_column(StaffMembers::Id))
                        .col(ColumnDef::new(StaffMembers::FullName).string_len(200).not_null())
                        .col(ColumnDef::new(StaffMembers::Role).string_len(30).not_null())
                        .col(
                            ColumnDef::new(StaffMembers::Active)
                                .boolean()
                                .not_null()
                                .default(true),
                        )
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(StaffMembers::Table).to_owned())
                .await?;
            manager
                .drop_table(Table::drop().table(Vehicles::Table).to_owned())
                .await?;
            manager
                .drop_table(Table::drop().table(Customers::Table).to_owned())
                .await?;
            manager
                .drop_table(Table::drop().table(WorkStatuses::Table).to_owned())
                .await?;
            manager
                .drop_table(Table::drop().table(OrderStatuses::Table).to_owned())
                .await?;
            manager
                .drop_table(Table::drop().table(ServiceTypes::Table).to_owned())
                .await?;
            manager
                .drop_table(Table::drop().table(OrderTypes::Table).to_owned())
                .await
        }
    }
}

mod m20250101_000002_create_appointment_tables {
    use super::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20250101_000002_create_appointment_tables"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(Appointments::Table)
                        .if_not_exists()
                        .col(id_column(Appointments::Id))
                        .col(ColumnDef::new(Appointments::OrderTypeId).integer().not_null())
                        .col(ColumnDef::new(Appointments::CustomerId).integer().not_null())
                        .col(ColumnDef::new(Appointments::VehicleId).integer().not_null())
                        .col(ColumnDef::new(Appointments::ServiceTypeId).integer())
                        .col(ColumnDef::new(Appointments::SchedulerId).integer().not_null())
                        .col(ColumnDef::new(Appointments::ScheduledAt).date_time().not_null())
                        .col(ColumnDef::new(Appointments::CreatedAt).date_time().not_null())
                        .col(
                            ColumnDef::new(Appointments::Active)
                                .boolean()
                                .not_null()
                                .default(true),
                        )
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_appointments_customer_id")
                                .from(Appointments::Table, Appointments::CustomerId)
                                .to(Customers::Table, Customers::Id),
                        )
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_appointments_vehicle_id")
                                .from(Appointments::Table, Appointments::VehicleId)
                                .to(Vehicles::Table, Vehicles::Id),
                        )
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_appointments_scheduler_id")
                                .from(Appointments::Table, Appointments::SchedulerId)
                                .to(StaffMembers::Table, StaffMembers::Id),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .name("idx_appointments_scheduled_at")
                        .table(Appointments::Table)
                        .col(Appointments::ScheduledAt)
                        .to_owned(),
                )
                .await?;

            manager
                .create_table(
                    Table::create()
                        .table(AppointmentWorkItems::Table)
                        .if_not_exists()
                        .col(id_column(AppointmentWorkItems::Id))
                        .col(
                            ColumnDef::new(AppointmentWorkItems::AppointmentId)
                                .integer()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(AppointmentWorkItems::Description)
                                .string_len(500)
                                .not_null(),
                        )
                        .col(ColumnDef::new(AppointmentWorkItems::Instructions).text())
                        .col(
                            ColumnDef::new(AppointmentWorkItems::PartsReady)
                                .boolean()
                                .not_null()
                                .default(false),
                        )
                        .col(
                            ColumnDef::new(AppointmentWorkItems::Active)
                                .boolean()
                                .not_null()
                                .default(true),
                        )
                        .col(
                            ColumnDef::new(AppointmentWorkItems::CreatedAt)
                                .date_time()
                                .not_null(),
                        )
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_appointment_work_items_appointment_id")
                                .from(
                                    AppointmentWorkItems::Table,
                                    AppointmentWorkItems::AppointmentId,
                                )
                                .to(Appointments::Table, Appointments::Id),
                        )
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(AppointmentWorkItems::Table).to_owned())
                .await?;
            manager
                .drop_table(Table::drop().table(Appointments::Table).to_owned())
                .await
        }
    }
}

mod m20250101_000003_create_work_order_tables {
    use super::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20250101_000003_create_work_order_tables"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(WorkOrders::Table)
                        .if_not_exists()
                        .col(id_column(WorkOrders::Id))
                        .col(
                            ColumnDef::new(WorkOrders::OrderNumber)
                                .string_len(20)
                                .not_null()
                                .unique_key(),
                        )
                        .col(ColumnDef::new(WorkOrders::OrderTypeId).integer().not_null())
                        .col(ColumnDef::new(WorkOrders::CustomerId).integer().not_null())
                        .col(ColumnDef::new(WorkOrders::VehicleId).integer().not_null())
                        .col(ColumnDef::new(WorkOrders::ServiceTypeId).integer())
                        .col(ColumnDef::new(WorkOrders::AdvisorId).integer().not_null())
                        .col(ColumnDef::new(WorkOrders::Odometer).integer().not_null())
                        .col(
                            ColumnDef::new(WorkOrders::Status)
                                .integer()
                                .not_null()
                                .default(1),
                        )
                        .col(
                            ColumnDef::new(WorkOrders::PromisedDeliveryAt)
                                .date_time()
                                .not_null(),
                        )
                        .col(ColumnDef::new(WorkOrders::FinishedAt).date_time())
                        .col(ColumnDef::new(WorkOrders::DeliveredAt).date_time())
                        .col(ColumnDef::new(WorkOrders::AdvisorNotes).text())
                        .col(ColumnDef::new(WorkOrders::ShopManagerNotes).text())
                        .col(money_column(WorkOrders::CostTotal))
                        .col(money_column(WorkOrders::CostTotalWithTax))
                        .col(
                            ColumnDef::new(WorkOrders::TotalWorkItems)
                                .integer()
                                .not_null()
                                .default(0),
                        )
                        .col(
                            ColumnDef::new(WorkOrders::CompletedWorkItems)
                                .integer()
                                .not_null()
                                .default(0),
                        )
                        .col(money_column(WorkOrders::Progress))
                        .col(
                            ColumnDef::new(WorkOrders::HasEvidence)
                                .boolean()
                                .not_null()
                                .default(false),
                        )
                        .col(ColumnDef::new(WorkOrders::CreatedAt).date_time().not_null())
                        .col(
                            ColumnDef::new(WorkOrders::Active)
                                .boolean()
                                .not_null()
                                .default(true),
                        )
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_work_orders_customer_id")
                                .from(WorkOrders::Table, WorkOrders::CustomerId)
                                .to(Customers::Table, Customers::Id),
                        )
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_work_orders_vehicle_id")
                                .from(WorkOrders::Table, WorkOrders::VehicleId)
                                .to(Vehicles::Table, Vehicles::Id),
                        )
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_work_orders_advisor_id")
                                .from(WorkOrders::Table, WorkOrders::AdvisorId)
                                .to(StaffMembers::Table, StaffMembers::Id),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_table(
                    Table::create()
                        .table(OrderWorkItems::Table)
                        .if_not_exists()
                        .col(id_column(OrderWorkItems::Id))
                        .col(ColumnDef::new(OrderWorkItems::WorkOrderId).integer().not_null())
                        .col(
                            ColumnDef::new(OrderWorkItems::Description)
                                .string_len(500)
                                .not_null(),
                        )
                        .col(ColumnDef::new(OrderWorkItems::Instructions).text())
                        .col(ColumnDef::new(OrderWorkItems::TechnicianId).integer())
                        .col(ColumnDef::new(OrderWorkItems::AssignedAt).date_time())
                        .col(ColumnDef::new(OrderWorkItems::StartedAt).date_time())
                        .col(ColumnDef::new(OrderWorkItems::FinishedAt).date_time())
                        .col(ColumnDef::new(OrderWorkItems::TechnicianComments).text())
                        .col(ColumnDef::new(OrderWorkItems::ShopManagerComments).text())
                        .col(
                            ColumnDef::new(OrderWorkItems::PartsReady)
                                .boolean()
                                .not_null()
                                .default(false),
                        )
                        .col(money_column(OrderWorkItems::LaborCost))
                        .col(money_column(OrderWorkItems::PartsTotal))
                        .col(
                            ColumnDef::new(OrderWorkItems::Status)
                                .integer()
                                .not_null()
                                .default(1),
                        )
                        .col(
                            ColumnDef::new(OrderWorkItems::Active)
                                .boolean()
                                .not_null()
                                .default(true),
                        )
                        .col(
                            ColumnDef::new(OrderWorkItems::CreatedAt)
                                .date_time()
                                .not_null(),
                        )
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_order_work_items_work_order_id")
                                .from(OrderWorkItems::Table, OrderWorkItems::WorkOrderId)
                                .to(WorkOrders::Table, WorkOrders::Id),
                        )
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_order_work_items_technician_id")
                                .from(OrderWorkItems::Table, OrderWorkItems::TechnicianId)
                                .to(StaffMembers::Table, StaffMembers::Id),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_table(
                    Table::create()
                        .table(ServiceChecklists::Table)
                        .if_not_exists()
                        .col(id_column(ServiceChecklists::Id))
                        .col(
                            ColumnDef::new(ServiceChecklists::WorkOrderId)
                                .integer()
                                .not_null()
                                .unique_key(),
                        )
                        .col(ColumnDef::new(ServiceChecklists::Steering).string_len(100).not_null())
                        .col(
                            ColumnDef::new(ServiceChecklists::Suspension)
                                .string_len(100)
                                .not_null(),
                        )
                        .col(ColumnDef::new(ServiceChecklists::Tires).string_len(100).not_null())
                        .col(ColumnDef::new(ServiceChecklists::Lights).string_len(100).not_null())
                        .col(ColumnDef::new(ServiceChecklists::Brakes).string_len(100).not_null())
                        .col(
                            ColumnDef::new(ServiceChecklists::PartsReplaced)
                                .boolean()
                                .not_null()
                                .default(false),
                        )
                        .col(
                            ColumnDef::new(ServiceChecklists::WorkPerformed)
                                .boolean()
                                .not_null()
                                .default(false),
                        )
                        .col(
                            ColumnDef::new(ServiceChecklists::UpdatedAt)
                                .date_time()
                                .not_null(),
                        )
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_service_checklists_work_order_id")
                                .from(ServiceChecklists::Table, ServiceChecklists::WorkOrderId)
                                .to(WorkOrders::Table, WorkOrders::Id),
                        )
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(ServiceChecklists::Table).to_owned())
                .await?;
            manager
                .drop_table(Table::drop().table(OrderWorkItems::Table).to_owned())
                .await?;
            manager
                .drop_table(Table::drop().table(WorkOrders::Table).to_owned())
                .await
        }
    }
}

mod m20250101_000004_create_purchased_parts_table {
    use super::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20250101_000004_create_purchased_parts_table"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(PurchasedParts::Table)
                        .if_not_exists()
                        .col(id_column(PurchasedParts::Id))
                        .col(ColumnDef::new(PurchasedParts::AppointmentWorkItemId).integer())
                        .col(ColumnDef::new(PurchasedParts::OrderWorkItemId).integer())
                        .col(
                            ColumnDef::new(PurchasedParts::Description)
                                .string_len(200)
                                .not_null(),
                        )
                        .col(ColumnDef::new(PurchasedParts::Quantity).integer().not_null())
                        .col(
                            ColumnDef::new(PurchasedParts::UnitCost)
                                .decimal_len(12, 2)
                                .not_null(),
                        )
                        .col(ColumnDef::new(PurchasedParts::UnitSalePrice).decimal_len(12, 2))
                        .col(
                            ColumnDef::new(PurchasedParts::PurchasedAt)
                                .date_time()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(PurchasedParts::Transferred)
                                .boolean()
                                .not_null()
                                .default(false),
                        )
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_purchased_parts_appointment_work_item_id")
                                .from(PurchasedParts::Table, PurchasedParts::AppointmentWorkItemId)
                                .to(AppointmentWorkItems::Table, AppointmentWorkItems::Id),
                        )
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_purchased_parts_order_work_item_id")
                                .from(PurchasedParts::Table, PurchasedParts::OrderWorkItemId)
                                .to(OrderWorkItems::Table, OrderWorkItems::Id),
                        )
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(PurchasedParts::Table).to_owned())
                .await
        }
    }
}

mod m20250101_000005_create_next_service_reminders_table {
    use super::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20250101_000005_create_next_service_reminders_table"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(NextServiceReminders::Table)
                        .if_not_exists()
                        .col(id_column(NextServiceReminders::Id))
                        .col(
                            ColumnDef::new(NextServiceReminders::CustomerId)
                                .integer()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(NextServiceReminders::VehicleId)
                                .integer()
                                .not_null()
                                .unique_key(),
                        )
                        .col(
                            ColumnDef::new(NextServiceReminders::LastServiceName)
                                .string_len(100)
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(NextServiceReminders::NextServiceLabel)
                                .string_len(100)
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(NextServiceReminders::LastOdometer)
                                .integer()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(NextServiceReminders::LastServiceDate)
                                .date()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(NextServiceReminders::NextServiceDate)
                                .date()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(NextServiceReminders::NextServiceOdometer)
                                .integer()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(NextServiceReminders::FirstSent)
                                .boolean()
                                .not_null()
                                .default(false),
                        )
                        .col(
                            ColumnDef::new(NextServiceReminders::SecondSent)
                                .boolean()
                                .not_null()
                                .default(false),
                        )
                        .col(
                            ColumnDef::new(NextServiceReminders::ThirdSent)
                                .boolean()
                                .not_null()
                                .default(false),
                        )
                        .col(
                            ColumnDef::new(NextServiceReminders::Active)
                                .boolean()
                                .not_null()
                                .default(true),
                        )
                        .col(
                            ColumnDef::new(NextServiceReminders::ModifiedAt)
                                .date_time()
                                .not_null(),
                        )
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_next_service_reminders_customer_id")
                                .from(NextServiceReminders::Table, NextServiceReminders::CustomerId)
                                .to(Customers::Table, Customers::Id),
                        )
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_next_service_reminders_vehicle_id")
                                .from(NextServiceReminders::Table, NextServiceReminders::VehicleId)
                                .to(Vehicles::Table, Vehicles::Id),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .name("idx_next_service_reminders_next_service_date")
                        .table(NextServiceReminders::Table)
                        .col(NextServiceReminders::NextServiceDate)
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(NextServiceReminders::Table).to_owned())
                .await
        }
    }
}
