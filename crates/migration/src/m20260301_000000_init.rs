//! Initial schema migration.
//!
//! Creates the tables of the BAWASA back office:
//!
//! - `accounts`: identity, credentials and role
//! - `consumers`: water-service consumers linked to an account
//! - `cashiers`, `bawasa_meter_reader`: role-specific account extensions
//! - `bawasa_meter_readings`: monthly previous/present reading pairs
//! - `meter_reader_assignments`: reader ↔ consumer links for a cycle
//! - `bawasa_billings`: computed bills and their payment status
//! - `issue_report`: maintenance tickets

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

// ─────────────────────────────────────────────────────────────────────────────
// Table identifiers
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Iden)]
enum Accounts {
    Table,
    Id,
    Email,
    PasswordHash,
    FullName,
    Role,
    CreatedAt,
    ResetToken,
    ResetExpiresAt,
}

#[derive(Iden)]
enum Consumers {
    Table,
    Id,
    AccountId,
    WaterMeterNo,
    Address,
    Phone,
    RegisteredVoter,
    InitialReading,
    CreatedAt,
}

#[derive(Iden)]
pub(crate) enum Cashiers {
    Table,
    Id,
    AccountId,
    EmployeeNo,
    CreatedAt,
}

#[derive(Iden)]
enum BawasaMeterReader {
    Table,
    Id,
    AccountId,
    AssignedArea,
    CreatedAt,
}

#[derive(Iden)]
enum BawasaMeterReadings {
    Table,
    Id,
    ConsumerId,
    CycleMonth,
    PreviousReading,
    PresentReading,
    ReadingDate,
    Remarks,
    CreatedAt,
}

#[derive(Iden)]
enum MeterReaderAssignments {
    Table,
    Id,
    ReaderId,
    ConsumerId,
    Status,
    AssignedAt,
    CompletedAt,
}

#[derive(Iden)]
pub(crate) enum BawasaBillings {
    Table,
    Id,
    ConsumerId,
    MeterReadingId,
    BillingMonth,
    #[iden = "consumption_m3"]
    ConsumptionM3,
    #[iden = "consumption_10_or_below"]
    Consumption10OrBelow,
    #[iden = "consumption_over_10"]
    ConsumptionOver10,
    YearsOfService,
    DiscountPercent,
    #[iden = "amount_10_or_below"]
    Amount10OrBelow,
    #[iden = "amount_10_or_below_with_discount"]
    Amount10OrBelowWithDiscount,
    #[iden = "amount_over_10"]
    AmountOver10,
    TotalAmountDue,
    AmountPaid,
    DueDate,
    PaymentStatus,
    PaymentDate,
    CreatedAt,
}

#[derive(Iden)]
enum IssueReport {
    Table,
    Id,
    ReportedBy,
    ConsumerId,
    IssueType,
    Description,
    Priority,
    Status,
    CreatedAt,
    ResolvedAt,
}

// ─────────────────────────────────────────────────────────────────────────────
// Migration implementation
// ─────────────────────────────────────────────────────────────────────────────

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // ───────────────────────────────────────────────────────────────────
        // 1. Accounts
        // ───────────────────────────────────────────────────────────────────
        manager
            .create_table(
                Table::create()
                    .table(Accounts::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Accounts::Id)
                            .string()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Accounts::Email).string().not_null())
                    .col(ColumnDef::new(Accounts::PasswordHash).string().not_null())
                    .col(ColumnDef::new(Accounts::FullName).string().not_null())
                    .col(ColumnDef::new(Accounts::Role).string().not_null())
                    .col(
                        ColumnDef::new(Accounts::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(ColumnDef::new(Accounts::ResetToken).string())
                    .col(ColumnDef::new(Accounts::ResetExpiresAt).timestamp_with_time_zone())
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-accounts-email-unique")
                    .table(Accounts::Table)
                    .col(Accounts::Email)
                    .unique()
                    .to_owned(),
            )
            .await?;

        // ───────────────────────────────────────────────────────────────────
        // 2. Consumers
        // ───────────────────────────────────────────────────────────────────
        manager
            .create_table(
                Table::create()
                    .table(Consumers::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Consumers::Id)
                            .string()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Consumers::AccountId).string().not_null())
                    .col(ColumnDef::new(Consumers::WaterMeterNo).string().not_null())
                    .col(ColumnDef::new(Consumers::Address).string())
                    .col(ColumnDef::new(Consumers::Phone).string())
                    .col(
                        ColumnDef::new(Consumers::RegisteredVoter)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(
                        ColumnDef::new(Consumers::InitialReading)
                            .big_integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(Consumers::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-consumers-account_id")
                            .from(Consumers::Table, Consumers::AccountId)
                            .to(Accounts::Table, Accounts::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-consumers-account_id-unique")
                    .table(Consumers::Table)
                    .col(Consumers::AccountId)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-consumers-water_meter_no-unique")
                    .table(Consumers::Table)
                    .col(Consumers::WaterMeterNo)
                    .unique()
                    .to_owned(),
            )
            .await?;

        // ───────────────────────────────────────────────────────────────────
        // 3. Staff extensions
        // ───────────────────────────────────────────────────────────────────
        manager
            .create_table(
                Table::create()
                    .table(Cashiers::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Cashiers::Id)
                            .string()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Cashiers::AccountId).string().not_null())
                    .col(ColumnDef::new(Cashiers::EmployeeNo).string().not_null())
                    .col(
                        ColumnDef::new(Cashiers::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-cashiers-account_id")
                            .from(Cashiers::Table, Cashiers::AccountId)
                            .to(Accounts::Table, Accounts::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-cashiers-account_id-unique")
                    .table(Cashiers::Table)
                    .col(Cashiers::AccountId)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-cashiers-employee_no-unique")
                    .table(Cashiers::Table)
                    .col(Cashiers::EmployeeNo)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(BawasaMeterReader::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(BawasaMeterReader::Id)
                            .string()
                            .not_null()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(BawasaMeterReader::AccountId)
                            .string()
                            .not_null(),
                    )
                    .col(ColumnDef::new(BawasaMeterReader::AssignedArea).string())
                    .col(
                        ColumnDef::new(BawasaMeterReader::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-bawasa_meter_reader-account_id")
                            .from(BawasaMeterReader::Table, BawasaMeterReader::AccountId)
                            .to(Accounts::Table, Accounts::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-bawasa_meter_reader-account_id-unique")
                    .table(BawasaMeterReader::Table)
                    .col(BawasaMeterReader::AccountId)
                    .unique()
                    .to_owned(),
            )
            .await?;

        // ───────────────────────────────────────────────────────────────────
        // 4. Meter readings
        // ───────────────────────────────────────────────────────────────────
        manager
            .create_table(
                Table::create()
                    .table(BawasaMeterReadings::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(BawasaMeterReadings::Id)
                            .string()
                            .not_null()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(BawasaMeterReadings::ConsumerId)
                            .string()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(BawasaMeterReadings::CycleMonth)
                            .date()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(BawasaMeterReadings::PreviousReading)
                            .big_integer()
                            .not_null(),
                    )
                    .col(ColumnDef::new(BawasaMeterReadings::PresentReading).big_integer())
                    .col(ColumnDef::new(BawasaMeterReadings::ReadingDate).date())
                    .col(ColumnDef::new(BawasaMeterReadings::Remarks).string())
                    .col(
                        ColumnDef::new(BawasaMeterReadings::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-bawasa_meter_readings-consumer_id")
                            .from(BawasaMeterReadings::Table, BawasaMeterReadings::ConsumerId)
                            .to(Consumers::Table, Consumers::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-bawasa_meter_readings-consumer_id-cycle_month-unique")
                    .table(BawasaMeterReadings::Table)
                    .col(BawasaMeterReadings::ConsumerId)
                    .col(BawasaMeterReadings::CycleMonth)
                    .unique()
                    .to_owned(),
            )
            .await?;

        // ───────────────────────────────────────────────────────────────────
        // 5. Reader assignments
        // ───────────────────────────────────────────────────────────────────
        manager
            .create_table(
                Table::create()
                    .table(MeterReaderAssignments::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(MeterReaderAssignments::Id)
                            .string()
                            .not_null()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(MeterReaderAssignments::ReaderId)
                            .string()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(MeterReaderAssignments::ConsumerId)
                            .string()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(MeterReaderAssignments::Status)
                            .string()
                            .not_null()
                            .default("assigned"),
                    )
                    .col(
                        ColumnDef::new(MeterReaderAssignments::AssignedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(MeterReaderAssignments::CompletedAt)
                            .timestamp_with_time_zone(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-meter_reader_assignments-reader_id")
                            .from(
                                MeterReaderAssignments::Table,
                                MeterReaderAssignments::ReaderId,
                            )
                            .to(BawasaMeterReader::Table, BawasaMeterReader::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-meter_reader_assignments-consumer_id")
                            .from(
                                MeterReaderAssignments::Table,
                                MeterReaderAssignments::ConsumerId,
                            )
                            .to(Consumers::Table, Consumers::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-meter_reader_assignments-reader_id-status")
                    .table(MeterReaderAssignments::Table)
                    .col(MeterReaderAssignments::ReaderId)
                    .col(MeterReaderAssignments::Status)
                    .to_owned(),
            )
            .await?;

        // ───────────────────────────────────────────────────────────────────
        // 6. Billings
        // ───────────────────────────────────────────────────────────────────
        manager
            .create_table(
                Table::create()
                    .table(BawasaBillings::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(BawasaBillings::Id)
                            .string()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(BawasaBillings::ConsumerId).string().not_null())
                    .col(
                        ColumnDef::new(BawasaBillings::MeterReadingId)
                            .string()
                            .not_null(),
                    )
                    .col(ColumnDef::new(BawasaBillings::BillingMonth).date().not_null())
                    .col(
                        ColumnDef::new(BawasaBillings::ConsumptionM3)
                            .big_integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(BawasaBillings::Consumption10OrBelow)
                            .big_integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(BawasaBillings::ConsumptionOver10)
                            .big_integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(BawasaBillings::YearsOfService)
                            .integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(BawasaBillings::DiscountPercent)
                            .integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(BawasaBillings::Amount10OrBelow)
                            .big_integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(BawasaBillings::Amount10OrBelowWithDiscount)
                            .big_integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(BawasaBillings::AmountOver10)
                            .big_integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(BawasaBillings::TotalAmountDue)
                            .big_integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(BawasaBillings::AmountPaid)
                            .big_integer()
                            .not_null()
                            .default(0),
                    )
                    .col(ColumnDef::new(BawasaBillings::DueDate).date().not_null())
                    .col(
                        ColumnDef::new(BawasaBillings::PaymentStatus)
                            .string()
                            .not_null()
                            .default("unpaid"),
                    )
                    .col(ColumnDef::new(BawasaBillings::PaymentDate).timestamp_with_time_zone())
                    .col(
                        ColumnDef::new(BawasaBillings::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-bawasa_billings-consumer_id")
                            .from(BawasaBillings::Table, BawasaBillings::ConsumerId)
                            .to(Consumers::Table, Consumers::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-bawasa_billings-meter_reading_id")
                            .from(BawasaBillings::Table, BawasaBillings::MeterReadingId)
                            .to(BawasaMeterReadings::Table, BawasaMeterReadings::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-bawasa_billings-meter_reading_id-unique")
                    .table(BawasaBillings::Table)
                    .col(BawasaBillings::MeterReadingId)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-bawasa_billings-payment_status-due_date")
                    .table(BawasaBillings::Table)
                    .col(BawasaBillings::PaymentStatus)
                    .col(BawasaBillings::DueDate)
                    .to_owned(),
            )
            .await?;

        // ───────────────────────────────────────────────────────────────────
        // 7. Issue reports
        // ───────────────────────────────────────────────────────────────────
        manager
            .create_table(
                Table::create()
                    .table(IssueReport::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(IssueReport::Id)
                            .string()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(IssueReport::ReportedBy).string().not_null())
                    .col(ColumnDef::new(IssueReport::ConsumerId).string())
                    .col(ColumnDef::new(IssueReport::IssueType).string().not_null())
                    .col(ColumnDef::new(IssueReport::Description).string().not_null())
                    .col(
                        ColumnDef::new(IssueReport::Priority)
                            .string()
                            .not_null()
                            .default("medium"),
                    )
                    .col(
                        ColumnDef::new(IssueReport::Status)
                            .string()
                            .not_null()
                            .default("open"),
                    )
                    .col(
                        ColumnDef::new(IssueReport::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(ColumnDef::new(IssueReport::ResolvedAt).timestamp_with_time_zone())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-issue_report-reported_by")
                            .from(IssueReport::Table, IssueReport::ReportedBy)
                            .to(Accounts::Table, Accounts::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-issue_report-consumer_id")
                            .from(IssueReport::Table, IssueReport::ConsumerId)
                            .to(Consumers::Table, Consumers::Id)
                            .on_delete(ForeignKeyAction::SetNull),
                    )
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(IssueReport::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(BawasaBillings::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(MeterReaderAssignments::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(BawasaMeterReadings::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(BawasaMeterReader::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Cashiers::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Consumers::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Accounts::Table).to_owned())
            .await?;
        Ok(())
    }
}
