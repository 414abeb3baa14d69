use std::{error::Error, io::Write};

use chrono::{NaiveDate, Utc};
use clap::{Args, Parser, Subcommand};
use crossterm::{
    cursor,
    event::{self, Event, KeyCode, KeyEvent, KeyModifiers},
    execute,
    style::Print,
    terminal,
    terminal::ClearType,
};
use engine::{Account, BillingPolicy, Engine, NewAccount, Role};
use migration::MigratorTrait;
use sea_orm::{Database, DatabaseConnection};

const MIN_PASSWORD_LEN: usize = 8;

#[derive(Parser, Debug)]
#[command(name = "bawasa_admin")]
#[command(about = "Admin utilities for BAWASA (bootstrap admins, run billing cycles)")]
struct Cli {
    /// Database connection string (also read from `DATABASE_URL`).
    #[arg(
        long,
        env = "DATABASE_URL",
        default_value = "sqlite:./bawasa.db?mode=rwc"
    )]
    database_url: String,

    /// Price of one cubic meter in centavos. Must match the server's `[billing]`.
    #[arg(long, env = "BAWASA__BILLING__RATE_MINOR_PER_M3", default_value_t = 3_000)]
    rate_minor_per_m3: i64,

    /// Cubic meters covered by the discountable first tier.
    #[arg(long, env = "BAWASA__BILLING__TIER_THRESHOLD_M3", default_value_t = 10)]
    tier_threshold_m3: i64,

    /// Days between reading date and due date.
    #[arg(long, env = "BAWASA__BILLING__DUE_DAYS", default_value_t = 15)]
    due_days: u32,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    Admin(Admin),
    Cycle(Cycle),
    Billing(Billing),
}

#[derive(Args, Debug)]
struct Admin {
    #[command(subcommand)]
    command: AdminCommand,
}

#[derive(Subcommand, Debug)]
enum AdminCommand {
    /// Create an administrator account. The password is prompted for.
    Create(AdminCreateArgs),
}

#[derive(Args, Debug)]
struct AdminCreateArgs {
    #[arg(long)]
    email: String,
    #[arg(long)]
    full_name: String,
}

#[derive(Args, Debug)]
struct Cycle {
    #[command(subcommand)]
    command: CycleCommand,
}

#[derive(Subcommand, Debug)]
enum CycleCommand {
    /// Create the empty readings of a month.
    Open(MonthArgs),
    /// Bill every read reading of a month.
    Bill(MonthArgs),
}

#[derive(Args, Debug)]
struct MonthArgs {
    /// Any day of the month, as YYYY-MM-DD.
    #[arg(long)]
    month: NaiveDate,
}

#[derive(Args, Debug)]
struct Billing {
    #[command(subcommand)]
    command: BillingCommand,
}

#[derive(Subcommand, Debug)]
enum BillingCommand {
    /// Flag unpaid billings past their due date as overdue.
    Overdue(OverdueArgs),
}

#[derive(Args, Debug)]
struct OverdueArgs {
    /// Defaults to today.
    #[arg(long)]
    today: Option<NaiveDate>,
}

struct RawModeGuard;

impl RawModeGuard {
    fn enter() -> Result<Self, Box<dyn Error + Send + Sync>> {
        terminal::enable_raw_mode()?;
        Ok(Self)
    }
}

impl Drop for RawModeGuard {
    fn drop(&mut self) {
        let _ = terminal::disable_raw_mode();
    }
}

fn prompt_password(prompt: &str) -> Result<String, Box<dyn Error + Send + Sync>> {
    let _raw = RawModeGuard::enter()?;

    let mut out = std::io::stderr();
    execute!(
        out,
        cursor::MoveToColumn(0),
        terminal::Clear(ClearType::CurrentLine),
        Print(prompt)
    )?;
    out.flush()?;

    let mut buf = String::new();
    loop {
        let Event::Key(KeyEvent {
            code, modifiers, ..
        }) = event::read()?
        else {
            continue;
        };

        match code {
            KeyCode::Enter => {
                execute!(out, Print("\r\n"))?;
                out.flush()?;
                break;
            }
            KeyCode::Backspace => {
                if buf.pop().is_some() {
                    execute!(out, cursor::MoveLeft(1), Print(" "), cursor::MoveLeft(1))?;
                    out.flush()?;
                }
            }
            KeyCode::Char('c') if modifiers.contains(KeyModifiers::CONTROL) => {
                execute!(out, Print("\r\n"))?;
                out.flush()?;
                return Err("interrupted".into());
            }
            KeyCode::Char(ch) if !modifiers.contains(KeyModifiers::CONTROL) => {
                buf.push(ch);
                execute!(out, Print("*"))?;
                out.flush()?;
            }
            _ => {}
        }
    }

    Ok(buf)
}

fn prompt_password_twice() -> Result<String, Box<dyn Error + Send + Sync>> {
    let mut out = std::io::stderr();
    for _ in 0..3 {
        let p1 = prompt_password("Password: ")?;
        if p1.chars().count() < MIN_PASSWORD_LEN {
            execute!(
                out,
                cursor::MoveToColumn(0),
                terminal::Clear(ClearType::CurrentLine),
                Print(format!(
                    "Password must be at least {MIN_PASSWORD_LEN} characters.\r\n"
                ))
            )?;
            continue;
        }

        let p2 = prompt_password("Confirm password: ")?;
        if p1 == p2 {
            return Ok(p1);
        }

        execute!(
            out,
            cursor::MoveToColumn(0),
            terminal::Clear(ClearType::CurrentLine),
            Print("Passwords do not match. Try again.\r\n")
        )?;
    }

    Err("too many attempts".into())
}

async fn connect_db(
    database_url: &str,
) -> Result<DatabaseConnection, Box<dyn Error + Send + Sync>> {
    let db = Database::connect(database_url).await?;
    migration::Migrator::up(&db, None).await?;
    Ok(db)
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error + Send + Sync>> {
    let cli = Cli::parse();

    let db = connect_db(&cli.database_url).await?;
    let engine = Engine::builder()
        .database(db)
        .billing_policy(BillingPolicy {
            rate_minor_per_m3: cli.rate_minor_per_m3,
            tier_threshold_m3: cli.tier_threshold_m3,
            due_days: cli.due_days,
        })
        .build()
        .await?;
    let system = Account::system();

    match cli.command {
        Command::Admin(Admin {
            command: AdminCommand::Create(args),
        }) => {
            let password = prompt_password_twice()?;
            let account = engine
                .create_account(
                    &system,
                    NewAccount {
                        email: args.email,
                        password,
                        full_name: args.full_name,
                        role: Role::Admin,
                    },
                )
                .await?;
            println!("created admin: {} ({})", account.email, account.id);
        }
        Command::Cycle(Cycle {
            command: CycleCommand::Open(args),
        }) => {
            let created = engine.open_billing_cycle(&system, args.month).await?;
            println!("opened cycle {}: {created} readings created", args.month);
        }
        Command::Cycle(Cycle {
            command: CycleCommand::Bill(args),
        }) => {
            let created = engine.generate_cycle_billings(&system, args.month).await?;
            println!("billed cycle {}: {created} billings created", args.month);
        }
        Command::Billing(Billing {
            command: BillingCommand::Overdue(args),
        }) => {
            let today = args.today.unwrap_or_else(|| Utc::now().date_naive());
            let flagged = engine.mark_overdue_billings(&system, today).await?;
            println!("flagged {flagged} billings as overdue");
        }
    }

    Ok(())
}
