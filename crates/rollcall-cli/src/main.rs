use clap::{Parser, Subcommand};
use dialoguer::{Input, Password};
use dotenvy::dotenv;
use rollcall_cli::seeder::{self, SeedOutcome};
use rollcall_config::SeedConfig;
use rollcall_db::{DatabaseConfig, PgPool, init_db_pool, run_migrations};

#[derive(Parser)]
#[command(name = "rollcall-cli")]
#[command(about = "Rollcall CLI - Administrative tools for Rollcall", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create a new principal account
    CreatePrincipal {
        /// Email address
        #[arg(short = 'e', long)]
        email: Option<String>,

        /// Password (will be prompted securely if not provided)
        #[arg(short = 'p', long)]
        password: Option<String>,
    },
    /// Create the principal from PRINCIPAL_EMAIL / PRINCIPAL_PASSWORD if missing
    SeedPrincipal,
    /// Apply pending database migrations
    Migrate,
}

#[tokio::main]
async fn main() {
    dotenv().ok();

    let pool = init_db_pool(&DatabaseConfig::from_env())
        .await
        .expect("Failed to connect to database");

    let cli = Cli::parse();

    match cli.command {
        Commands::CreatePrincipal { email, password } => {
            handle_create_principal(&pool, email, password).await
        }
        Commands::SeedPrincipal => handle_seed_principal(&pool).await,
        Commands::Migrate => handle_migrate(&pool).await,
    }
}

async fn handle_create_principal(pool: &PgPool, email: Option<String>, password: Option<String>) {
    let email = email.unwrap_or_else(|| {
        Input::new()
            .with_prompt("Email address")
            .interact_text()
            .expect("Failed to read email")
    });

    let password = password.unwrap_or_else(|| {
        Password::new()
            .with_prompt("Password")
            .with_confirmation("Confirm password", "Passwords don't match")
            .interact()
            .expect("Failed to read password")
    });

    match seeder::create_principal(pool, &email, &password).await {
        Ok(id) => {
            println!("\n✅ Principal created successfully!");
            println!("   Id: {}", id);
            println!("   Email: {}", email.trim().to_lowercase());
        }
        Err(e) => {
            eprintln!("\n❌ Error creating principal: {}", e.public_message());
            std::process::exit(1);
        }
    }
}

async fn handle_seed_principal(pool: &PgPool) {
    let config = SeedConfig::from_env();

    match seeder::seed_principal(pool, &config).await {
        Ok(SeedOutcome::Created(id)) => {
            println!("✅ Principal {} created ({})", config.principal_email, id)
        }
        Ok(SeedOutcome::AlreadyExists) => {
            println!("ℹ️  Principal {} already exists", config.principal_email)
        }
        Err(e) => {
            eprintln!("❌ Error seeding principal: {}", e.public_message());
            std::process::exit(1);
        }
    }
}

async fn handle_migrate(pool: &PgPool) {
    match run_migrations(pool).await {
        Ok(()) => println!("✅ Migrations applied"),
        Err(e) => {
            eprintln!("❌ Migration failed: {}", e);
            std::process::exit(1);
        }
    }
}
