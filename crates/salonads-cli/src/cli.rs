use clap::{Parser, Subcommand, ValueEnum};

#[derive(Parser)]
#[command(name = "salonads")]
#[command(about = "Salonads CLI: manage salon ads from the terminal")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// API base URL (overrides config and SALONADS_URL env var)
    #[arg(short, long, global = true, env = "SALONADS_URL")]
    pub server: Option<String>,

    /// Config profile name
    #[arg(short, long, global = true, env = "SALONADS_PROFILE", default_value = "default")]
    pub profile: String,

    /// Output format
    #[arg(short, long, global = true)]
    pub format: Option<OutputFormat>,

    /// Log filter used when RUST_LOG is unset
    #[arg(long, global = true, default_value = "warn")]
    pub log_level: String,
}

#[derive(Clone, Copy, ValueEnum, Default)]
pub enum OutputFormat {
    #[default]
    Json,
    Table,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Sign in and store the session for this profile
    Login(LoginArgs),
    /// Sign out and forget the stored session
    Logout,
    /// Show the signed-in user
    Whoami,
    /// Create a new account
    Register(RegisterArgs),
    /// Request a password reset email
    ForgotPassword(ForgotPasswordArgs),
    /// Set a new password with a reset token
    ResetPassword(ResetPasswordArgs),
    /// Manage salons
    Salons(SalonsArgs),
    /// Manage ads
    Ads(AdsArgs),
    /// Manage CLI configuration
    Config(ConfigArgs),
}

#[derive(clap::Args)]
pub struct LoginArgs {
    #[arg(short, long)]
    pub email: String,
    #[arg(long, env = "SALONADS_PASSWORD", hide_env_values = true)]
    pub password: String,
}

#[derive(clap::Args)]
pub struct RegisterArgs {
    #[arg(short, long)]
    pub email: String,
    #[arg(long, env = "SALONADS_PASSWORD", hide_env_values = true)]
    pub password: String,
    /// Display name
    #[arg(long)]
    pub name: Option<String>,
    #[arg(long)]
    pub phone: Option<String>,
}

#[derive(clap::Args)]
pub struct ForgotPasswordArgs {
    #[arg(short, long)]
    pub email: String,
}

#[derive(clap::Args)]
pub struct ResetPasswordArgs {
    /// Token from the reset email
    #[arg(long)]
    pub token: String,
    #[arg(long, env = "SALONADS_PASSWORD", hide_env_values = true)]
    pub password: String,
}

#[derive(clap::Args)]
pub struct SalonsArgs {
    #[command(subcommand)]
    pub command: SalonsCommands,
}

#[derive(Subcommand)]
pub enum SalonsCommands {
    /// All salons (admin)
    List,
    /// One page of the salon directory
    Page(PageArgs),
    Delete(IdArgs),
}

#[derive(clap::Args)]
pub struct AdsArgs {
    #[command(subcommand)]
    pub command: AdsCommands,
}

#[derive(Subcommand)]
pub enum AdsCommands {
    /// List ads of the signed-in salon
    List(QueryArgs),
    /// Paginated listing across salons
    Page(PageArgs),
    /// Search ads
    Search(QueryArgs),
    /// Ads on the public portal
    Public(QueryArgs),
    /// Show one ad
    Get(IdArgs),
    /// Create an ad from JSON
    Create(BodyArgs),
    /// Replace an ad from JSON
    Update(UpdateArgs),
    Delete(IdArgs),
    /// Start showing an ad
    Activate(IdArgs),
    /// Stop showing an ad
    Deactivate(IdArgs),
    /// Schedule an ad from JSON
    Schedule(BodyArgs),
    /// Ads currently on display screens
    Display,
    /// Manage tablet ads
    Tablet(TabletArgs),
}

#[derive(clap::Args)]
pub struct TabletArgs {
    #[command(subcommand)]
    pub command: TabletCommands,
}

#[derive(Subcommand)]
pub enum TabletCommands {
    List,
    /// Tablet ads currently on display
    Active,
    Get(IdArgs),
    Create(BodyArgs),
    /// Patch a tablet ad from JSON
    Update(UpdateArgs),
    Delete(IdArgs),
}

#[derive(clap::Args)]
pub struct QueryArgs {
    /// Query parameters as key=value pairs (e.g. status=active)
    pub params: Vec<String>,
}

#[derive(clap::Args)]
pub struct PageArgs {
    #[arg(long, default_value_t = 1)]
    pub page: u32,
    #[arg(long, default_value_t = 20)]
    pub limit: u32,
    /// Extra key=value filters
    pub params: Vec<String>,
}

#[derive(clap::Args)]
pub struct IdArgs {
    pub id: String,
}

#[derive(clap::Args)]
pub struct BodyArgs {
    /// Path to JSON file (reads from stdin if omitted)
    #[arg(long)]
    pub file: Option<String>,
}

#[derive(clap::Args)]
pub struct UpdateArgs {
    pub id: String,
    /// Path to JSON file (reads from stdin if omitted)
    #[arg(long)]
    pub file: Option<String>,
}

#[derive(clap::Args)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommands,
}

#[derive(Subcommand)]
pub enum ConfigCommands {
    /// Show current config
    Show,
    /// Set config value
    Set(ConfigSetArgs),
}

#[derive(clap::Args)]
pub struct ConfigSetArgs {
    /// Key to set (server, format)
    pub key: String,
    pub value: String,
}
