use super::Parser;

#[derive(Parser, Debug)]
#[command(name = "redclass-auth", about = "Credential and session service")]
pub struct Cli {
    /// Path to a TOML settings file.
    #[arg(long)]
    pub settings: Option<String>,
    /// Overrides `http.address`.
    #[arg(long)]
    pub address: Option<String>,
}
