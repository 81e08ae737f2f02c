use std::env;

const DEFAULT_BIND_ADDR: &str = "0.0.0.0:8080";
const DEFAULT_CORS_ORIGIN: &str = "http://localhost:3000";
const DEFAULT_REGENERATION_WEEKS: u32 = 12;
const DEFAULT_ADMIN_ROLE: &str = "ADMIN";

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub database_url: String,
    pub jwt_secret: String,
    pub bind_addr: String,
    pub cors_origin: String,
    /// Forward window, in weeks, that pattern regeneration materializes.
    pub regeneration_weeks: u32,
    pub admin_role: String,
    pub run_migrations: bool,
    pub metrics_key: Option<String>,
}

impl AppConfig {
    pub fn from_env() -> Result<Self, String> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, String> {
        let database_url = lookup("DATABASE_URL").ok_or("DATABASE_URL must be set")?;

        let jwt_secret = lookup("JWT_SECRET").ok_or("JWT_SECRET must be set")?;
        if jwt_secret.len() < 16 {
            return Err("JWT_SECRET must be at least 16 characters".to_string());
        }

        let bind_addr = lookup("BIND_ADDR").unwrap_or_else(|| DEFAULT_BIND_ADDR.to_string());
        let cors_origin = lookup("CORS_ORIGIN").unwrap_or_else(|| DEFAULT_CORS_ORIGIN.to_string());

        let regeneration_weeks = match lookup("REGENERATION_WEEKS") {
            Some(raw) => parse_regeneration_weeks(&raw)?,
            None => DEFAULT_REGENERATION_WEEKS,
        };

        let admin_role = lookup("ADMIN_ROLE")
            .map(|r| r.trim().to_string())
            .filter(|r| !r.is_empty())
            .unwrap_or_else(|| DEFAULT_ADMIN_ROLE.to_string());

        let run_migrations = match lookup("RUN_MIGRATIONS") {
            Some(raw) => parse_bool(&raw).ok_or_else(|| format!("RUN_MIGRATIONS is not a boolean: {}", raw))?,
            None => true,
        };

        let metrics_key = lookup("METRICS_KEY").filter(|k| !k.is_empty());

        Ok(Self {
            database_url,
            jwt_secret,
            bind_addr,
            cors_origin,
            regeneration_weeks,
            admin_role,
            run_migrations,
            metrics_key,
        })
    }
}

fn parse_regeneration_weeks(raw: &str) -> Result<u32, String> {
    let weeks: u32 = raw
        .trim()
        .parse()
        .map_err(|_| format!("REGENERATION_WEEKS is not a number: {}", raw))?;

    if !(1..=104).contains(&weeks) {
        return Err(format!("REGENERATION_WEEKS must be between 1 and 104, got {}", weeks));
    }

    Ok(weeks)
}

fn parse_bool(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}
