use serde::Deserialize;

use crate::types::AccountId;

/// Number of fractional digits in a wad.
pub const WAD_DECIMALS: u8 = 18;

/// Global application configuration loaded from environment variables.
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    /// Required over-collateralization multiple, as a wad (1.5 = 1_500_000_000_000_000_000)
    pub collateralization_ratio: u128,

    /// Fractional digits of the collateral asset
    pub collateral_decimals: u8,

    /// Fractional digits of the borrowable asset
    pub debt_decimals: u8,

    /// Fractional digits of the price feed
    pub price_decimals: u8,

    /// Starting price mantissa, scaled by `price_decimals`
    pub initial_price: u128,

    /// Accounts allowed to liquidate unhealthy positions
    pub liquidators: Vec<AccountId>,

    /// Account allowed to set prices and mint balances
    pub admin_account: Option<AccountId>,

    /// Custody account holding deposited assets
    pub custody_account: AccountId,

    /// JWT secret for API authentication
    pub jwt_secret: String,

    /// JWT token expiry in hours
    pub jwt_expiry_hours: u64,

    /// API listen port (default: 3000)
    pub api_port: u16,

    /// Optional webhook receiving audit events
    pub audit_webhook_url: Option<String>,
}

impl AppConfig {
    /// Load configuration from environment variables.
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();

        let price_decimals: u8 = std::env::var("PRICE_DECIMALS")
            .unwrap_or_else(|_| "18".to_string())
            .parse()
            .map_err(|_| anyhow::anyhow!("PRICE_DECIMALS must be a valid u8"))?;

        let ratio_text = std::env::var("COLLATERALIZATION_RATIO").unwrap_or_else(|_| "1.5".to_string());
        let price_text = std::env::var("INITIAL_PRICE")
            .map_err(|_| anyhow::anyhow!("INITIAL_PRICE environment variable is required"))?;

        Ok(Self {
            collateralization_ratio: parse_decimal(&ratio_text, WAD_DECIMALS).map_err(|e| {
                anyhow::anyhow!("COLLATERALIZATION_RATIO must be a decimal number: {}", e)
            })?,
            collateral_decimals: std::env::var("COLLATERAL_DECIMALS")
                .unwrap_or_else(|_| "18".to_string())
                .parse()
                .map_err(|_| anyhow::anyhow!("COLLATERAL_DECIMALS must be a valid u8"))?,
            debt_decimals: std::env::var("DEBT_DECIMALS")
                .unwrap_or_else(|_| "18".to_string())
                .parse()
                .map_err(|_| anyhow::anyhow!("DEBT_DECIMALS must be a valid u8"))?,
            price_decimals,
            initial_price: parse_decimal(&price_text, price_decimals)
                .map_err(|e| anyhow::anyhow!("INITIAL_PRICE must be a decimal number: {}", e))?,
            liquidators: parse_account_list(
                &std::env::var("LIQUIDATORS").unwrap_or_default(),
            ),
            admin_account: std::env::var("ADMIN_ACCOUNT")
                .ok()
                .filter(|s| !s.trim().is_empty())
                .map(|s| AccountId::new(s.trim())),
            custody_account: AccountId::new(
                std::env::var("VAULT_CUSTODY_ACCOUNT").unwrap_or_else(|_| "vault".to_string()),
            ),
            jwt_secret: std::env::var("JWT_SECRET")
                .map_err(|_| anyhow::anyhow!("JWT_SECRET environment variable is required"))?,
            jwt_expiry_hours: std::env::var("JWT_EXPIRY_HOURS")
                .unwrap_or_else(|_| "24".to_string())
                .parse()
                .map_err(|_| anyhow::anyhow!("JWT_EXPIRY_HOURS must be a valid u64"))?,
            api_port: std::env::var("API_PORT")
                .unwrap_or_else(|_| "3000".to_string())
                .parse()
                .map_err(|_| anyhow::anyhow!("API_PORT must be a valid u16"))?,
            audit_webhook_url: std::env::var("AUDIT_WEBHOOK_URL").ok(),
        })
    }
}

/// Parse a non-negative decimal string into an integer scaled by `10^decimals`.
///
/// `parse_decimal("1.5", 18) == 1_500_000_000_000_000_000`. Digits beyond
/// `decimals` are rejected rather than rounded.
pub fn parse_decimal(text: &str, decimals: u8) -> Result<u128, String> {
    let text = text.trim();
    let (whole, fraction) = match text.split_once('.') {
        Some((w, f)) => (w, f),
        None => (text, ""),
    };

    if whole.is_empty() && fraction.is_empty() {
        return Err(format!("'{}' is empty", text));
    }
    if !whole.chars().chain(fraction.chars()).all(|c| c.is_ascii_digit()) {
        return Err(format!("'{}' is not a non-negative decimal", text));
    }
    if fraction.len() > decimals as usize {
        return Err(format!(
            "'{}' has more than {} fractional digits",
            text, decimals
        ));
    }

    let scale = 10u128
        .checked_pow(decimals as u32)
        .ok_or_else(|| format!("scale 10^{} overflows", decimals))?;
    let whole: u128 = if whole.is_empty() {
        0
    } else {
        whole.parse().map_err(|e| format!("{}", e))?
    };
    let padded = format!("{:0<width$}", fraction, width = decimals as usize);
    let fraction: u128 = if padded.is_empty() {
        0
    } else {
        padded.parse().map_err(|e| format!("{}", e))?
    };

    whole
        .checked_mul(scale)
        .and_then(|w| w.checked_add(fraction))
        .ok_or_else(|| format!("'{}' overflows at {} decimals", text, decimals))
}

/// Split a comma-separated list of account ids, skipping blanks.
pub fn parse_account_list(text: &str) -> Vec<AccountId> {
    text.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(AccountId::new)
        .collect()
}
