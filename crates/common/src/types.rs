use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Opaque account identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AccountId(String);

impl AccountId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for AccountId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for AccountId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl From<String> for AccountId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

/// The two assets the ledger accounts for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Asset {
    /// Asset posted as collateral.
    Collateral,
    /// Asset lent out to borrowers.
    Debt,
}

impl std::fmt::Display for Asset {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Asset::Collateral => write!(f, "collateral"),
            Asset::Debt => write!(f, "debt"),
        }
    }
}

/// Exchange rate of the borrowable asset denominated in the collateral asset.
///
/// `mantissa / 10^decimals` whole collateral units buy one whole debt unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Price {
    #[serde(with = "amount_string")]
    pub mantissa: u128,
    pub decimals: u8,
}

impl Price {
    pub fn new(mantissa: u128, decimals: u8) -> Self {
        Self { mantissa, decimals }
    }
}

impl std::fmt::Display for Price {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}e-{}", self.mantissa, self.decimals)
    }
}

/// Kinds of ledger mutation reported to the audit sink.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OperationKind {
    Deposit,
    Borrow,
    Repay,
    Withdraw,
    Liquidate,
}

impl std::fmt::Display for OperationKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OperationKind::Deposit => write!(f, "deposit"),
            OperationKind::Borrow => write!(f, "borrow"),
            OperationKind::Repay => write!(f, "repay"),
            OperationKind::Withdraw => write!(f, "withdraw"),
            OperationKind::Liquidate => write!(f, "liquidate"),
        }
    }
}

/// Audit record emitted after every successful mutating operation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerEvent {
    pub id: Uuid,
    pub kind: OperationKind,
    /// Account whose position changed
    pub account: AccountId,
    /// Amount moved, in units of the operation's asset (debt cleared for liquidations)
    #[serde(with = "amount_string")]
    pub amount: u128,
    /// Liquidator for liquidations, `None` otherwise
    pub actor: Option<AccountId>,
    /// Collateral released to the liquidator
    #[serde(default, with = "option_amount_string")]
    pub seized_collateral: Option<u128>,
    pub recorded_at: DateTime<Utc>,
}

impl LedgerEvent {
    pub fn new(kind: OperationKind, account: AccountId, amount: u128) -> Self {
        Self {
            id: Uuid::new_v4(),
            kind,
            account,
            amount,
            actor: None,
            seized_collateral: None,
            recorded_at: Utc::now(),
        }
    }

    pub fn liquidation(
        liquidator: AccountId,
        account: AccountId,
        debt_cleared: u128,
        seized_collateral: u128,
    ) -> Self {
        Self {
            actor: Some(liquidator),
            seized_collateral: Some(seized_collateral),
            ..Self::new(OperationKind::Liquidate, account, debt_cleared)
        }
    }
}

/// Serde helpers that carry `u128` amounts as decimal strings.
///
/// JSON numbers lose precision past 2^53 in most clients. Deserialization
/// also accepts plain numbers for convenience.
pub mod amount_string {
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &u128, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&value.to_string())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<u128, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Repr {
            Text(String),
            Number(u64),
        }

        match Repr::deserialize(deserializer)? {
            Repr::Text(text) => text.trim().parse().map_err(serde::de::Error::custom),
            Repr::Number(n) => Ok(n as u128),
        }
    }
}

/// `Option<u128>` variant of [`amount_string`].
pub mod option_amount_string {
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &Option<u128>, serializer: S) -> Result<S::Ok, S::Error> {
        match value {
            Some(v) => serializer.serialize_some(&v.to_string()),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Option<u128>, D::Error> {
        let text: Option<String> = Option::deserialize(deserializer)?;
        text.map(|t| t.trim().parse().map_err(serde::de::Error::custom))
            .transpose()
    }
}
