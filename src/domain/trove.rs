//! Trove and collateral ratio domain types
//!
//! Collateral is denominated in ETH, debt in the protocol's stablecoin. All
//! ratio math is pure; nothing here touches storage or the network.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Collateral and debt amounts of a position or of the protocol aggregate
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Position {
    /// Collateral amount (ETH)
    pub collateral: f64,
    /// Debt amount (stablecoin)
    pub debt: f64,
}

impl Position {
    /// Create a new position
    pub const fn new(collateral: f64, debt: f64) -> Self {
        Self { collateral, debt }
    }

    /// Collateral ratio at `price`: `collateral * price / debt`
    ///
    /// A position without debt has an infinite ratio and can never fall below
    /// a threshold.
    pub fn collateral_ratio(&self, price: f64) -> f64 {
        if self.debt == 0.0 {
            return f64::INFINITY;
        }
        self.collateral * price / self.debt
    }

    /// Both collateral and debt are zero
    pub fn is_empty(&self) -> bool {
        self.collateral == 0.0 && self.debt == 0.0
    }

    fn add(self, other: Position) -> Position {
        Position::new(self.collateral + other.collateral, self.debt + other.debt)
    }

    fn subtract(self, other: Position) -> Position {
        Position::new(self.collateral - other.collateral, self.debt - other.debt)
    }

    fn multiply(self, factor: f64) -> Position {
        Position::new(self.collateral * factor, self.debt * factor)
    }
}

/// On-chain trove status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum TroveStatus {
    /// Never opened
    NonExistent,
    /// Open and carrying debt
    Open,
    /// Repaid and closed by its owner
    ClosedByOwner,
    /// Liquidated
    ClosedByLiquidation,
    /// Fully redeemed against
    ClosedByRedemption,
}

impl TroveStatus {
    /// The closed variant, if this status is one
    pub fn closed(&self) -> Option<ClosedStatus> {
        match self {
            Self::ClosedByOwner => Some(ClosedStatus::Owner),
            Self::ClosedByLiquidation => Some(ClosedStatus::Liquidation),
            Self::ClosedByRedemption => Some(ClosedStatus::Redemption),
            Self::NonExistent | Self::Open => None,
        }
    }
}

impl fmt::Display for TroveStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NonExistent => write!(f, "nonExistent"),
            Self::Open => write!(f, "open"),
            Self::ClosedByOwner => write!(f, "closedByOwner"),
            Self::ClosedByLiquidation => write!(f, "closedByLiquidation"),
            Self::ClosedByRedemption => write!(f, "closedByRedemption"),
        }
    }
}

/// How a trove was closed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ClosedStatus {
    #[serde(rename = "closedByOwner")]
    Owner,
    #[serde(rename = "closedByLiquidation")]
    Liquidation,
    #[serde(rename = "closedByRedemption")]
    Redemption,
}

impl ClosedStatus {
    /// Short description of who closed the trove
    pub fn closed_by(&self) -> &'static str {
        match self {
            Self::Owner => "owner",
            Self::Liquidation => "liquidation",
            Self::Redemption => "redemption",
        }
    }
}

impl From<ClosedStatus> for TroveStatus {
    fn from(status: ClosedStatus) -> Self {
        match status {
            ClosedStatus::Owner => Self::ClosedByOwner,
            ClosedStatus::Liquidation => Self::ClosedByLiquidation,
            ClosedStatus::Redemption => Self::ClosedByRedemption,
        }
    }
}

/// Trove state as recorded on-chain, before pending redistribution
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TroveSnapshot {
    /// Recorded collateral and debt
    #[serde(flatten)]
    pub position: Position,
    /// Stake used to weight redistributed liquidations
    pub stake: f64,
    /// Redistribution totals at the trove's last update
    pub snapshot_of_total_redistributed: Position,
    /// On-chain status
    pub status: TroveStatus,
}

impl TroveSnapshot {
    /// Snapshot of an address that never opened a trove
    pub fn non_existent() -> Self {
        Self {
            position: Position::default(),
            stake: 0.0,
            snapshot_of_total_redistributed: Position::default(),
            status: TroveStatus::NonExistent,
        }
    }

    /// Apply liquidation gains accumulated since the trove's last update
    ///
    /// `position + stake * (total_redistributed - snapshot_of_total_redistributed)`
    pub fn apply_redistribution(&self, total_redistributed: &Position) -> Trove {
        let pending = total_redistributed
            .subtract(self.snapshot_of_total_redistributed)
            .multiply(self.stake);

        Trove {
            position: self.position.add(pending),
            status: self.status,
        }
    }
}

/// Trove state with redistribution applied
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Trove {
    /// Current collateral and debt
    pub position: Position,
    /// On-chain status
    pub status: TroveStatus,
}

impl Trove {
    /// No collateral and no debt left
    pub fn is_empty(&self) -> bool {
        self.position.is_empty()
    }

    /// Collateral ratio at `price`
    pub fn collateral_ratio(&self, price: f64) -> f64 {
        self.position.collateral_ratio(price)
    }
}
