//! Chain data source abstraction
//!
//! RPC connectivity and contract decoding live outside this crate; the monitor
//! only sees the snapshot providers defined by [`ChainDataSource`].

mod snapshot;

pub use snapshot::{ChainSnapshot, SnapshotDataSource};

use crate::domain::{Address, Position, TroveSnapshot};
use crate::error::DataSourceError;
use async_trait::async_trait;

/// Provider of protocol and trove snapshots
#[async_trait]
pub trait ChainDataSource: Send + Sync {
    /// Protocol-wide collateral and debt
    async fn get_total(&self) -> Result<Position, DataSourceError>;

    /// Accumulated redistribution totals
    async fn get_total_redistributed(&self) -> Result<Position, DataSourceError>;

    /// Trove state as recorded, before pending redistribution
    async fn get_trove_before_redistribution(
        &self,
        address: &Address,
    ) -> Result<TroveSnapshot, DataSourceError>;

    /// Price reported by the protocol's own price feed
    async fn get_price(&self) -> Result<f64, DataSourceError>;
}
