//! Snapshot-file data source
//!
//! Serves chain state captured in a JSON document, for offline checks and
//! replaying past incidents.

use super::ChainDataSource;
use crate::domain::{Address, Position, TroveSnapshot};
use crate::error::DataSourceError;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// Captured chain state
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ChainSnapshot {
    /// Price reported by the protocol price feed
    pub price: f64,
    /// Protocol aggregate
    pub total: Position,
    /// Redistribution totals
    #[serde(default)]
    pub total_redistributed: Position,
    /// Trove snapshots keyed by owner address
    #[serde(default)]
    pub troves: HashMap<Address, TroveSnapshot>,
}

impl ChainSnapshot {
    /// Add a trove snapshot
    pub fn with_trove(mut self, address: Address, trove: TroveSnapshot) -> Self {
        self.troves.insert(address, trove);
        self
    }
}

/// Where the served snapshot comes from
#[derive(Debug, Clone)]
enum Origin {
    Fixed(ChainSnapshot),
    File(PathBuf),
}

/// Data source answering from a [`ChainSnapshot`]
///
/// A file-backed source re-reads its file on every fetch, so a long-running
/// watch sees the file as it is rewritten.
#[derive(Debug, Clone)]
pub struct SnapshotDataSource {
    origin: Origin,
}

impl SnapshotDataSource {
    /// Serve an in-memory snapshot
    pub fn new(snapshot: ChainSnapshot) -> Self {
        Self {
            origin: Origin::Fixed(snapshot),
        }
    }

    /// Serve the snapshot file at `path`
    ///
    /// The file is parsed once up front so a missing or malformed file is
    /// reported before the first run.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, DataSourceError> {
        let path = path.as_ref();
        parse(&std::fs::read_to_string(path)?)?;
        log::debug!("Loaded chain snapshot from {}", path.display());
        Ok(Self {
            origin: Origin::File(path.to_path_buf()),
        })
    }

    async fn current(&self) -> Result<Cow<'_, ChainSnapshot>, DataSourceError> {
        match &self.origin {
            Origin::Fixed(snapshot) => Ok(Cow::Borrowed(snapshot)),
            Origin::File(path) => {
                let contents = tokio::fs::read_to_string(path).await?;
                log::trace!("Re-read chain snapshot from {}", path.display());
                Ok(Cow::Owned(parse(&contents)?))
            }
        }
    }
}

fn parse(contents: &str) -> Result<ChainSnapshot, DataSourceError> {
    Ok(serde_json::from_str(contents)?)
}

#[async_trait]
impl ChainDataSource for SnapshotDataSource {
    async fn get_total(&self) -> Result<Position, DataSourceError> {
        Ok(self.current().await?.total)
    }

    async fn get_total_redistributed(&self) -> Result<Position, DataSourceError> {
        Ok(self.current().await?.total_redistributed)
    }

    async fn get_trove_before_redistribution(
        &self,
        address: &Address,
    ) -> Result<TroveSnapshot, DataSourceError> {
        Ok(self
            .current()
            .await?
            .troves
            .get(address)
            .copied()
            .unwrap_or_else(TroveSnapshot::non_existent))
    }

    async fn get_price(&self) -> Result<f64, DataSourceError> {
        let price = self.current().await?.price;
        if price > 0.0 {
            Ok(price)
        } else {
            Err(DataSourceError::Unavailable(
                "snapshot carries no price".to_string(),
            ))
        }
    }
}
