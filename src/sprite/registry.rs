//! Ordered, deduplicating collection of discovered sprite assets.

use crate::models::AssetRecord;

/// Registry of assets in discovery order.
///
/// Records are unique by fingerprint and by source path. The version moves on every insert
/// that changes the contents so the emission coordinator can tell whether its cached sprite
/// is stale.
#[derive(Debug, Default)]
pub struct AssetRegistry {
  records: Vec<AssetRecord>,
  version: u64,
}

impl AssetRegistry {
  /// Insert a record, returning `false` when an asset with the same fingerprint is known.
  ///
  /// A record sharing the source path of an existing one supersedes it and moves to the end.
  pub fn insert(&mut self, record: AssetRecord) -> bool {
    if self
      .records
      .iter()
      .any(|existing| existing.fingerprint == record.fingerprint)
    {
      return false;
    }

    self
      .records
      .retain(|existing| existing.source_path != record.source_path);
    self.records.push(record);
    self.version += 1;
    true
  }

  /// Records in discovery order.
  pub fn records(&self) -> &[AssetRecord] {
    &self.records
  }

  /// Counter identifying the current contents.
  pub fn version(&self) -> u64 {
    self.version
  }

  /// Number of records.
  pub fn len(&self) -> usize {
    self.records.len()
  }

  /// Whether no asset has been registered.
  pub fn is_empty(&self) -> bool {
    self.records.is_empty()
  }
}
