// lumen/core/storage/src/db/rocks_db.rs

use super::column_families::all_column_families;
use anyhow::Result;
use rocksdb::{ColumnFamilyDescriptor, Direction, IteratorMode, Options, WriteBatch, DB};
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, info};

type KvItem = (Box<[u8]>, Box<[u8]>);

/// RocksDB wrapper addressing column families by name
pub struct RocksDB {
    db: Arc<DB>,
}

impl RocksDB {
    /// Open database with default options
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let mut db_opts = Options::default();
        db_opts.create_if_missing(true);
        db_opts.create_missing_column_families(true);
        let compression = if cfg!(any(test, feature = "no-compression")) {
            rocksdb::DBCompressionType::None
        } else {
            rocksdb::DBCompressionType::Lz4
        };
        db_opts.set_compression_type(compression);
        db_opts.set_write_buffer_size(64 * 1024 * 1024); // 64MB
        db_opts.set_max_write_buffer_number(3);
        db_opts.increase_parallelism(num_cpus::get() as i32);

        let cfs: Vec<ColumnFamilyDescriptor> = all_column_families()
            .into_iter()
            .map(|name| {
                let mut cf_opts = Options::default();
                cf_opts.set_compression_type(compression);
                ColumnFamilyDescriptor::new(name, cf_opts)
            })
            .collect();

        let db = DB::open_cf_descriptors(&db_opts, path.as_ref(), cfs)?;

        info!("RocksDB opened at {}", path.as_ref().display());
        Ok(Self { db: Arc::new(db) })
    }

    pub fn get_cf(&self, cf: &str, key: &[u8]) -> Result<Option<Vec<u8>>> {
        let cf_handle = self.cf_handle(cf)?;
        Ok(self.db.get_cf(cf_handle, key)?)
    }

    pub fn put_cf(&self, cf: &str, key: &[u8], value: &[u8]) -> Result<()> {
        let cf_handle = self.cf_handle(cf)?;
        self.db.put_cf(cf_handle, key, value)?;
        Ok(())
    }

    pub fn exists_cf(&self, cf: &str, key: &[u8]) -> Result<bool> {
        Ok(self.get_cf(cf, key)?.is_some())
    }

    /// Write a batch of operations atomically
    pub fn write_batch(&self, batch: WriteBatch) -> Result<()> {
        self.db.write(batch)?;
        Ok(())
    }

    pub fn batch(&self) -> WriteBatch {
        WriteBatch::default()
    }

    pub fn batch_put_cf(
        &self,
        batch: &mut WriteBatch,
        cf: &str,
        key: &[u8],
        value: &[u8],
    ) -> Result<()> {
        let cf_handle = self.cf_handle(cf)?;
        batch.put_cf(cf_handle, key, value);
        Ok(())
    }

    /// Every entry whose key starts with `prefix`, in key order
    pub fn prefix_scan_cf(&self, cf: &str, prefix: &[u8]) -> Result<Vec<KvItem>> {
        let cf_handle = self.cf_handle(cf)?;
        let mut items = Vec::new();
        for entry in self
            .db
            .iterator_cf(cf_handle, IteratorMode::From(prefix, Direction::Forward))
        {
            let (key, value) = entry?;
            if !key.starts_with(prefix) {
                break;
            }
            items.push((key, value));
        }
        Ok(items)
    }

    /// Flush all column families
    pub fn flush(&self) -> Result<()> {
        for cf_name in all_column_families() {
            let cf = self.cf_handle(cf_name)?;
            self.db.flush_cf(cf)?;
        }
        debug!("Flushed all column families");
        Ok(())
    }

    fn cf_handle(&self, name: &str) -> Result<&rocksdb::ColumnFamily> {
        self.db
            .cf_handle(name)
            .ok_or_else(|| anyhow::anyhow!("Column family {} not found", name))
    }
}

impl Clone for RocksDB {
    fn clone(&self) -> Self {
        Self {
            db: Arc::clone(&self.db),
        }
    }
}
