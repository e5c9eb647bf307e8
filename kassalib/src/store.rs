//! Порты хранения. Ядро не трогает файловую систему напрямую — только
//! абстрактные источники записей, таблицы соответствий и конфигурации.
//!
//! Кассовую книгу и таблицу соответствий пишут внешние компоненты
//! (форма ввода и редактор настроек); это ядро мутирует только
//! конфигурацию экспорта.

use crate::{
    error::{KassaError, Result},
    model::{ExportConfig, LedgerRow, MappingTable},
};
use chrono::NaiveDate;
use std::cell::RefCell;
use std::fs;
use std::path::{Path, PathBuf};

pub trait LedgerStore {
    /// Записи с датой в `[start, end]`, порядок не гарантируется.
    fn rows_in(&self, start: NaiveDate, end: NaiveDate) -> Result<Vec<LedgerRow>>;

    /// Все записи строго до `day` — история для расчёта входящего остатка.
    fn rows_before(&self, day: NaiveDate) -> Result<Vec<LedgerRow>>;
}

pub trait MappingStore {
    fn mapping(&self) -> Result<MappingTable>;
}

pub trait ConfigStore {
    fn load(&self) -> Result<ExportConfig>;
    fn save(&self, cfg: &ExportConfig) -> Result<()>;
}

/// Хранилище в памяти — для тестов и встраивания.
#[derive(Debug)]
pub struct MemoryStore {
    rows: Vec<LedgerRow>,
    mapping: MappingTable,
    config: RefCell<ExportConfig>,
}

impl MemoryStore {
    pub fn new(rows: Vec<LedgerRow>, mapping: MappingTable, config: ExportConfig) -> Self {
        MemoryStore {
            rows,
            mapping,
            config: RefCell::new(config),
        }
    }

    pub fn config_snapshot(&self) -> ExportConfig {
        self.config.borrow().clone()
    }
}

impl LedgerStore for MemoryStore {
    fn rows_in(&self, start: NaiveDate, end: NaiveDate) -> Result<Vec<LedgerRow>> {
        Ok(self
            .rows
            .iter()
            .filter(|r| r.date >= start && r.date <= end)
            .cloned()
            .collect())
    }

    fn rows_before(&self, day: NaiveDate) -> Result<Vec<LedgerRow>> {
        Ok(self
            .rows
            .iter()
            .filter(|r| r.date < day)
            .cloned()
            .collect())
    }
}

impl MappingStore for MemoryStore {
    fn mapping(&self) -> Result<MappingTable> {
        Ok(self.mapping.clone())
    }
}

impl ConfigStore for MemoryStore {
    fn load(&self) -> Result<ExportConfig> {
        Ok(self.config.borrow().clone())
    }

    fn save(&self, cfg: &ExportConfig) -> Result<()> {
        *self.config.borrow_mut() = cfg.clone();
        Ok(())
    }
}

/// Файловое хранилище: по одному JSON-файлу на кассовую книгу, таблицу
/// соответствий и конфигурацию. Конфигурация сохраняется через временный
/// файл с переименованием.
#[derive(Debug, Clone)]
pub struct JsonStore {
    ledger_path: PathBuf,
    mapping_path: PathBuf,
    config_path: PathBuf,
}

impl JsonStore {
    pub fn new(ledger: &Path, mapping: &Path, config: &Path) -> Self {
        JsonStore {
            ledger_path: ledger.to_path_buf(),
            mapping_path: mapping.to_path_buf(),
            config_path: config.to_path_buf(),
        }
    }

    fn read_rows(&self) -> Result<Vec<LedgerRow>> {
        let raw = fs::read_to_string(&self.ledger_path)?;
        serde_json::from_str(&raw).map_err(store_err)
    }
}

fn store_err<E: std::fmt::Display>(e: E) -> KassaError {
    KassaError::Store(e.to_string())
}

impl LedgerStore for JsonStore {
    fn rows_in(&self, start: NaiveDate, end: NaiveDate) -> Result<Vec<LedgerRow>> {
        let rows = self.read_rows()?;
        Ok(rows
            .into_iter()
            .filter(|r| r.date >= start && r.date <= end)
            .collect())
    }

    fn rows_before(&self, day: NaiveDate) -> Result<Vec<LedgerRow>> {
        let rows = self.read_rows()?;
        Ok(rows.into_iter().filter(|r| r.date < day).collect())
    }
}

impl MappingStore for JsonStore {
    fn mapping(&self) -> Result<MappingTable> {
        let raw = fs::read_to_string(&self.mapping_path)?;
        serde_json::from_str(&raw).map_err(store_err)
    }
}

impl ConfigStore for JsonStore {
    fn load(&self) -> Result<ExportConfig> {
        let raw = fs::read_to_string(&self.config_path)?;
        serde_json::from_str(&raw).map_err(store_err)
    }

    fn save(&self, cfg: &ExportConfig) -> Result<()> {
        let raw = serde_json::to_string_pretty(cfg).map_err(store_err)?;
        let tmp = self.config_path.with_extension("json.tmp");
        fs::write(&tmp, raw)?;
        fs::rename(&tmp, &self.config_path)?;
        tracing::debug!(path = %self.config_path.display(), "config saved");
        Ok(())
    }
}
