//! Оркестратор экспорта: выбор периода, свёртка дней в выписки,
//! отрисовка выбранного диалекта, фиксация счётчика выписок.
//!
//! Прогон однопоточный и пакетный: либо документ полностью отрисован и
//! конфигурация зафиксирована, либо не сохраняется ничего. Частичной
//! эмиссии не бывает.

use crate::{
    balance::{build_statements, opening_before, Carry},
    error::{KassaError, Result},
    formats::{camt053::Camt053, coda::Coda, csv::LedgerCsv},
    model::ExportRun,
    store::{ConfigStore, LedgerStore, MappingStore},
    traits::WriteDialect,
};
use chrono::{Local, NaiveDate, NaiveDateTime};
use rust_decimal::Decimal;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dialect {
    Coda,
    Camt053,
    Csv,
}

/// Готовый документ и его имя файла.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportFile {
    pub filename: String,
    pub bytes: Vec<u8>,
}

pub struct Exporter<'a, L, M, C> {
    ledger: &'a L,
    mapping: &'a M,
    config: &'a C,
}

impl<'a, L, M, C> Exporter<'a, L, M, C>
where
    L: LedgerStore,
    M: MappingStore,
    C: ConfigStore,
{
    pub fn new(ledger: &'a L, mapping: &'a M, config: &'a C) -> Self {
        Exporter {
            ledger,
            mapping,
            config,
        }
    }

    /// Экспорт периода `[start, end]`. `Ok(None)` — в периоде нет ни
    /// одного торгового дня; это штатный пустой результат, не ошибка.
    pub fn export(&self, start: NaiveDate, end: NaiveDate, dialect: Dialect) -> Result<Option<ExportFile>> {
        self.export_at(start, end, dialect, Local::now().naive_local())
    }

    /// То же с явным временем прогона — им управляют тесты.
    pub fn export_at(
        &self,
        start: NaiveDate,
        end: NaiveDate,
        dialect: Dialect,
        now: NaiveDateTime,
    ) -> Result<Option<ExportFile>> {
        let cfg = self.config.load()?;

        let mut rows = self.ledger.rows_in(start, end)?;
        rows.sort_by_key(|r| r.date);
        if !rows.iter().any(|r| r.is_trading_day()) {
            tracing::info!(%start, %end, "export: no trading days in range");
            return Ok(None);
        }

        let mapping = self.mapping.mapping()?;

        // Входящий остаток считается один раз, по истории строго до периода.
        let history = self.ledger.rows_before(start)?;
        let opening = opening_before(cfg.opening_balance, &history);

        let carry = Carry {
            balance: opening,
            sequence: cfg.last_sequence,
        };
        let (statements, carry) = build_statements(&rows, &mapping, carry);

        let run = ExportRun {
            iban: cfg.iban.clone(),
            bic: cfg.bic.clone(),
            created: now,
            statements,
        };

        // Сначала полная отрисовка в память: сбой рендера ничего не фиксирует.
        let mut bytes = Vec::new();
        let filename = match dialect {
            Dialect::Coda => {
                Coda::write(&mut bytes, &run)?;
                Coda::filename(&run)
            }
            Dialect::Camt053 => {
                Camt053::write(&mut bytes, &run)?;
                Camt053::filename(&run)
            }
            Dialect::Csv => {
                LedgerCsv::write(&mut bytes, &run)?;
                LedgerCsv::filename(&run)
            }
        };

        // Фиксация счётчика. Без неё документ не выдаётся: номера выписок
        // не должны ни повторяться, ни пропускаться.
        let mut updated = cfg;
        updated.last_sequence = carry.sequence;
        self.config
            .save(&updated)
            .map_err(|e| KassaError::ConfigPersist(e.to_string()))?;

        tracing::info!(
            statements = run.statements.len(),
            first = run.first_sequence(),
            last = run.last_sequence(),
            %filename,
            "export finished"
        );
        Ok(Some(ExportFile { filename, bytes }))
    }

    /// Явный сброс стартового кассового остатка. Счётчик не трогает.
    pub fn reset_balance(&self, opening: Decimal) -> Result<()> {
        let mut cfg = self.config.load()?;
        cfg.opening_balance = opening;
        self.config.save(&cfg)?;
        tracing::info!(%opening, "opening balance reset");
        Ok(())
    }
}
