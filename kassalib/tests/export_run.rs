use chrono::{NaiveDate, NaiveDateTime};
use kassalib::{
    balance::{build_statements, opening_before, Carry},
    classify::classify,
    error::{KassaError, Result},
    export::{Dialect, Exporter},
    model::{
        AccountMapping, DebitCredit, ExportConfig, LedgerRow, MappingTable, PaymentMethod, VatRate,
    },
    store::{ConfigStore, MemoryStore},
};
use rust_decimal::Decimal;
use std::cell::RefCell;

fn dec(s: &str) -> Decimal {
    Decimal::from_str_exact(s).expect("decimal literal")
}

fn date(d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(2025, 6, d).expect("date literal")
}

fn run_time() -> NaiveDateTime {
    date(30).and_hms_opt(9, 30, 0).expect("time literal")
}

fn mapping() -> MappingTable {
    let mut t = MappingTable::new();
    t.insert(AccountMapping {
        code: "Bancontact".into(),
        account: "580000".into(),
        label: "Bancontact".into(),
        description_template: "Bancontact &date& &note&".into(),
        vat_code: None,
    });
    t.insert(AccountMapping {
        code: "Afstorting".into(),
        account: "580005".into(),
        label: "Afstorting".into(),
        description_template: "".into(),
        vat_code: None,
    });
    t
}

fn trading_row(d: u32, cash: &str, bancontact: &str, deposit: &str) -> LedgerRow {
    let mut row = LedgerRow::new(date(d), "");
    let total = dec(cash) + dec(bancontact);
    if !total.is_zero() {
        row.revenue.insert(VatRate::Rate21, total);
    }
    if !dec(cash).is_zero() {
        row.payments.insert(PaymentMethod::Cash, dec(cash));
    }
    if !dec(bancontact).is_zero() {
        row.payments.insert(PaymentMethod::Bancontact, dec(bancontact));
    }
    row.cash_deposit = dec(deposit);
    row
}

#[test]
fn movement_order_is_revenue_then_methods_then_deposit() {
    let mut row = LedgerRow::new(date(1), "zaterdag");
    row.revenue.insert(VatRate::Rate21, dec("100.00"));
    row.payments.insert(PaymentMethod::Cash, dec("40.00"));
    row.payments.insert(PaymentMethod::Bancontact, dec("60.00"));
    row.cash_deposit = dec("30.00");

    let movements = classify(&row, &mapping());
    assert_eq!(movements.len(), 4);
    assert_eq!(movements[0].dc, DebitCredit::Credit);
    assert_eq!(movements[0].description, "Dagontvangsten zaterdag");
    assert_eq!(movements[1].account, "580000");
    assert_eq!(
        movements[1].description,
        "Bancontact 01-06-2025 zaterdag"
    );
    // наличные до афсторинга, афсторинг последним
    assert_eq!(movements[2].dc, DebitCredit::Debit);
    assert_eq!(movements[2].account, "Cash");
    assert_eq!(movements[3].account, "580005");
}

#[test]
fn zero_amounts_are_omitted() {
    let mut row = LedgerRow::new(date(1), "dag");
    row.revenue.insert(VatRate::Rate21, dec("10.00"));
    row.payments.insert(PaymentMethod::Bancontact, dec("10.00"));
    row.payments.insert(PaymentMethod::Payconiq, dec("0.00"));
    let movements = classify(&row, &mapping());
    assert_eq!(movements.len(), 2);
}

#[test]
fn empty_template_falls_back_to_label() {
    let mut row = LedgerRow::new(date(1), "dag");
    row.revenue.insert(VatRate::Rate21, dec("10.00"));
    row.payments.insert(PaymentMethod::Cash, dec("10.00"));
    row.cash_deposit = dec("10.00");
    let movements = classify(&row, &mapping());
    let deposit = movements.last().expect("deposit movement");
    assert_eq!(deposit.description, "Afstorting");
}

#[test]
fn unmapped_code_uses_code_as_account_and_label() {
    let mut row = LedgerRow::new(date(1), "dag");
    row.revenue.insert(VatRate::Rate21, dec("10.00"));
    row.payments.insert(PaymentMethod::Bonnen, dec("10.00"));
    let movements = classify(&row, &MappingTable::new());
    let bonnen = movements.last().expect("bonnen movement");
    assert_eq!(bonnen.account, "Bonnen");
    assert_eq!(bonnen.description, "Bonnen");
}

#[test]
fn blank_description_gets_default() {
    let row = LedgerRow::new(date(5), "  ");
    assert_eq!(row.description, "Dagontvangsten 05-06-2025");
}

#[test]
fn non_trading_days_are_skipped_without_sequence_or_balance() {
    // 5 календарных дней, из них 2 пустых
    let rows = vec![
        trading_row(1, "40.00", "60.00", "0.00"),
        trading_row(2, "0.00", "0.00", "0.00"),
        trading_row(3, "20.00", "0.00", "10.00"),
        trading_row(4, "0.00", "0.00", "0.00"),
        trading_row(5, "0.00", "15.00", "0.00"),
    ];
    let carry = Carry {
        balance: Decimal::ZERO,
        sequence: 7,
    };
    let (statements, carry) = build_statements(&rows, &mapping(), carry);

    assert_eq!(statements.len(), 3);
    let seqs: Vec<u32> = statements.iter().map(|s| s.sequence).collect();
    assert_eq!(seqs, [8, 9, 10]);
    assert_eq!(carry.sequence, 10);

    // непрерывность: закрытие дня N — открытие дня N+1
    assert_eq!(statements[0].closing, statements[1].opening);
    assert_eq!(statements[1].closing, statements[2].opening);

    // касса: +40, затем +20−10, электронные платежи остаток не трогают
    assert_eq!(statements[0].closing, dec("40.00"));
    assert_eq!(statements[1].closing, dec("50.00"));
    assert_eq!(statements[2].closing, dec("50.00"));
    assert_eq!(carry.balance, dec("50.00"));
}

#[test]
fn opening_balance_folds_history_before_period() {
    let history = vec![
        trading_row(1, "100.00", "0.00", "30.00"),
        trading_row(2, "0.00", "50.00", "0.00"),
    ];
    assert_eq!(opening_before(dec("5.00"), &history), dec("75.00"));
}

#[test]
fn export_no_trading_days_is_none_and_config_untouched() -> Result<()> {
    let store = MemoryStore::new(
        vec![trading_row(2, "0.00", "0.00", "0.00")],
        mapping(),
        ExportConfig::new("BE68539007547034", "GKCCBEBB"),
    );
    let exporter = Exporter::new(&store, &store, &store);
    let out = exporter.export_at(date(1), date(7), Dialect::Coda, run_time())?;
    assert!(out.is_none());
    assert_eq!(store.config_snapshot().last_sequence, 0);
    Ok(())
}

#[test]
fn export_persists_last_sequence() -> Result<()> {
    let mut cfg = ExportConfig::new("BE68539007547034", "GKCCBEBB");
    cfg.last_sequence = 41;
    let store = MemoryStore::new(
        vec![
            trading_row(1, "40.00", "60.00", "0.00"),
            trading_row(2, "10.00", "0.00", "0.00"),
        ],
        mapping(),
        cfg,
    );
    let exporter = Exporter::new(&store, &store, &store);
    let file = exporter
        .export_at(date(1), date(7), Dialect::Coda, run_time())?
        .expect("document");
    assert_eq!(store.config_snapshot().last_sequence, 43);
    assert_eq!(file.filename, "BE68539007547034_2025-042_2025-043.cod");
    Ok(())
}

#[test]
fn consecutive_runs_continue_sequence_and_balance() -> Result<()> {
    let store = MemoryStore::new(
        vec![
            trading_row(1, "40.00", "0.00", "0.00"),
            trading_row(8, "25.00", "0.00", "0.00"),
        ],
        mapping(),
        ExportConfig::new("BE68539007547034", "GKCCBEBB"),
    );
    let exporter = Exporter::new(&store, &store, &store);
    exporter
        .export_at(date(1), date(7), Dialect::Coda, run_time())?
        .expect("first run");
    let second = exporter
        .export_at(date(8), date(14), Dialect::Coda, run_time())?
        .expect("second run");

    // вторая выписка продолжает счётчик и несёт остаток первой недели
    assert_eq!(store.config_snapshot().last_sequence, 2);
    let doc = String::from_utf8(second.bytes).expect("ascii");
    let opening = doc
        .split_terminator("\r\n")
        .find(|l| l.starts_with('1'))
        .expect("1 record");
    assert_eq!(
        &opening[kassalib::formats::coda::layout::BAL_AMOUNT.range()],
        "000000000040000"
    );
    Ok(())
}

/// Конфигурация, у которой отказывает запись — для проверки политики
/// «документ не выдаётся без зафиксированного счётчика».
struct BrokenConfig {
    inner: RefCell<ExportConfig>,
}

impl ConfigStore for BrokenConfig {
    fn load(&self) -> Result<ExportConfig> {
        Ok(self.inner.borrow().clone())
    }

    fn save(&self, _cfg: &ExportConfig) -> Result<()> {
        Err(KassaError::Store("disk full".into()))
    }
}

#[test]
fn persist_failure_surfaces_and_withholds_document() {
    let store = MemoryStore::new(
        vec![trading_row(1, "40.00", "60.00", "0.00")],
        mapping(),
        ExportConfig::new("BE68539007547034", "GKCCBEBB"),
    );
    let broken = BrokenConfig {
        inner: RefCell::new(ExportConfig::new("BE68539007547034", "GKCCBEBB")),
    };
    let exporter = Exporter::new(&store, &store, &broken);
    let err = exporter
        .export_at(date(1), date(7), Dialect::Coda, run_time())
        .expect_err("save must fail");
    assert!(matches!(err, KassaError::ConfigPersist(_)));
}

#[test]
fn reset_balance_keeps_sequence() -> Result<()> {
    let mut cfg = ExportConfig::new("BE68539007547034", "GKCCBEBB");
    cfg.last_sequence = 12;
    let store = MemoryStore::new(Vec::new(), mapping(), cfg);
    let exporter = Exporter::new(&store, &store, &store);
    exporter.reset_balance(dec("150.00"))?;
    let snapshot = store.config_snapshot();
    assert_eq!(snapshot.opening_balance, dec("150.00"));
    assert_eq!(snapshot.last_sequence, 12);
    Ok(())
}
