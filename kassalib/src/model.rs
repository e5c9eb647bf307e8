//! Доменные модели — единый слой между кассовой книгой и форматами экспорта.

use chrono::{Datelike, NaiveDate, NaiveDateTime};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Код «афсторинга» (изъятие наличных в банк) в таблице соответствий.
pub const DEPOSIT_CODE: &str = "Afstorting";

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum DebitCredit {
    Debit,
    Credit,
}

/// Ставки НДС, под которыми регистрируется выручка.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum VatRate {
    Rate21,
    Rate12,
    Rate6,
    Rate0,
}

impl VatRate {
    pub fn code(self) -> &'static str {
        match self {
            VatRate::Rate21 => "Omzet_21",
            VatRate::Rate12 => "Omzet_12",
            VatRate::Rate6 => "Omzet_6",
            VatRate::Rate0 => "Omzet_0",
        }
    }
}

/// Способы оплаты. Порядок объявления фиксирован: именно в этом порядке
/// классификатор перечисляет дебетовые движения (афсторинг идёт отдельно,
/// всегда последним). Только `Cash` меняет физический остаток кассы.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum PaymentMethod {
    Bancontact,
    Payconiq,
    Overschrijving,
    Bonnen,
    Cash,
}

impl PaymentMethod {
    pub const DEBIT_ORDER: [PaymentMethod; 5] = [
        PaymentMethod::Bancontact,
        PaymentMethod::Payconiq,
        PaymentMethod::Overschrijving,
        PaymentMethod::Bonnen,
        PaymentMethod::Cash,
    ];

    pub fn code(self) -> &'static str {
        match self {
            PaymentMethod::Bancontact => "Bancontact",
            PaymentMethod::Payconiq => "Payconiq",
            PaymentMethod::Overschrijving => "Oversch",
            PaymentMethod::Bonnen => "Bonnen",
            PaymentMethod::Cash => "Cash",
        }
    }

    pub fn is_cash(self) -> bool {
        matches!(self, PaymentMethod::Cash)
    }
}

/// Одно дневное закрытие кассы.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LedgerRow {
    pub date: NaiveDate,
    pub description: String,
    pub revenue: BTreeMap<VatRate, Decimal>,
    pub payments: BTreeMap<PaymentMethod, Decimal>,
    pub cash_deposit: Decimal,
}

impl LedgerRow {
    /// Пустая запись на дату; пустое описание заменяется штатным
    /// «Dagontvangsten <дата>».
    pub fn new(date: NaiveDate, description: &str) -> Self {
        let description = if description.trim().is_empty() {
            format!("Dagontvangsten {}", date.format("%d-%m-%Y"))
        } else {
            description.to_string()
        };
        LedgerRow {
            date,
            description,
            revenue: BTreeMap::new(),
            payments: BTreeMap::new(),
            cash_deposit: Decimal::ZERO,
        }
    }

    pub fn total_revenue(&self) -> Decimal {
        self.revenue.values().copied().sum()
    }

    pub fn total_payments(&self) -> Decimal {
        self.payments.values().copied().sum()
    }

    /// Торговый день: есть выручка или есть платежи.
    pub fn is_trading_day(&self) -> bool {
        !self.total_revenue().is_zero() || !self.total_payments().is_zero()
    }

    /// Дневное изменение кассового остатка: принятые наличные минус
    /// изъятие в банк. Электронные платежи и выручка кассу не трогают.
    pub fn net_cash(&self) -> Decimal {
        let cash = self
            .payments
            .get(&PaymentMethod::Cash)
            .copied()
            .unwrap_or(Decimal::ZERO);
        cash - self.cash_deposit
    }
}

/// Строка таблицы соответствий: код → счёт, подпись, шаблон описания.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AccountMapping {
    pub code: String,
    pub account: String,
    pub label: String,
    #[serde(default)]
    pub description_template: String,
    #[serde(default)]
    pub vat_code: Option<String>,
}

/// Таблица соответствий. Отсутствующий код не ошибка: вместо него
/// подставляется запись, где и счёт, и подпись — сам код.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct MappingTable(BTreeMap<String, AccountMapping>);

impl MappingTable {
    pub fn new() -> Self {
        MappingTable(BTreeMap::new())
    }

    pub fn insert(&mut self, entry: AccountMapping) {
        self.0.insert(entry.code.clone(), entry);
    }

    pub fn resolve(&self, code: &str) -> AccountMapping {
        self.0.get(code).cloned().unwrap_or_else(|| AccountMapping {
            code: code.to_string(),
            account: code.to_string(),
            label: code.to_string(),
            description_template: String::new(),
            vat_code: None,
        })
    }
}

/// Персистентная конфигурация экспорта. Меняется только самим экспортом
/// (счётчик) и явной операцией сброса остатка.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ExportConfig {
    pub opening_balance: Decimal,
    pub iban: String,
    pub bic: String,
    pub last_sequence: u32,
}

impl ExportConfig {
    pub fn new(iban: &str, bic: &str) -> Self {
        ExportConfig {
            opening_balance: Decimal::ZERO,
            // IBAN храним без пробелов
            iban: iban.replace(' ', ""),
            bic: bic.to_string(),
            last_sequence: 0,
        }
    }
}

/// Трёхуровневый код операции (домен/семейство/подсемейство), нужен
/// только диалекту CAMT.053.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TxCode {
    pub domain: &'static str,
    pub family: &'static str,
    pub sub_family: &'static str,
}

impl TxCode {
    pub fn for_side(dc: DebitCredit) -> Self {
        match dc {
            DebitCredit::Credit => TxCode {
                domain: "PMNT",
                family: "RCDT",
                sub_family: "ESCT",
            },
            DebitCredit::Debit => TxCode {
                domain: "PMNT",
                family: "ICDT",
                sub_family: "ESCT",
            },
        }
    }
}

/// Одно классифицированное движение. Сумма всегда положительная,
/// направление — в `dc`.
#[derive(Debug, Clone, PartialEq)]
pub struct Movement {
    pub amount: Decimal,
    pub dc: DebitCredit,
    pub description: String,
    pub account: String,
    pub tx_code: TxCode,
}

/// Выписка одного торгового дня. Живёт только внутри одного прогона
/// экспорта и никуда не сохраняется.
#[derive(Debug, Clone, PartialEq)]
pub struct Statement {
    pub sequence: u32,
    pub date: NaiveDate,
    pub opening: Decimal,
    pub closing: Decimal,
    pub movements: Vec<Movement>,
}

/// Собранный прогон экспорта — вход для всех диалектов записи.
#[derive(Debug, Clone, PartialEq)]
pub struct ExportRun {
    pub iban: String,
    pub bic: String,
    pub created: NaiveDateTime,
    pub statements: Vec<Statement>,
}

impl ExportRun {
    pub fn first_sequence(&self) -> u32 {
        self.statements.first().map(|s| s.sequence).unwrap_or(0)
    }

    pub fn last_sequence(&self) -> u32 {
        self.statements.last().map(|s| s.sequence).unwrap_or(0)
    }

    pub fn year(&self) -> i32 {
        self.created.year()
    }

    /// Итог по всем движениям прогона: (число кредитов, сумма кредитов,
    /// число дебетов, сумма дебетов) — для хвостовой записи CODA.
    pub fn totals(&self) -> (usize, Decimal, usize, Decimal) {
        let mut credit_n = 0usize;
        let mut credit_sum = Decimal::ZERO;
        let mut debit_n = 0usize;
        let mut debit_sum = Decimal::ZERO;
        for m in self.statements.iter().flat_map(|s| &s.movements) {
            match m.dc {
                DebitCredit::Credit => {
                    credit_n += 1;
                    credit_sum += m.amount;
                }
                DebitCredit::Debit => {
                    debit_n += 1;
                    debit_sum += m.amount;
                }
            }
        }
        (credit_n, credit_sum, debit_n, debit_sum)
    }
}
