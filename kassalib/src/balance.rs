//! Аккумулятор кассового остатка и счётчика выписок.
//!
//! Остаток и номер выписки протягиваются через дни явной свёрткой с
//! аккумулятором [`Carry`], без разрозненных мутабельных переменных.

use crate::classify::classify;
use crate::model::{LedgerRow, MappingTable, Statement};
use rust_decimal::Decimal;

/// Состояние, переносимое от дня к дню и от прогона к прогону.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Carry {
    pub balance: Decimal,
    pub sequence: u32,
}

/// Остаток на начало периода: стартовый остаток из конфигурации плюс
/// наличные минус афсторинги по всем записям строго до периода.
pub fn opening_before(config_opening: Decimal, history: &[LedgerRow]) -> Decimal {
    history
        .iter()
        .fold(config_opening, |acc, row| acc + row.net_cash())
}

/// Свёртка упорядоченных по дате записей в выписки. Неторговые дни
/// выпадают целиком: ни номера выписки, ни влияния на остаток.
/// Закрытие дня N становится открытием дня N+1.
pub fn build_statements(
    rows: &[LedgerRow],
    mapping: &MappingTable,
    carry: Carry,
) -> (Vec<Statement>, Carry) {
    rows.iter().filter(|r| r.is_trading_day()).fold(
        (Vec::new(), carry),
        |(mut statements, carry), row| {
            let sequence = carry.sequence + 1;
            let closing = carry.balance + row.net_cash();
            statements.push(Statement {
                sequence,
                date: row.date,
                opening: carry.balance,
                closing,
                movements: classify(row, mapping),
            });
            (
                statements,
                Carry {
                    balance: closing,
                    sequence,
                },
            )
        },
    )
}
