//! Классификатор: одно дневное закрытие → упорядоченный список движений.
//!
//! Порядок значим и воспроизводится точно: сначала кредит на всю выручку,
//! затем дебеты по способам оплаты в фиксированном порядке перечисления,
//! афсторинг всегда последним. Нулевые суммы не эмитятся.

use crate::model::{
    AccountMapping, DebitCredit, LedgerRow, MappingTable, Movement, PaymentMethod, TxCode,
    DEPOSIT_CODE,
};
use rust_decimal::Decimal;

/// Код счёта для кредитовой строки выручки.
const VAT_TOTAL_CODE: &str = "Omzet";

/// Подстановка плейсхолдеров шаблона описания: `&date&` → дата дня в виде
/// `dd-mm-yyyy`, `&note&` → описание дня. Пустой результат откатывается
/// на подпись из таблицы соответствий.
fn render_description(entry: &AccountMapping, row: &LedgerRow) -> String {
    let rendered = entry
        .description_template
        .replace("&date&", &row.date.format("%d-%m-%Y").to_string())
        .replace("&note&", &row.description);
    if rendered.is_empty() {
        entry.label.clone()
    } else {
        rendered
    }
}

fn debit(row: &LedgerRow, mapping: &MappingTable, code: &str, amount: Decimal) -> Movement {
    let entry = mapping.resolve(code);
    Movement {
        amount,
        dc: DebitCredit::Debit,
        description: render_description(&entry, row),
        account: entry.account,
        tx_code: TxCode::for_side(DebitCredit::Debit),
    }
}

/// Классифицирует одно закрытие. Баланс «выручка == платежи» здесь не
/// проверяется — это контракт слоя ввода данных.
pub fn classify(row: &LedgerRow, mapping: &MappingTable) -> Vec<Movement> {
    let mut movements = Vec::new();

    // Выручка — один кредит на полную сумму. Описание фиксированное,
    // через шаблоны соответствий не прогоняется.
    let revenue = row.total_revenue();
    if revenue > Decimal::ZERO {
        let entry = mapping.resolve(VAT_TOTAL_CODE);
        movements.push(Movement {
            amount: revenue,
            dc: DebitCredit::Credit,
            description: format!("Dagontvangsten {}", row.description),
            account: entry.account,
            tx_code: TxCode::for_side(DebitCredit::Credit),
        });
    }

    for method in PaymentMethod::DEBIT_ORDER {
        if let Some(&amount) = row.payments.get(&method) {
            if amount > Decimal::ZERO {
                movements.push(debit(row, mapping, method.code(), amount));
            }
        }
    }

    if row.cash_deposit > Decimal::ZERO {
        movements.push(debit(row, mapping, DEPOSIT_CODE, row.cash_deposit));
    }

    movements
}
