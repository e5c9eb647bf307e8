//! CSV-диалект проводок: точка с запятой, одна строка на движение.
//!
//! Порядок колонок задаётся снаружи (его определяет редактор настроек,
//! не это ядро) — здесь только перечень доступных колонок и запись
//! потока движений в выбранной раскладке.

use crate::{
    error::Result,
    model::{DebitCredit, ExportRun},
    traits::WriteDialect,
};
use csv::WriterBuilder;
use rust_decimal::Decimal;
use std::io::Write;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CsvColumn {
    Date,
    Sequence,
    Account,
    Description,
    /// Сумма в колонке только для дебетовых движений, иначе пусто.
    Debit,
    /// Сумма в колонке только для кредитовых движений, иначе пусто.
    Credit,
    Amount,
    Side,
}

impl CsvColumn {
    fn header(self) -> &'static str {
        match self {
            CsvColumn::Date => "date",
            CsvColumn::Sequence => "sequence",
            CsvColumn::Account => "account",
            CsvColumn::Description => "description",
            CsvColumn::Debit => "debit",
            CsvColumn::Credit => "credit",
            CsvColumn::Amount => "amount",
            CsvColumn::Side => "side",
        }
    }
}

/// Раскладка колонок, в порядке вывода.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CsvLayout(pub Vec<CsvColumn>);

impl Default for CsvLayout {
    fn default() -> Self {
        CsvLayout(vec![
            CsvColumn::Date,
            CsvColumn::Sequence,
            CsvColumn::Account,
            CsvColumn::Description,
            CsvColumn::Debit,
            CsvColumn::Credit,
        ])
    }
}

fn money(a: Decimal) -> String {
    format!("{:.2}", a.round_dp(2))
}

pub struct LedgerCsv;

impl LedgerCsv {
    pub fn write_with_layout<W: Write>(w: W, run: &ExportRun, layout: &CsvLayout) -> Result<()> {
        let mut wrt = WriterBuilder::new().delimiter(b';').from_writer(w);

        wrt.write_record(layout.0.iter().map(|c| c.header()))?;

        for st in &run.statements {
            for m in &st.movements {
                let record: Vec<String> = layout
                    .0
                    .iter()
                    .map(|col| match col {
                        CsvColumn::Date => st.date.format("%Y-%m-%d").to_string(),
                        CsvColumn::Sequence => st.sequence.to_string(),
                        CsvColumn::Account => m.account.clone(),
                        CsvColumn::Description => m.description.clone(),
                        CsvColumn::Debit => match m.dc {
                            DebitCredit::Debit => money(m.amount),
                            DebitCredit::Credit => String::new(),
                        },
                        CsvColumn::Credit => match m.dc {
                            DebitCredit::Credit => money(m.amount),
                            DebitCredit::Debit => String::new(),
                        },
                        CsvColumn::Amount => money(m.amount),
                        CsvColumn::Side => match m.dc {
                            DebitCredit::Debit => "D".to_string(),
                            DebitCredit::Credit => "C".to_string(),
                        },
                    })
                    .collect();
                wrt.write_record(&record)?;
            }
        }
        wrt.flush()?;
        Ok(())
    }
}

impl WriteDialect for LedgerCsv {
    fn write<W: Write>(w: W, run: &ExportRun) -> Result<()> {
        LedgerCsv::write_with_layout(w, run, &CsvLayout::default())
    }

    fn filename(run: &ExportRun) -> String {
        format!("{}_{}.csv", run.iban, run.created.format("%Y%m%d"))
    }
}
