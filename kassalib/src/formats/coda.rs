//! Кодировщик CODA — бельгийский формат выписок с фиксированной шириной.
//!
//! Каждая логическая запись — ровно 128 символов ASCII, строки склеиваются
//! CRLF. Раскладка полей задана явными дескрипторами (смещение, ширина,
//! выравнивание, символ заполнения), а не конкатенацией строк: колонки
//! сходятся по построению.
//!
//! Порядок записей на одну выписку: `0` (заголовок), `1` (входящий
//! остаток), пара `21`/`22` на каждое движение, `8` (исходящий остаток).
//! Одна запись `9` на весь прогон.

use crate::{
    error::Result,
    model::{DebitCredit, ExportRun, Movement, Statement},
    traits::WriteDialect,
};
use chrono::NaiveDate;
use rust_decimal::Decimal;
use std::io::Write;

pub const LINE_WIDTH: usize = 128;

#[derive(Debug, Clone, Copy)]
enum Justify {
    Left,
    Right,
}

/// Дескриптор одного поля фиксированной раскладки.
#[derive(Debug, Clone, Copy)]
pub struct Field {
    offset: usize,
    width: usize,
    justify: Justify,
    pad: char,
}

impl Field {
    const fn left(offset: usize, width: usize) -> Self {
        Field {
            offset,
            width,
            justify: Justify::Left,
            pad: ' ',
        }
    }

    const fn num(offset: usize, width: usize) -> Self {
        Field {
            offset,
            width,
            justify: Justify::Right,
            pad: '0',
        }
    }

    pub const fn range(&self) -> std::ops::Range<usize> {
        self.offset..self.offset + self.width
    }
}

/// Раскладка всех типов записей. Публична, чтобы тесты читали поля по тем
/// же смещениям, по которым они были записаны.
pub mod layout {
    use super::Field;

    // тип 0 — заголовок выписки
    pub const HDR_SEQ: Field = Field::num(2, 4);
    pub const HDR_DATE: Field = Field::left(6, 6);
    pub const HDR_BIC: Field = Field::left(12, 11);
    pub const HDR_IBAN: Field = Field::left(23, 34);

    // типы 1 и 8 — входящий/исходящий остаток (одна форма)
    pub const BAL_SEQ: Field = Field::num(2, 4);
    pub const BAL_IBAN: Field = Field::left(6, 34);
    pub const BAL_SIGN: Field = Field::left(40, 1);
    pub const BAL_AMOUNT: Field = Field::num(41, 15);
    pub const BAL_DATE: Field = Field::left(56, 6);

    // тип 21 — движение
    pub const MOV_SEQ: Field = Field::num(2, 4);
    pub const MOV_SIGN: Field = Field::left(6, 1);
    pub const MOV_AMOUNT: Field = Field::num(7, 15);
    pub const MOV_DATE: Field = Field::left(22, 6);

    // тип 22 — описание движения
    pub const DTL_SEQ: Field = Field::num(2, 4);
    pub const DTL_DESC: Field = Field::left(6, 53);

    // тип 9 — хвост прогона
    pub const TRL_COUNT: Field = Field::num(2, 6);
    pub const TRL_DEBIT: Field = Field::num(8, 15);
    pub const TRL_CREDIT: Field = Field::num(23, 15);

    // маркер версии формата в последней колонке (записи 0 и 9)
    pub const VERSION: Field = Field::left(127, 1);
}

const VERSION_MARK: &str = "2";

/// Построитель одной 128-символьной строки.
struct Line {
    buf: Vec<u8>,
}

impl Line {
    fn new(record_type: &str) -> Self {
        let mut buf = vec![b' '; LINE_WIDTH];
        buf[..record_type.len()].copy_from_slice(record_type.as_bytes());
        Line { buf }
    }

    /// Кладёт значение в поле: усечение до ширины, набивка по выравниванию.
    /// Не-ASCII символы заменяются на `?`, формат допускает только ASCII.
    fn put(&mut self, field: Field, value: &str) -> &mut Self {
        let ascii: String = value
            .chars()
            .map(|c| if c.is_ascii() { c } else { '?' })
            .take(field.width)
            .collect();
        let pad = field.width - ascii.len();
        let rendered = match field.justify {
            Justify::Left => format!("{}{}", ascii, field.pad.to_string().repeat(pad)),
            Justify::Right => format!("{}{}", field.pad.to_string().repeat(pad), ascii),
        };
        self.buf[field.range()].copy_from_slice(rendered.as_bytes());
        self
    }

    fn finish(self) -> String {
        // buf заполнен только ASCII
        String::from_utf8_lossy(&self.buf).into_owned()
    }
}

/// Каноническое кодирование суммы: округление до 2 знаков, абсолютное
/// значение в тысячных долях, 15 цифр с ведущими нулями, без разделителя.
pub fn amount_field(a: Decimal) -> String {
    let fixed = format!("{:.3}", a.round_dp(2).abs()).replace('.', "");
    format!("{:0>15}", fixed)
}

/// Обратное декодирование тысячных долей (используется тестами и
/// самопроверками): 15 цифр → Decimal с двумя знаками.
pub fn decode_amount(field: &str) -> Option<Decimal> {
    let n: i64 = field.parse().ok()?;
    Some(Decimal::new(n, 3).round_dp(2))
}

fn balance_sign(balance: Decimal) -> &'static str {
    if balance.is_sign_negative() && !balance.is_zero() {
        "1"
    } else {
        "0"
    }
}

fn movement_sign(dc: DebitCredit) -> &'static str {
    match dc {
        DebitCredit::Credit => "0",
        DebitCredit::Debit => "1",
    }
}

fn coda_date(d: NaiveDate) -> String {
    d.format("%d%m%y").to_string()
}

fn seq_field(sequence: u32) -> String {
    format!("{:04}", sequence)
}

fn header(run: &ExportRun, st: &Statement) -> String {
    let mut line = Line::new("0");
    line.put(layout::HDR_SEQ, &seq_field(st.sequence))
        .put(layout::HDR_DATE, &coda_date(st.date))
        .put(layout::HDR_BIC, &run.bic)
        .put(layout::HDR_IBAN, &run.iban)
        .put(layout::VERSION, VERSION_MARK);
    line.finish()
}

fn balance_record(record_type: &str, run: &ExportRun, st: &Statement, balance: Decimal) -> String {
    let mut line = Line::new(record_type);
    line.put(layout::BAL_SEQ, &seq_field(st.sequence))
        .put(layout::BAL_IBAN, &run.iban)
        .put(layout::BAL_SIGN, balance_sign(balance))
        .put(layout::BAL_AMOUNT, &amount_field(balance))
        .put(layout::BAL_DATE, &coda_date(st.date));
    line.finish()
}

fn movement_pair(st: &Statement, m: &Movement) -> [String; 2] {
    let mut first = Line::new("21");
    first
        .put(layout::MOV_SEQ, &seq_field(st.sequence))
        .put(layout::MOV_SIGN, movement_sign(m.dc))
        .put(layout::MOV_AMOUNT, &amount_field(m.amount))
        .put(layout::MOV_DATE, &coda_date(st.date));

    let mut second = Line::new("22");
    second
        .put(layout::DTL_SEQ, &seq_field(st.sequence))
        .put(layout::DTL_DESC, &m.description);

    [first.finish(), second.finish()]
}

fn trailer(run: &ExportRun, record_count: usize) -> String {
    let (_, credit_sum, _, debit_sum) = run.totals();
    let mut line = Line::new("9");
    line.put(layout::TRL_COUNT, &format!("{:06}", record_count))
        .put(layout::TRL_DEBIT, &amount_field(debit_sum))
        .put(layout::TRL_CREDIT, &amount_field(credit_sum))
        .put(layout::VERSION, VERSION_MARK);
    line.finish()
}

pub struct Coda;

impl WriteDialect for Coda {
    fn write<W: Write>(mut w: W, run: &ExportRun) -> Result<()> {
        let mut lines: Vec<String> = Vec::new();
        for st in &run.statements {
            lines.push(header(run, st));
            lines.push(balance_record("1", run, st, st.opening));
            for m in &st.movements {
                lines.extend(movement_pair(st, m));
            }
            lines.push(balance_record("8", run, st, st.closing));
        }
        // счётчик хвоста — все записи до самой записи 9
        let count = lines.len();
        lines.push(trailer(run, count));

        for line in &lines {
            w.write_all(line.as_bytes())?;
            w.write_all(b"\r\n")?;
        }
        Ok(())
    }

    fn filename(run: &ExportRun) -> String {
        format!(
            "{}_{}-{:03}_{}-{:03}.cod",
            run.iban,
            run.year(),
            run.first_sequence(),
            run.year(),
            run.last_sequence()
        )
    }
}
