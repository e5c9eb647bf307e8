//! Диалект CAMT.053 (ISO 20022) — XML-выписка banka→клиент.
//!
//! Одна `Stmt` на торговый день: идентификатор из номера выписки, блоки
//! остатков OPBD/CLBD с абсолютной суммой и индикатором CRDT/DBIT, по
//! одному `Ntry` на движение с трёхуровневым кодом операции.

use crate::{
    error::{KassaError, Result},
    model::{DebitCredit, ExportRun, Movement, Statement},
    traits::WriteDialect,
};
use chrono::NaiveDate;
use quick_xml::{
    events::{BytesDecl, BytesStart, BytesText, Event},
    Writer,
};
use rust_decimal::Decimal;
use std::io::Write;

const NAMESPACE: &str = "urn:iso:std:iso:20022:tech:xsd:camt.053.001.02";
const CURRENCY: &str = "EUR";

pub struct Camt053;

impl WriteDialect for Camt053 {
    fn write<W: Write>(mut w: W, run: &ExportRun) -> Result<()> {
        let mut wr = Writer::new_with_indent(&mut w, b' ', 2);

        wr.write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))
            .map_err(xml)?;

        let mut doc = BytesStart::new("Document");
        doc.push_attribute(("xmlns", NAMESPACE));
        wr.write_event(Event::Start(doc)).map_err(xml)?;
        open(&mut wr, "BkToCstmrStmt").map_err(xml)?;

        // <GrpHdr> — идентификатор сообщения из времени прогона
        let created = run.created.format("%Y-%m-%dT%H:%M:%S").to_string();
        open(&mut wr, "GrpHdr").map_err(xml)?;
        text_el(
            &mut wr,
            "MsgId",
            &format!("KASSA-{}", run.created.format("%Y%m%d%H%M%S")),
        )
        .map_err(xml)?;
        text_el(&mut wr, "CreDtTm", &created).map_err(xml)?;
        close(&mut wr, "GrpHdr").map_err(xml)?;

        for st in &run.statements {
            write_statement(&mut wr, run, st, &created).map_err(xml)?;
        }

        close(&mut wr, "BkToCstmrStmt").map_err(xml)?;
        close(&mut wr, "Document").map_err(xml)?;
        Ok(())
    }

    fn filename(run: &ExportRun) -> String {
        format!(
            "CAMT053_{}_{}.xml",
            run.iban,
            run.created.format("%Y%m%d")
        )
    }
}

type XmlResult = std::result::Result<(), quick_xml::Error>;

fn open<W: Write>(wr: &mut Writer<W>, tag: &str) -> XmlResult {
    wr.write_event(Event::Start(BytesStart::new(tag)))
}

fn close<W: Write>(wr: &mut Writer<W>, tag: &str) -> XmlResult {
    wr.write_event(Event::End(BytesStart::new(tag).to_end()))
}

fn text_el<W: Write>(wr: &mut Writer<W>, tag: &str, text: &str) -> XmlResult {
    open(wr, tag)?;
    wr.write_event(Event::Text(BytesText::new(text)))?;
    close(wr, tag)
}

fn write_statement<W: Write>(
    wr: &mut Writer<W>,
    run: &ExportRun,
    st: &Statement,
    created: &str,
) -> XmlResult {
    open(wr, "Stmt")?;
    text_el(wr, "Id", &format!("{}-{}", run.year(), st.sequence))?;
    text_el(wr, "ElctrncSeqNb", &st.sequence.to_string())?;
    text_el(wr, "CreDtTm", created)?;

    // <Acct><Id><IBAN>...</IBAN></Id><Ccy>EUR</Ccy></Acct>
    open(wr, "Acct")?;
    open(wr, "Id")?;
    text_el(wr, "IBAN", &run.iban)?;
    close(wr, "Id")?;
    text_el(wr, "Ccy", CURRENCY)?;
    close(wr, "Acct")?;

    write_balance(wr, "OPBD", st.opening, st.date)?;
    write_balance(wr, "CLBD", st.closing, st.date)?;

    for m in &st.movements {
        write_entry(wr, m, st.date)?;
    }

    close(wr, "Stmt")
}

fn indicator(dc: DebitCredit) -> &'static str {
    match dc {
        DebitCredit::Credit => "CRDT",
        DebitCredit::Debit => "DBIT",
    }
}

/// Остаток пишется суммой без знака; знак несёт отдельный индикатор.
fn write_balance<W: Write>(wr: &mut Writer<W>, tp: &str, amount: Decimal, date: NaiveDate) -> XmlResult {
    let ind = if amount.is_sign_negative() && !amount.is_zero() {
        "DBIT"
    } else {
        "CRDT"
    };
    open(wr, "Bal")?;
    open(wr, "Tp")?;
    open(wr, "CdOrPrtry")?;
    text_el(wr, "Cd", tp)?;
    close(wr, "CdOrPrtry")?;
    close(wr, "Tp")?;
    write_amount(wr, amount.abs())?;
    text_el(wr, "CdtDbtInd", ind)?;
    open(wr, "Dt")?;
    text_el(wr, "Dt", &date.format("%Y-%m-%d").to_string())?;
    close(wr, "Dt")?;
    close(wr, "Bal")
}

fn write_amount<W: Write>(wr: &mut Writer<W>, amount: Decimal) -> XmlResult {
    let amt = format!("{:.2}", amount.round_dp(2));
    wr.write_event(Event::Start(
        BytesStart::new("Amt").with_attributes([("Ccy", CURRENCY)]),
    ))?;
    wr.write_event(Event::Text(BytesText::new(&amt)))?;
    close(wr, "Amt")
}

fn write_entry<W: Write>(wr: &mut Writer<W>, m: &Movement, date: NaiveDate) -> XmlResult {
    let d = date.format("%Y-%m-%d").to_string();
    open(wr, "Ntry")?;
    write_amount(wr, m.amount)?;
    text_el(wr, "CdtDbtInd", indicator(m.dc))?;
    text_el(wr, "Sts", "BOOK")?;
    open(wr, "BookgDt")?;
    text_el(wr, "Dt", &d)?;
    close(wr, "BookgDt")?;
    open(wr, "ValDt")?;
    text_el(wr, "Dt", &d)?;
    close(wr, "ValDt")?;

    // <BkTxCd><Domn><Cd>PMNT</Cd><Fmly><Cd>..</Cd><SubFmlyCd>..</SubFmlyCd></Fmly></Domn></BkTxCd>
    open(wr, "BkTxCd")?;
    open(wr, "Domn")?;
    text_el(wr, "Cd", m.tx_code.domain)?;
    open(wr, "Fmly")?;
    text_el(wr, "Cd", m.tx_code.family)?;
    text_el(wr, "SubFmlyCd", m.tx_code.sub_family)?;
    close(wr, "Fmly")?;
    close(wr, "Domn")?;
    close(wr, "BkTxCd")?;

    open(wr, "NtryDtls")?;
    open(wr, "TxDtls")?;
    open(wr, "RmtInf")?;
    text_el(wr, "Ustrd", &m.description)?;
    close(wr, "RmtInf")?;
    close(wr, "TxDtls")?;
    close(wr, "NtryDtls")?;

    close(wr, "Ntry")
}

fn xml<E: std::fmt::Display>(e: E) -> KassaError {
    KassaError::Xml(e.to_string())
}
