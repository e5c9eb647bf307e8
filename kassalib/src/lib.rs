//! kassalib — экспорт дневных кассовых закрытий в банковские форматы
//! (CODA с фиксированной шириной, CAMT.053 XML, CSV-проводки).

pub mod balance;
pub mod classify;
pub mod error;
pub mod export;
pub mod model;
pub mod store;
pub mod traits;

pub mod formats {
    pub mod camt053;
    pub mod coda;
    pub mod csv;
}
