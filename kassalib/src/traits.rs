//! Унифицированный трэйт записи на основе std::io::Write.
//!
//! Все диалекты — взаимозаменяемые стратегии над одним и тем же
//! [`ExportRun`]: одинаковые остатки, одинаковый набор движений.

use crate::{error::Result, model::ExportRun};
use std::io::Write;

pub trait WriteDialect {
    fn write<W: Write>(w: W, run: &ExportRun) -> Result<()>;

    /// Имя файла для готового документа.
    fn filename(run: &ExportRun) -> String;
}
