use chrono::NaiveDate;
use clap::{Parser, ValueEnum};
use kassalib::{
    error::Result,
    export::{Dialect, Exporter},
    store::JsonStore,
};
use rust_decimal::Decimal;
use std::fs;
use std::path::PathBuf;

#[derive(Copy, Clone, Debug, ValueEnum)]
enum Fmt {
    Coda,
    Camt053,
    Csv,
}

impl From<Fmt> for Dialect {
    fn from(f: Fmt) -> Self {
        match f {
            Fmt::Coda => Dialect::Coda,
            Fmt::Camt053 => Dialect::Camt053,
            Fmt::Csv => Dialect::Csv,
        }
    }
}

#[derive(Parser, Debug)]
#[command(name = "kassa", version, about = "Экспорт кассовых закрытий в банковские форматы")]
struct Cli {
    /// Кассовая книга (JSON)
    #[arg(long = "ledger")]
    ledger: PathBuf,

    /// Таблица соответствий (JSON)
    #[arg(long = "mapping")]
    mapping: PathBuf,

    /// Конфигурация экспорта (JSON, перезаписывается после прогона)
    #[arg(long = "config")]
    config: PathBuf,

    /// Первый день периода
    #[arg(long = "from")]
    from: Option<NaiveDate>,

    /// Последний день периода
    #[arg(long = "to")]
    to: Option<NaiveDate>,

    /// Формат выхода
    #[arg(long = "format", value_enum, default_value = "coda")]
    format: Fmt,

    /// Каталог для готового файла
    #[arg(long = "out-dir", default_value = ".")]
    out_dir: PathBuf,

    /// Вместо экспорта: сбросить стартовый кассовый остаток
    #[arg(long = "reset-balance")]
    reset_balance: Option<Decimal>,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    let store = JsonStore::new(&cli.ledger, &cli.mapping, &cli.config);
    let exporter = Exporter::new(&store, &store, &store);

    if let Some(opening) = cli.reset_balance {
        exporter.reset_balance(opening)?;
        println!("Стартовый остаток: {opening}");
        return Ok(());
    }

    let (from, to) = match (cli.from, cli.to) {
        (Some(f), Some(t)) => (f, t),
        _ => {
            eprintln!("Нужны --from и --to (или --reset-balance)");
            std::process::exit(2);
        }
    };

    match exporter.export(from, to, cli.format.into())? {
        Some(file) => {
            let path = cli.out_dir.join(&file.filename);
            fs::write(&path, &file.bytes)?;
            println!("{}", path.display());
        }
        None => {
            println!("Нет торговых дней в периоде — экспортировать нечего");
        }
    }
    Ok(())
}
