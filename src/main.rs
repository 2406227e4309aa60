//! CLI: читает JSON-снимок и печатает выбранный отчёт с итогами.
//!
//! ```text
//! autoparts-analytics <snapshot.json> [report] [query] [sort-key] [desc]
//! ```
//!
//! `report`: `clients`, `products`, `unit-economics`, `suppliers`, `ledger`
//! (по умолчанию `clients`).

use std::env;
use std::fs::File;
use std::str::FromStr;

use autoparts_analytics::{
    AnalyticsConfig, ReportBuilder, ReportError, ReportView, Searchable, Snapshot, SortState,
    Sortable, Sources, Summarize, present,
};
use serde::Serialize;
use tracing::info;
use tracing_subscriber::EnvFilter;

const REPORTS: [&str; 5] = ["clients", "products", "unit-economics", "suppliers", "ledger"];

/// Поиск и сортировка из аргументов командной строки.
struct ViewArgs {
    query: String,
    sort_key: Option<String>,
    descending: bool,
}

impl ViewArgs {
    fn sort<K>(&self) -> Result<Option<SortState<K>>, ReportError>
    where
        K: FromStr<Err = ReportError> + Copy + PartialEq,
    {
        let Some(name) = self.sort_key.as_deref() else {
            return Ok(None);
        };
        let key = name.parse()?;
        Ok(Some(if self.descending {
            SortState::desc(key)
        } else {
            SortState::asc(key)
        }))
    }

    fn render<R>(&self, rows: Option<Vec<R>>) -> Result<String, Box<dyn std::error::Error>>
    where
        R: Searchable + Sortable + Summarize + Serialize,
        R::Key: FromStr<Err = ReportError>,
        R::Totals: Serialize,
    {
        let view: ReportView<R> = present(rows.unwrap_or_default(), &self.query, self.sort()?);
        info!(rows = view.rows.len(), "Report ready");
        Ok(serde_json::to_string_pretty(&view)?)
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let mut args = env::args().skip(1);
    let Some(path) = args.next() else {
        println!(
            "Usage: autoparts-analytics <snapshot.json> [clients|products|unit-economics|suppliers|ledger] [query] [sort-key] [desc]"
        );
        return Ok(());
    };
    let report = args.next().unwrap_or_else(|| "clients".to_string());
    if !REPORTS.contains(&report.as_str()) {
        return Err(ReportError::UnknownReport(report).into());
    }
    let view_args = ViewArgs {
        query: args.next().unwrap_or_default(),
        sort_key: args.next().filter(|key| !key.is_empty()),
        descending: args.next().is_some_and(|dir| dir == "desc"),
    };

    let config = AnalyticsConfig::from_env()?;
    let snapshot = Snapshot::from_reader(File::open(&path)?)?;
    let sources = Sources::from_snapshot(&snapshot);
    info!(path = %path, report = %report, "Snapshot loaded");

    let reports = ReportBuilder::new(&sources)
        .now(config.options().now)
        .period(config.period)
        .clients(report == "clients")
        .products(report == "products")
        .unit_economics(report == "unit-economics")
        .suppliers(report == "suppliers")
        .ledger(report == "ledger")
        .compute();

    let output = match report.as_str() {
        "clients" => view_args.render(reports.clients)?,
        "products" => view_args.render(reports.products)?,
        "unit-economics" => view_args.render(reports.unit_economics)?,
        "suppliers" => view_args.render(reports.suppliers)?,
        _ => view_args.render(reports.ledger)?,
    };
    println!("{output}");
    Ok(())
}
