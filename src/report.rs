use chrono::{DateTime, Local};
use comfy_table::presets::UTF8_FULL;
use comfy_table::{CellAlignment, Table};
use crate::analysis::{ProjectionRow, RankingRow, StatisticsRow};
use crate::catalog::{Catalog, EtfRecord};
use crate::dashboard::{PriceSummary, Selection};

const RULE_WIDTH: usize = 60;

const UNDEFINED: &str = "NaN";

fn new_table(header: Vec<&str>) -> Table {
    let mut table = Table::new();
    table.load_preset(UTF8_FULL).set_header(header);
    table
}

fn align_numbers(table: &mut Table, from: usize) {
    let count = table.column_count();
    for i in from..count {
        if let Some(column) = table.column_mut(i) {
            column.set_cell_alignment(CellAlignment::Right);
        }
    }
}

fn section(title: &str, body: &str) -> String {
    let mut out = String::new();
    out.push_str(&format!("{}\n", "=".repeat(RULE_WIDTH)));
    out.push_str(&format!("{}\n", title));
    out.push_str(&format!("{}\n", "=".repeat(RULE_WIDTH)));
    out.push_str(body);
    if !body.ends_with('\n') {
        out.push('\n');
    }
    out
}

/// `0.0123` -> `1.23 %`
pub fn format_percent(value: Option<f64>) -> String {
    match value {
        Some(v) => format!("{:.2} %", v * 100.0),
        None => UNDEFINED.to_string(),
    }
}

pub fn format_ratio(value: Option<f64>) -> String {
    match value {
        Some(v) => format!("{:.2}", v),
        None => UNDEFINED.to_string(),
    }
}

/// `1234.5` -> `$1,234.50`
pub fn format_money(value: Option<f64>) -> String {
    let Some(v) = value else {
        return UNDEFINED.to_string();
    };
    if !v.is_finite() {
        return UNDEFINED.to_string();
    }

    let fixed = format!("{:.2}", v.abs());
    let (whole, cents) = fixed.split_once('.').unwrap_or((fixed.as_str(), "00"));

    let mut grouped = String::with_capacity(whole.len() + whole.len() / 3);
    for (i, digit) in whole.chars().enumerate() {
        if i > 0 && (whole.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(digit);
    }

    let sign = if v < 0.0 && fixed != "0.00" { "-" } else { "" };
    format!("{}${}.{}", sign, grouped, cents)
}

pub fn render_header(now: DateTime<Local>, selection: &Selection) -> String {
    let mut out = String::new();
    out.push_str("ETF Dashboard\n");
    out.push_str("Returns and risk of the selected ETFs over the chosen period.\n");
    out.push_str(&format!("{}\n", now.format("%A, %d %B %Y - %H:%M")));
    out.push_str(&format!(
        "Period: {} | Investment: {}\n",
        selection.period,
        format_money(Some(selection.investment))
    ));
    out
}

pub fn render_catalog(catalog: &Catalog) -> String {
    let mut table = new_table(vec!["Name", "Ticker", "Description"]);
    for record in catalog.iter() {
        table.add_row(vec![
            record.name.as_str(),
            record.ticker.as_str(),
            record.description.as_str(),
        ]);
    }
    section(&format!("ETF Catalog ({} entries)", catalog.len()), &table.to_string())
}

pub fn render_details(records: &[EtfRecord]) -> String {
    let mut body = String::new();
    for record in records {
        body.push_str(&format!("Name:        {}\n", record.name));
        body.push_str(&format!("Description: {}\n", record.description));
        body.push_str(&format!("Ticker:      {}\n", record.ticker));
        body.push_str(&format!("{}\n", "-".repeat(RULE_WIDTH)));
    }
    section("Selected ETF Details", &body)
}

pub fn render_price_summaries(summaries: &[PriceSummary], selection: &Selection) -> String {
    let mut body = String::new();
    for summary in summaries {
        let mut table = new_table(vec!["From", "To", "Days", "First", "Last", "Min", "Max"]);
        table.add_row(vec![
            summary.first_date.clone(),
            summary.last_date.clone(),
            summary.rows.to_string(),
            format_ratio(summary.first_close),
            format_ratio(summary.last_close),
            format_ratio(summary.min_close),
            format_ratio(summary.max_close),
        ]);
        align_numbers(&mut table, 2);

        let mut recent = new_table(vec!["Date", "Close"]);
        for (date, close) in &summary.recent {
            recent.add_row(vec![date.clone(), format_ratio(*close)]);
        }
        align_numbers(&mut recent, 1);

        body.push_str(&format!(
            "Closing prices for {} ({})\n{}\n{}\n\n",
            summary.ticker, selection.period, table, recent
        ));
    }
    section("Price History", &body)
}

pub fn render_statistics(rows: &[StatisticsRow]) -> String {
    let mut table = new_table(vec![
        "ETF",
        "Mean Daily Return (%)",
        "Daily Risk (Std Dev) (%)",
        "Reward/Risk (Sharpe)",
        "Total Return (%)",
        "Max Drawdown (%)",
    ]);
    for row in rows {
        table.add_row(vec![
            row.etf_name.clone(),
            format_percent(row.mean_daily_return),
            format_percent(row.daily_std),
            format_ratio(row.reward_risk_ratio),
            format_percent(row.total_return),
            format_percent(Some(row.max_drawdown)),
        ]);
    }
    align_numbers(&mut table, 1);

    let mut body = table.to_string();
    body.push_str("\nA higher reward/risk ratio means more mean daily return per unit of daily volatility.\n");
    section("Statistical Analysis", &body)
}

pub fn render_projections(rows: &[ProjectionRow], investment: f64) -> String {
    if investment <= 0.0 {
        return section(
            "Returns",
            "Enter an investment amount above zero (--investment) to project returns.\n",
        );
    }

    let mut table = new_table(vec![
        "ETF",
        "Monthly Return (%)",
        "Annual Return (%)",
        "Monthly Value",
        "Annual Value",
    ]);
    for row in rows {
        table.add_row(vec![
            row.etf_name.clone(),
            format_percent(row.mean_monthly_return),
            format_percent(row.mean_annual_return),
            format_money(row.monthly_value),
            format_money(row.annual_value),
        ]);
    }
    align_numbers(&mut table, 1);

    section(
        &format!("Returns on {}", format_money(Some(investment))),
        &table.to_string(),
    )
}

pub fn render_ranking(rows: &[RankingRow]) -> String {
    let mut table = new_table(vec!["#", "ETF", "Annual Return (%)"]);
    for (i, row) in rows.iter().enumerate() {
        table.add_row(vec![
            (i + 1).to_string(),
            row.etf_name.clone(),
            format_percent(row.mean_annual_return),
        ]);
    }
    align_numbers(&mut table, 2);
    section("Top 10 ETFs by Annual Return", &table.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fetch::Period;

    #[test]
    fn test_format_money() {
        assert_eq!(format_money(Some(1100.0)), "$1,100.00");
        assert_eq!(format_money(Some(0.5)), "$0.50");
        assert_eq!(format_money(Some(1234567.891)), "$1,234,567.89");
        assert_eq!(format_money(Some(-2500.0)), "-$2,500.00");
        assert_eq!(format_money(Some(f64::NAN)), "NaN");
        assert_eq!(format_money(None), "NaN");
    }

    #[test]
    fn test_format_percent_and_ratio() {
        assert_eq!(format_percent(Some(0.012345)), "1.23 %");
        assert_eq!(format_percent(None), "NaN");
        assert_eq!(format_ratio(Some(0.456)), "0.46");
    }

    #[test]
    fn test_render_statistics() {
        let rows = vec![StatisticsRow {
            etf_name: "Fund A".to_string(),
            mean_daily_return: Some(0.001),
            daily_std: Some(0.01),
            reward_risk_ratio: Some(0.1),
            total_return: Some(0.05),
            max_drawdown: 0.02,
        }];
        let out = render_statistics(&rows);
        assert!(out.contains("Statistical Analysis"));
        assert!(out.contains("Fund A"));
        assert!(out.contains("0.10 %"));
        assert!(out.contains("1.00 %"));
    }

    #[test]
    fn test_render_projections() {
        let rows = vec![ProjectionRow {
            etf_name: "Fund A".to_string(),
            mean_monthly_return: None,
            mean_annual_return: Some(0.10),
            monthly_value: None,
            annual_value: Some(1100.0),
        }];
        let out = render_projections(&rows, 1000.0);
        assert!(out.contains("$1,100.00"));
        assert!(out.contains("10.00 %"));
        assert!(out.contains("NaN"));

        let prompt = render_projections(&[], 0.0);
        assert!(prompt.contains("--investment"));
    }

    #[test]
    fn test_render_ranking_numbers_rows() {
        let rows = vec![
            RankingRow { etf_name: "B".to_string(), mean_annual_return: Some(0.2) },
            RankingRow { etf_name: "A".to_string(), mean_annual_return: Some(0.1) },
        ];
        let out = render_ranking(&rows);
        assert!(out.contains("20.00 %"));
        let b = out.find("20.00 %").unwrap();
        let a = out.find("10.00 %").unwrap();
        assert!(b < a);
    }

    #[test]
    fn test_render_header() {
        let selection = Selection::new(vec![], Period::OneYear, 1000.0).unwrap();
        let out = render_header(Local::now(), &selection);
        assert!(out.contains("Period: 1y"));
        assert!(out.contains("$1,000.00"));
    }

    #[test]
    fn test_render_catalog_lists_tickers() {
        let out = render_catalog(&Catalog::builtin());
        assert!(out.contains("SPY"));
        assert!(out.contains("QQQ"));
    }
}
