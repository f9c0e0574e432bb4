//! CSV export and the Markdown screen report.

use chrono::NaiveDate;
use std::collections::BTreeMap;
use std::fmt::Write as _;
use std::path::Path;
use trading_core::{TradingError, TradingResult};

use crate::scanner::StockAnalysis;

/// Write the screen, one row per ticker, in the given order.
pub fn write_csv(path: &Path, rows: &[StockAnalysis]) -> TradingResult<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let mut writer =
        csv::Writer::from_path(path).map_err(|e| TradingError::Serialization(e.to_string()))?;
    for row in rows {
        writer
            .serialize(row)
            .map_err(|e| TradingError::Serialization(e.to_string()))?;
    }
    writer.flush()?;
    Ok(())
}

#[derive(Debug, Clone, PartialEq)]
pub struct SectorSummary {
    pub sector: String,
    pub avg_conviction: f64,
    pub count: usize,
}

/// Average conviction per sector, best first.
pub fn sector_summary(rows: &[StockAnalysis]) -> Vec<SectorSummary> {
    let mut groups: BTreeMap<&str, (f64, usize)> = BTreeMap::new();
    for row in rows {
        let entry = groups.entry(row.sector.as_str()).or_default();
        entry.0 += row.conviction_score;
        entry.1 += 1;
    }
    let mut out: Vec<SectorSummary> = groups
        .into_iter()
        .map(|(sector, (total, count))| SectorSummary {
            sector: sector.to_string(),
            avg_conviction: total / count as f64,
            count,
        })
        .collect();
    out.sort_by(|a, b| b.avg_conviction.total_cmp(&a.avg_conviction));
    out
}

fn share(count: usize, total: usize) -> f64 {
    if total == 0 {
        0.0
    } else {
        count as f64 / total as f64 * 100.0
    }
}

/// Markdown report: top picks, sector table, market breadth and signal
/// counts. `rows` should already be sorted by conviction.
pub fn markdown_report(rows: &[StockAnalysis], high_conviction: f64, date: NaiveDate) -> String {
    let mut md = String::new();
    let total = rows.len();

    let _ = writeln!(md, "# US Stock Conviction Screen");
    let _ = writeln!(md);
    let _ = writeln!(md, "Date: {}  ", date.format("%Y-%m-%d"));
    let _ = writeln!(md, "Stocks analyzed: {}", total);
    let _ = writeln!(md);

    let _ = writeln!(md, "## High-Conviction Picks (Score >= {:.0})", high_conviction);
    let _ = writeln!(md);
    let picks: Vec<_> = rows
        .iter()
        .filter(|r| r.conviction_score >= high_conviction)
        .collect();
    if picks.is_empty() {
        let _ = writeln!(
            md,
            "No stocks currently meet high conviction criteria (Score >= {:.0})",
            high_conviction
        );
    } else {
        let _ = writeln!(
            md,
            "| Ticker | Name | Sector | Score | Recommendation | Price | 30-Day Target | 90-Day Target | Risk | Action |"
        );
        let _ = writeln!(md, "|---|---|---|---|---|---|---|---|---|---|");
        for r in picks {
            let _ = writeln!(
                md,
                "| {} | {} | {} | {:.1} | {} | ${:.2} | ${:.2} ({:+.1}%) | ${:.2} ({:+.1}%) | {} | {} |",
                r.ticker,
                r.name,
                r.sector,
                r.conviction_score,
                r.recommendation,
                r.current_price,
                r.target_30d,
                r.upside_pct(r.target_30d),
                r.target_90d,
                r.upside_pct(r.target_90d),
                r.risk_level,
                r.action,
            );
        }
    }
    let _ = writeln!(md);

    let _ = writeln!(md, "## Sector Performance");
    let _ = writeln!(md);
    let _ = writeln!(md, "| Sector | Avg Conviction Score | Stock Count |");
    let _ = writeln!(md, "|---|---|---|");
    for s in sector_summary(rows) {
        let _ = writeln!(md, "| {} | {:.1} | {} |", s.sector, s.avg_conviction, s.count);
    }
    let _ = writeln!(md);

    let bullish = rows.iter().filter(|r| r.recommendation.is_bullish()).count();
    let bearish = rows.iter().filter(|r| r.recommendation.is_bearish()).count();
    let neutral = total - bullish - bearish;
    let _ = writeln!(md, "## Market Overview");
    let _ = writeln!(md);
    let _ = writeln!(md, "- Bullish: {} ({:.1}%)", bullish, share(bullish, total));
    let _ = writeln!(md, "- Neutral: {} ({:.1}%)", neutral, share(neutral, total));
    let _ = writeln!(md, "- Bearish: {} ({:.1}%)", bearish, share(bearish, total));
    let _ = writeln!(md);

    let above_200 = rows.iter().filter(|r| r.above_200_sma).count();
    let macd = rows.iter().filter(|r| r.macd_bullish).count();
    let surges = rows.iter().filter(|r| r.volume_surge).count();
    let _ = writeln!(md, "## Technical Signals");
    let _ = writeln!(md);
    let _ = writeln!(
        md,
        "- Above 200-day SMA: {} ({:.1}%)",
        above_200,
        share(above_200, total)
    );
    let _ = writeln!(md, "- Bullish MACD: {} ({:.1}%)", macd, share(macd, total));
    let _ = writeln!(md, "- Volume surge: {} ({:.1}%)", surges, share(surges, total));

    md
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scoring::{Recommendation, RiskLevel};

    fn row(ticker: &str, sector: &str, score: f64) -> StockAnalysis {
        let recommendation = Recommendation::from_conviction(score);
        StockAnalysis {
            ticker: ticker.into(),
            name: format!("{} Corp", ticker),
            sector: sector.into(),
            current_price: 100.0,
            market_cap_b: 10.0,
            conviction_score: score,
            recommendation,
            action: recommendation.action().into(),
            risk_level: RiskLevel::Low,
            rsi: Some(55.0),
            momentum_score: 60,
            fundamental_score: 50.0,
            target_30d: 110.0,
            target_90d: 120.0,
            support: 95.0,
            resistance: 105.0,
            stop_loss: 95.0,
            volume_surge: false,
            macd_bullish: true,
            above_200_sma: score > 60.0,
            golden_cross: false,
        }
    }

    #[test]
    fn test_sector_summary() {
        let rows = vec![
            row("A", "Tech", 80.0),
            row("B", "Tech", 60.0),
            row("C", "Energy", 75.0),
        ];
        let sectors = sector_summary(&rows);
        assert_eq!(sectors[0].sector, "Energy");
        assert_eq!(sectors[1].count, 2);
        assert!((sectors[1].avg_conviction - 70.0).abs() < 1e-10);
    }

    #[test]
    fn test_markdown_sections() {
        let rows = vec![row("A", "Tech", 80.0), row("B", "Energy", 45.0)];
        let date = NaiveDate::from_ymd_opt(2025, 1, 2).unwrap();
        let md = markdown_report(&rows, 70.0, date);

        assert!(md.contains("| A | A Corp | Tech | 80.0 | STRONG BUY | $100.00 | $110.00 (+10.0%)"));
        assert!(!md.contains("| B | B Corp"));
        assert!(md.contains("- Bullish: 1 (50.0%)"));
        assert!(md.contains("- Bearish: 1 (50.0%)"));
        assert!(md.contains("- Bullish MACD: 2 (100.0%)"));
        assert!(md.contains("- Above 200-day SMA: 1 (50.0%)"));
    }

    #[test]
    fn test_markdown_without_picks() {
        let md = markdown_report(&[], 70.0, NaiveDate::from_ymd_opt(2025, 1, 2).unwrap());
        assert!(md.contains("No stocks currently meet high conviction criteria"));
        assert!(md.contains("- Neutral: 0 (0.0%)"));
    }

    #[test]
    fn test_write_csv() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("screen").join("stocks.csv");
        write_csv(&path, &[row("A", "Tech", 80.0)]).unwrap();

        let text = std::fs::read_to_string(&path).unwrap();
        let mut lines = text.lines();
        assert!(lines.next().unwrap().starts_with("ticker,name,sector,current_price"));
        let first = lines.next().unwrap();
        assert!(first.starts_with("A,A Corp,Tech,100.0"));
        assert!(first.contains("STRONG BUY"));
        assert!(first.contains("Low"));
    }
}
