//! Default ticker universe.

/// Large caps across technology, financials, healthcare, energy, consumer,
/// industrials, utilities and communication.
pub const DEFAULT_UNIVERSE: &[(&str, &str)] = &[
    ("NVDA", "Nvidia Corp"),
    ("MSFT", "Microsoft Corp"),
    ("AAPL", "Apple Inc"),
    ("GOOGL", "Alphabet Inc"),
    ("META", "Meta Platforms"),
    ("AMZN", "Amazon.com Inc"),
    ("AVGO", "Broadcom Inc"),
    ("AMD", "Advanced Micro Devices"),
    ("SMCI", "Super Micro Computer"),
    ("ARM", "ARM Holdings"),
    ("PLTR", "Palantir Technologies"),
    ("JPM", "JPMorgan Chase"),
    ("BRK-B", "Berkshire Hathaway"),
    ("V", "Visa Inc"),
    ("MA", "Mastercard Inc"),
    ("GS", "Goldman Sachs"),
    ("BAC", "Bank of America"),
    ("LLY", "Eli Lilly"),
    ("UNH", "UnitedHealth Group"),
    ("JNJ", "Johnson & Johnson"),
    ("PFE", "Pfizer Inc"),
    ("ABBV", "AbbVie Inc"),
    ("XOM", "Exxon Mobil"),
    ("CVX", "Chevron Corp"),
    ("COP", "ConocoPhillips"),
    ("TSLA", "Tesla Inc"),
    ("WMT", "Walmart Inc"),
    ("HD", "Home Depot"),
    ("PG", "Procter & Gamble"),
    ("KO", "Coca-Cola Co"),
    ("CAT", "Caterpillar Inc"),
    ("BA", "Boeing Co"),
    ("UPS", "United Parcel Service"),
    ("NEE", "NextEra Energy"),
    ("SO", "Southern Co"),
    ("DIS", "Walt Disney Co"),
    ("NFLX", "Netflix Inc"),
    ("T", "AT&T Inc"),
];

/// Owned copy of [`DEFAULT_UNIVERSE`].
pub fn default_universe() -> Vec<(String, String)> {
    DEFAULT_UNIVERSE
        .iter()
        .map(|(t, n)| (t.to_string(), n.to_string()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_tickers_unique() {
        let tickers: HashSet<_> = DEFAULT_UNIVERSE.iter().map(|(t, _)| *t).collect();
        assert_eq!(tickers.len(), DEFAULT_UNIVERSE.len());
        assert_eq!(default_universe()[0].0, "NVDA");
    }
}
