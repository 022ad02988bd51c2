// Copyright (c) 2026 bad-antics
// Licensed under the MIT License. See LICENSE file in the project root.
// https://github.com/bad-antics/roomsense

//! Hard disk price tracker
//!
//! Scrapes the diskprices.com listing table for external and internal HDDs
//! and keeps the cheapest price per TB for a fixed set of Western Digital
//! capacity tiers.

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use scraper::{ElementRef, Html, Selector};
use serde::{Deserialize, Serialize};
use tracing::trace;

use super::{Fetcher, ScanJob};
use crate::error::{ParseError, ReadError, ScanError};

pub const DEFAULT_DISK_PRICES_URL: &str = "https://diskprices.com/?locale=au&condition=new&disk_types=";

const SCANNER_NAME: &str = "disk_prices";

/// Fixed enumeration of tracked drive tiers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CapacityTier {
    External14Tb,
    External16Tb,
    External18Tb,
    External20Tb,
    External22Tb,
    Red14Tb,
    Red16Tb,
    Red18Tb,
    Red20Tb,
    Red22Tb,
}

impl CapacityTier {
    pub const ALL: [CapacityTier; 10] = [
        CapacityTier::External14Tb,
        CapacityTier::External16Tb,
        CapacityTier::External18Tb,
        CapacityTier::External20Tb,
        CapacityTier::External22Tb,
        CapacityTier::Red14Tb,
        CapacityTier::Red16Tb,
        CapacityTier::Red18Tb,
        CapacityTier::Red20Tb,
        CapacityTier::Red22Tb,
    ];

    fn index(self) -> usize {
        self as usize
    }

    /// Suffix used in exported metric names, e.g. `red_14tb`
    pub fn metric_suffix(&self) -> &'static str {
        match self {
            CapacityTier::External14Tb => "14tb",
            CapacityTier::External16Tb => "16tb",
            CapacityTier::External18Tb => "18tb",
            CapacityTier::External20Tb => "20tb",
            CapacityTier::External22Tb => "22tb",
            CapacityTier::Red14Tb => "red_14tb",
            CapacityTier::Red16Tb => "red_16tb",
            CapacityTier::Red18Tb => "red_18tb",
            CapacityTier::Red20Tb => "red_20tb",
            CapacityTier::Red22Tb => "red_22tb",
        }
    }

    fn external(capacity: &str) -> Option<Self> {
        match normalise_capacity(capacity).as_str() {
            "14TB" => Some(CapacityTier::External14Tb),
            "16TB" => Some(CapacityTier::External16Tb),
            "18TB" => Some(CapacityTier::External18Tb),
            "20TB" => Some(CapacityTier::External20Tb),
            "22TB" => Some(CapacityTier::External22Tb),
            _ => None,
        }
    }

    fn red(capacity: &str) -> Option<Self> {
        match normalise_capacity(capacity).as_str() {
            "14TB" => Some(CapacityTier::Red14Tb),
            "16TB" => Some(CapacityTier::Red16Tb),
            "18TB" => Some(CapacityTier::Red18Tb),
            "20TB" => Some(CapacityTier::Red20Tb),
            "22TB" => Some(CapacityTier::Red22Tb),
            _ => None,
        }
    }
}

impl fmt::Display for CapacityTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.metric_suffix())
    }
}

fn normalise_capacity(capacity: &str) -> String {
    capacity
        .chars()
        .filter(|c| !c.is_whitespace())
        .collect::<String>()
        .to_ascii_uppercase()
}

/// Cheapest price per TB seen for each tier
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PriceTable {
    prices: [f64; 10],
}

impl PriceTable {
    /// `None` when no listing matched the tier
    pub fn price_per_tb(&self, tier: CapacityTier) -> Option<f64> {
        let price = self.prices[tier.index()];
        (price > 0.0).then_some(price)
    }

    /// Record a listing, keeping the lower price
    pub fn consider(&mut self, tier: CapacityTier, price_per_tb: f64) {
        if price_per_tb <= 0.0 {
            return;
        }
        let slot = &mut self.prices[tier.index()];
        if *slot == 0.0 || price_per_tb < *slot {
            *slot = price_per_tb;
        }
    }

    pub fn is_empty(&self) -> bool {
        self.prices.iter().all(|p| *p == 0.0)
    }

    /// Tiers that have a price, in tier order
    pub fn priced(&self) -> impl Iterator<Item = (CapacityTier, f64)> + '_ {
        CapacityTier::ALL
            .into_iter()
            .filter_map(|tier| self.price_per_tb(tier).map(|p| (tier, p)))
    }
}

/// One row of the listing table
#[derive(Debug, Clone, PartialEq)]
pub struct DiskListing {
    pub price_per_gb: f64,
    pub price_per_tb: f64,
    pub price: f64,
    pub capacity: String,
    pub form_factor: String,
    pub name: String,
}

impl DiskListing {
    fn is_western_digital(&self) -> bool {
        let name = self.name.to_lowercase();
        name.contains("wd") || name.contains("western digital")
    }

    fn external_tier(&self) -> Option<CapacityTier> {
        if self.form_factor.contains("External") && self.is_western_digital() {
            CapacityTier::external(&self.capacity)
        } else {
            None
        }
    }

    fn red_tier(&self) -> Option<CapacityTier> {
        if self.form_factor.contains("Internal")
            && self.is_western_digital()
            && self.name.to_lowercase().contains("red")
        {
            CapacityTier::red(&self.capacity)
        } else {
            None
        }
    }
}

fn selector(css: &str) -> Result<Selector, ParseError> {
    Selector::parse(css).map_err(|e| ParseError::Malformed(format!("bad selector {}: {}", css, e)))
}

fn cell_text(cell: &ElementRef<'_>) -> String {
    cell.text().collect::<String>().trim().to_string()
}

/// "A$1,234.56" -> 1234.56
fn parse_price(text: &str) -> Option<f64> {
    let digits: String = text
        .trim_start_matches(|c: char| !c.is_ascii_digit())
        .chars()
        .filter(|c| *c != ',')
        .collect();
    digits.trim().parse().ok()
}

/// Extract listing rows from the `diskprices` table
pub fn parse_listings(html: &str) -> Result<Vec<DiskListing>, ParseError> {
    let document = Html::parse_document(html);
    let table_sel = selector("table#diskprices")?;
    let body_sel = selector("tbody")?;
    let row_sel = selector("tr")?;
    let cell_sel = selector("td")?;

    let table = document
        .select(&table_sel)
        .next()
        .ok_or_else(|| ParseError::MissingElement("table#diskprices".to_string()))?;
    let body = table
        .select(&body_sel)
        .next()
        .ok_or_else(|| ParseError::MissingElement("tbody".to_string()))?;

    let mut listings = Vec::new();
    for row in body.select(&row_sel) {
        let cells: Vec<ElementRef<'_>> = row.select(&cell_sel).collect();
        if cells.len() <= 8 {
            continue;
        }

        let Some(price_per_tb) = parse_price(&cell_text(&cells[1])) else {
            trace!("Skipping row without a price per TB");
            continue;
        };

        listings.push(DiskListing {
            price_per_gb: parse_price(&cell_text(&cells[0])).unwrap_or(0.0),
            price_per_tb,
            price: parse_price(&cell_text(&cells[2])).unwrap_or(0.0),
            capacity: cell_text(&cells[3]),
            form_factor: cell_text(&cells[5]),
            name: cell_text(&cells[8]),
        });
    }

    Ok(listings)
}

/// Fold external and internal listings into a price table
pub fn build_price_table(external: &[DiskListing], internal: &[DiskListing]) -> PriceTable {
    let mut table = PriceTable::default();

    for listing in external {
        if let Some(tier) = listing.external_tier() {
            table.consider(tier, listing.price_per_tb);
        }
    }
    for listing in internal {
        if let Some(tier) = listing.red_tier() {
            table.consider(tier, listing.price_per_tb);
        }
    }

    table
}

pub struct DiskPriceJob {
    fetcher: Arc<dyn Fetcher>,
    base_url: String,
}

impl DiskPriceJob {
    /// `base_url` is completed with the disk type being queried
    pub fn new(fetcher: Arc<dyn Fetcher>, base_url: &str) -> Self {
        Self {
            fetcher,
            base_url: base_url.to_string(),
        }
    }

    async fn query(&self, disk_types: &str) -> Result<Vec<DiskListing>, ScanError> {
        let url = format!("{}{}", self.base_url, disk_types);
        let body = self
            .fetcher
            .fetch(&url)
            .await
            .map_err(|e| ReadError::new(SCANNER_NAME, e))?;

        parse_listings(&body).map_err(|e| ScanError::parse(SCANNER_NAME, e))
    }
}

#[async_trait]
impl ScanJob for DiskPriceJob {
    type Output = PriceTable;

    fn name(&self) -> &str {
        SCANNER_NAME
    }

    async fn scan(&self) -> Result<PriceTable, ScanError> {
        let external = self.query("external_hdd").await?;
        let internal = self.query("internal_hdd").await?;

        let table = build_price_table(&external, &internal);
        if table.is_empty() {
            return Err(ScanError::parse(SCANNER_NAME, ParseError::Empty));
        }
        Ok(table)
    }
}
