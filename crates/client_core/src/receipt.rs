//! The order receipt card: most recently saved order wins.

use std::fmt;

use chrono::{DateTime, Local};
use shared::domain::OrderRecord;
use tokio::sync::broadcast::{self, error::RecvError, error::TryRecvError};
use tracing::warn;

pub const RECEIPT_BRAND: &str = "STARBUCKS";
pub const STORE_LINE: &str = "Store #8832 • 123 Coffee Lane";
pub const WAITING_LINE: &str = "Waiting for order...";
pub const BARCODE_NUMBER: &str = "1234-5678-9012-3456";
pub const THANK_YOU_LINE: &str = "THANK YOU!";

/// Prices are shown in rupees with two decimals.
pub fn format_price(price: f64) -> String {
    format!("₹{price:.2}")
}

#[derive(Debug, Clone, PartialEq)]
pub struct OrderLines {
    pub headline: String,
    pub milk: String,
    pub extras: Vec<String>,
    pub item_price: String,
    pub total: String,
    pub customer: String,
}

impl From<&OrderRecord> for OrderLines {
    fn from(order: &OrderRecord) -> Self {
        let price = format_price(order.price);
        Self {
            headline: order.headline(),
            milk: order.milk.clone(),
            extras: order.extras.iter().map(|e| format!("+ {e}")).collect(),
            item_price: price.clone(),
            total: price,
            customer: order.name.to_uppercase(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ReceiptView {
    pub issued_at: String,
    pub order: Option<OrderLines>,
}

impl ReceiptView {
    pub fn new(order: Option<&OrderRecord>, issued_at: DateTime<Local>) -> Self {
        Self {
            issued_at: issued_at.format("%d/%m/%Y, %H:%M:%S").to_string(),
            order: order.map(OrderLines::from),
        }
    }

    pub fn lines(&self) -> Vec<String> {
        let mut lines = vec![
            RECEIPT_BRAND.to_string(),
            STORE_LINE.to_string(),
            self.issued_at.clone(),
        ];

        let Some(order) = &self.order else {
            lines.push(WAITING_LINE.to_string());
            return lines;
        };

        lines.push(format!("{}  {}", order.headline, order.item_price));
        lines.push(order.milk.clone());
        lines.extend(order.extras.iter().cloned());
        lines.push(format!("TOTAL  {}", order.total));
        lines.push(format!("FOR: {}", order.customer));
        lines.push(BARCODE_NUMBER.to_string());
        lines.push(THANK_YOU_LINE.to_string());
        lines
    }
}

impl fmt::Display for ReceiptView {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for line in self.lines() {
            writeln!(f, "{line}")?;
        }
        Ok(())
    }
}

/// Listens for saved orders and keeps the latest one.
pub struct OrderReceipt {
    rx: broadcast::Receiver<OrderRecord>,
    latest: Option<OrderRecord>,
}

impl OrderReceipt {
    pub fn new(rx: broadcast::Receiver<OrderRecord>) -> Self {
        Self { rx, latest: None }
    }

    pub fn latest(&self) -> Option<&OrderRecord> {
        self.latest.as_ref()
    }

    /// Waits for the next order. Returns `None` once the session is gone.
    pub async fn next_order(&mut self) -> Option<&OrderRecord> {
        loop {
            match self.rx.recv().await {
                Ok(order) => {
                    self.latest = Some(order);
                    return self.latest.as_ref();
                }
                Err(RecvError::Lagged(skipped)) => {
                    warn!(skipped, "order receipt fell behind; skipping to newest order");
                }
                Err(RecvError::Closed) => return None,
            }
        }
    }

    /// Applies every order already queued without waiting.
    pub fn refresh(&mut self) -> Option<&OrderRecord> {
        loop {
            match self.rx.try_recv() {
                Ok(order) => self.latest = Some(order),
                Err(TryRecvError::Lagged(skipped)) => {
                    warn!(skipped, "order receipt fell behind; skipping to newest order");
                }
                Err(TryRecvError::Empty | TryRecvError::Closed) => break,
            }
        }
        self.latest.as_ref()
    }

    pub fn view(&self) -> ReceiptView {
        ReceiptView::new(self.latest.as_ref(), Local::now())
    }
}
