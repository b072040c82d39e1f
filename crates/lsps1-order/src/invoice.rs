//! Lightning invoice presentation: amount resolution, the payment URI, and
//! the copy-to-clipboard action.

use std::time::Duration;

use crate::config::OrderUiConfig;
use crate::error::Result;
use crate::model::PresentationState;
use crate::qr::{QrCapability, QrSlot};

/// Host clipboard capability.
pub trait Clipboard: Send + Sync {
    fn write_text(&self, text: &str) -> Result<()>;
}

/// Transient confirmation surfaced after a successful copy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub message: String,
    pub auto_dismiss: Duration,
}

/// Presents one BOLT11 invoice for the awaiting-payment state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvoicePresenter {
    invoice: String,
    uri: String,
    amount_sats: Option<u64>,
}

impl InvoicePresenter {
    /// Resolve the display amount against `state` and build the payment URI.
    pub fn new(invoice: impl Into<String>, state: &PresentationState) -> Self {
        let invoice = invoice.into();
        let amount_sats = resolve_amount_sats(&invoice, state);
        let uri = format!("lightning:{invoice}");
        Self {
            invoice,
            uri,
            amount_sats,
        }
    }

    pub fn invoice(&self) -> &str {
        &self.invoice
    }

    /// The scannable/copyable `lightning:` encoding of the invoice.
    pub fn payment_uri(&self) -> &str {
        &self.uri
    }

    pub fn amount_sats(&self) -> Option<u64> {
        self.amount_sats
    }

    /// Thousands-grouped display label, or `None` when no amount resolved.
    /// No placeholder zero is ever shown.
    pub fn amount_label(&self) -> Option<String> {
        self.amount_sats
            .map(|sats| format!("{} satoshis", group_thousands(sats)))
    }

    /// Render the payment URI into `slot`. Re-invocation on an occupied slot
    /// is a no-op, so the mounted block is never duplicated.
    pub async fn render_qr(&self, capability: &QrCapability, slot: &mut QrSlot) -> bool {
        if slot.is_mounted() {
            return false;
        }
        let surface = capability.render(&self.uri).await;
        slot.mount(surface)
    }

    /// Copy the raw invoice. Both the QR-region click and the copy button
    /// route here. Success yields a transient confirmation; failure is
    /// logged and silently swallowed, never blocking the payment flow.
    pub fn copy_invoice(&self, clipboard: &dyn Clipboard, config: &OrderUiConfig) -> Option<Notice> {
        match clipboard.write_text(&self.invoice) {
            Ok(()) => Some(Notice {
                message: "Invoice copied to clipboard!".to_string(),
                auto_dismiss: config.notice_dismiss,
            }),
            Err(err) => {
                tracing::warn!(error = %err, "failed to copy invoice");
                None
            }
        }
    }
}

/// Resolve the display amount in satoshis. First match wins: the digested
/// payment summary, then the raw LSPS1 payment section, then lexical
/// extraction from the invoice itself.
pub fn resolve_amount_sats(invoice: &str, state: &PresentationState) -> Option<u64> {
    if let Some(total) = state.payment_info.as_ref().and_then(|info| info.total_sats) {
        return Some(total);
    }
    if let Some(total) = state
        .payment
        .as_ref()
        .and_then(|payment| payment.bolt11.as_ref())
        .and_then(|bolt11| bolt11.order_total_sat)
    {
        return Some(total);
    }
    extract_invoice_amount(invoice)
}

/// Best-effort lexical extraction of the amount token from a BOLT11-style
/// invoice: the digit run after the `ln` + currency prefix, terminated by a
/// magnitude-unit letter and the `1` separator.
///
/// This is not an invoice decoder. The digit run is returned verbatim,
/// without scaling by the magnitude unit, so the value is only suitable as
/// an approximate display fallback when no structured amount is available.
pub fn extract_invoice_amount(invoice: &str) -> Option<u64> {
    let invoice = invoice.trim().to_ascii_lowercase();
    let bytes = invoice.as_bytes();

    if !invoice.starts_with("ln") {
        return None;
    }

    let mut idx = 2usize;
    while idx < bytes.len() && bytes[idx].is_ascii_lowercase() {
        idx += 1;
    }
    if idx == 2 {
        return None;
    }

    let digits_start = idx;
    while idx < bytes.len() && bytes[idx].is_ascii_digit() {
        idx += 1;
    }
    if idx == digits_start {
        return None;
    }

    if idx >= bytes.len() || !matches!(bytes[idx], b'm' | b'u' | b'n' | b'p') {
        return None;
    }
    idx += 1;

    // Without the separator this is bech32 data, not an amount token.
    if idx >= bytes.len() || bytes[idx] != b'1' {
        return None;
    }

    invoice[digits_start..idx - 1].parse::<u64>().ok()
}

fn group_thousands(value: u64) -> String {
    let digits = value.to_string();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }
    grouped
}
