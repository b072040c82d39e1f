//! Wire-shaped order payloads and the derived presentation projection.
//!
//! Two status vocabularies coexist permanently: the LSPS1 `order_state`
//! values (`CREATED`/`COMPLETED`/`FAILED`/...) and the legacy `status`
//! values (`waiting_for_payment`/`complete`/`completed`/`failed`). Every
//! derivation below recognizes both.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Channel record snapshot as delivered by the channel-management
/// collaborator. Kept opaque; the status renderer owns its interpretation.
pub type ChannelRecord = Value;

/// Outcome of the initial order submission. Created once, immutable.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OrderResult {
    #[serde(default)]
    pub success: bool,
    #[serde(default, rename = "orderId")]
    pub order_id: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default, rename = "paymentInfo")]
    pub payment_info: Option<PaymentInfo>,
    #[serde(default)]
    pub data: Option<Value>,
}

/// A polled order snapshot. Each snapshot replaces the previous one
/// wholesale; `payment_info`/`data` inherit from the initial [`OrderResult`]
/// only when the snapshot omits them.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OrderStatus {
    #[serde(default)]
    pub order_state: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default, rename = "paymentInfo")]
    pub payment_info: Option<PaymentInfo>,
    #[serde(default)]
    pub data: Option<Value>,
    #[serde(default)]
    pub details: Option<OrderDetails>,
    #[serde(default)]
    pub payment: Option<PaymentSection>,
}

/// Plugin-digested payment summary.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PaymentInfo {
    #[serde(default, rename = "totalSats")]
    pub total_sats: Option<u64>,
    #[serde(default)]
    pub invoice: Option<String>,
}

/// Supplementary order details carried by some polled snapshots.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OrderDetails {
    #[serde(default)]
    pub order_id: Option<String>,
}

/// Raw LSPS1 payment section.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PaymentSection {
    #[serde(default)]
    pub bolt11: Option<Bolt11Payment>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Bolt11Payment {
    #[serde(default)]
    pub order_total_sat: Option<u64>,
    #[serde(default)]
    pub invoice: Option<String>,
}

/// The single merged view over `{initial result, polled status, channels}`.
///
/// This is a projection, recomputed whenever an input changes; it is never
/// stored authoritatively.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct PresentationState {
    pub success: bool,
    pub order_id: Option<String>,
    pub message: Option<String>,
    pub order_state: Option<String>,
    pub status: Option<String>,
    pub payment_info: Option<PaymentInfo>,
    pub data: Option<Value>,
    pub details: Option<OrderDetails>,
    pub payment: Option<PaymentSection>,
    /// Latest channel snapshot; `None` when the snapshot is empty (empty
    /// lists mean "no data", not "cleared").
    pub channel_data: Option<Vec<ChannelRecord>>,
}

/// Presentation state machine, derived from [`PresentationState`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Classification {
    /// Awaiting payment; the invoice block communicates state.
    Waiting,
    /// The LSP acknowledged the order and it has not failed.
    Success,
    /// The order failed server-side, or the initial submission failed.
    Failure,
    /// Submission succeeded but no status snapshot has arrived yet. Shown
    /// as a soft error until the first poll lands.
    Generic,
}

/// Visual accent for the surrounding container.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusTone {
    Danger,
    Success,
    Neutral,
    Plain,
}

/// Heading and message shown above the status details.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Heading {
    pub heading: String,
    pub message: String,
}

impl PresentationState {
    /// Classify this state. First match wins:
    ///
    /// 1. explicit failure in either vocabulary;
    /// 2. failed initial submission, even with no status snapshot;
    /// 3. awaiting payment (`waiting_for_payment`, or `order_state` equal to
    ///    `created` ignoring case);
    /// 4. any other acknowledged state on a successful order;
    /// 5. successful order with no snapshot yet.
    pub fn classification(&self) -> Classification {
        if self.is_failed() {
            return Classification::Failure;
        }
        if !self.success {
            return Classification::Failure;
        }
        if self.is_awaiting_payment() {
            return Classification::Waiting;
        }
        if self.order_state.is_some() {
            return Classification::Success;
        }
        Classification::Generic
    }

    /// Container accent derived from the same inputs as the classification.
    pub fn tone(&self) -> StatusTone {
        if self.is_failed() || !self.success {
            return StatusTone::Danger;
        }
        if self.is_completed() {
            return StatusTone::Success;
        }
        if self.status.as_deref() == Some("waiting_for_payment") {
            return StatusTone::Neutral;
        }
        StatusTone::Plain
    }

    /// Whether the invoice block should be shown in place of heading and
    /// message.
    pub fn shows_invoice(&self) -> bool {
        self.classification() == Classification::Waiting
    }

    /// Order id to surface in user-facing messages, preferring the id from
    /// the initial submission over the one in polled details.
    pub fn display_order_id(&self) -> Option<&str> {
        self.order_id
            .as_deref()
            .or_else(|| self.details.as_ref().and_then(|d| d.order_id.as_deref()))
    }

    fn is_failed(&self) -> bool {
        self.order_state.as_deref() == Some("FAILED") || self.status.as_deref() == Some("failed")
    }

    fn is_awaiting_payment(&self) -> bool {
        self.status.as_deref() == Some("waiting_for_payment")
            || self
                .order_state
                .as_deref()
                .is_some_and(|state| state.eq_ignore_ascii_case("created"))
    }

    fn is_completed(&self) -> bool {
        self.order_state.as_deref() == Some("COMPLETED")
            || matches!(self.status.as_deref(), Some("complete" | "completed"))
    }
}
