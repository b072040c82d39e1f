//! Client-side presentation core for LSPS1 channel purchase orders.
//!
//! Two cooperating pieces:
//!
//! - [`StatusReconciler`] merges the initial [`OrderResult`] with polled
//!   [`OrderStatus`] snapshots and channel snapshots into one
//!   [`PresentationState`], classified as
//!   Waiting / Success / Failure / Generic.
//! - [`InvoicePresenter`] resolves a display amount for a BOLT11 invoice and
//!   produces a QR encoding of `lightning:<invoice>`, degrading to a text
//!   placeholder when no QR backend is available.
//!
//! Collaborators (polling, status rendering, clipboard, QR backends) are
//! traits supplied by the host at composition time.

mod config;
mod error;
mod events;
mod invoice;
mod model;
mod qr;
mod reconciler;

pub use config::OrderUiConfig;
pub use error::{OrderUiError, Result};
pub use events::{OrderEventBus, OrderSubscriptions};
pub use invoice::{
    Clipboard, InvoicePresenter, Notice, extract_invoice_amount, resolve_amount_sats,
};
pub use model::{
    Bolt11Payment, ChannelRecord, Classification, Heading, OrderDetails, OrderResult, OrderStatus,
    PaymentInfo, PaymentSection, PresentationState, StatusTone,
};
pub use qr::{QrCapability, QrProvider, QrRenderer, QrSlot, QrSurface, text_placeholder};
pub use reconciler::{
    OrderEvent, OrderPoller, PresentationUpdate, StatusReconciler, StatusRenderer, heading_for,
};
