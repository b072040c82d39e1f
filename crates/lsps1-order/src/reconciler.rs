//! Order-status reconciliation.
//!
//! Merges the immutable submission outcome with zero or more polled status
//! snapshots and channel snapshots into one [`PresentationState`], and keeps
//! observers updated as events arrive. Merge and classification are total:
//! absence of data degrades to the soft-error presentation, never to an
//! error value.

use chrono::{DateTime, Utc};
use tokio::sync::mpsc;

use crate::config::OrderUiConfig;
use crate::events::OrderSubscriptions;
use crate::model::{
    ChannelRecord, Classification, Heading, OrderResult, OrderStatus, PresentationState,
};

/// External collaborator that periodically fetches order status.
pub trait OrderPoller: Send + Sync {
    fn start_polling(&self, order_id: &str);
}

impl<T: OrderPoller + ?Sized> OrderPoller for std::sync::Arc<T> {
    fn start_polling(&self, order_id: &str) {
        (**self).start_polling(order_id);
    }
}

/// External collaborator that paints the polled status details.
pub trait StatusRenderer: Send + Sync {
    /// Returns a renderable fragment, or nothing when there is nothing to
    /// show for this state.
    fn render_status(&self, state: &PresentationState, last_polled: DateTime<Utc>)
    -> Option<String>;
}

/// An incoming reconciliation event.
#[derive(Debug, Clone, PartialEq)]
pub enum OrderEvent {
    StatusUpdated(OrderStatus),
    ChannelsUpdated(Vec<ChannelRecord>),
}

/// Derived snapshot republished after every applied event.
#[derive(Debug, Clone, PartialEq)]
pub struct PresentationUpdate {
    pub state: PresentationState,
    pub classification: Classification,
}

/// Reconciles `{initial result, polled status, channel data}` into a single
/// presentation state.
pub struct StatusReconciler<P> {
    result: OrderResult,
    status: Option<OrderStatus>,
    channels: Vec<ChannelRecord>,
    last_polled: DateTime<Utc>,
    polling_started: bool,
    poller: P,
    config: OrderUiConfig,
}

impl<P: OrderPoller> StatusReconciler<P> {
    pub fn new(result: OrderResult, poller: P, config: OrderUiConfig) -> Self {
        Self {
            result,
            status: None,
            channels: Vec::new(),
            last_polled: Utc::now(),
            polling_started: false,
            poller,
            config,
        }
    }

    /// Trigger the polling collaborator for a successful order with a known
    /// id. Idempotent: repeated mounts of the same order never re-trigger.
    pub fn mount(&mut self) {
        if self.polling_started || !self.result.success {
            return;
        }
        if let Some(order_id) = self.result.order_id.clone() {
            tracing::debug!(order_id = %order_id, "starting order status polling");
            self.poller.start_polling(&order_id);
            self.polling_started = true;
        }
    }

    /// Apply one incoming event, atomically with respect to projection.
    pub fn apply_event(&mut self, event: OrderEvent) {
        match event {
            OrderEvent::StatusUpdated(status) => self.apply_status(status, Utc::now()),
            OrderEvent::ChannelsUpdated(channels) => self.apply_channels(channels),
        }
    }

    /// Replace the stored status wholesale (last write wins), inheriting
    /// `payment_info`/`data` from the initial result only when the new
    /// snapshot omits them.
    pub fn apply_status(&mut self, mut status: OrderStatus, polled_at: DateTime<Utc>) {
        if status.payment_info.is_none() {
            status.payment_info = self.result.payment_info.clone();
        }
        if status.data.is_none() {
            status.data = self.result.data.clone();
        }
        tracing::debug!(
            order_state = status.order_state.as_deref().unwrap_or("-"),
            status = status.status.as_deref().unwrap_or("-"),
            "order status snapshot applied"
        );
        self.status = Some(status);
        self.last_polled = polled_at;
    }

    /// Replace the stored channel list wholesale.
    pub fn apply_channels(&mut self, channels: Vec<ChannelRecord>) {
        self.channels = channels;
    }

    /// Project the current inputs into the merged presentation view.
    pub fn presentation(&self) -> PresentationState {
        let status = self.status.as_ref();
        PresentationState {
            success: self.result.success,
            order_id: self.result.order_id.clone(),
            message: self.result.message.clone(),
            order_state: status.and_then(|s| s.order_state.clone()),
            status: status.and_then(|s| s.status.clone()),
            payment_info: status.map_or_else(
                || self.result.payment_info.clone(),
                |s| s.payment_info.clone(),
            ),
            data: status.map_or_else(|| self.result.data.clone(), |s| s.data.clone()),
            details: status.and_then(|s| s.details.clone()),
            payment: status.and_then(|s| s.payment.clone()),
            channel_data: if self.channels.is_empty() {
                None
            } else {
                Some(self.channels.clone())
            },
        }
    }

    pub fn classification(&self) -> Classification {
        self.presentation().classification()
    }

    /// Heading and message for the current state; `None` while awaiting
    /// payment, where the invoice block communicates state on its own.
    pub fn heading(&self) -> Option<Heading> {
        heading_for(&self.presentation(), &self.config)
    }

    pub fn last_polled(&self) -> DateTime<Utc> {
        self.last_polled
    }

    /// Combine the optional heading with the status collaborator's fragment.
    pub fn render(&self, renderer: &dyn StatusRenderer) -> Option<String> {
        let state = self.presentation();
        let heading = heading_for(&state, &self.config);
        let fragment = renderer.render_status(&state, self.last_polled);
        match (heading, fragment) {
            (None, None) => None,
            (Some(heading), None) => Some(format!("{}\n{}", heading.heading, heading.message)),
            (None, Some(fragment)) => Some(fragment),
            (Some(heading), Some(fragment)) => Some(format!(
                "{}\n{}\n{}",
                heading.heading, heading.message, fragment
            )),
        }
    }

    fn snapshot(&self) -> PresentationUpdate {
        let state = self.presentation();
        let classification = state.classification();
        PresentationUpdate {
            state,
            classification,
        }
    }

    /// Drive the reconciler from its subscriptions, republishing a derived
    /// snapshot after every applied event.
    ///
    /// Events are applied strictly in delivery order; each apply-and-publish
    /// step completes before the next event is taken. The loop ends when
    /// both inbound streams close, or when the observer goes away.
    pub async fn run(mut self, mut subscriptions: OrderSubscriptions, updates: mpsc::Sender<PresentationUpdate>) {
        self.mount();
        if updates.send(self.snapshot()).await.is_err() {
            return;
        }

        let mut status_open = true;
        let mut channels_open = true;
        while status_open || channels_open {
            let applied = tokio::select! {
                status = subscriptions.status_rx.recv(), if status_open => match status {
                    Some(status) => {
                        self.apply_event(OrderEvent::StatusUpdated(status));
                        true
                    }
                    None => {
                        status_open = false;
                        false
                    }
                },
                channels = subscriptions.channels_rx.recv(), if channels_open => match channels {
                    Some(channels) => {
                        self.apply_event(OrderEvent::ChannelsUpdated(channels));
                        true
                    }
                    None => {
                        channels_open = false;
                        false
                    }
                },
            };

            if applied && updates.send(self.snapshot()).await.is_err() {
                tracing::debug!("presentation observer dropped, stopping reconciliation");
                return;
            }
        }
    }
}

/// Derive the heading block for a presentation state.
pub fn heading_for(state: &PresentationState, config: &OrderUiConfig) -> Option<Heading> {
    match state.classification() {
        Classification::Waiting => None,
        Classification::Failure => {
            let order_id = state.display_order_id().unwrap_or("unknown");
            Some(Heading {
                heading: "Channel Opening Failed".to_string(),
                message: format!(
                    "The channel order failed to complete. To troubleshoot, please contact {} and inquire about order ID {}.",
                    config.lsp_name(),
                    order_id
                ),
            })
        }
        Classification::Generic => Some(Heading {
            heading: "Error".to_string(),
            message: state
                .message
                .clone()
                .unwrap_or_else(|| "Failed to get options for channel opening.".to_string()),
        }),
        Classification::Success => Some(Heading {
            heading: "Success!".to_string(),
            message: state
                .message
                .clone()
                .unwrap_or_else(|| "The LSP is opening your channel.".to_string()),
        }),
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use chrono::Utc;
    use serde_json::json;

    use super::{OrderPoller, StatusReconciler, StatusRenderer, heading_for};
    use crate::config::OrderUiConfig;
    use crate::model::{
        Classification, OrderResult, OrderStatus, PaymentInfo, PresentationState,
    };

    #[derive(Default)]
    struct RecordingPoller {
        starts: AtomicUsize,
        last_order_id: Mutex<Option<String>>,
    }

    impl OrderPoller for RecordingPoller {
        fn start_polling(&self, order_id: &str) {
            self.starts.fetch_add(1, Ordering::SeqCst);
            if let Ok(mut last) = self.last_order_id.lock() {
                *last = Some(order_id.to_string());
            }
        }
    }

    struct FragmentRenderer(Option<&'static str>);

    impl StatusRenderer for FragmentRenderer {
        fn render_status(
            &self,
            _state: &PresentationState,
            _last_polled: chrono::DateTime<Utc>,
        ) -> Option<String> {
            self.0.map(|fragment| fragment.to_string())
        }
    }

    fn successful_result(order_id: Option<&str>) -> OrderResult {
        OrderResult {
            success: true,
            order_id: order_id.map(|id| id.to_string()),
            ..OrderResult::default()
        }
    }

    fn reconciler(result: OrderResult) -> StatusReconciler<RecordingPoller> {
        StatusReconciler::new(result, RecordingPoller::default(), OrderUiConfig::default())
    }

    fn status_from(value: serde_json::Value) -> OrderStatus {
        match serde_json::from_value(value) {
            Ok(status) => status,
            Err(err) => {
                assert!(false, "status fixture should parse: {err}");
                OrderStatus::default()
            }
        }
    }

    #[test]
    fn mount_starts_polling_exactly_once() {
        let mut reconciler = reconciler(successful_result(Some("abc")));
        reconciler.mount();
        reconciler.mount();

        assert_eq!(reconciler.poller.starts.load(Ordering::SeqCst), 1);
        let last = reconciler.poller.last_order_id.lock();
        let last = match last {
            Ok(last) => last.clone(),
            Err(_) => None,
        };
        assert_eq!(last.as_deref(), Some("abc"));
    }

    #[test]
    fn mount_without_order_id_or_success_does_not_poll() {
        let mut no_id = reconciler(successful_result(None));
        no_id.mount();
        assert_eq!(no_id.poller.starts.load(Ordering::SeqCst), 0);

        let mut failed = reconciler(OrderResult {
            order_id: Some("abc".to_string()),
            ..OrderResult::default()
        });
        failed.mount();
        assert_eq!(failed.poller.starts.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn status_snapshots_are_last_write_wins() {
        let mut reconciler = reconciler(successful_result(Some("abc")));
        let now = Utc::now();

        reconciler.apply_status(
            status_from(json!({ "order_state": "CREATED", "status": "waiting_for_payment" })),
            now,
        );
        reconciler.apply_status(status_from(json!({ "order_state": "COMPLETED" })), now);

        let state = reconciler.presentation();
        assert_eq!(state.order_state.as_deref(), Some("COMPLETED"));
        // The replacement is verbatim: the earlier legacy marker is gone.
        assert_eq!(state.status, None);
        assert_eq!(state.classification(), Classification::Success);
    }

    #[test]
    fn missing_payment_info_and_data_inherit_from_the_initial_result() {
        let result = OrderResult {
            payment_info: Some(PaymentInfo {
                total_sats: Some(1_000),
                invoice: None,
            }),
            data: Some(json!({ "seed": true })),
            ..successful_result(Some("abc"))
        };
        let mut reconciler = reconciler(result);

        reconciler.apply_status(status_from(json!({ "order_state": "CREATED" })), Utc::now());
        let inherited = reconciler.presentation();
        let total = inherited.payment_info.as_ref().and_then(|p| p.total_sats);
        assert_eq!(total, Some(1_000));
        assert_eq!(inherited.data, Some(json!({ "seed": true })));

        reconciler.apply_status(
            status_from(json!({
                "order_state": "CREATED",
                "paymentInfo": { "totalSats": 2_000 },
                "data": { "fresh": true }
            })),
            Utc::now(),
        );
        let replaced = reconciler.presentation();
        let total = replaced.payment_info.as_ref().and_then(|p| p.total_sats);
        assert_eq!(total, Some(2_000));
        assert_eq!(replaced.data, Some(json!({ "fresh": true })));
    }

    #[test]
    fn empty_channel_snapshot_projects_as_no_data() {
        let mut reconciler = reconciler(successful_result(Some("abc")));

        reconciler.apply_channels(vec![json!({ "id": "chan-1" })]);
        let state = reconciler.presentation();
        assert_eq!(
            state.channel_data,
            Some(vec![json!({ "id": "chan-1" })])
        );

        reconciler.apply_channels(Vec::new());
        assert_eq!(reconciler.presentation().channel_data, None);
    }

    #[test]
    fn status_snapshot_refreshes_last_polled() {
        let mut reconciler = reconciler(successful_result(Some("abc")));
        let polled_at = Utc::now();

        reconciler.apply_status(status_from(json!({ "order_state": "CREATED" })), polled_at);
        assert_eq!(reconciler.last_polled(), polled_at);
    }

    #[test]
    fn failure_heading_references_lsp_and_order_id_from_details() {
        let config = OrderUiConfig {
            lsp_display_name: Some("Olympus".to_string()),
            ..OrderUiConfig::default()
        };
        let mut reconciler = StatusReconciler::new(
            successful_result(None),
            RecordingPoller::default(),
            config,
        );

        reconciler.apply_status(
            status_from(json!({ "order_state": "FAILED", "details": { "order_id": "xyz" } })),
            Utc::now(),
        );

        let heading = reconciler.heading();
        let heading = match heading {
            Some(heading) => heading,
            None => {
                assert!(false, "failure state should produce a heading");
                return;
            }
        };
        assert_eq!(heading.heading, "Channel Opening Failed");
        assert!(heading.message.contains("Olympus"));
        assert!(heading.message.contains("order ID xyz"));
    }

    #[test]
    fn failure_heading_falls_back_to_unknown_order_id() {
        let mut reconciler = reconciler(successful_result(None));
        reconciler.apply_status(status_from(json!({ "order_state": "FAILED" })), Utc::now());

        let message = reconciler.heading().map(|h| h.message);
        let message = message.unwrap_or_default();
        assert!(message.contains("the LSP"));
        assert!(message.contains("order ID unknown"));
    }

    #[test]
    fn generic_and_success_headings_prefer_the_caller_message() {
        let result = OrderResult {
            message: Some("Custom note".to_string()),
            ..successful_result(Some("abc"))
        };
        let mut reconciler = reconciler(result);

        let generic = heading_for(&reconciler.presentation(), &OrderUiConfig::default());
        let generic = match generic {
            Some(heading) => heading,
            None => {
                assert!(false, "generic state should produce a heading");
                return;
            }
        };
        assert_eq!(generic.heading, "Error");
        assert_eq!(generic.message, "Custom note");

        reconciler.apply_status(status_from(json!({ "order_state": "COMPLETED" })), Utc::now());
        let success = reconciler.heading();
        let success = match success {
            Some(heading) => heading,
            None => {
                assert!(false, "success state should produce a heading");
                return;
            }
        };
        assert_eq!(success.heading, "Success!");
        assert_eq!(success.message, "Custom note");
    }

    #[test]
    fn generic_heading_uses_the_default_message_when_none_supplied() {
        let reconciler = reconciler(successful_result(Some("abc")));
        let message = reconciler.heading().map(|h| h.message);
        assert_eq!(
            message.as_deref(),
            Some("Failed to get options for channel opening.")
        );
    }

    #[test]
    fn waiting_state_suppresses_heading_but_keeps_the_fragment() {
        let mut reconciler = reconciler(successful_result(Some("abc")));
        reconciler.apply_status(
            status_from(json!({ "status": "waiting_for_payment" })),
            Utc::now(),
        );

        assert_eq!(reconciler.heading(), None);
        assert_eq!(
            reconciler.render(&FragmentRenderer(Some("invoice-block"))),
            Some("invoice-block".to_string())
        );
        assert_eq!(reconciler.render(&FragmentRenderer(None)), None);
    }

    #[test]
    fn render_combines_heading_and_fragment_in_order() {
        let mut reconciler = reconciler(successful_result(Some("abc")));
        reconciler.apply_status(status_from(json!({ "order_state": "COMPLETED" })), Utc::now());

        let rendered = reconciler.render(&FragmentRenderer(Some("details")));
        let rendered = rendered.unwrap_or_default();
        let lines: Vec<&str> = rendered.lines().collect();
        assert_eq!(
            lines,
            vec![
                "Success!",
                "The LSP is opening your channel.",
                "details"
            ]
        );
    }
}
