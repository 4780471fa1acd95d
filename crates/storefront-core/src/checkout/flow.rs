//! Checkout flow state machine.
//!
//! Pure state: no I/O happens here. The orchestrator drives transitions
//! around its Gateway calls and this type enforces which ones are legal.

use crate::checkout::{PaymentMethod, ShippingAddress};
use crate::ids::OrderId;
use crate::CommerceError;
use serde::Serialize;
use std::collections::BTreeSet;

/// Where a checkout attempt currently stands.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum CheckoutState {
    /// Not checking out.
    #[default]
    Idle,
    /// On the checkout page, no payment method chosen yet.
    CollectingAddress,
    /// A payment method is active and may be submitted.
    MethodSelected { method: PaymentMethod },
    /// A submission was sent and its outcome is pending.
    ///
    /// For wallet redirects this is where the flow rests: the outcome is
    /// resolved by the Gateway's callback, out of band.
    AwaitingPaymentConfirmation { method: PaymentMethod },
    /// The Gateway accepted the order.
    Placed { order_id: Option<OrderId> },
    /// The payment path failed. The customer may pick a method and retry.
    Failed { method: PaymentMethod, reason: String },
}

impl CheckoutState {
    pub fn as_str(&self) -> &'static str {
        match self {
            CheckoutState::Idle => "idle",
            CheckoutState::CollectingAddress => "collecting_address",
            CheckoutState::MethodSelected { .. } => "method_selected",
            CheckoutState::AwaitingPaymentConfirmation { .. } => "awaiting_payment_confirmation",
            CheckoutState::Placed { .. } => "placed",
            CheckoutState::Failed { .. } => "failed",
        }
    }

    /// The payment method the state refers to, if any.
    pub fn method(&self) -> Option<PaymentMethod> {
        match self {
            CheckoutState::MethodSelected { method }
            | CheckoutState::AwaitingPaymentConfirmation { method }
            | CheckoutState::Failed { method, .. } => Some(*method),
            _ => None,
        }
    }
}

/// Result of trying to start a submission.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmissionStart {
    /// The caller owns the submission and must report its outcome.
    Started,
    /// A submission for this method is already pending; nothing to do.
    AlreadyInFlight,
}

/// Session-scoped checkout state.
#[derive(Debug, Clone, Default, Serialize)]
pub struct CheckoutFlow {
    state: CheckoutState,
    address: ShippingAddress,
    /// Message from the last rejected submission, if it was not cleared.
    last_error: Option<String>,
    #[serde(skip)]
    in_flight: BTreeSet<PaymentMethod>,
}

impl CheckoutFlow {
    /// Create an idle flow.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> &CheckoutState {
        &self.state
    }

    pub fn address(&self) -> &ShippingAddress {
        &self.address
    }

    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    /// Whether a submission for `method` is pending.
    pub fn is_busy(&self, method: PaymentMethod) -> bool {
        self.in_flight.contains(&method)
    }

    /// Enter the checkout page.
    ///
    /// Requires an authenticated session and a non-empty cart. Re-entering
    /// from any state other than a pending submission starts over.
    pub fn begin(&mut self, authenticated: bool, item_count: u64) -> Result<(), CommerceError> {
        if !authenticated {
            return Err(CommerceError::AuthRequired);
        }
        if item_count == 0 {
            return Err(CommerceError::CartEmpty);
        }
        if !self.in_flight.is_empty() {
            return Err(self.invalid("collecting_address"));
        }
        self.state = CheckoutState::CollectingAddress;
        self.last_error = None;
        Ok(())
    }

    /// Replace the shipping address. Returns true if it changed.
    pub fn set_address(&mut self, address: ShippingAddress) -> Result<bool, CommerceError> {
        if matches!(self.state, CheckoutState::Idle | CheckoutState::Placed { .. }) {
            return Err(self.invalid("collecting_address"));
        }
        if self.address == address {
            return Ok(false);
        }
        self.address = address;
        Ok(true)
    }

    /// Make `method` the active payment method.
    ///
    /// Allowed while collecting the address, after another selection, after
    /// a failure, and after a wallet redirect whose outcome is still
    /// pending out of band. Not allowed while a submission is in flight.
    pub fn select_method(&mut self, method: PaymentMethod) -> Result<(), CommerceError> {
        let allowed = match &self.state {
            CheckoutState::CollectingAddress
            | CheckoutState::MethodSelected { .. }
            | CheckoutState::Failed { .. } => true,
            CheckoutState::AwaitingPaymentConfirmation { method: pending } => {
                !self.is_busy(*pending)
            }
            CheckoutState::Idle | CheckoutState::Placed { .. } => false,
        };
        if !allowed {
            return Err(self.invalid("method_selected"));
        }
        self.state = CheckoutState::MethodSelected { method };
        Ok(())
    }

    /// Claim the single-flight slot for `method`.
    pub fn start_submission(&mut self, method: PaymentMethod) -> Result<SubmissionStart, CommerceError> {
        if self.is_busy(method)
            || self.state == (CheckoutState::AwaitingPaymentConfirmation { method })
        {
            return Ok(SubmissionStart::AlreadyInFlight);
        }
        if self.state != (CheckoutState::MethodSelected { method }) {
            return Err(self.invalid("awaiting_payment_confirmation"));
        }
        self.in_flight.insert(method);
        self.state = CheckoutState::AwaitingPaymentConfirmation { method };
        self.last_error = None;
        Ok(SubmissionStart::Started)
    }

    /// The Gateway created the order.
    ///
    /// Applies even if the customer switched method meanwhile: the order
    /// exists either way.
    pub fn mark_placed(&mut self, method: PaymentMethod, order_id: Option<OrderId>) {
        self.in_flight.remove(&method);
        self.state = CheckoutState::Placed { order_id };
        self.last_error = None;
    }

    /// The wallet page is taking over; the outcome arrives out of band.
    pub fn mark_redirected(&mut self, method: PaymentMethod) {
        self.in_flight.remove(&method);
    }

    /// The submission was rejected or the transport failed.
    ///
    /// Cash-on-delivery stays selected so the customer can simply resubmit;
    /// the provider paths move to `Failed`. The state is left alone if the
    /// customer already moved on to another method.
    pub fn mark_rejected(&mut self, method: PaymentMethod, reason: impl Into<String>) {
        let reason = reason.into();
        self.in_flight.remove(&method);
        self.last_error = Some(reason.clone());

        if self.state != (CheckoutState::AwaitingPaymentConfirmation { method }) {
            return;
        }
        self.state = match method {
            PaymentMethod::Cod => CheckoutState::MethodSelected { method },
            _ => CheckoutState::Failed { method, reason },
        };
    }

    /// Leave checkout. The address is kept for the next attempt.
    pub fn reset(&mut self) {
        self.state = CheckoutState::Idle;
        self.last_error = None;
        self.in_flight.clear();
    }

    fn invalid(&self, to: &str) -> CommerceError {
        CommerceError::InvalidCheckoutTransition {
            from: self.state.as_str().to_string(),
            to: to.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn selected(method: PaymentMethod) -> CheckoutFlow {
        let mut flow = CheckoutFlow::new();
        flow.begin(true, 1).unwrap();
        flow.select_method(method).unwrap();
        flow
    }

    #[test]
    fn test_new_flow_is_idle() {
        assert_eq!(CheckoutState::default(), CheckoutState::Idle);
        assert_eq!(CheckoutFlow::new().state(), &CheckoutState::Idle);
    }

    #[test]
    fn test_entry_guard() {
        let mut flow = CheckoutFlow::new();
        assert_eq!(flow.begin(false, 3), Err(CommerceError::AuthRequired));
        assert_eq!(flow.begin(true, 0), Err(CommerceError::CartEmpty));
        assert_eq!(flow.state(), &CheckoutState::Idle);

        flow.begin(true, 1).unwrap();
        assert_eq!(flow.state(), &CheckoutState::CollectingAddress);
    }

    #[test]
    fn test_cannot_select_before_begin() {
        let mut flow = CheckoutFlow::new();
        assert!(matches!(
            flow.select_method(PaymentMethod::Cod),
            Err(CommerceError::InvalidCheckoutTransition { .. })
        ));
    }

    #[test]
    fn test_single_flight() {
        let mut flow = selected(PaymentMethod::Cod);
        assert_eq!(flow.start_submission(PaymentMethod::Cod), Ok(SubmissionStart::Started));
        assert_eq!(
            flow.start_submission(PaymentMethod::Cod),
            Ok(SubmissionStart::AlreadyInFlight)
        );
        assert!(flow.is_busy(PaymentMethod::Cod));
        assert!(flow.select_method(PaymentMethod::WalletRedirect).is_err());
    }

    #[test]
    fn test_cod_rejection_returns_to_method_selected() {
        let mut flow = selected(PaymentMethod::Cod);
        flow.start_submission(PaymentMethod::Cod).unwrap();
        flow.mark_rejected(PaymentMethod::Cod, "Out of stock");

        assert_eq!(flow.state(), &CheckoutState::MethodSelected { method: PaymentMethod::Cod });
        assert_eq!(flow.last_error(), Some("Out of stock"));
        assert!(!flow.is_busy(PaymentMethod::Cod));
    }

    #[test]
    fn test_provider_rejection_fails_and_allows_retry() {
        let mut flow = selected(PaymentMethod::EmbeddedWidget);
        flow.start_submission(PaymentMethod::EmbeddedWidget).unwrap();
        flow.mark_rejected(PaymentMethod::EmbeddedWidget, "declined");
        assert!(matches!(flow.state(), CheckoutState::Failed { .. }));

        // Must re-select before submitting again.
        assert!(flow.start_submission(PaymentMethod::EmbeddedWidget).is_err());
        flow.select_method(PaymentMethod::EmbeddedWidget).unwrap();
        assert_eq!(
            flow.start_submission(PaymentMethod::EmbeddedWidget),
            Ok(SubmissionStart::Started)
        );
    }

    #[test]
    fn test_wallet_redirect_rests_in_awaiting() {
        let mut flow = selected(PaymentMethod::WalletRedirect);
        flow.start_submission(PaymentMethod::WalletRedirect).unwrap();
        flow.mark_redirected(PaymentMethod::WalletRedirect);

        assert_eq!(
            flow.state(),
            &CheckoutState::AwaitingPaymentConfirmation { method: PaymentMethod::WalletRedirect }
        );
        assert_eq!(
            flow.start_submission(PaymentMethod::WalletRedirect),
            Ok(SubmissionStart::AlreadyInFlight)
        );
        // Coming back from the wallet page the customer may pick again.
        flow.select_method(PaymentMethod::Cod).unwrap();
    }

    #[test]
    fn test_placed_is_terminal_for_selection() {
        let mut flow = selected(PaymentMethod::Cod);
        flow.start_submission(PaymentMethod::Cod).unwrap();
        flow.mark_placed(PaymentMethod::Cod, Some(OrderId::new("o1")));

        assert_eq!(flow.state(), &CheckoutState::Placed { order_id: Some(OrderId::new("o1")) });
        assert!(flow.select_method(PaymentMethod::Cod).is_err());
        assert!(flow.set_address(ShippingAddress::default()).is_err());
    }

    #[test]
    fn test_set_address_reports_change() {
        let mut flow = selected(PaymentMethod::Cod);
        let mut address = ShippingAddress::default();
        assert_eq!(flow.set_address(address.clone()), Ok(false));
        address.city = "Hue".into();
        assert_eq!(flow.set_address(address), Ok(true));
    }
}
