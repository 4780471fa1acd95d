//! Payment strategies.
//!
//! Each payment path turns the same order draft into an outcome. The
//! orchestrator does not know which provider it is talking to.

use async_trait::async_trait;
use storefront_core::checkout::{OrderDraft, PaymentMethod};
use storefront_core::{CommerceError, OrderId};
use storefront_data::OrderGateway;
use storefront_session::SessionToken;

/// What a successful submission produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PaymentOutcome {
    /// The Gateway created the order.
    Placed { order_id: Option<OrderId> },
    /// The customer must be sent to this URL to pay.
    Redirect { url: String },
}

/// A way of paying for an order draft.
#[async_trait]
pub trait PaymentStrategy: Send + Sync {
    fn method(&self) -> PaymentMethod;

    async fn submit(
        &self,
        gateway: &dyn OrderGateway,
        session: &SessionToken,
        draft: &OrderDraft,
    ) -> Result<PaymentOutcome, CommerceError>;
}

/// Cash on delivery: the order is placed directly.
#[derive(Debug, Clone, Copy, Default)]
pub struct CashOnDelivery;

#[async_trait]
impl PaymentStrategy for CashOnDelivery {
    fn method(&self) -> PaymentMethod {
        PaymentMethod::Cod
    }

    async fn submit(
        &self,
        gateway: &dyn OrderGateway,
        session: &SessionToken,
        draft: &OrderDraft,
    ) -> Result<PaymentOutcome, CommerceError> {
        let placed = gateway.place_order(session, draft).await?;
        Ok(PaymentOutcome::Placed {
            order_id: placed.order_id,
        })
    }
}

/// Redirect-based wallet. The outcome arrives through the Gateway's callback.
#[derive(Debug, Clone, Copy, Default)]
pub struct WalletRedirect;

#[async_trait]
impl PaymentStrategy for WalletRedirect {
    fn method(&self) -> PaymentMethod {
        PaymentMethod::WalletRedirect
    }

    async fn submit(
        &self,
        gateway: &dyn OrderGateway,
        session: &SessionToken,
        draft: &OrderDraft,
    ) -> Result<PaymentOutcome, CommerceError> {
        let url = gateway
            .initiate_wallet_payment(session, draft)
            .await
            .map_err(|e| CommerceError::Payment(e.user_message()))?;
        if url.trim().is_empty() {
            return Err(CommerceError::Payment("wallet returned no payment URL".into()));
        }
        Ok(PaymentOutcome::Redirect { url })
    }
}

/// Embedded provider widget, submitted once the widget reports a capture.
#[derive(Debug, Clone)]
pub struct EmbeddedWidget {
    /// Capture details reported by the provider widget.
    pub receipt: serde_json::Value,
}

#[async_trait]
impl PaymentStrategy for EmbeddedWidget {
    fn method(&self) -> PaymentMethod {
        PaymentMethod::EmbeddedWidget
    }

    async fn submit(
        &self,
        gateway: &dyn OrderGateway,
        session: &SessionToken,
        draft: &OrderDraft,
    ) -> Result<PaymentOutcome, CommerceError> {
        let placed = gateway
            .capture_embedded_payment(session, draft, &self.receipt)
            .await
            .map_err(|e| CommerceError::Payment(e.user_message()))?;
        Ok(PaymentOutcome::Placed {
            order_id: placed.order_id,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use storefront_core::checkout::ShippingAddress;
    use storefront_core::Money;
    use storefront_data::{GatewayError, MemoryGateway, Operation};

    fn draft() -> OrderDraft {
        OrderDraft {
            address: ShippingAddress::default(),
            items: vec![],
            amount: Money::new(30_000, Default::default()),
        }
    }

    #[tokio::test]
    async fn test_cod_failure_is_a_gateway_error() {
        let gateway = MemoryGateway::new();
        gateway.fail(Operation::PlaceOrder, GatewayError::Rejected("closed".into()));
        let err = CashOnDelivery
            .submit(&gateway, &"t".into(), &draft())
            .await
            .unwrap_err();
        assert_eq!(err, CommerceError::Gateway("closed".into()));
    }

    #[tokio::test]
    async fn test_wallet_returns_redirect() {
        let gateway = MemoryGateway::new();
        let outcome = WalletRedirect.submit(&gateway, &"t".into(), &draft()).await.unwrap();
        assert!(matches!(outcome, PaymentOutcome::Redirect { url } if url.contains("amount=30000")));
    }

    #[tokio::test]
    async fn test_widget_failure_is_a_payment_error() {
        let gateway = MemoryGateway::new();
        gateway.fail(Operation::CaptureEmbeddedPayment, GatewayError::Rejected("declined".into()));
        let strategy = EmbeddedWidget { receipt: serde_json::json!({"id": "cap-1"}) };
        let err = strategy.submit(&gateway, &"t".into(), &draft()).await.unwrap_err();
        assert_eq!(err, CommerceError::Payment("declined".into()));
    }
}
