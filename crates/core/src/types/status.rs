//! Order status state machines.
//!
//! An order carries two independent lifecycles: payment and fulfillment.
//! Both are closed state machines - every transition goes through
//! `can_transition_to`, and terminal states admit no further moves.

use serde::{Deserialize, Serialize};

/// Payment lifecycle of an order.
///
/// State transitions:
/// ```text
/// Pending ──┬──► Paid
///           └──► Failed
/// ```
///
/// `Paid` and `Failed` are terminal; the pending state resolves exactly once.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum PaymentStatus {
    /// Awaiting the payment outcome.
    #[default]
    Pending,
    /// Payment captured.
    Paid,
    /// Payment was declined or errored.
    Failed,
}

impl PaymentStatus {
    /// Returns true if the machine allows moving from `self` to `next`.
    #[must_use]
    pub const fn can_transition_to(self, next: Self) -> bool {
        matches!((self, next), (Self::Pending, Self::Paid | Self::Failed))
    }

    /// Returns true if no further transitions are possible.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        !matches!(self, Self::Pending)
    }

    /// Returns the status name as stored and serialized.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Paid => "paid",
            Self::Failed => "failed",
        }
    }
}

impl std::fmt::Display for PaymentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for PaymentStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(Self::Pending),
            "paid" => Ok(Self::Paid),
            "failed" => Ok(Self::Failed),
            _ => Err(format!("invalid payment status: {s}")),
        }
    }
}

/// Physical-delivery lifecycle of an order, distinct from payment.
///
/// State transitions:
/// ```text
/// Processing ──► Shipped ──► Delivered
///      │            │
///      └────────────┴──► Cancelled
/// ```
///
/// `Delivered` and `Cancelled` are terminal. Cancellation never deletes the
/// order; the record stays as the audit trail.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum FulfillmentStatus {
    /// Order accepted, not yet handed to the carrier.
    #[default]
    Processing,
    /// In transit.
    Shipped,
    /// Received by the customer (terminal).
    Delivered,
    /// Abandoned before delivery (terminal).
    Cancelled,
}

impl FulfillmentStatus {
    /// Returns true if the machine allows moving from `self` to `next`.
    #[must_use]
    pub const fn can_transition_to(self, next: Self) -> bool {
        matches!(
            (self, next),
            (Self::Processing, Self::Shipped | Self::Cancelled)
                | (Self::Shipped, Self::Delivered | Self::Cancelled)
        )
    }

    /// Returns true if no further transitions are possible.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Delivered | Self::Cancelled)
    }

    /// Returns the status name as stored and serialized.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Processing => "processing",
            Self::Shipped => "shipped",
            Self::Delivered => "delivered",
            Self::Cancelled => "cancelled",
        }
    }
}

impl std::fmt::Display for FulfillmentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for FulfillmentStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "processing" => Ok(Self::Processing),
            "shipped" => Ok(Self::Shipped),
            "delivered" => Ok(Self::Delivered),
            "cancelled" => Ok(Self::Cancelled),
            _ => Err(format!("invalid fulfillment status: {s}")),
        }
    }
}

/// Supported payment gateways.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PaymentMethod {
    Stripe,
    Razorpay,
}

impl PaymentMethod {
    /// Returns the gateway name as stored and serialized.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Stripe => "stripe",
            Self::Razorpay => "razorpay",
        }
    }
}

impl std::fmt::Display for PaymentMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for PaymentMethod {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "stripe" => Ok(Self::Stripe),
            "razorpay" => Ok(Self::Razorpay),
            _ => Err(format!("invalid payment method: {s}")),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn payment_pending_resolves_once() {
        assert!(PaymentStatus::Pending.can_transition_to(PaymentStatus::Paid));
        assert!(PaymentStatus::Pending.can_transition_to(PaymentStatus::Failed));
        assert!(!PaymentStatus::Paid.can_transition_to(PaymentStatus::Failed));
        assert!(!PaymentStatus::Paid.can_transition_to(PaymentStatus::Pending));
        assert!(!PaymentStatus::Failed.can_transition_to(PaymentStatus::Paid));
    }

    #[test]
    fn payment_terminal_states() {
        assert!(!PaymentStatus::Pending.is_terminal());
        assert!(PaymentStatus::Paid.is_terminal());
        assert!(PaymentStatus::Failed.is_terminal());
    }

    #[test]
    fn fulfillment_happy_path() {
        assert!(FulfillmentStatus::Processing.can_transition_to(FulfillmentStatus::Shipped));
        assert!(FulfillmentStatus::Shipped.can_transition_to(FulfillmentStatus::Delivered));
    }

    #[test]
    fn fulfillment_cancellation_from_non_terminal() {
        assert!(FulfillmentStatus::Processing.can_transition_to(FulfillmentStatus::Cancelled));
        assert!(FulfillmentStatus::Shipped.can_transition_to(FulfillmentStatus::Cancelled));
        assert!(!FulfillmentStatus::Delivered.can_transition_to(FulfillmentStatus::Cancelled));
        assert!(!FulfillmentStatus::Cancelled.can_transition_to(FulfillmentStatus::Processing));
    }

    #[test]
    fn fulfillment_rejects_backwards_moves() {
        assert!(!FulfillmentStatus::Delivered.can_transition_to(FulfillmentStatus::Shipped));
        assert!(!FulfillmentStatus::Shipped.can_transition_to(FulfillmentStatus::Processing));
        assert!(!FulfillmentStatus::Processing.can_transition_to(FulfillmentStatus::Delivered));
    }

    #[test]
    fn fulfillment_terminal_states() {
        assert!(!FulfillmentStatus::Processing.is_terminal());
        assert!(!FulfillmentStatus::Shipped.is_terminal());
        assert!(FulfillmentStatus::Delivered.is_terminal());
        assert!(FulfillmentStatus::Cancelled.is_terminal());
    }

    #[test]
    fn statuses_serialize_lowercase() {
        assert_eq!(
            serde_json::to_string(&PaymentStatus::Pending).unwrap(),
            "\"pending\""
        );
        assert_eq!(
            serde_json::to_string(&FulfillmentStatus::Processing).unwrap(),
            "\"processing\""
        );
        assert_eq!(
            serde_json::to_string(&PaymentMethod::Stripe).unwrap(),
            "\"stripe\""
        );
    }
}
