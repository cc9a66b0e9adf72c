use crate::types::room::PushSubscription;

/// Lets the notifier tell a dead endpoint apart from a transient failure.
pub trait DeliveryFailure: std::fmt::Display {
    /// True when the destination is permanently gone and should be removed.
    fn is_permanent(&self) -> bool;
}

pub trait PushSender: Clone + Send + Sync + 'static {
    type Error: DeliveryFailure + Send + Sync + 'static;
    type Fut<'a>: Future<Output = Result<(), Self::Error>> + Send + 'a
    where
        Self: 'a;

    fn send<'a>(&'a self, subscription: &'a PushSubscription, message: &'a str) -> Self::Fut<'a>;
}
