use crate::errors::{ItemViolation, ValidationError};
use crate::model::{Delivery, Item, Order, Payment};

/// Check that a decoded order is complete enough to persist.
///
/// Rules run in a fixed order and the first failure is returned:
/// root fields, delivery, payment, then items (by position).
pub fn validate(order: &Order) -> Result<(), ValidationError> {
    require(&order.order_uid, "order_uid")?;
    require(&order.track_number, "track_number")?;
    require(&order.entry, "entry")?;
    require(&order.customer_id, "customer_id")?;
    require(&order.delivery_service, "delivery_service")?;

    validate_delivery(&order.delivery)?;
    validate_payment(&order.payment)?;

    if order.items.is_empty() {
        return Err(ValidationError::NoItems);
    }

    for (index, item) in order.items.iter().enumerate() {
        validate_item(item).map_err(|violation| ValidationError::InvalidItem { index, violation })?;
    }

    Ok(())
}

fn require(value: &str, field: &'static str) -> Result<(), ValidationError> {
    if value.is_empty() {
        return Err(ValidationError::MissingField(field));
    }
    Ok(())
}

fn validate_delivery(delivery: &Delivery) -> Result<(), ValidationError> {
    require(&delivery.name, "delivery.name")?;
    require(&delivery.phone, "delivery.phone")?;
    require(&delivery.city, "delivery.city")?;
    require(&delivery.address, "delivery.address")?;

    if !delivery.email.is_empty() && !delivery.email.contains('@') {
        return Err(ValidationError::InvalidEmail(delivery.email.clone()));
    }

    Ok(())
}

fn validate_payment(payment: &Payment) -> Result<(), ValidationError> {
    require(&payment.transaction, "payment.transaction")?;
    require(&payment.currency, "payment.currency")?;
    require(&payment.provider, "payment.provider")?;

    if payment.amount <= 0 {
        return Err(ValidationError::NonPositiveAmount(payment.amount));
    }

    require(&payment.bank, "payment.bank")
}

fn validate_item(item: &Item) -> Result<(), ItemViolation> {
    if item.chrt_id <= 0 {
        return Err(ItemViolation::NonPositiveChrtId(item.chrt_id));
    }
    if item.track_number.is_empty() {
        return Err(ItemViolation::MissingTrackNumber);
    }
    if item.name.is_empty() {
        return Err(ItemViolation::MissingName);
    }
    if item.price <= 0 {
        return Err(ItemViolation::NonPositivePrice(item.price));
    }
    if item.total_price <= 0 {
        return Err(ItemViolation::NonPositiveTotalPrice(item.total_price));
    }
    if item.brand.is_empty() {
        return Err(ItemViolation::MissingBrand);
    }
    Ok(())
}
