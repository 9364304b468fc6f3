//! Order placement body.

use serde::{Deserialize, Serialize};

use crate::types::{DeliveryMethod, ProductId, UserId};
use crate::validation::{ValidationError, Violations};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct OrderRequest {
    pub user_id: Option<UserId>,
    #[serde(alias = "productIds")]
    pub products_ids: Vec<ProductId>,
    pub address: Option<String>,
    pub delivery_method: Option<String>,
}

/// A checked order request. Products and user still have to be resolved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderDraft {
    pub user_id: UserId,
    pub product_ids: Vec<ProductId>,
    pub address: String,
    pub delivery_method: DeliveryMethod,
}

impl OrderRequest {
    /// # Errors
    ///
    /// Returns every missing or malformed field.
    pub fn validate(&self) -> Result<OrderDraft, ValidationError> {
        let mut v = Violations::new();

        v.check(self.user_id.is_none(), "User ID cannot be null");
        let address = v.require_text(self.address.as_deref(), "Address");
        v.check(
            self.products_ids.is_empty(),
            "Order must contain at least one product",
        );
        let method = match self.delivery_method.as_deref().map(str::trim) {
            None | Some("") => {
                v.push("Delivery method cannot be empty");
                None
            }
            Some(raw) => v.parse_optional::<DeliveryMethod>(Some(raw), "Invalid delivery method value"),
        };

        v.finish()?;
        let (Some(user_id), Some(address), Some(delivery_method)) = (self.user_id, address, method)
        else {
            return Err(ValidationError::single("Invalid order data"));
        };

        Ok(OrderDraft {
            user_id,
            product_ids: self.products_ids.clone(),
            address: address.to_owned(),
            delivery_method,
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_request_reports_everything() {
        let err = OrderRequest::default().validate().unwrap_err();
        assert_eq!(
            err.to_string(),
            "User ID cannot be null, Address cannot be empty, \
             Order must contain at least one product, Delivery method cannot be empty"
        );
    }

    #[test]
    fn test_accepts_short_delivery_alias() {
        let request: OrderRequest = serde_json::from_str(
            r#"{"userId":1,"productsIds":[3,3,4],"address":"1 Agave Way","deliveryMethod":"express"}"#,
        )
        .unwrap();
        let draft = request.validate().unwrap();
        assert_eq!(draft.delivery_method, DeliveryMethod::ExpressDelivery);
        assert_eq!(draft.product_ids.len(), 3);
    }

    #[test]
    fn test_unknown_delivery_method() {
        let request = OrderRequest {
            user_id: Some(UserId::new(1)),
            products_ids: vec![ProductId::new(1)],
            address: Some("x".to_owned()),
            delivery_method: Some("pigeon".to_owned()),
        };
        assert_eq!(
            request.validate().unwrap_err().violations,
            ["Invalid delivery method value"]
        );
    }
}
