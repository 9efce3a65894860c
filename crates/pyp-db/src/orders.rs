//! Order placement: the order document and the stock it consumes are written
//! in one transaction.

use pyp_core::Collection;
use serde_json::{Map, Value};
use sqlx::PgPool;

use crate::documents::with_id;
use crate::{conflict_or, DbError};

/// `(product id, quantity)` for every well-formed line of an order document.
///
/// Lines without a product id or with a non-positive quantity are ignored.
#[must_use]
pub fn order_lines(order: &Map<String, Value>) -> Vec<(String, i32)> {
    let Some(Value::Array(items)) = order.get("items") else {
        return Vec::new();
    };

    items
        .iter()
        .filter_map(|item| {
            let id = match item.get("id")? {
                Value::String(s) => s.clone(),
                Value::Number(n) => n.to_string(),
                _ => return None,
            };
            let quantity = item.get("quantity")?.as_i64()?;
            let quantity = i32::try_from(quantity).ok().filter(|q| *q > 0)?;
            Some((id, quantity))
        })
        .collect()
}

/// Store an order and decrement the stock of every product it contains.
///
/// Stock is floored at zero; an order for more than is left still succeeds.
/// Lines for products that no longer exist are stored but change nothing.
///
/// # Errors
///
/// Returns [`DbError::Conflict`] if the order id already exists, or
/// [`DbError::Sqlx`] if any statement fails (nothing is written).
pub async fn place_order(pool: &PgPool, order: Map<String, Value>) -> Result<Value, DbError> {
    let lines = order_lines(&order);
    let (id, body) = with_id(order);

    let mut tx = pool.begin().await?;

    sqlx::query("INSERT INTO documents (collection, id, body) VALUES ($1, $2, $3)")
        .bind(Collection::Orders.as_str())
        .bind(&id)
        .bind(&body)
        .execute(&mut *tx)
        .await
        .map_err(|e| conflict_or(e, format!("order {id} already exists")))?;

    for (product_id, quantity) in &lines {
        sqlx::query(
            "UPDATE documents \
             SET body = jsonb_set( \
                     body, '{stockQuantity}', \
                     to_jsonb(GREATEST(COALESCE((body->>'stockQuantity')::int, 0) - $3, 0)) \
                 ), \
                 updated_at = NOW() \
             WHERE collection = $1 AND id = $2",
        )
        .bind(Collection::Products.as_str())
        .bind(product_id)
        .bind(quantity)
        .execute(&mut *tx)
        .await?;
    }

    tx.commit().await?;
    Ok(body)
}
