use serde::{Deserialize, Serialize};

use crate::core::error::StoreResult;
use crate::core::order::{Order, OrderStatus, Priority};

/// Raw order filter query parameters
#[derive(Debug, Clone, Default, Deserialize)]
pub struct OrderFilterQuery {
    pub search: Option<String>,
    pub status: Option<String>,
    pub priority: Option<String>,
}

/// Admin order list filter
#[derive(Debug, Clone, Default, PartialEq)]
pub struct OrderFilter {
    pub search: Option<String>,
    pub status: Option<OrderStatus>,
    pub priority: Option<Priority>,
}

/// Filtered order list with counts for the "showing x / y" line
#[derive(Debug, Serialize)]
pub struct FilteredOrders {
    pub orders: Vec<Order>,
    pub shown: usize,
    pub total: usize,
}

// "all" and "" both mean no filter
fn selected(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty() && *v != "all")
}

impl OrderFilter {
    pub fn from_query(query: &OrderFilterQuery) -> StoreResult<Self> {
        Ok(Self {
            search: query
                .search
                .as_deref()
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_lowercase),
            status: selected(query.status.as_deref())
                .map(str::parse)
                .transpose()?,
            priority: selected(query.priority.as_deref())
                .map(str::parse)
                .transpose()?,
        })
    }

    pub fn matches(&self, order: &Order) -> bool {
        let matches_search = match &self.search {
            None => true,
            Some(term) => [&order.order_id, &order.customer_name, &order.service_name]
                .iter()
                .any(|field| field.to_lowercase().contains(term.as_str())),
        };

        matches_search
            && self.status.map_or(true, |s| order.status == s)
            && self.priority.map_or(true, |p| order.priority == p)
    }

    /// Keep matching orders in their existing order
    pub fn apply(&self, orders: Vec<Order>) -> FilteredOrders {
        let total = orders.len();
        let orders: Vec<Order> = orders.into_iter().filter(|o| self.matches(o)).collect();
        FilteredOrders {
            shown: orders.len(),
            total,
            orders,
        }
    }
}
