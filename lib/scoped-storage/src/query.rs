//! Query options shared by the read operations of every repository.

use crate::{Column, Condition, StatementBuilder};

/// Sort order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Order {
    Asc,
    Desc,
}

/// Condition, ordering and pagination for a SELECT.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct QueryOpts {
    /// Filter condition.
    pub condition: Option<Condition>,
    /// Order by clauses.
    pub order_by: Vec<(Column, Order)>,
    /// Maximum number of results.
    pub limit: Option<u64>,
    /// Offset for pagination.
    pub offset: Option<u64>,
}

impl QueryOpts {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the filter condition, replacing any earlier one.
    pub fn condition(mut self, condition: Condition) -> Self {
        self.condition = Some(condition);
        self
    }

    /// Add an order-by clause.
    pub fn order_by(mut self, column: Column, order: Order) -> Self {
        self.order_by.push((column, order));
        self
    }

    /// Set the maximum number of results.
    pub fn limit(mut self, limit: u64) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Set the offset for pagination.
    pub fn offset(mut self, offset: u64) -> Self {
        self.offset = Some(offset);
        self
    }

    /// Write ` WHERE ... ORDER BY ... LIMIT $n OFFSET $m`, skipping absent parts.
    pub fn write(&self, builder: &mut StatementBuilder) {
        if let Some(condition) = &self.condition {
            builder.write_str(" WHERE ");
            condition.write(builder);
        }
        self.write_tail(builder);
    }

    /// Write ordering and pagination only, for callers that render their own WHERE.
    pub fn write_tail(&self, builder: &mut StatementBuilder) {
        for (idx, (column, order)) in self.order_by.iter().enumerate() {
            builder.write_str(if idx == 0 { " ORDER BY " } else { ", " });
            column.write_qualified(builder);
            builder.write_str(match order {
                Order::Asc => " ASC",
                Order::Desc => " DESC",
            });
        }
        if let Some(limit) = self.limit {
            builder.write_str(" LIMIT ");
            builder.write_arg(clamp(limit));
        }
        if let Some(offset) = self.offset {
            builder.write_str(" OFFSET ");
            builder.write_arg(clamp(offset));
        }
    }
}

fn clamp(n: u64) -> i64 {
    i64::try_from(n).unwrap_or(i64::MAX)
}
