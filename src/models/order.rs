//! Production order: requested quantity per product.

use serde::{Deserialize, Serialize};

/// One order line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderLine {
    pub product: String,
    pub quantity: u32,
}

/// Requested quantities, in the order the lines were added.
///
/// Adding the same product twice sums the quantities, matching how the
/// order form accumulates repeated submissions.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Order {
    lines: Vec<OrderLine>,
}

impl Order {
    /// Creates an empty order.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds `quantity` units of `product` (builder form).
    pub fn with(mut self, product: impl Into<String>, quantity: u32) -> Self {
        self.add(product, quantity);
        self
    }

    /// Adds `quantity` units of `product`.
    pub fn add(&mut self, product: impl Into<String>, quantity: u32) {
        let product = product.into();
        match self.lines.iter_mut().find(|l| l.product == product) {
            Some(line) => line.quantity += quantity,
            None => self.lines.push(OrderLine { product, quantity }),
        }
    }

    /// Lines with a positive quantity.
    pub fn active_lines(&self) -> impl Iterator<Item = &OrderLine> {
        self.lines.iter().filter(|l| l.quantity > 0)
    }

    /// All lines, including zero quantities.
    pub fn lines(&self) -> &[OrderLine] {
        &self.lines
    }

    /// Total requested units.
    pub fn total_units(&self) -> u64 {
        self.lines.iter().map(|l| u64::from(l.quantity)).sum()
    }

    /// Whether nothing positive was requested.
    pub fn is_empty(&self) -> bool {
        self.total_units() == 0
    }
}

impl<S: Into<String>> FromIterator<(S, u32)> for Order {
    fn from_iter<T: IntoIterator<Item = (S, u32)>>(iter: T) -> Self {
        let mut order = Order::new();
        for (product, quantity) in iter {
            order.add(product, quantity);
        }
        order
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_repeated_lines_sum() {
        let o = Order::new().with("Boot", 2).with("Sandal", 0).with("Boot", 3);
        assert_eq!(o.lines().len(), 2);
        assert_eq!(o.lines()[0].quantity, 5);
        assert_eq!(o.active_lines().count(), 1);
        assert_eq!(o.total_units(), 5);
    }

    #[test]
    fn test_all_zero_is_empty() {
        let o: Order = vec![("A", 0), ("B", 0)].into_iter().collect();
        assert!(o.is_empty());
        assert!(Order::new().is_empty());
    }
}
