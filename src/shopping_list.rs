//! Shopping-list aggregation: every ingredient edge of every recipe in
//! the cart, summed per (name, measurement unit), rendered as the
//! plain-text attachment body.

use std::collections::HashMap;

use crate::models::CartItemRow;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShoppingItem {
    pub name: String,
    pub measurement_unit: String,
    pub amount: i64,
}

/// Sums amounts per (name, unit) key, keeping the order in which each
/// key first appeared in the input.
pub fn aggregate(rows: impl IntoIterator<Item = CartItemRow>) -> Vec<ShoppingItem> {
    let mut items: Vec<ShoppingItem> = Vec::new();
    let mut index: HashMap<(String, String), usize> = HashMap::new();
    for row in rows {
        let key = (row.name.clone(), row.measurement_unit.clone());
        match index.get(&key) {
            Some(&position) => items[position].amount += row.amount,
            None => {
                index.insert(key, items.len());
                items.push(ShoppingItem {
                    name: row.name,
                    measurement_unit: row.measurement_unit,
                    amount: row.amount,
                });
            }
        }
    }
    items
}

pub fn render(items: &[ShoppingItem]) -> String {
    let mut out = String::from("Список покупок:\n");
    for item in items {
        out.push_str(&format!(
            "{} ({}) - {}\n",
            item.name, item.measurement_unit, item.amount
        ));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(name: &str, unit: &str, amount: i64) -> CartItemRow {
        CartItemRow {
            name: name.to_string(),
            measurement_unit: unit.to_string(),
            amount,
        }
    }

    #[test]
    fn sums_amounts_per_name_and_unit() {
        let items = aggregate(vec![
            row("Молоко", "мл", 200),
            row("Молоко", "мл", 150),
            row("Сахар", "г", 50),
        ]);
        assert_eq!(items.len(), 2);
        assert_eq!(items[0].name, "Молоко");
        assert_eq!(items[0].amount, 350);
        assert_eq!(items[1].name, "Сахар");
        assert_eq!(items[1].amount, 50);
    }

    #[test]
    fn same_name_different_unit_stays_separate() {
        let items = aggregate(vec![row("Соль", "г", 10), row("Соль", "щепотка", 1)]);
        assert_eq!(items.len(), 2);
    }

    #[test]
    fn keeps_first_appearance_order() {
        let items = aggregate(vec![
            row("c", "г", 1),
            row("a", "г", 1),
            row("c", "г", 1),
            row("b", "г", 1),
        ]);
        let names: Vec<&str> = items.iter().map(|i| i.name.as_str()).collect();
        assert_eq!(names, ["c", "a", "b"]);
    }

    #[test]
    fn renders_report_body() {
        let items = aggregate(vec![
            row("Молоко", "мл", 200),
            row("Молоко", "мл", 150),
            row("Сахар", "г", 50),
        ]);
        assert_eq!(
            render(&items),
            "Список покупок:\nМолоко (мл) - 350\nСахар (г) - 50\n"
        );
    }

    #[test]
    fn renders_empty_cart() {
        assert_eq!(render(&[]), "Список покупок:\n");
    }
}
