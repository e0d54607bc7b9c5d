//! Canned exploration queries over an ingested database.
//!
//! The menu is a fixed, ordered list of labelled queries. Entries are
//! addressed by their 1-based position; `0` leaves the interactive loop.

use crate::db::{Database, QueryTable};
use crate::error::{IngestError, Result};
use colored::*;
use std::io::{BufRead, Write};
use std::path::Path;

/// One labelled entry in the query menu
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MenuQuery {
    pub label: &'static str,
    pub sql: &'static str,
}

pub const QUERIES: &[MenuQuery] = &[
    MenuQuery {
        label: "List all tables",
        sql: "SELECT t.table_schema, t.table_name, COUNT(c.column_name) AS column_count
              FROM information_schema.tables t
              LEFT JOIN information_schema.columns c
                ON c.table_schema = t.table_schema AND c.table_name = t.table_name
              WHERE t.table_schema IN ('raw', 'dimensions')
              GROUP BY t.table_schema, t.table_name
              ORDER BY t.table_schema, t.table_name",
    },
    MenuQuery {
        label: "Order status summary",
        sql: "SELECT order_status,
                     COUNT(*) AS count,
                     ROUND(COUNT(*) * 100.0 / SUM(COUNT(*)) OVER (), 2) AS percentage
              FROM raw.orders
              GROUP BY order_status
              ORDER BY count DESC",
    },
    MenuQuery {
        label: "Top 10 states by customers",
        sql: "SELECT customer_state, COUNT(*) AS customer_count
              FROM raw.customers
              GROUP BY customer_state
              ORDER BY customer_count DESC
              LIMIT 10",
    },
    MenuQuery {
        label: "Monthly order trends",
        sql: "SELECT c.year, c.month, c.month_name,
                     COUNT(DISTINCT o.order_id) AS orders,
                     COUNT(DISTINCT o.customer_id) AS customers
              FROM raw.orders o
              JOIN dimensions.calendar c ON CAST(o.order_purchase_timestamp AS DATE) = c.date
              GROUP BY c.year, c.month, c.month_name
              ORDER BY c.year, c.month",
    },
    MenuQuery {
        label: "Product categories (top 10)",
        sql: "SELECT COALESCE(t.product_category_name_english, p.product_category_name) AS category,
                     COUNT(*) AS product_count
              FROM raw.products p
              LEFT JOIN raw.product_category_translation t
                ON p.product_category_name = t.product_category_name
              GROUP BY category
              ORDER BY product_count DESC
              LIMIT 10",
    },
    MenuQuery {
        label: "Payment type distribution",
        sql: "SELECT payment_type,
                     COUNT(*) AS payment_count,
                     ROUND(SUM(payment_value), 2) AS total_value
              FROM raw.order_payments
              GROUP BY payment_type
              ORDER BY total_value DESC",
    },
    MenuQuery {
        label: "Review score distribution",
        sql: "SELECT review_score,
                     COUNT(*) AS review_count,
                     ROUND(COUNT(*) * 100.0 / SUM(COUNT(*)) OVER (), 2) AS percentage
              FROM raw.order_reviews
              GROUP BY review_score
              ORDER BY review_score DESC",
    },
    MenuQuery {
        label: "Orders by region",
        sql: "SELECT r.region,
                     COUNT(DISTINCT o.order_id) AS order_count,
                     COUNT(DISTINCT c.customer_id) AS customer_count
              FROM raw.orders o
              JOIN raw.customers c ON o.customer_id = c.customer_id
              JOIN dimensions.region_lookup r ON c.customer_state = r.state_code
              GROUP BY r.region
              ORDER BY order_count DESC",
    },
    MenuQuery {
        label: "Calendar dimension sample",
        sql: "SELECT date, year, quarter, month, month_name, day_name, is_weekend
              FROM dimensions.calendar
              WHERE year = 2017 AND month = 1
              ORDER BY date
              LIMIT 10",
    },
];

/// Runs menu queries against a read-only connection
#[derive(Debug)]
pub struct Explorer {
    db: Database,
}

impl Explorer {
    pub fn open(db_path: &Path) -> Result<Self> {
        Ok(Self {
            db: Database::open_read_only(db_path)?,
        })
    }

    /// Look up a menu entry by its 1-based number
    pub fn menu_entry(choice: usize) -> Option<&'static MenuQuery> {
        choice.checked_sub(1).and_then(|index| QUERIES.get(index))
    }

    /// Run one menu entry by its 1-based number
    pub fn run_query(&self, choice: usize) -> Result<QueryTable> {
        let entry = Self::menu_entry(choice).ok_or_else(|| {
            IngestError::configuration(format!(
                "Query {choice} does not exist, choose 1-{}",
                QUERIES.len()
            ))
        })?;
        self.db.query_table(entry.sql)
    }

    /// Prompt for menu choices until `0` or end of input
    ///
    /// A bad choice or a failing query is reported and the loop continues.
    pub fn interactive<R: BufRead, W: Write>(&self, input: R, mut output: W) -> Result<()> {
        let mut lines = input.lines();

        loop {
            writeln!(output, "\n{}", "Quick Queries:".bright_green().bold())?;
            for (index, entry) in QUERIES.iter().enumerate() {
                writeln!(output, "   {}. {}", index + 1, entry.label)?;
            }
            writeln!(output, "   0. Exit")?;
            write!(output, "\nSelect query (0-{}): ", QUERIES.len())?;
            output.flush()?;

            let Some(line) = lines.next() else {
                break;
            };
            let choice = line?;
            let choice = choice.trim();

            if choice == "0" {
                writeln!(output, "\nGoodbye!")?;
                break;
            }

            let Some((number, entry)) = choice
                .parse::<usize>()
                .ok()
                .and_then(|number| Self::menu_entry(number).map(|entry| (number, entry)))
            else {
                writeln!(
                    output,
                    "{} Invalid choice. Please select 0-{}.",
                    "✗".bright_red(),
                    QUERIES.len()
                )?;
                continue;
            };

            writeln!(output, "\n{}", entry.label.bright_cyan())?;
            match self.run_query(number) {
                Ok(table) => write!(output, "{table}")?,
                Err(error) => writeln!(output, "{} Error: {}", "✗".bright_red(), error)?,
            }
        }

        Ok(())
    }

    pub fn close(self) -> Result<()> {
        self.db.close()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_menu_numbering() {
        assert_eq!(QUERIES.len(), 9);
        assert_eq!(Explorer::menu_entry(0), None);
        assert_eq!(Explorer::menu_entry(1).unwrap().label, "List all tables");
        assert_eq!(
            Explorer::menu_entry(9).unwrap().label,
            "Calendar dimension sample"
        );
        assert_eq!(Explorer::menu_entry(10), None);
    }
}
