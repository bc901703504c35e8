// Shared fixtures for conformist integration tests
#![allow(dead_code)]

use conformist::cancel::CancellationToken;
use conformist::report::Report;
use conformist::run::{Mode, RunContext, RunOptions};
use indoc::indoc;
use std::fs;
use std::path::Path;
use tempfile::TempDir;

/// A Python project written into a temporary directory.
pub struct Project {
    dir: TempDir,
}

impl Project {
    pub fn empty() -> Self {
        Self {
            dir: TempDir::new().expect("Failed to create temp dir"),
        }
    }

    /// A small tree that satisfies every shipped rule.
    pub fn clean() -> Self {
        Self::empty()
            .file("src/shop/__init__.py", "\"\"\"Shop domain.\"\"\"\n")
            .file("src/shop/exceptions.py", CLEAN_EXCEPTIONS)
            .file("src/shop/orders.py", CLEAN_ORDERS)
            .file("tests/__init__.py", "")
            .file("tests/test_orders.py", CLEAN_TESTS)
    }

    pub fn file(self, relative: &str, content: &str) -> Self {
        let path = self.dir.path().join(relative);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).expect("Failed to create fixture dir");
        }
        fs::write(&path, content).expect("Failed to write fixture file");
        self
    }

    pub fn root(&self) -> &Path {
        self.dir.path()
    }

    pub fn read(&self, relative: &str) -> String {
        fs::read_to_string(self.dir.path().join(relative)).expect("Failed to read fixture file")
    }

    pub fn options(&self, mode: Mode) -> RunOptions {
        let mut options = RunOptions::new(self.root());
        options.mode = mode;
        options
    }

    pub fn run(&self, mode: Mode) -> Report {
        run_with(self.options(mode))
    }
}

pub fn run_with(options: RunOptions) -> Report {
    RunContext::prepare(options)
        .expect("run should prepare")
        .run(&CancellationToken::new())
        .expect("run should complete")
}

pub fn structured(report: &Report) -> String {
    serde_json::to_string_pretty(report).expect("report serializes")
}

pub fn rule_ids(report: &Report) -> Vec<&str> {
    report.findings.iter().map(|f| f.rule_id.as_str()).collect()
}

pub const CLEAN_EXCEPTIONS: &str = indoc! {r#"
    """Shop errors."""


    class ShopError(Exception):
        """Base error for the shop domain."""


    class OutOfStockError(ShopError):
        """Raised when an item is unavailable."""
"#};

pub const CLEAN_ORDERS: &str = indoc! {r#"
    """Order handling."""

    import logging
    from dataclasses import dataclass

    from shop.exceptions import OutOfStockError

    logger = logging.getLogger(__name__)


    @dataclass
    class Order:
        """A placed order."""

        sku: str
        quantity: int


    def reserve(order: Order, stock: int) -> int:
        """Reserve stock for an order.

        Args:
            order: The order to reserve.
            stock: Units currently available.

        Returns:
            Units left after the reservation.

        Raises:
            OutOfStockError: If the order exceeds the stock.
        """
        if order.quantity > stock:
            raise OutOfStockError(order.sku)
        logger.info("reserved %s", order.sku)
        return stock - order.quantity
"#};

pub const CLEAN_TESTS: &str = indoc! {r#"
    """Order tests."""

    from shop.orders import Order, reserve


    def test_reserve_keeps_the_rest() -> None:
        """Reserving two units leaves three."""
        assert reserve(Order(sku="A1", quantity=2), 5) == 3
"#};
