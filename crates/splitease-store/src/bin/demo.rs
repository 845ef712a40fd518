//! # Demo Walkthrough
//!
//! Runs a full service: place an order, walk it through the kitchen,
//! generate the bill, split it two ways, settle both shares, and print the
//! end-of-day report. State persists as JSON snapshots in the data
//! directory, so running twice shows yesterday's bills surviving a restart.
//!
//! ## Usage
//! ```bash
//! cargo run -p splitease-store --bin splitease-demo
//!
//! # Custom data directory
//! cargo run -p splitease-store --bin splitease-demo -- --data ./demo-data
//!
//! # Wipe persisted state first
//! cargo run -p splitease-store --bin splitease-demo -- --reset
//! ```

use std::env;

use chrono::Utc;
use tracing::info;
use tracing_subscriber::EnvFilter;

use splitease_core::{MenuCatalog, OrderPriority, OrderStatus, PaymentMethod};
use splitease_gateway::MockGateway;
use splitease_store::{NewOrder, NewOrderItem, Services, SplitPlan, StoreResult};

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,splitease_store=debug,splitease_gateway=debug"));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

#[tokio::main]
async fn main() -> StoreResult<()> {
    init_tracing();

    let args: Vec<String> = env::args().collect();
    let mut data_dir = String::from("./splitease-data");
    let mut reset = false;

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--data" | "-d" => {
                if i + 1 < args.len() {
                    data_dir = args[i + 1].clone();
                    i += 1;
                }
            }
            "--reset" => reset = true,
            _ => {}
        }
        i += 1;
    }

    let services = Services::open(&data_dir, MenuCatalog::sample(), MockGateway::new())?;
    if reset {
        services.reset()?;
    }

    let mut updates = services.bus.subscribe();

    // Table 12 orders dinner.
    let order = services.orders.create_order(NewOrder {
        table_number: 12,
        customer_id: None,
        waiter_id: Some("w-alex".to_string()),
        priority: OrderPriority::Normal,
        items: vec![
            NewOrderItem::new("burrata", 1),
            NewOrderItem::new("carbonara", 1),
            NewOrderItem::new("risotto-funghi", 1),
            NewOrderItem::new("house-red", 2),
        ],
    })?;
    info!(order_id = %order.id, total_cents = order.total_cents, "Order placed");

    // Kitchen works the ticket.
    for status in [
        OrderStatus::Confirmed,
        OrderStatus::Preparing,
        OrderStatus::Ready,
        OrderStatus::Served,
    ] {
        services.orders.update_status(&order.id, status)?;
    }
    info!(queue = services.orders.kitchen_queue().len(), "Order served");

    // Bill the table and split it between two diners.
    let bill = services.billing.generate_bill(12, &[])?;
    info!(
        bill_id = %bill.id,
        subtotal = bill.subtotal_cents,
        tax = bill.tax_cents,
        service = bill.service_cents,
        total = bill.total_cents,
        "Bill generated"
    );

    services.billing.initiate_split(
        &bill.id,
        SplitPlan::Equal {
            customers: vec!["anna".to_string(), "ben".to_string()],
        },
    )?;
    services.billing.finalize_split(&bill.id)?;

    services
        .billing
        .pay_share(&bill.id, "anna", PaymentMethod::Card)
        .await?;
    let settled = services
        .billing
        .pay_share(&bill.id, "ben", PaymentMethod::MobileWallet)
        .await?;
    info!(status = %settled.status, payments = settled.payments.len(), "Bill settled");

    services.save()?;

    // End-of-day numbers.
    let revenue = services.daily_revenue(Utc::now().date_naive());
    info!(
        bills_paid = revenue.bills_paid,
        gross_cents = revenue.gross_cents,
        net_cents = revenue.net_cents(),
        "Daily revenue"
    );
    for (method, stats) in services.payment_method_stats(Some(Utc::now().date_naive())) {
        info!(method, payments = stats.payments, total_cents = stats.total_cents, "Method stats");
    }

    // Drain the notification feed the screens would have shown.
    while let Ok(notification) = updates.try_recv() {
        println!("[{:?}] {}", notification.level, notification.message);
    }

    Ok(())
}
