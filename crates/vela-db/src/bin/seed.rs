//! Seeds a local database with demo catalog, customer and voucher data.
//!
//! ```text
//! cargo run -p vela-db --bin seed [path/to/vela.db]
//! ```

use chrono::{Duration, Utc};
use tracing::info;

use vela_db::repository::voucher::VoucherRepository;
use vela_db::{Database, DbConfig};

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let path = std::env::args().nth(1).unwrap_or_else(|| "vela.db".to_string());
    let db = Database::new(DbConfig::new(&path)).await?;

    let products = db.products();
    let vacuum = products.create("Robot Vacuum X1", 4_500_000, 12).await?;
    let fryer = products.create("Air Fryer A2", 1_890_000, 30).await?;
    let kettle = products.create("Electric Kettle K3", 390_000, 50).await?;
    products.create_variant(&vacuum.id, "Black", 8).await?;
    products.create_variant(&vacuum.id, "White", 4).await?;
    info!(count = 3, "Products seeded");

    let customer = db
        .customers()
        .create(Some("Tran Thi B"), Some("0901234567"), Some("b@example.com"))
        .await?;
    db.customers()
        .add_address(
            &customer.id,
            Some("12 Nguyen Trai"),
            Some("Ward 5"),
            Some("District 1"),
            Some("Ho Chi Minh City"),
        )
        .await?;
    db.customers().add_cart_item(&customer.id, &fryer.id, None, 1).await?;
    db.customers().add_cart_item(&customer.id, &kettle.id, None, 2).await?;
    info!(customer_id = %customer.id, "Demo customer seeded");

    let now = Utc::now();
    let mut voucher =
        VoucherRepository::new_voucher("SUMMER10", now - Duration::days(1), now + Duration::days(30));
    voucher.discount_percent = Some(10.0);
    voucher.discount_amount_vnd = Some(5_000);
    voucher.usage_limit = 100;
    db.vouchers().create(&voucher).await?;
    info!(code = "SUMMER10", "Voucher seeded");

    info!(path = %path, "Seeding complete");
    Ok(())
}
