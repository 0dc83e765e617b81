//! The six demo steps, written to any `Write` so they run the same against
//! stdout or a buffer.

use std::io::{self, Write};

use giia_core::{PlatformClient, Product, Transport};

pub fn rule(out: &mut impl Write) -> io::Result<()> {
    writeln!(out, "{}", "=".repeat(50))
}

/// Run every step in order. A failed login ends the walkthrough; any other
/// failed step prints its error and the next step runs.
pub fn run<T: Transport>(
    client: &mut PlatformClient<T>,
    email: &str,
    password: &str,
    out: &mut impl Write,
) -> io::Result<()> {
    writeln!(out, "\n1. Authenticating...")?;
    match client.login(email, password) {
        Ok(user) => {
            writeln!(out, "   ✓ Logged in as {}", user.email)?;
            writeln!(out, "   ✓ Organization: {}", user.organization_id)?;
        }
        Err(e) => {
            writeln!(out, "   ✗ Login failed: {e}")?;
            return Ok(());
        }
    }

    writeln!(out, "\n2. Listing products...")?;
    let products: Vec<Product> = match client.list_products(1, 5, None) {
        Ok(products) => {
            writeln!(out, "   ✓ Found {} products", products.len())?;
            for p in products.iter().take(3) {
                writeln!(out, "      - {}: {}", p.sku, p.name)?;
            }
            products
        }
        Err(e) => {
            writeln!(out, "   ✗ Failed: {e}")?;
            Vec::new()
        }
    };

    writeln!(out, "\n3. Creating product...")?;
    let sku = format!("RS-{}", chrono::Local::now().format("%Y%m%d%H%M%S"));
    match client.create_product(&sku, "Rust Demo Product", "Demo", "units") {
        Ok(product) => writeln!(out, "   ✓ Created: {} - {}", product.sku, product.name)?,
        Err(e) => writeln!(out, "   ✗ Failed: {e}")?,
    }

    writeln!(out, "\n4. Checking buffer status...")?;
    if let Some(first) = products.first() {
        match client.get_buffer(&first.id) {
            Ok(buffer) => {
                writeln!(out, "   ✓ Buffer for {}:", first.sku)?;
                writeln!(out, "      Zone: {}", buffer.zone)?;
                writeln!(out, "      NFP: {:.2}", buffer.net_flow_position)?;
                writeln!(out, "      Penetration: {:.1}%", buffer.buffer_penetration * 100.0)?;
            }
            Err(e) => writeln!(out, "   ✗ Failed: {e}")?,
        }
    }

    writeln!(out, "\n5. Getting KPI snapshot...")?;
    match client.get_kpi_snapshot() {
        Ok(kpis) => {
            let rate = |key: &str| kpis.get(key).and_then(|v| v.as_f64()).unwrap_or(0.0) * 100.0;
            writeln!(out, "   ✓ Service Level: {:.1}%", rate("service_level"))?;
            writeln!(out, "   ✓ Stockout Rate: {:.1}%", rate("stockout_rate"))?;
        }
        Err(e) => writeln!(out, "   ✗ Failed: {e}")?,
    }

    writeln!(out, "\n6. Getting notifications...")?;
    match client.get_notifications(true) {
        Ok(notifications) => {
            writeln!(out, "   ✓ {} unread notifications", notifications.len())?;
            for n in notifications.iter().take(3) {
                let priority = n.get("priority").and_then(|v| v.as_str()).unwrap_or("info");
                let title = n.get("title").and_then(|v| v.as_str()).unwrap_or("Untitled");
                writeln!(out, "      - [{priority}] {title}")?;
            }
        }
        Err(e) => writeln!(out, "   ✗ Failed: {e}")?,
    }

    client.logout();

    writeln!(out)?;
    rule(out)?;
    writeln!(out, "Example complete!")?;
    rule(out)
}
