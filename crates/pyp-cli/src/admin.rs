//! Back-office commands: dashboard, order handling and catalog upkeep.

use clap::Subcommand;
use pyp_core::{Banner, CategoryItem, Coupon, OrderStatus, Product, ReturnAction};
use pyp_storefront::{ReviewDraft, Storefront};
use rust_decimal::Decimal;

use crate::{print_notification, truncate};

/// Sub-commands available under `admin`.
#[derive(Debug, Subcommand)]
pub enum AdminCommands {
    /// Revenue and order counts
    Stats,
    /// List every order, newest first
    Orders {
        /// Only show orders in this status (e.g. return_requested)
        #[arg(long)]
        status: Option<OrderStatus>,
    },
    /// Overwrite an order's status
    SetStatus {
        order_id: String,
        status: OrderStatus,
        #[arg(long)]
        tracking_id: Option<String>,
    },
    /// Approve, reject or refund a return request
    Return {
        order_id: String,
        /// approve, reject or refund
        action: ReturnAction,
    },
    /// Book a shipment and generate the AWB label
    Label { order_id: String },
    /// Add a product
    AddProduct {
        #[arg(long)]
        name: String,
        #[arg(long)]
        price: Decimal,
        #[arg(long)]
        offer_price: Option<Decimal>,
        #[arg(long)]
        category: String,
        #[arg(long, default_value_t = 0)]
        stock: u32,
        #[arg(long)]
        weight: Option<String>,
        #[arg(long, default_value = "")]
        description: String,
        #[arg(long, default_value = "")]
        image: String,
        #[arg(long)]
        featured: bool,
    },
    /// Change a product's price or stock
    UpdateProduct {
        id: String,
        #[arg(long)]
        price: Option<Decimal>,
        #[arg(long)]
        offer_price: Option<Decimal>,
        #[arg(long)]
        stock: Option<u32>,
        #[arg(long)]
        in_stock: Option<bool>,
    },
    DeleteProduct { id: String },
    AddCategory {
        #[arg(long)]
        name: String,
        /// Defaults to the lowercased name with dashes
        #[arg(long)]
        slug: Option<String>,
    },
    DeleteCategory { id: String },
    AddCoupon {
        code: String,
        #[arg(long)]
        percent: u8,
        #[arg(long, default_value = "")]
        description: String,
    },
    DeleteCoupon { id: String },
    AddBanner {
        #[arg(long)]
        title: String,
        #[arg(long)]
        image_url: String,
        #[arg(long, default_value = "")]
        subtitle: String,
        #[arg(long, default_value = "/shop")]
        link: String,
    },
    DeleteBanner { id: String },
    /// Post a review on a customer's behalf
    AddReview {
        product_id: String,
        #[arg(long)]
        user_name: String,
        #[arg(long)]
        rating: u8,
        #[arg(long, default_value = "")]
        comment: String,
    },
    DeleteReview { id: String },
    /// Show or change the site settings
    Settings {
        #[arg(long)]
        announcement: Option<String>,
        #[arg(long)]
        announcement_active: Option<bool>,
        #[arg(long)]
        marquee: Option<String>,
        #[arg(long)]
        marquee_speed: Option<u32>,
        #[arg(long)]
        cod: Option<bool>,
    },
}

/// Millisecond timestamp id, the scheme every client-created document uses.
fn new_id() -> String {
    chrono::Utc::now().timestamp_millis().to_string()
}

fn slugify(name: &str) -> String {
    name.trim()
        .to_lowercase()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join("-")
}

#[allow(clippy::too_many_lines)]
pub(crate) async fn run(store: &mut Storefront, command: AdminCommands) -> anyhow::Result<()> {
    match command {
        AdminCommands::Stats => {
            let stats = store.dashboard_stats();
            println!("Revenue:          ₹{}", stats.total_revenue);
            println!("Orders:           {}", stats.order_count);
            println!("Pending:          {}", stats.pending);
            println!("Processing:       {}", stats.processing);
            println!("Return requests:  {}", stats.return_requests);
            return Ok(());
        }
        AdminCommands::Orders { status } => {
            print_orders(store, status);
            return Ok(());
        }
        AdminCommands::SetStatus {
            order_id,
            status,
            tracking_id,
        } => {
            store
                .update_order_status(&order_id, status, tracking_id)
                .await?;
        }
        AdminCommands::Return { order_id, action } => {
            store.process_return_action(&order_id, action).await?;
        }
        AdminCommands::Label { order_id } => store.generate_label(&order_id).await?,
        AdminCommands::AddProduct {
            name,
            price,
            offer_price,
            category,
            stock,
            weight,
            description,
            image,
            featured,
        } => {
            let product = Product {
                id: new_id(),
                name,
                description,
                price,
                offer_price,
                image,
                category,
                weight,
                in_stock: stock > 0,
                stock_quantity: stock,
                is_featured: featured,
            };
            store.add_product(product).await?;
        }
        AdminCommands::UpdateProduct {
            id,
            price,
            offer_price,
            stock,
            in_stock,
        } => {
            let mut product = store
                .product(&id)
                .cloned()
                .ok_or_else(|| anyhow::anyhow!("product '{id}' not found"))?;
            if let Some(price) = price {
                product.price = price;
            }
            if offer_price.is_some() {
                product.offer_price = offer_price;
            }
            if let Some(stock) = stock {
                product.stock_quantity = stock;
            }
            if let Some(in_stock) = in_stock {
                product.in_stock = in_stock;
            }
            store.update_product(product).await?;
        }
        AdminCommands::DeleteProduct { id } => store.delete_product(&id).await?,
        AdminCommands::AddCategory { name, slug } => {
            let category = CategoryItem {
                id: new_id(),
                slug: slug.unwrap_or_else(|| slugify(&name)),
                name,
                description: None,
                image: None,
            };
            store.add_category(category).await?;
        }
        AdminCommands::DeleteCategory { id } => store.delete_category(&id).await?,
        AdminCommands::AddCoupon {
            code,
            percent,
            description,
        } => {
            let coupon = Coupon {
                id: new_id(),
                code,
                discount_percent: percent,
                description,
                is_active: true,
            };
            store.add_coupon(coupon).await?;
        }
        AdminCommands::DeleteCoupon { id } => store.delete_coupon(&id).await?,
        AdminCommands::AddBanner {
            title,
            image_url,
            subtitle,
            link,
        } => {
            let banner = Banner {
                id: new_id(),
                image_url,
                title,
                subtitle,
                link,
                button_text: None,
                active: true,
            };
            store.add_banner(banner).await?;
        }
        AdminCommands::DeleteBanner { id } => store.delete_banner(&id).await?,
        AdminCommands::AddReview {
            product_id,
            user_name,
            rating,
            comment,
        } => {
            let draft = ReviewDraft {
                product_id,
                user_id: format!("admin-{}", new_id()),
                user_name,
                user_image: None,
                rating,
                comment,
                date: None,
            };
            store.admin_add_review(draft).await?;
        }
        AdminCommands::DeleteReview { id } => store.delete_review(&id).await?,
        AdminCommands::Settings {
            announcement,
            announcement_active,
            marquee,
            marquee_speed,
            cod,
        } => {
            let mut config = store.config().clone();
            let unchanged = announcement.is_none()
                && announcement_active.is_none()
                && marquee.is_none()
                && marquee_speed.is_none()
                && cod.is_none();
            if unchanged {
                println!(
                    "announcement: {} ({})",
                    config.announcement_text,
                    if config.announcement_active { "on" } else { "off" }
                );
                println!(
                    "marquee:      {} ({}s)",
                    config.marquee_text, config.marquee_speed
                );
                println!(
                    "payments:     {}",
                    config.payment_methods.enabled().join(", ")
                );
                return Ok(());
            }

            if let Some(text) = announcement {
                config.announcement_text = text;
            }
            if let Some(active) = announcement_active {
                config.announcement_active = active;
            }
            if let Some(text) = marquee {
                config.marquee_text = text;
            }
            if let Some(speed) = marquee_speed {
                config.marquee_speed = speed;
            }
            if let Some(cod) = cod {
                config.payment_methods.cod = cod;
            }
            store.update_config(config).await?;
        }
    }

    print_notification(store);
    Ok(())
}

fn print_orders(store: &Storefront, status: Option<OrderStatus>) {
    println!(
        "{:<18}{:<12}{:<18}{:>10}  {:<10}ITEMS",
        "ORDER", "DATE", "STATUS", "TOTAL", "USER"
    );
    for order in store
        .orders()
        .iter()
        .filter(|o| status.is_none_or(|s| o.status == s))
    {
        println!(
            "{:<18}{:<12}{:<18}{:>10}  {:<10}{}",
            order.id,
            order.date.format("%Y-%m-%d"),
            order.status,
            format!("₹{}", order.final_amount),
            truncate(&order.user_id, 8),
            truncate(&order.item_summary(), 40)
        );
    }
}
