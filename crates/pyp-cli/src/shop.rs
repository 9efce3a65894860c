//! Customer-facing commands: catalog, cart, checkout, orders and reviews.
//!
//! The cart and session persist between runs; an applied coupon does not,
//! so `checkout` takes the code directly.

use clap::Subcommand;
use pyp_storefront::Storefront;

use crate::{print_notification, truncate};

/// Sub-commands available under `shop`.
#[derive(Debug, Subcommand)]
pub enum ShopCommands {
    /// List products
    Products {
        /// Only show this category slug (e.g. pickles)
        #[arg(long)]
        category: Option<String>,
    },
    /// Show a product with its reviews
    Product { id: String },
    /// Show the cart
    Cart,
    /// Add one unit of a product to the cart
    Add { id: String },
    /// Set the quantity of a cart line (0 removes it)
    Update {
        id: String,
        #[arg(allow_negative_numbers = true)]
        quantity: i64,
    },
    /// Remove a line from the cart
    Remove { id: String },
    /// Empty the cart
    Clear,
    /// Place an order for the whole cart
    Checkout {
        #[arg(long)]
        address: String,
        #[arg(long)]
        city: String,
        #[arg(long)]
        pincode: String,
        /// upi, card, cod or bankTransfer
        #[arg(long, default_value = "cod")]
        payment: String,
        #[arg(long)]
        coupon: Option<String>,
    },
    /// List your orders
    Orders,
    /// Cancel one of your orders
    Cancel { order_id: String },
    /// Ask to return a delivered order
    Return {
        order_id: String,
        #[arg(long)]
        reason: String,
    },
    /// Show the tracking timeline for an AWB code
    Track { awb: String },
    /// Check whether a pincode can be delivered to
    Serviceability { pincode: String },
    /// Review a product
    Review {
        product_id: String,
        #[arg(long)]
        rating: u8,
        #[arg(long, default_value = "")]
        comment: String,
    },
    /// Suggest meals that go with a pickle
    Recipe { name: String },
}

pub(crate) async fn run(store: &mut Storefront, command: ShopCommands) -> anyhow::Result<()> {
    match command {
        ShopCommands::Products { category } => {
            print_products(store, category.as_deref());
            Ok(())
        }
        ShopCommands::Product { id } => print_product(store, &id),
        ShopCommands::Cart => {
            print_cart(store);
            Ok(())
        }
        ShopCommands::Add { id } => {
            store.add_to_cart(&id)?;
            print_notification(store);
            Ok(())
        }
        ShopCommands::Update { id, quantity } => {
            store.update_cart_quantity(&id, quantity);
            print_notification(store);
            Ok(())
        }
        ShopCommands::Remove { id } => {
            store.remove_from_cart(&id);
            print_notification(store);
            Ok(())
        }
        ShopCommands::Clear => {
            store.clear_cart();
            print_notification(store);
            Ok(())
        }
        ShopCommands::Checkout {
            address,
            city,
            pincode,
            payment,
            coupon,
        } => {
            if let Some(code) = coupon {
                store.apply_coupon(&code)?;
                print_notification(store);
            }
            let checkout = store.checkout(&address, &city, &pincode, &payment);
            match store.place_order(checkout).await? {
                Some(order) => {
                    print_notification(store);
                    println!(
                        "order {} total ₹{} (discount ₹{}), AWB {}",
                        order.id,
                        order.final_amount,
                        order.discount_amount,
                        order.shipment.awb_code.as_deref().unwrap_or("\u{2014}")
                    );
                }
                None => println!("please log in first (`pyp-cli auth login`)"),
            }
            Ok(())
        }
        ShopCommands::Orders => {
            print_my_orders(store);
            Ok(())
        }
        ShopCommands::Cancel { order_id } => {
            store.cancel_order(&order_id).await?;
            print_notification(store);
            Ok(())
        }
        ShopCommands::Return { order_id, reason } => {
            store.request_return(&order_id, &reason).await?;
            print_notification(store);
            Ok(())
        }
        ShopCommands::Track { awb } => {
            let events = store.track_shipment(&awb).await?;
            println!("{:<18}{:<10}{:<28}LOCATION", "TIME", "STATUS", "ACTIVITY");
            for event in &events {
                let at = event.at.map_or_else(
                    || "\u{2014}".to_string(),
                    |t| t.format("%Y-%m-%d %H:%M").to_string(),
                );
                println!(
                    "{:<18}{:<10}{:<28}{}",
                    at,
                    format!("{:?}", event.status).to_lowercase(),
                    event.activity,
                    event.location
                );
            }
            Ok(())
        }
        ShopCommands::Serviceability { pincode } => {
            let answer = store.check_serviceability(&pincode).await?;
            if answer.available {
                println!(
                    "{} delivers to {pincode} for ₹{}{}",
                    answer.courier_name,
                    answer.rate,
                    answer
                        .estimated_delivery
                        .map(|d| format!(", expected by {}", d.format("%Y-%m-%d")))
                        .unwrap_or_default()
                );
            } else {
                println!("sorry, we do not deliver to {pincode} yet");
            }
            Ok(())
        }
        ShopCommands::Review {
            product_id,
            rating,
            comment,
        } => {
            if store.add_review(&product_id, rating, &comment).await?.is_none() {
                println!("please log in first (`pyp-cli auth login`)");
            } else {
                print_notification(store);
            }
            Ok(())
        }
        ShopCommands::Recipe { name } => {
            println!("{}", store.recipe(&name).await);
            Ok(())
        }
    }
}

fn print_products(store: &Storefront, category: Option<&str>) {
    println!(
        "{:<8}{:<30}{:<12}{:>10}{:>8}  RATING",
        "ID", "NAME", "CATEGORY", "PRICE", "STOCK"
    );
    for product in store
        .products()
        .iter()
        .filter(|p| category.is_none_or(|c| p.category == c))
    {
        let rating = store.average_rating(&product.id);
        let stock = if product.is_available() {
            product.stock_quantity.to_string()
        } else {
            "out".to_string()
        };
        println!(
            "{:<8}{:<30}{:<12}{:>10}{:>8}  {:.1} ({})",
            truncate(&product.id, 7),
            truncate(&product.name, 28),
            product.category,
            format!("₹{}", product.unit_price()),
            stock,
            rating.average,
            rating.count
        );
    }
}

fn print_product(store: &Storefront, id: &str) -> anyhow::Result<()> {
    let product = store
        .product(id)
        .ok_or_else(|| anyhow::anyhow!("product '{id}' not found"))?;

    println!("{}", product.name);
    match product.offer_price {
        Some(offer) => println!("₹{offer} (was ₹{})", product.price),
        None => println!("₹{}", product.price),
    }
    if let Some(weight) = &product.weight {
        println!("{weight}");
    }
    if !product.description.is_empty() {
        println!("\n{}", product.description);
    }

    let rating = store.average_rating(id);
    println!("\nRating: {:.1} from {} review(s)", rating.average, rating.count);
    for review in store.product_reviews(id) {
        println!(
            "  {} {} ({}): {}",
            "*".repeat(usize::from(review.rating)),
            review.user_name,
            review.date.format("%Y-%m-%d"),
            review.comment
        );
    }
    Ok(())
}

fn print_cart(store: &Storefront) {
    let cart = store.cart();
    if cart.is_empty() {
        println!("your cart is empty");
        return;
    }

    println!("{:<30}{:>5}{:>12}", "ITEM", "QTY", "TOTAL");
    for item in cart.items() {
        println!(
            "{:<30}{:>5}{:>12}",
            truncate(&item.product.name, 28),
            item.quantity,
            format!("₹{}", item.line_total())
        );
    }
    println!("{:<35}{:>12}", "Subtotal", format!("₹{}", cart.subtotal()));
}

fn print_my_orders(store: &Storefront) {
    if store.user().is_none() {
        println!("please log in first (`pyp-cli auth login`)");
        return;
    }
    let orders = store.my_orders();
    if orders.is_empty() {
        println!("no orders yet");
        return;
    }

    println!(
        "{:<18}{:<12}{:<18}{:>10}  {:<10}ITEMS",
        "ORDER", "DATE", "STATUS", "TOTAL", "ACTIONS"
    );
    for order in orders {
        let actions = if order.status.customer_can_cancel() {
            "cancel"
        } else if order.status.customer_can_request_return() {
            "return"
        } else {
            "\u{2014}"
        };
        println!(
            "{:<18}{:<12}{:<18}{:>10}  {:<10}{}",
            order.id,
            order.date.format("%Y-%m-%d"),
            order.status,
            format!("₹{}", order.final_amount),
            actions,
            truncate(&order.item_summary(), 40)
        );
    }
}
