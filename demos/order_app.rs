//! Order application demo: member sign-up, discounts and container shutdown.
//!
//! Run with `RUST_LOG=beanpod=debug cargo run --example order_app` to watch
//! the container build and tear down the graph.

use beanpod::sample::{
    register_app, DiscountPolicy, Grade, Member, MemberService, NetworkClient, OrderService,
};
use beanpod::{Container, ContainerConfig, DiResult, TracingObserver};
use std::sync::Arc;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

fn main() -> DiResult<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = ContainerConfig::from_env().unwrap_or_else(|e| {
        warn!(error = %e, "ignoring invalid environment configuration");
        ContainerConfig::default()
    });
    let container = Container::with_config(config);
    container.add_observer(Arc::new(TracingObserver::new()))?;
    register_app(&container)?;
    container.seal()?;

    for descriptor in container.bean_descriptors() {
        info!(id = %descriptor.id, scope = %descriptor.scope, primary = descriptor.primary, "bean");
    }

    let members = container.get_bean::<dyn MemberService>()?;
    let orders = container.get_bean::<dyn OrderService>()?;

    members.join(Member::new(1, "memberA", Grade::Vip));
    members.join(Member::new(2, "memberB", Grade::Basic));

    for (member_id, price) in [(1, 10000), (1, 20000), (2, 10000), (3, 10000)] {
        match orders.create_order(member_id, "itemA", price) {
            Ok(order) => println!(
                "order member={} price={} discount={} total={}",
                order.member_id,
                order.item_price,
                order.discount_price,
                order.calculate_price()
            ),
            Err(e) => println!("order rejected: {}", e),
        }
    }

    // Qualifier beats primary
    let fix = container.get_bean_qualified::<dyn DiscountPolicy>("fixDiscountPolicy")?;
    let vip = Member::new(9, "memberC", Grade::Vip);
    println!("fixed discount on 20000: {}", fix.discount(&vip, 20000));

    let client = container.get_bean::<NetworkClient>()?;
    client.call("demo message");

    for error in container.shutdown() {
        warn!(error = %error, "destroy hook failed");
    }
    for event in client.events() {
        println!("network: {}", event);
    }
    Ok(())
}
