//! Walk through a short scene: declare an inventory, apply items, check the
//! rules and save the state.
//!
//! ```bash
//! RUST_LOG=playstate_core=debug PLAYSTATE_STORE=/tmp/playstate.json \
//!     cargo run -p playstate-core --example inventory_session
//! ```

use playstate_core::{name, Category, Item, Limit, Session, SessionConfig};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();

    let config = SessionConfig::from_env();
    let mut session = Session::open(config).await?;

    let collar = Item::new(name!("Toys.Collar:leather"))
        .with_display_name("Leather collar")
        .with_default_peers([name!("Body.AroundNeck")])
        .with_attributes([name!("Materials.Leather")])
        .with_blockers([name!("Clothes.Scarf")]);
    let scarf =
        Item::new(name!("Clothes.Scarf:wool")).with_default_peers([name!("Body.AroundNeck")]);

    session.add_item(collar.clone());
    session.add_item(scarf.clone());
    collar.set_available(session.registry(), true)?;
    scarf.set_available(session.registry(), true)?;

    if session.registry().is_applied(collar.kind())? {
        println!("{} is still on from last time", collar.display_name());
    } else {
        let allowed = session.can_apply(&collar.instance_name())?;
        println!("can apply {}: {}", collar.display_name(), allowed);
    }

    session.apply_item(&scarf.instance_name())?;
    println!("rules failing with the scarf on: {:?}", session.explain(&collar.instance_name())?);

    session.remove_item(&scarf.instance_name())?;
    if session.can_apply(&collar.instance_name())? {
        session.apply_item(&collar.instance_name())?;
        session.registry().over(collar.kind(), Limit::seconds(30 * 60))?;
        session.registry().remember(collar.kind())?;
    }

    let neck = name!("Body.AroundNeck");
    let registry = session.registry();
    println!("neck wears toys: {}", registry.is(&neck, &[Category::Toys.into()])?);
    let leather = registry.is(collar.kind(), &[name!("Materials.Leather").into()])?;
    println!("collar is leather: {}", leather);
    println!("collar window: {}", registry.duration(collar.kind())?);
    println!("scarf removed {:?}s ago", registry.removed_since(scarf.kind())?);

    session.save().await?;
    Ok(())
}
