use ar_config::{ArConfig, DataSourceRegistry, Model};
use std::borrow::Cow;

struct User;

impl Model for User {}

struct Order;

impl Model for Order {
    fn model_name() -> Cow<'static, str> {
        Cow::Borrowed("com.example.Order")
    }
}

fn main() -> Result<(), ar_config::Error> {
    let config = ArConfig::builder()
        .with_file("demos/ar.toml", true)
        .with_env("AR", "__")
        .load()?;

    let registry = DataSourceRegistry::from_config(config)?;

    // User has no binding, so it resolves to the default data source.
    let ds = registry.datasource_for::<User>()?;
    println!("User -> {} ({})", ds.name(), ds.url());

    // Order is explicitly bound to the analytics source.
    let ds = registry.datasource_for::<Order>()?;
    println!("Order -> {} ({})", ds.name(), ds.url());

    Ok(())
}
